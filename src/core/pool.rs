use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::core::experiment::Experiment;
use crate::error::PipelineError;

/// Concatenate every replicate's gzipped alignment into the pooled
/// tagAlign, in replicate order. Gzip members concatenate, so appending
/// the raw bytes keeps the pooled file decompressable; any stale pooled
/// file is replaced.
pub fn pool_alignments(exp: &Experiment) -> Result<(), PipelineError> {
    let pooled = &exp.pooled_tagalign.path;

    if pooled.exists() {
        std::fs::remove_file(pooled)?;
    }

    let mut out = BufWriter::new(File::create(pooled)?);
    for rep in &exp.reps {
        let mut input = File::open(&rep.tagalign.path)?;
        io::copy(&mut input, &mut out)?;
    }
    out.flush()?;

    log::info!(
        "INFO [STEP 3]: pooled {} {} alignment/s into {}",
        exp.reps.len(),
        exp.role,
        exp.pooled_tagalign.filename()
    );

    Ok(())
}
