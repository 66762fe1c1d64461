use crate::config::{Config, PipelineStep};
use crate::consts::*;
use crate::core::experiment::{Experiment, Replicate};
use crate::error::PipelineError;
use crate::executor::manager::shell;

/// Align every replicate's reads into its gzipped tagAlign.
///
/// Each replicate runs one fixed shell pipeline: decompress, align,
/// filter unmapped/duplicate/QC-failed records, convert to intervals,
/// blank the read name column, compress. Stages are connected by pipes;
/// a non-zero exit anywhere is pipeline-fatal.
pub fn align_reads(exp: &Experiment, config: &Config) -> Result<(), PipelineError> {
    let bowtie = config.require_global(BOWTIE_BIN)?.to_string();
    let samtools = config.require_global(SAMTOOLS_BIN)?.to_string();
    let bedtools = config.require_global(BEDTOOLS_BIN)?.to_string();
    let index = config.require_global(BOWTIE_INDEX)?.to_string();
    let extra = config.get_step_args(PipelineStep::Align, vec![]);
    let nthr = bowtie_threads(config.num_threads());

    for rep in &exp.reps {
        let encoding = rep
            .encoding
            .as_deref()
            .ok_or(PipelineError::MissingEncoding(rep.index))?;

        let cmd = alignment_pipeline(
            rep, &bowtie, &samtools, &bedtools, &index, encoding, &extra, nthr,
        );

        shell(
            &cmd,
            &format!("aligned {} replicate {}", exp.role, rep.index),
            "bowtie",
        )?;
    }

    log::info!(
        "INFO [STEP 2]: aligned {} {} replicate/s",
        exp.reps.len(),
        exp.role
    );

    Ok(())
}

/// Bowtie's share of the thread budget; four threads stay reserved for
/// the downstream pipe stages when the budget allows it.
pub(crate) fn bowtie_threads(total: i64) -> i64 {
    if total > BOWTIE_RESERVED_THREADS {
        total - BOWTIE_RESERVED_THREADS
    } else {
        1
    }
}

#[allow(clippy::too_many_arguments)]
fn alignment_pipeline(
    rep: &Replicate,
    bowtie: &str,
    samtools: &str,
    bedtools: &str,
    index: &str,
    encoding: &str,
    extra: &str,
    nthr: i64,
) -> String {
    let extra = if extra.is_empty() {
        String::new()
    } else {
        format!(" {}", extra)
    };

    [
        format!("{} {}", rep.fastq.cat_command(), rep.fastq.path.display()),
        format!(
            "{} -q -v 2 -a --best --strata -m 1 {} -S -p {}{} {} -",
            bowtie, encoding, nthr, extra, index
        ),
        format!("{} view -S -b -F {} -", samtools, SAM_FILTER_FLAG),
        format!("{} bamtobed -i stdin", bedtools),
        format!(
            "awk 'BEGIN{{FS=\"\\t\";OFS=\"\\t\"}}{{$4=\"{}\"; print $0}}'",
            STRAND_PLACEHOLDER
        ),
        format!("gzip -c > {}", rep.tagalign.path.display()),
    ]
    .join(" | ")
}
