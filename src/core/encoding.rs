use std::path::PathBuf;

use hashbrown::HashMap;

use crate::config::Config;
use crate::consts::*;
use crate::core::experiment::{Experiment, Role};
use crate::error::PipelineError;
use crate::executor::manager::run_tool;

/// Guess the quality-score encoding of every replicate's reads.
///
/// Delegates to the R helper, which writes a two-column table mapping
/// each read file to its bowtie encoding flag; the parsed result is
/// stored on the replicates for the alignment step.
pub fn discover_encoding(exp: &mut Experiment, config: &Config) -> Result<(), PipelineError> {
    let rscript = config.require_global(CHIPSEQ_RSCRIPT)?.to_string();
    let rlib = config.require_global(RLIB_DIR)?.to_string();
    let table = encoding_table_path(config, exp.role)?;

    let files = exp
        .reps
        .iter()
        .map(|rep| rep.fastq.path.display().to_string())
        .collect::<Vec<_>>()
        .join(",");

    run_tool(
        RSCRIPT,
        &[
            rscript,
            GUESS_ENCODING.to_string(),
            config.num_threads().to_string(),
            files,
            table.display().to_string(),
            rlib,
        ],
    )?;

    assign_encodings(exp, &table)?;

    log::info!(
        "INFO [STEP 1]: discovered quality encodings for {} {} replicate/s",
        exp.reps.len(),
        exp.role
    );

    Ok(())
}

/// Re-read a previously written encoding table without invoking the
/// helper again. Lets the alignment step run on its own through
/// `run-step` after an earlier encoding run.
pub fn load_cached(exp: &mut Experiment, config: &Config) -> Result<(), PipelineError> {
    let table = encoding_table_path(config, exp.role)?;

    assign_encodings(exp, &table)
}

fn encoding_table_path(config: &Config, role: Role) -> Result<PathBuf, PipelineError> {
    Ok(config
        .temp_dir()?
        .join(format!("{}{}", role, ENCODING_SUFFIX)))
}

fn assign_encodings(exp: &mut Experiment, table: &PathBuf) -> Result<(), PipelineError> {
    let text = std::fs::read_to_string(table)?;
    let file2enc = parse_encoding_table(&text)?;

    for rep in &mut exp.reps {
        let key = rep.fastq.path.display().to_string();
        let encoding = file2enc.get(&key).ok_or_else(|| {
            PipelineError::MalformedTable(format!(
                "{}: no encoding listed for {}",
                table.display(),
                key
            ))
        })?;
        rep.encoding = Some(encoding.clone());
    }

    Ok(())
}

/// Parse the helper's `file<TAB>encoding` table, header line skipped.
pub(crate) fn parse_encoding_table(text: &str) -> Result<HashMap<String, String>, PipelineError> {
    let mut file2enc = HashMap::new();

    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.splitn(2, '\t');
        match (fields.next(), fields.next()) {
            (Some(file), Some(encoding)) if !encoding.trim().is_empty() => {
                file2enc.insert(file.to_string(), encoding.trim_end().to_string());
            }
            _ => {
                return Err(PipelineError::MalformedTable(format!(
                    "expected `file<TAB>encoding`: {}",
                    line
                )))
            }
        }
    }

    Ok(file2enc)
}
