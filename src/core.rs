pub mod align;
pub mod encoding;
pub mod experiment;
pub mod idr;
pub mod peaks;
pub mod pool;
pub mod spp;

use crate::config::{Config, PipelineStep};
use crate::core::experiment::{Experiment, Role};
use crate::error::PipelineError;

/// Walk the configured steps in order over the target and control
/// experiments. Peak calling and reproducibility scoring run on the
/// target only, with the control's pooled alignment as their shared
/// reference.
pub fn run(config: Config) -> Result<(), PipelineError> {
    log::info!("INFO: configuration loaded, starting pipeline...");
    log::debug!("DEBUG: running with the following config: {:#?}", config);

    let mut target = Experiment::from_config(&config, Role::Target)?;
    let mut control = Experiment::from_config(&config, Role::Control)?;

    for step in config.steps().clone() {
        match step {
            PipelineStep::Encoding => {
                encoding::discover_encoding(&mut target, &config)?;
                encoding::discover_encoding(&mut control, &config)?;
            }
            PipelineStep::Align => {
                // encodings survive on disk between run-step invocations
                if target.reps.iter().any(|rep| rep.encoding.is_none()) {
                    encoding::load_cached(&mut target, &config)?;
                }
                if control.reps.iter().any(|rep| rep.encoding.is_none()) {
                    encoding::load_cached(&mut control, &config)?;
                }

                align::align_reads(&target, &config)?;
                align::align_reads(&control, &config)?;
            }
            PipelineStep::Pool => {
                pool::pool_alignments(&target)?;
                pool::pool_alignments(&control)?;
            }
            PipelineStep::CallPeaks => {
                spp::call_peaks(&target, &config, &control.pooled_tagalign)?;
            }
            PipelineStep::Idr => {
                idr::reproducible_peaks(&target, &config, &control.pooled_tagalign)?;
            }
        }
    }

    log::info!("INFO: pipeline finished");

    Ok(())
}
