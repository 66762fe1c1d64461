use std::path::{Path, PathBuf};

use dashmap::DashMap;
use itertools::Itertools;
use rayon::prelude::*;

use crate::config::Config;
use crate::consts::*;
use crate::core::experiment::{region_peak_path, Experiment, Replicate, TrackFile};
use crate::core::peaks::{count_reproducible, merge_top_peaks};
use crate::error::PipelineError;
use crate::executor::manager::run_tool;

/// Score every unordered replicate pair for reproducibility and cap the
/// pooled peak set at the best pair's reproducible-peak count.
///
/// One external scoring process runs per pair; each worker publishes
/// `report file -> count` into a shared map, a failing worker fails the
/// whole stage after the join. The pooled peak set is then stably sorted
/// by its two rank columns, truncated to the maximum published count and
/// written as the final peak set.
///
/// With a single replicate there are no pairs to score: the full peak
/// set is kept, sorted but uncapped.
pub fn reproducible_peaks(
    exp: &Experiment,
    config: &Config,
    ctrl_tagalign: &TrackFile,
) -> Result<(), PipelineError> {
    exp.guard_target("idr")?;

    let temp_dir = config.temp_dir()?;
    let pairs = replicate_pairs(&exp.reps);

    if pairs.is_empty() {
        log::warn!(
            "WARN: {} replicate/s only, skipping reproducibility scoring and keeping all peaks",
            exp.reps.len()
        );

        let written = merge_top_peaks(&exp.peaks.path, &exp.final_peaks.path, None)?;
        log::info!(
            "INFO [STEP 5]: wrote {} uncapped peak/s -> {}",
            written,
            exp.final_peaks.filename()
        );

        return Ok(());
    }

    let idr_script = config.require_global(IDR_SCRIPT)?.to_string();
    let idr_script_dir = config.require_global(IDR_SCRIPT_DIR)?.to_string();
    let genome_table = config.require_global(GENOME_TABLE)?.to_string();
    let threshold = config.idr_threshold();

    let counts: DashMap<String, usize> = DashMap::new();

    pairs.par_iter().try_for_each(|(repa, repb)| {
        let fpeaka = region_peak_path(&temp_dir, &repa.tagalign, ctrl_tagalign);
        let fpeakb = region_peak_path(&temp_dir, &repb.tagalign, ctrl_tagalign);
        let prefix = idr_prefix(&temp_dir, repa, repb);

        run_tool(
            RSCRIPT,
            &[
                idr_script.clone(),
                fpeaka.display().to_string(),
                fpeakb.display().to_string(),
                "-1".to_string(),
                prefix.display().to_string(),
                "0".to_string(),
                "F".to_string(),
                "signal.value".to_string(),
                idr_script_dir.clone(),
                genome_table.clone(),
            ],
        )?;

        let report = PathBuf::from(format!("{}{}", prefix.display(), OVERLAPPED_PEAKS_SUFFIX));
        let npeaks = count_reproducible(&report, threshold)?;

        counts.insert(report.display().to_string(), npeaks);

        Ok::<(), PipelineError>(())
    })?;

    let max_npeaks = max_published(&counts);

    log::info!(
        "INFO [STEP 5]: {} pair/s scored, max reproducible peaks: {}",
        counts.len(),
        max_npeaks
    );

    let written = merge_top_peaks(&exp.peaks.path, &exp.final_peaks.path, Some(max_npeaks))?;

    log::info!(
        "INFO [STEP 5]: wrote {} final peak/s -> {}",
        written,
        exp.final_peaks.filename()
    );

    Ok(())
}

/// Every unordered pair of replicates, lower index first.
pub(crate) fn replicate_pairs(reps: &[Replicate]) -> Vec<(&Replicate, &Replicate)> {
    reps.iter().tuple_combinations().collect()
}

/// The largest count any pair published.
fn max_published(counts: &DashMap<String, usize>) -> usize {
    counts.iter().map(|entry| *entry.value()).max().unwrap_or(0)
}

fn idr_prefix(temp_dir: &Path, repa: &Replicate, repb: &Replicate) -> PathBuf {
    temp_dir.join(format!(
        "{}{}_vs_{}",
        IDR_FILE_PREFIX,
        repa.tagalign.stem(),
        repb.tagalign.stem()
    ))
}
