use std::path::Path;

use tempfile::TempDir;

use crate::config::{Config, PipelineStep};
use crate::consts::*;
use crate::core::experiment::{Experiment, TrackFile};
use crate::error::PipelineError;
use crate::executor::{
    job::Job,
    manager::{run_tool, ParallelExecutor},
};

/// Call peaks on the pooled alignment and on every replicate alignment,
/// one external caller process per target, all against the shared
/// control. Target experiments only; callers write their own output
/// files and nothing is collected here beyond exit statuses.
pub fn call_peaks(
    exp: &Experiment,
    config: &Config,
    ctrl_tagalign: &TrackFile,
) -> Result<(), PipelineError> {
    exp.guard_target("call-peaks")?;

    let helper = config.require_global(CHIPSEQ_RSCRIPT)?.to_string();
    let spp_tgz = config.require_global(SPP_TGZ)?.to_string();
    let rlib = config.require_global(RLIB_DIR)?.to_string();

    run_tool(
        RSCRIPT,
        &[helper, CHECK_INSTALL_SPP.to_string(), spp_tgz, rlib],
    )?;

    let temp_dir = config.temp_dir()?;
    // scratch handles stay alive until every worker has joined; dropping
    // them removes the dirs on success and failure alike
    let (jobs, _scratch) = spp_jobs(exp, config, ctrl_tagalign, &temp_dir)?;

    log::info!(
        "INFO [STEP 4]: calling peaks on {} target/s with {} thread/s each...",
        jobs.len(),
        split_threads(config.num_threads(), exp.tagaligns().len())
    );

    let mut executor = ParallelExecutor::new();
    executor.add_jobs(jobs);
    executor.execute()?;

    Ok(())
}

/// One caller invocation per target alignment, each with its own scoped
/// scratch directory. The scratch handles must outlive the join.
fn spp_jobs(
    exp: &Experiment,
    config: &Config,
    ctrl_tagalign: &TrackFile,
    temp_dir: &Path,
) -> Result<(Vec<Job>, Vec<TempDir>), PipelineError> {
    let spp_script = config.require_global(SPP_SCRIPT)?.to_string();
    let npeak = config.require_param(PipelineStep::CallPeaks, NPEAK)?.to_int();
    let peak_type = config
        .require_param(PipelineStep::CallPeaks, PEAK_TYPE)?
        .to_string();
    let exclusion = config
        .require_param(PipelineStep::CallPeaks, EXCLUSION_ZONE)?
        .to_string();

    let targets = exp.tagaligns();
    let nthr = split_threads(config.num_threads(), targets.len());

    let mut jobs = Vec::with_capacity(targets.len());
    let mut scratch = Vec::with_capacity(targets.len());

    for tagalign in targets {
        let tmpdir = tempfile::Builder::new()
            .prefix(&format!("{}{}", tagalign.stem(), SPP_TMP_INFIX))
            .tempdir_in(temp_dir)?;
        let phantom = temp_dir.join(format!("{}{}", tagalign.stem(), PHANTOM_SUFFIX));

        let job = Job::from(format!("{} {}", RSCRIPT, spp_script))
            .arg(&format!("-c={}", tagalign.path.display()))
            .arg(&format!("-i={}", ctrl_tagalign.path.display()))
            .arg(&format!("-npeak={}", npeak))
            .arg(&peak_type)
            .arg("-savp")
            .arg(&format!("-x={}", exclusion))
            .arg("-rf")
            .arg(&format!("-odir={}", temp_dir.display()))
            .arg(&format!("-p={}", nthr))
            .arg(&format!("-tmpdir={}", tmpdir.path().display()))
            .arg(&format!("-out={}", phantom.display()));

        jobs.push(job);
        scratch.push(tmpdir);
    }

    Ok((jobs, scratch))
}

/// Each fan-out worker's share of the thread budget, floored at one.
pub(crate) fn split_threads(total: i64, workers: usize) -> i64 {
    std::cmp::max(total / workers.max(1) as i64, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::experiment::Role;

    fn test_config(temp_dir: &Path) -> Config {
        let toml = format!(
            r#"
            [global]
            target_read_files = "/data/a.fastq.gz,/data/b.fastq.gz"
            control_read_files = "/data/c.fastq.gz"
            num_threads = 12
            temp_dir = "{}"
            final_peaks = "{}"
            spp_script = "/opt/spp/run_spp.R"

            [params.call-peaks]
            npeak = 300000
            peak-type = "-savr"
            exclusion-zone = "-500:85"
            "#,
            temp_dir.display(),
            temp_dir.join("final.regionPeak.gz").display()
        );

        toml::from_str(&toml).expect("test config")
    }

    #[test]
    fn budget_split_floors_at_one() {
        assert_eq!(split_threads(16, 3), 5);
        assert_eq!(split_threads(12, 3), 4);
        assert_eq!(split_threads(2, 3), 1);
        assert_eq!(split_threads(8, 1), 8);
    }

    #[test]
    fn one_job_per_target_with_scoped_scratch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let exp = Experiment::from_config(&config, Role::Target).expect("experiment");
        let ctrl = TrackFile::new(dir.path().join("controlRep0.tagAlign.gz"));

        let scratch_paths;
        {
            let (jobs, scratch) = spp_jobs(&exp, &config, &ctrl, dir.path()).expect("jobs");

            // pooled alignment plus both replicates
            assert_eq!(jobs.len(), 3);
            assert_eq!(scratch.len(), 3);

            assert!(jobs[0].cmd().starts_with("Rscript /opt/spp/run_spp.R"));
            assert!(jobs[0]
                .cmd()
                .contains(&format!("-c={}", exp.pooled_tagalign.path.display())));
            assert!(jobs[1]
                .cmd()
                .contains(&format!("-c={}", exp.reps[0].tagalign.path.display())));
            for job in &jobs {
                assert!(job.cmd().contains(&format!("-i={}", ctrl.path.display())));
                assert!(job.cmd().contains("-npeak=300000"));
                assert!(job.cmd().contains("-savr -savp"));
                assert!(job.cmd().contains("-x=-500:85"));
                assert!(job.cmd().contains("-p=4"));
            }

            scratch_paths = scratch
                .iter()
                .map(|dir| dir.path().to_path_buf())
                .collect::<Vec<_>>();
            assert!(scratch_paths.iter().all(|p| p.is_dir()));
        }

        // dropping the handles removes every scratch dir
        assert!(scratch_paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn control_experiments_are_rejected_before_any_launch() {
        let dir = tempfile::tempdir().expect("tempdir");
        // no helper script is configured, so reaching the launch path
        // would fail with MissingParam instead of InvalidRole
        let config = test_config(dir.path());

        let control = Experiment::from_config(&config, Role::Control).expect("control");
        let ctrl_track = TrackFile::new(dir.path().join("controlRep0.tagAlign.gz"));

        match call_peaks(&control, &config, &ctrl_track) {
            Err(PipelineError::InvalidRole { step, role }) => {
                assert_eq!(step, "call-peaks");
                assert_eq!(role, "control");
            }
            other => panic!("expected InvalidRole, got {:?}", other),
        }
    }
}
