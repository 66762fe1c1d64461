use std::process::{Command, Output};

use crate::consts::CHIPPIPE;
use crate::error::PipelineError;
use crate::executor::job::Job;

/// Local fan-out executor: one OS process per job.
///
/// `execute` spawns every queued job concurrently, blocks until all of
/// them have finished, and checks every exit status. Completion order is
/// irrelevant to callers; the first failure is reported after the join.
///
/// # Example
///
/// ```rust
/// use chippipe::executor::{job::Job, manager::ParallelExecutor};
///
/// let mut executor = ParallelExecutor::new();
/// executor.add_job(Job::from("true".to_string()));
/// executor.execute().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    jobs: Vec<Job>,
}

impl ParallelExecutor {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn add_job(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn add_jobs(&mut self, jobs: Vec<Job>) -> &mut Self {
        self.jobs.extend(jobs);

        self
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Launch every job as its own process, join all, then surface the
    /// first failure. A failing job never short-circuits the join; the
    /// remaining workers are always waited on.
    pub fn execute(&self) -> Result<(), PipelineError> {
        if self.jobs.is_empty() {
            return Ok(());
        }

        let results = std::thread::scope(|scope| {
            let handles = self
                .jobs
                .iter()
                .map(|job| scope.spawn(move || run_job(job)))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(PipelineError::WorkerPanicked)))
                .collect::<Vec<_>>()
        });

        for result in results {
            result?;
        }

        Ok(())
    }
}

fn run_job(job: &Job) -> Result<(), PipelineError> {
    let output = Command::new("sh").arg("-c").arg(job.cmd()).output()?;

    check_status(job.cmd(), &output)
}

fn check_status(cmd: &str, output: &Output) -> Result<(), PipelineError> {
    if output.status.success() {
        return Ok(());
    }

    Err(PipelineError::CommandFailed {
        cmd: cmd.to_string(),
        status: output
            .status
            .code()
            .map(|code| format!("status {}", code))
            .unwrap_or_else(|| "signal".to_string()),
        stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
    })
}

/// Execute a shell command line and log a progress message on success.
pub fn shell(cmd: &str, log_msg: &str, tool: &str) -> Result<(), PipelineError> {
    let tool = if tool.is_empty() { CHIPPIPE } else { tool };

    let output = Command::new("sh").arg("-c").arg(cmd).output()?;
    check_status(cmd, &output)?;

    log::info!("INFO [{}]: {}", tool, log_msg);

    Ok(())
}

/// Execute a program with positional arguments, no shell in between.
pub fn run_tool(program: &str, args: &[String]) -> Result<(), PipelineError> {
    let output = Command::new(program).args(args).output()?;

    check_status(&format!("{} {}", program, args.join(" ")), &output)
}
