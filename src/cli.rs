use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::PipelineStep;
use crate::error::PipelineError;

pub const MIN_STEP: &str = "1";
pub const MAX_STEP: &str = "5";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubArgs,
}

#[derive(Debug, Subcommand)]
pub enum SubArgs {
    #[command(name = "run")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },
    #[command(name = "run-step")]
    Step {
        #[command(flatten)]
        args: StepArgs,
    },
}

/// Run the pipeline from start to finish
///
/// # Example
///
/// ```bash,no_run
/// chippipe run -c config.toml
/// ```
#[derive(Debug, Parser)]
pub struct RunArgs {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the configuration file",
        value_name = "CONFIG",
        required = true,
        default_value = "config.toml"
    )]
    pub config: PathBuf,
}

/// Run the pipeline from a specific step to another step,
/// only run specific steps, or skip steps.
///
/// # Example
///
/// ```bash,no_run
/// chippipe run-step -c config.toml -f 1 -t 3
/// chippipe run-step -c config.toml -o align
/// chippipe run-step -c config.toml -s encoding,align
/// ```
///
/// # Note
///
/// * `from`/`to` and `only` are mutually exclusive
/// * `only` and `skip` are mutually exclusive
/// * steps can be given as 1-based numbers or names
#[derive(Debug, Parser, Clone)]
pub struct StepArgs {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the configuration file",
        value_name = "CONFIG",
        required = true,
        default_value = "config.toml"
    )]
    pub config: PathBuf,

    #[arg(
        short = 'f',
        long = "from",
        help = "Start from a specific step. Can be a step number or step name.",
        value_name = "STEP",
        default_value = MIN_STEP,
        conflicts_with = "only"
    )]
    pub from: String,

    #[arg(
        short = 't',
        long = "to",
        help = "Stop at a specific step. Can be a step number or step name.",
        value_name = "STEP",
        conflicts_with = "only",
        requires = "from",
        default_value = MAX_STEP
    )]
    pub to: String,

    #[arg(
        short = 'o',
        long = "only",
        help = "Only run a specific step (or steps). Specify the step number or step name.",
        value_name = "STEP",
        value_delimiter = ',',
        conflicts_with = "to",
        conflicts_with = "skip",
        conflicts_with = "from",
        num_args = 1..,
    )]
    pub only: Option<Vec<String>>,

    #[arg(
        short = 's',
        long = "skip",
        help = "Skip a specific step or multiple steps. Specify the step number or step name.",
        value_delimiter = ',',
        value_name = "STEPS",
        conflicts_with = "only",
        num_args = 1..,
    )]
    pub skip: Option<Vec<String>>,

    #[arg(short = 'v', long = "verbose", help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(short = 'q', long = "quiet", help = "Decrease verbosity")]
    pub quiet: bool,
}

impl StepArgs {
    /// Build an absolute, ordered list of steps to run based on args.
    pub fn abs_steps(&self) -> Result<Vec<PipelineStep>, PipelineError> {
        let max_step = MAX_STEP.parse::<usize>().unwrap_or(5);

        fn parse_step(step: &str) -> Result<usize, PipelineError> {
            step.parse::<usize>()
                .or_else(|_| PipelineStep::from_str(step).map(|s| s.to_int()))
                .map_err(|_| PipelineError::BadParam {
                    key: "step".to_string(),
                    msg: format!("invalid step '{}'", step),
                })
        }

        fn validate_step(step: usize, max: usize, flag: &str) -> Result<usize, PipelineError> {
            if step < 1 || step > max {
                return Err(PipelineError::BadParam {
                    key: flag.to_string(),
                    msg: format!("step must be between 1 and {}", max),
                });
            }
            Ok(step)
        }

        if let Some(only) = &self.only {
            let mut steps = only
                .iter()
                .map(|s| validate_step(parse_step(s)?, max_step, "only"))
                .collect::<Result<Vec<_>, _>>()?;
            steps.sort_unstable();
            steps.dedup();

            log::info!("INFO: running step/s {:?} only...", steps);

            return PipelineStep::from_vec_int(steps).map_err(|e| PipelineError::BadParam {
                key: "only".to_string(),
                msg: e,
            });
        }

        let from = validate_step(parse_step(&self.from)?, max_step, "from")?;
        let to = validate_step(parse_step(&self.to)?, max_step, "to")?;

        if from > to {
            return Err(PipelineError::BadParam {
                key: "from".to_string(),
                msg: "--from must be less than or equal to --to".to_string(),
            });
        }

        let skips = if let Some(skip) = &self.skip {
            skip.iter()
                .map(|s| validate_step(parse_step(s)?, max_step, "skip"))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let result_steps = (from..=to)
            .filter(|s| !skips.contains(s))
            .collect::<Vec<_>>();

        if result_steps.is_empty() {
            return Err(PipelineError::BadParam {
                key: "skip".to_string(),
                msg: "no steps left to run".to_string(),
            });
        } else if result_steps.len() == max_step {
            log::warn!("WARN: Running all steps... Next time use run instead of run-step!");
        }

        PipelineStep::from_vec_int(result_steps).map_err(|e| PipelineError::BadParam {
            key: "step".to_string(),
            msg: e,
        })
    }
}
