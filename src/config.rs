use serde::Deserialize;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::cli::StepArgs;
use crate::consts::*;
use crate::error::PipelineError;

/// A struct representing a configuration file.
///
/// # Fields
///
/// * `global` - A HashMap of run-wide key-value parameters.
/// * `steps` - A Vec containing PipelineStep enums, in execution order.
/// * `params` - Per-step parameter tables.
///
/// # Example
///
/// ``` toml
/// steps = ["encoding", "align", "pool", "call-peaks", "idr"]
///
/// [global]
/// target_read_files = "targetRep1.fastq.gz,targetRep2.fastq.gz"
/// control_read_files = "controlRep1.fastq.gz"
/// temp_dir = "/scratch/chip"
/// final_peaks = "/results/target.final.regionPeak.gz"
///
/// [params.call-peaks]
/// npeak = 300000
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub global: HashMap<String, ParamValue>,
    #[serde(default, deserialize_with = "deserialize_steps")]
    pub steps: Vec<PipelineStep>,
    #[serde(default, deserialize_with = "deserialize_to_hash")]
    pub params: HashMap<PipelineStep, StepParams>,
}

impl Config {
    /// Read a configuration file and return a Config struct.
    ///
    /// # Example
    ///
    /// ``` rust, no_run
    /// use std::path::PathBuf;
    /// use chippipe::config::Config;
    ///
    /// let config = Config::read(PathBuf::from("config.toml")).unwrap();
    /// ```
    pub fn read(config: PathBuf) -> Result<Self, PipelineError> {
        let mut file = File::open(config)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    pub fn new() -> Self {
        Self {
            global: HashMap::new(),
            steps: Vec::new(),
            params: HashMap::new(),
        }
    }

    /// Validate the configuration and prepare the workspace.
    ///
    /// Checks that every required global key is present, fills in the full
    /// step list when `steps` is absent, and creates the temp directory.
    /// Missing keys are fatal here rather than halfway through a run.
    pub fn load(&mut self) -> Result<(), PipelineError> {
        for key in REQUIRED_GLOBALS {
            if !self.global.contains_key(*key) {
                return Err(PipelineError::MissingParam(key.to_string()));
            }
        }

        if let Some(nthr) = self.global.get(NUM_THREADS) {
            if nthr.to_int() < 1 {
                return Err(PipelineError::BadParam {
                    key: NUM_THREADS.to_string(),
                    msg: format!("expected a positive thread count, got {}", nthr),
                });
            }
        }

        if self.steps.is_empty() {
            self.steps = PipelineStep::all().to_vec();
        }

        std::fs::create_dir_all(self.temp_dir()?)?;

        Ok(())
    }

    /// In-place modification of the steps in the Config from run-step args.
    pub fn aware(&mut self, args: &StepArgs) -> Result<(), PipelineError> {
        let steps = args.abs_steps()?;

        self.set_steps(steps);
        self.update_params();

        Ok(())
    }

    /// Drop parameter tables for steps that are not selected.
    pub fn update_params(&mut self) {
        let steps = self.steps.clone();
        self.params.retain(|step, _| steps.contains(step));
    }

    pub fn steps(&self) -> &Vec<PipelineStep> {
        &self.steps
    }

    pub fn set_steps(&mut self, steps: Vec<PipelineStep>) {
        self.steps = steps;
    }

    pub fn params(&self) -> &HashMap<PipelineStep, StepParams> {
        &self.params
    }

    /// Get a parameter value for a step, if the step table and key exist.
    pub fn get_param(&self, step: PipelineStep, key: &str) -> Option<&ParamValue> {
        self.params.get(&step).and_then(|params| params.get(key))
    }

    /// Get a parameter value for a step, failing when it is absent.
    pub fn require_param(&self, step: PipelineStep, key: &str) -> Result<&ParamValue, PipelineError> {
        self.get_param(step, key)
            .ok_or_else(|| PipelineError::MissingParam(format!("{} ({})", key, step)))
    }

    pub fn get_global(&self, key: &str) -> Option<&ParamValue> {
        self.global.get(key)
    }

    /// Get a global parameter value, failing when it is absent.
    pub fn require_global(&self, key: &str) -> Result<&ParamValue, PipelineError> {
        self.global
            .get(key)
            .ok_or_else(|| PipelineError::MissingParam(key.to_string()))
    }

    /// Flatten a step's parameter table into a CLI argument string,
    /// excluding the given keys. Missing tables flatten to nothing.
    pub fn get_step_args(&self, step: PipelineStep, exclude: Vec<&str>) -> String {
        self.params
            .get(&step)
            .map(|params| params.flat(Some(exclude)))
            .unwrap_or_default()
    }

    /// The run-wide thread budget. Falls back to the number of
    /// logical CPUs when `num_threads` is not configured.
    pub fn num_threads(&self) -> i64 {
        self.global
            .get(NUM_THREADS)
            .map(|v| v.to_int())
            .filter(|n| *n >= 1)
            .unwrap_or(num_cpus::get() as i64)
    }

    /// The IDR score cutoff below which a peak counts as reproducible.
    pub fn idr_threshold(&self) -> f64 {
        self.global
            .get(IDR_THRESHOLD)
            .map(|v| v.to_float())
            .unwrap_or(DEFAULT_IDR_THRESHOLD)
    }

    pub fn temp_dir(&self) -> Result<PathBuf, PipelineError> {
        Ok(self.require_global(TEMP_DIR)?.to_path_buf())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// An enum representing pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum PipelineStep {
    Encoding,
    Align,
    Pool,
    CallPeaks,
    Idr,
}

impl PipelineStep {
    /// All steps in execution order.
    pub fn all() -> [Self; 5] {
        [
            Self::Encoding,
            Self::Align,
            Self::Pool,
            Self::CallPeaks,
            Self::Idr,
        ]
    }

    /// Create a PipelineStep enum from a step name.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use chippipe::config::PipelineStep;
    ///
    /// assert_eq!(PipelineStep::from_str("align"), Ok(PipelineStep::Align));
    /// ```
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "encoding" => Ok(Self::Encoding),
            "align" => Ok(Self::Align),
            "pool" => Ok(Self::Pool),
            "call-peaks" => Ok(Self::CallPeaks),
            "idr" => Ok(Self::Idr),
            _ => Err(format!("ERROR: Invalid pipeline step: {}", s)),
        }
    }

    /// Create a PipelineStep enum from its 1-based position.
    pub fn from_int(i: usize) -> Result<Self, String> {
        match i {
            1 => Ok(Self::Encoding),
            2 => Ok(Self::Align),
            3 => Ok(Self::Pool),
            4 => Ok(Self::CallPeaks),
            5 => Ok(Self::Idr),
            _ => Err(format!("ERROR: Invalid pipeline step: {}", i)),
        }
    }

    pub fn to_str(&self) -> String {
        match self {
            Self::Encoding => "encoding".into(),
            Self::Align => "align".into(),
            Self::Pool => "pool".into(),
            Self::CallPeaks => "call-peaks".into(),
            Self::Idr => "idr".into(),
        }
    }

    pub fn to_int(&self) -> usize {
        match self {
            Self::Encoding => 1,
            Self::Align => 2,
            Self::Pool => 3,
            Self::CallPeaks => 4,
            Self::Idr => 5,
        }
    }

    pub fn from_vec_str(v: Vec<String>) -> Result<Vec<Self>, String> {
        v.iter().map(|s| Self::from_str(s)).collect()
    }

    pub fn from_vec_int(v: Vec<usize>) -> Result<Vec<Self>, String> {
        v.iter().map(|i| Self::from_int(*i)).collect()
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A step's parameter table, flattened from TOML.
#[derive(Deserialize, Debug, Clone)]
pub struct StepParams {
    #[serde(flatten)]
    values: HashMap<String, ParamValue>,
}

impl StepParams {
    /// Flatten the parameters into a single string for CLI execution.
    ///
    /// Keys of one or two characters are interpreted as short flags and
    /// prefixed with a single dash, longer keys with two dashes. Keys are
    /// emitted in sorted order.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use chippipe::config::StepParams;
    ///
    /// let params: StepParams = toml::from_str("chunkmbs = 512").unwrap();
    ///
    /// assert_eq!(params.flat(None), "--chunkmbs 512");
    /// ```
    pub fn flat(&self, exclude: Option<Vec<&str>>) -> String {
        let exclude = exclude
            .unwrap_or_default()
            .into_iter()
            .collect::<HashSet<_>>();

        let mut keys = self
            .values
            .keys()
            .filter(|key| !exclude.contains(key.as_str()))
            .collect::<Vec<_>>();
        keys.sort();

        keys.into_iter()
            .map(|key| {
                let dash = if key.len() > 2 { "--" } else { "-" };
                format!("{}{} {}", dash, key, self.values[key])
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }
}

/// Represents a parameter value for any step.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    pub fn to_path_buf(&self) -> PathBuf {
        match self {
            ParamValue::Str(s) => PathBuf::from(s),
            _ => PathBuf::new(),
        }
    }

    pub fn to_int(&self) -> i64 {
        match self {
            ParamValue::Int(i) => *i,
            _ => 0,
        }
    }

    pub fn to_float(&self) -> f64 {
        match self {
            ParamValue::Float(f) => *f,
            ParamValue::Int(i) => *i as f64,
            _ => 0.0,
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            _ => false,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(flt) => write!(f, "{}", flt),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Deserialize a list of step names into PipelineStep enums.
///
/// ``` toml
/// steps = ["encoding", "align"]
/// ```
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<PipelineStep>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;

    PipelineStep::from_vec_str(raw).map_err(serde::de::Error::custom)
}

/// Deserialize `[params.<step>]` tables keyed by step name.
fn deserialize_to_hash<'de, D>(
    deserializer: D,
) -> Result<HashMap<PipelineStep, StepParams>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: HashMap<String, StepParams> = HashMap::deserialize(deserializer)?;

    raw.into_iter()
        .map(|(key, value)| PipelineStep::from_str(&key).map(|step| (step, value)))
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let toml = r#"
            steps = ["align", "call-peaks"]

            [global]
            target_read_files = "a.fastq.gz,b.fastq.gz"
            control_read_files = "c.fastq.gz"
            num_threads = 8
            temp_dir = "/tmp/chip"
            final_peaks = "/tmp/chip/final.regionPeak.gz"
            idr_threshold = 0.02

            [params.align]
            chunkmbs = 512

            [params.call-peaks]
            npeak = 300000
            peak-type = "-savr"
        "#;

        toml::from_str(toml).expect("sample config should parse")
    }

    #[test]
    fn parses_steps_and_params() {
        let config = sample();

        assert_eq!(
            config.steps(),
            &vec![PipelineStep::Align, PipelineStep::CallPeaks]
        );
        assert_eq!(
            config
                .get_param(PipelineStep::CallPeaks, NPEAK)
                .map(|v| v.to_int()),
            Some(300000)
        );
        assert_eq!(config.num_threads(), 8);
        assert_eq!(config.idr_threshold(), 0.02);
    }

    #[test]
    fn rejects_unknown_step_names() {
        let toml = r#"
            steps = ["align", "frobnicate"]

            [global]
        "#;

        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn flat_renders_sorted_arguments() {
        let config = sample();

        assert_eq!(
            config.get_step_args(PipelineStep::CallPeaks, vec![PEAK_TYPE]),
            "--npeak 300000"
        );
        assert_eq!(
            config.get_step_args(PipelineStep::CallPeaks, vec![]),
            "--npeak 300000 --peak-type -savr"
        );
        // missing table flattens to nothing
        assert_eq!(config.get_step_args(PipelineStep::Pool, vec![]), "");
    }

    #[test]
    fn update_params_drops_unselected_tables() {
        let mut config = sample();
        config.set_steps(vec![PipelineStep::CallPeaks]);
        config.update_params();

        assert!(config.get_param(PipelineStep::Align, "chunkmbs").is_none());
        assert!(config.get_param(PipelineStep::CallPeaks, NPEAK).is_some());
    }

    #[test]
    fn load_requires_every_global_key() {
        let mut config = sample();

        // sample() omits the tool and script paths, so load must refuse it
        match config.load() {
            Err(PipelineError::MissingParam(_)) => {}
            other => panic!("expected MissingParam, got {:?}", other),
        }
    }

    #[test]
    fn load_fills_default_steps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = sample();
        for key in REQUIRED_GLOBALS {
            config
                .global
                .entry(key.to_string())
                .or_insert_with(|| ParamValue::Str(format!("/opt/{}", key)));
        }
        config.global.insert(
            TEMP_DIR.to_string(),
            ParamValue::Str(dir.path().join("work").display().to_string()),
        );
        config.set_steps(Vec::new());

        config.load().expect("load should pass with all keys");

        assert_eq!(config.steps(), &PipelineStep::all().to_vec());
        assert!(dir.path().join("work").is_dir());
    }

    #[test]
    fn num_threads_defaults_to_cpu_count() {
        let mut config = sample();
        config.global.remove(NUM_THREADS);

        assert!(config.num_threads() >= 1);
    }

    #[test]
    fn step_roundtrip() {
        for step in PipelineStep::all() {
            assert_eq!(PipelineStep::from_str(&step.to_str()), Ok(step));
            assert_eq!(PipelineStep::from_int(step.to_int()), Ok(step));
        }
        assert!(PipelineStep::from_int(0).is_err());
        assert!(PipelineStep::from_int(6).is_err());
    }
}
