use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::consts::*;
use crate::error::PipelineError;

/// Whether an experiment holds the immunoprecipitated target or the
/// input control. A single parameterized type instead of two near-identical
/// ones; peak calling and reproducibility scoring only accept `Target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Target,
    Control,
}

impl Role {
    /// The global config key listing this role's read files.
    pub fn read_files_key(&self) -> &'static str {
        match self {
            Role::Target => TARGET_READ_FILES,
            Role::Control => CONTROL_READ_FILES,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Target => write!(f, "target"),
            Role::Control => write!(f, "control"),
        }
    }
}

/// A path plus derived name components. Purely a naming convenience.
///
/// # Example
///
/// ```rust
/// use chippipe::core::experiment::TrackFile;
///
/// let track = TrackFile::new("/data/sampleA.tagAlign.gz");
///
/// assert_eq!(track.filename(), "sampleA.tagAlign.gz");
/// assert_eq!(track.stem(), "sampleA");
/// assert!(track.is_gz());
/// ```
#[derive(Debug, Clone)]
pub struct TrackFile {
    pub path: PathBuf,
}

impl TrackFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The file name without its directory.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The file name up to its first dot.
    pub fn stem(&self) -> String {
        let filename = self.filename();
        filename
            .split('.')
            .next()
            .unwrap_or(filename.as_str())
            .to_string()
    }

    pub fn is_gz(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(GZ))
            .unwrap_or(false)
    }

    /// The command that streams this file decompressed to stdout.
    pub fn cat_command(&self) -> &'static str {
        if self.is_gz() {
            "zcat"
        } else {
            "cat"
        }
    }
}

/// One independent sequencing sample within an experiment.
///
/// Indices are 1-based and unique within the owning experiment. There is
/// no back-reference to the experiment; operations receive their context
/// explicitly.
#[derive(Debug, Clone)]
pub struct Replicate {
    pub index: usize,
    pub fastq: TrackFile,
    pub tagalign: TrackFile,
    pub encoding: Option<String>,
}

/// A ChIP-seq experiment: ordered replicates plus the pooled alignment
/// and peak outputs derived from them.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub role: Role,
    pub reps: Vec<Replicate>,
    pub pooled_tagalign: TrackFile,
    pub peaks: TrackFile,
    pub final_peaks: TrackFile,
}

impl Experiment {
    /// Build an experiment for a role from the configured comma-separated
    /// read file list.
    pub fn from_config(config: &Config, role: Role) -> Result<Self, PipelineError> {
        let temp_dir = config.temp_dir()?;
        let reads = config.require_global(role.read_files_key())?.to_string();

        let reps = reads
            .split(',')
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .enumerate()
            .map(|(i, f)| {
                let fastq = TrackFile::new(f);
                let tagalign =
                    TrackFile::new(temp_dir.join(format!("{}.{}", fastq.stem(), TAGALIGN_GZ)));

                Replicate {
                    index: i + 1,
                    fastq,
                    tagalign,
                    encoding: None,
                }
            })
            .collect::<Vec<_>>();

        if reps.is_empty() {
            return Err(PipelineError::BadParam {
                key: role.read_files_key().to_string(),
                msg: "expected at least one read file".to_string(),
            });
        }

        let pooled_tagalign =
            TrackFile::new(temp_dir.join(format!("{}{}.{}", role, POOLED_REP, TAGALIGN_GZ)));

        let peaks = TrackFile::new(temp_dir.join(format!(
            "{}{}{}{}{}.{}",
            Role::Target,
            POOLED_REP,
            PEAK_VS,
            Role::Control,
            POOLED_REP,
            REGION_PEAK_GZ
        )));

        let final_peaks = TrackFile::new(config.require_global(FINAL_PEAKS)?.to_path_buf());

        Ok(Self {
            role,
            reps,
            pooled_tagalign,
            peaks,
            final_peaks,
        })
    }

    /// Peak-calling targets: the pooled alignment first, then every
    /// replicate alignment in order.
    pub fn tagaligns(&self) -> Vec<&TrackFile> {
        std::iter::once(&self.pooled_tagalign)
            .chain(self.reps.iter().map(|rep| &rep.tagalign))
            .collect()
    }

    /// Fail fast when a target-only operation is invoked on a control
    /// experiment, before any subprocess is launched.
    pub fn guard_target(&self, step: &str) -> Result<(), PipelineError> {
        if self.role == Role::Control {
            return Err(PipelineError::InvalidRole {
                step: step.to_string(),
                role: self.role.to_string(),
            });
        }

        Ok(())
    }
}

/// Where the peak caller writes the peak set of `chip` scored against
/// `ctrl`.
pub fn region_peak_path(temp_dir: &Path, chip: &TrackFile, ctrl: &TrackFile) -> PathBuf {
    temp_dir.join(format!(
        "{}{}{}.{}",
        chip.stem(),
        PEAK_VS,
        ctrl.stem(),
        REGION_PEAK_GZ
    ))
}
