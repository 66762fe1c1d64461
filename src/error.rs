use thiserror::Error;

/// Everything that can stop the pipeline.
///
/// Precondition violations (`InvalidRole`) are raised before any side
/// effect; external tool failures (`CommandFailed`) carry the exit status
/// and captured stderr of the offending process.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("ERROR: step `{step}` cannot be applied to a {role} experiment")]
    InvalidRole { step: String, role: String },

    #[error("ERROR: command exited with {status}: {cmd}\n{stderr}")]
    CommandFailed {
        cmd: String,
        status: String,
        stderr: String,
    },

    #[error("ERROR: {0} not found in config.toml")]
    MissingParam(String),

    #[error("ERROR: invalid value for `{key}`: {msg}")]
    BadParam { key: String, msg: String },

    #[error("ERROR: replicate {0} has no discovered encoding, run the encoding step first")]
    MissingEncoding(usize),

    #[error("ERROR: malformed table: {0}")]
    MalformedTable(String),

    #[error("ERROR: malformed peak record: {0}")]
    MalformedPeak(String),

    #[error("ERROR: a worker thread panicked")]
    WorkerPanicked,

    #[error("ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("ERROR: {0}")]
    Toml(#[from] toml::de::Error),
}
