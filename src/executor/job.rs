/// Struct to represent a single external command
/// to be executed by the pipeline.
///
/// # Example
///
/// ```rust
/// use chippipe::executor::job::Job;
///
/// let job = Job::from("Rscript idr.R".to_string())
///     .arg("repA.regionPeak.gz")
///     .arg("repB.regionPeak.gz");
///
/// assert_eq!(job.cmd(), "Rscript idr.R repA.regionPeak.gz repB.regionPeak.gz");
/// ```
#[derive(Debug, Clone)]
pub struct Job {
    cmd: String,
}

impl Job {
    pub fn new() -> Self {
        Self { cmd: String::new() }
    }

    /// Add an argument to the job.
    pub fn arg(mut self, arg: &str) -> Self {
        if !self.cmd.is_empty() {
            self.cmd.push(' ');
        }
        self.cmd.push_str(arg);
        self
    }

    /// Add multiple arguments to the job.
    pub fn args(mut self, args: &[&str]) -> Self {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for Job {
    fn from(cmd: String) -> Self {
        Self { cmd }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_command_line() {
        let job = Job::new().arg("samtools").args(&["view", "-S", "-b"]);

        assert_eq!(job.cmd(), "samtools view -S -b");
    }

    #[test]
    fn from_string_keeps_pipelines_intact() {
        let cmd = "zcat a.gz | gzip -c > b.gz".to_string();

        assert_eq!(Job::from(cmd.clone()).cmd(), cmd);
    }
}
