use log::debug;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Exit status of an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Runs the external packaging tool.
///
/// Blocking; no timeout is applied.
pub trait Packager {
    fn run(&self, dir: &Path, program: &str, args: &[String]) -> io::Result<RunStatus>;
}

/// Spawns the real tool with stdout/stderr passed through to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandPackager;

impl Packager for CommandPackager {
    fn run(&self, dir: &Path, program: &str, args: &[String]) -> io::Result<RunStatus> {
        debug!("running {} {} in {}", program, args.join(" "), dir.display());
        let status = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(RunStatus {
            code: status.code(),
        })
    }
}

pub(crate) fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
