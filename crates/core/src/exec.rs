use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::ToolError;

pub const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);
pub const SMART_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external diagnostic tools. Implementations block until the tool exits
/// or the timeout elapses.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], timeout: Duration)
        -> Result<CommandOutput, ToolError>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, ToolError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| spawn_error(program, err))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                kill_and_reap(&mut child);
                return Err(ToolError::Timeout {
                    operation: describe(program, args),
                    timeout,
                });
            }
            Err(source) => {
                kill_and_reap(&mut child);
                return Err(ToolError::Io {
                    tool: program.to_string(),
                    source,
                });
            }
        };

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: join_output(stdout),
            stderr: join_output(stderr),
        })
    }
}

/// Package hint shown when a tool binary is missing.
pub fn install_hint(program: &str) -> &'static str {
    match program {
        "dmidecode" => "sudo apt install dmidecode",
        "smartctl" => "sudo apt install smartmontools",
        _ => "your system package manager",
    }
}

pub fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

fn spawn_error(program: &str, err: io::Error) -> ToolError {
    match err.kind() {
        io::ErrorKind::NotFound => ToolError::ToolUnavailable {
            tool: program.to_string(),
            install_hint: install_hint(program).to_string(),
        },
        io::ErrorKind::PermissionDenied => ToolError::PermissionDenied {
            operation: format!("executing {program}"),
            suggestion: format!("sudo {program}"),
        },
        _ => ToolError::Io {
            tool: program.to_string(),
            source: err,
        },
    }
}

// Pipes are drained on their own threads so a chatty tool cannot fill the
// pipe buffer and stall before the timeout fires.
fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<String>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_output(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
