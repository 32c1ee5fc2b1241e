//! External search processes and the events they report back.

use ripcomp_backend::SearchCommand;
use ripcomp_core::{Error, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, Stdio};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// Events delivered from a process reader thread to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One line of stdout, without its terminator.
    Line { invocation: u64, line: String },
    /// The process exited; `code` is `None` when it died from a signal.
    Exited { invocation: u64, code: Option<i32> },
}

/// Handle to a spawned search process.
///
/// The child is only reaped while holding the lock, so a pid observed alive
/// under the lock cannot have been recycled.
pub struct RunningProcess {
    invocation: u64,
    pid: u32,
    child: Arc<Mutex<Child>>,
}

impl RunningProcess {
    /// Spawn `command` and start a thread streaming its stdout into `events`.
    pub fn spawn(
        command: &SearchCommand,
        invocation: u64,
        events: Sender<ProcessEvent>,
    ) -> Result<Self> {
        let mut child = command
            .to_process_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("child stdout was not captured".to_string()))?;
        let pid = child.id();
        let child = Arc::new(Mutex::new(child));

        let reaper = Arc::clone(&child);
        std::thread::Builder::new()
            .name(format!("ripcomp-search-{invocation}"))
            .spawn(move || read_output(invocation, stdout, reaper, events))?;

        debug!("Spawned {} (pid {}) for invocation {}", command.program, pid, invocation);

        Ok(Self {
            invocation,
            pid,
            child,
        })
    }

    pub fn invocation(&self) -> u64 {
        self.invocation
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Ask the process to terminate without waiting for it to exit.
    ///
    /// Returns `true` if a live process was signalled, `false` if it had
    /// already exited.
    pub fn terminate(&self) -> bool {
        let mut child = lock(&self.child);
        match child.try_wait() {
            Ok(Some(_)) => false,
            Ok(None) => send_terminate(&mut child),
            Err(e) => {
                warn!("Could not query search process {}: {}", self.pid, e);
                false
            }
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> bool {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return false;
    };
    // SAFETY: the child has not been reaped (checked under the lock), so the
    // pid still names our process.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> bool {
    child.kill().is_ok()
}

fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_output(
    invocation: u64,
    stdout: std::process::ChildStdout,
    child: Arc<Mutex<Child>>,
    events: Sender<ProcessEvent>,
) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if events.send(ProcessEvent::Line { invocation, line }).is_err() {
                    // Controller is gone; keep draining so the child can exit.
                    continue;
                }
            }
            Err(e) => {
                debug!("Read error on invocation {}: {}", invocation, e);
                break;
            }
        }
    }

    // Poll rather than block in wait() so terminate() never waits on the lock.
    let code = loop {
        match lock(&child).try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {}
            Err(e) => {
                warn!("Could not reap search process: {}", e);
                break None;
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    };

    let _ = events.send(ProcessEvent::Exited { invocation, code });
}
