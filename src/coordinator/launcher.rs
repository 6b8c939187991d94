//! Minion launching.
//!
//! The coordinator listens on an ephemeral host-local port and hands the
//! launcher the port plus the image file path. The production launcher
//! spawns a fresh `mutmatrix-minion` process; the in-process launcher runs
//! the executor on a thread of the current process, which trades away
//! isolation for debuggability and drives the same protocol end to end.

use std::net::TcpStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::bytecode::image::ProgramImage;
use crate::config::Verbosity;
use crate::minion::executor::run_minion;

/// Everything a launcher needs to start one executor.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Control port the coordinator is listening on.
    pub port: u16,
    /// Serialized program image (the classpath analogue).
    pub image_path: PathBuf,
    /// Executor memory limit in MiB.
    pub memory_limit_mb: u64,
    /// Logging verbosity.
    pub verbosity: Verbosity,
}

/// Handle to one running executor.
pub trait MinionHandle: Send {
    /// Block until the executor terminates; `None` means killed by signal.
    fn wait(&mut self) -> std::io::Result<Option<i32>>;
}

/// Starts executors for the coordinator.
pub trait MinionLauncher: Send + Sync {
    /// Start one executor against the given spec.
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<Box<dyn MinionHandle>>;
}

/// Spawns isolated `mutmatrix-minion` processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    minion_bin: PathBuf,
}

impl ProcessLauncher {
    /// Launcher over an explicit minion executable.
    pub fn new(minion_bin: PathBuf) -> Self {
        Self { minion_bin }
    }

    /// The minion executable expected next to the current executable.
    pub fn default_minion_bin() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|d| d.join("mutmatrix-minion")))
            .unwrap_or_else(|| PathBuf::from("mutmatrix-minion"))
    }
}

struct ProcessHandle {
    child: Child,
}

impl MinionHandle for ProcessHandle {
    fn wait(&mut self) -> std::io::Result<Option<i32>> {
        Ok(self.child.wait()?.code())
    }
}

impl MinionLauncher for ProcessLauncher {
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<Box<dyn MinionHandle>> {
        let child = Command::new(&self.minion_bin)
            .arg("--port")
            .arg(spec.port.to_string())
            .arg("--image")
            .arg(&spec.image_path)
            .arg("--memory-limit-mb")
            .arg(spec.memory_limit_mb.to_string())
            .arg("--verbosity")
            .arg(spec.verbosity.as_str())
            .stdin(Stdio::null())
            .spawn()?;
        Ok(Box::new(ProcessHandle { child }))
    }
}

/// Runs the executor on a thread of the coordinator process.
///
/// No process isolation: a runaway test shares this process. Useful for
/// debugging the protocol and for exercising the full coordinator loop in
/// tests without a built minion binary.
#[derive(Debug, Clone, Default)]
pub struct InProcessLauncher;

struct ThreadHandle {
    join: Option<std::thread::JoinHandle<i32>>,
}

impl MinionHandle for ThreadHandle {
    fn wait(&mut self) -> std::io::Result<Option<i32>> {
        match self.join.take() {
            Some(handle) => match handle.join() {
                Ok(code) => Ok(Some(code)),
                Err(_) => Ok(None),
            },
            None => Ok(None),
        }
    }
}

impl MinionLauncher for InProcessLauncher {
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<Box<dyn MinionHandle>> {
        let port = spec.port;
        let image_path = spec.image_path.clone();
        let join = std::thread::spawn(move || {
            let Ok(bytes) = std::fs::read(&image_path) else {
                return crate::protocol::ExitKind::UnknownError.code();
            };
            let Ok(image) = ProgramImage::from_bytes(&bytes) else {
                return crate::protocol::ExitKind::UnknownError.code();
            };
            let Ok(mut stream) = TcpStream::connect(("127.0.0.1", port)) else {
                return crate::protocol::ExitKind::UnknownError.code();
            };
            run_minion(&mut stream, &image, None).code()
        });
        Ok(Box::new(ThreadHandle { join: Some(join) }))
    }
}
