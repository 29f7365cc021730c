//! Compiler location and process launching

use std::cell::OnceCell;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::{IdlError, Result};
use crate::runtime::RuntimeFacts;

/// How a compiler backend is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerProgram {
    /// A native launcher, e.g. `idlj`
    Executable(PathBuf),

    /// A class entry point run through the runtime launcher
    JavaClass {
        /// The `java` launcher
        java: PathBuf,
        /// Classpath entries
        classpath: Vec<PathBuf>,
        /// Fully qualified entry class
        class: String,
    },
}

impl CompilerProgram {
    /// Name used when echoing command lines
    pub fn display_name(&self) -> String {
        match self {
            Self::Executable(path) => path.display().to_string(),
            Self::JavaClass { class, .. } => class.clone(),
        }
    }

    fn command(&self) -> io::Result<Command> {
        match self {
            Self::Executable(path) => Ok(Command::new(path)),
            Self::JavaClass {
                java,
                classpath,
                class,
            } => {
                let classpath = std::env::join_paths(classpath)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                let mut cmd = Command::new(java);
                let _ = cmd.arg("-cp").arg(classpath).arg(class);
                Ok(cmd)
            }
        }
    }
}

/// What a backend produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOutput {
    /// Completion code, 0 on success; -1 when terminated without one
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Runs a compiler backend to completion
pub trait Launcher {
    /// Run `program` with `args`, capturing its output
    fn launch(&self, program: &CompilerProgram, args: &[String]) -> io::Result<LaunchOutput>;
}

/// [`Launcher`] spawning a child process per invocation
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, program: &CompilerProgram, args: &[String]) -> io::Result<LaunchOutput> {
        let output = program
            .command()?
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(LaunchOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Where to look for a backend
#[derive(Debug, Clone)]
pub enum CompilerLocator {
    /// Use this program as is
    Fixed(CompilerProgram),

    /// Search the host
    Search {
        /// Native launcher name, looked up on the search path and in `<java_home>/bin`
        executable: Option<&'static str>,
        /// Entry class for the classpath fallback
        class: String,
        /// Classpath candidates; only existing entries are used
        classpath: Vec<PathBuf>,
        /// Host facts driving the search
        facts: RuntimeFacts,
    },
}

impl CompilerLocator {
    /// Resolve the program to run.
    ///
    /// Native launchers win over the classpath fallback. Failing both, the
    /// backend is unavailable on this host.
    pub fn locate(&self) -> Result<CompilerProgram> {
        let (executable, class, classpath, facts) = match self {
            Self::Fixed(program) => return Ok(program.clone()),
            Self::Search {
                executable,
                class,
                classpath,
                facts,
            } => (executable, class, classpath, facts),
        };

        if let Some(name) = executable {
            if let Some(path) = find_executable(name, facts) {
                debug!("Using compiler launcher {}", path.display());
                return Ok(CompilerProgram::Executable(path));
            }
        }

        let classpath: Vec<PathBuf> = classpath.iter().filter(|p| p.exists()).cloned().collect();
        if !classpath.is_empty() {
            if let Some(java) = find_executable("java", facts) {
                debug!("Using compiler class {} from {:?}", class, classpath);
                return Ok(CompilerProgram::JavaClass {
                    java,
                    classpath,
                    class: class.clone(),
                });
            }
        }

        Err(IdlError::CompilerUnavailable(match executable {
            Some(name) => format!("no '{}' launcher and no classpath providing {}", name, class),
            None => format!("no classpath providing {}", class),
        }))
    }
}

/// A [`CompilerLocator`] that searches the host at most once.
///
/// A translator resolves its program on first use and keeps it for the
/// remaining files of the run. A failed search is not remembered.
#[derive(Debug)]
pub struct CachedLocator {
    locator: CompilerLocator,
    program: OnceCell<CompilerProgram>,
}

impl CachedLocator {
    /// Wrap `locator`; nothing is searched until [`CachedLocator::program`]
    pub fn new(locator: CompilerLocator) -> Self {
        Self {
            locator,
            program: OnceCell::new(),
        }
    }

    /// The program to run, located on the first call
    pub fn program(&self) -> Result<&CompilerProgram> {
        if let Some(program) = self.program.get() {
            return Ok(program);
        }
        let program = self.locator.locate()?;
        Ok(self.program.get_or_init(|| program))
    }
}

fn find_executable(name: &str, facts: &RuntimeFacts) -> Option<PathBuf> {
    if let Some(home) = &facts.java_home {
        if let Ok(path) = which::which_in(name, Some(home.join("bin")), home) {
            return Some(path);
        }
    }

    let search_path: Option<OsString> = facts.search_path.clone();
    which::which_in(name, search_path, Path::new(".")).ok()
}
