//! Compiler backends
//!
//! A [`CompilerTranslator`] turns one IDL file plus its [`SourceConfiguration`]
//! into a backend command line and runs it. Backends come in two families:
//!
//! - **idlj** ([`IdljTranslator`]): the compiler bundled with legacy JDKs, and
//!   its module-aware Glassfish flavor for runtimes without a bundled one
//! - **JacORB** ([`JacorbTranslator`]): the third-party JacORB IDL compiler
//!
//! [`selector`] maps a configuration string and the host [`RuntimeFacts`] to
//! one of them.
//!
//! [`RuntimeFacts`]: crate::runtime::RuntimeFacts

pub mod capture;
pub mod idlj;
pub mod jacorb;
pub mod launcher;
pub mod selector;

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{IdlError, Result};
use crate::source::SourceConfiguration;
use capture::OutputCapture;
use launcher::{CompilerProgram, Launcher};

pub use idlj::{IdljFlavor, IdljTranslator};
pub use jacorb::JacorbTranslator;
pub use selector::{Backend, TranslatorType, select_translator};

/// Everything a backend needs to translate one file
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    /// Root of the IDL sources, always on the include path
    pub source_directory: &'a Path,
    /// Extra include directories
    pub include_directories: &'a [PathBuf],
    /// Directory receiving generated code
    pub output_directory: &'a Path,
    /// The IDL file to translate
    pub file: &'a Path,
    /// Options of the group the file belongs to
    pub source: &'a SourceConfiguration,
}

/// Run-wide switches shared by all backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorSettings {
    /// Ask the backend for verbose output and echo its command line
    pub debug: bool,
    /// Turn backend failures into errors
    pub fail_on_error: bool,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            debug: false,
            fail_on_error: true,
        }
    }
}

/// Result of translating one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationOutcome {
    /// The backend reported success
    Succeeded,
    /// The backend failed but fail-on-error is disabled; the file is treated
    /// as processed and timestamped all the same
    FailedLeniently,
}

/// A compiler backend
pub trait CompilerTranslator {
    /// Backend name for messages
    fn name(&self) -> &'static str;

    /// Enable or disable debug output
    fn set_debug(&mut self, debug: bool);

    /// Enable or disable failing on backend errors
    fn set_fail_on_error(&mut self, fail_on_error: bool);

    /// Compose the backend arguments for one file, ending with the file path.
    ///
    /// Options the backend cannot express fail here, before anything runs.
    fn arguments(&self, request: &TranslationRequest<'_>) -> Result<Vec<String>>;

    /// Translate one file
    fn invoke(&self, request: &TranslationRequest<'_>) -> Result<TranslationOutcome>;
}

/// Backend specific pieces of an invocation
pub(crate) struct Invocation<'a> {
    pub compiler: &'static str,
    pub verbose_flags: &'a [&'a str],
    pub failure_marker: Option<&'a str>,
    pub settings: TranslatorSettings,
}

impl Invocation<'_> {
    /// Run `program` for `file` and apply the failure policy.
    pub(crate) fn run(
        &self,
        launcher: &dyn Launcher,
        program: &CompilerProgram,
        mut args: Vec<String>,
        file: &Path,
    ) -> Result<TranslationOutcome> {
        if self.settings.debug {
            let _ = args.splice(0..0, self.verbose_flags.iter().map(|f| f.to_string()));
            info!("{} {}", program.display_name(), args.join(" "));
        } else {
            debug!("{} {}", program.display_name(), args.join(" "));
        }

        let mut capture = OutputCapture::acquire(self.compiler);
        let output = launcher.launch(program, &args).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                IdlError::CompilerUnavailable(format!("{}: {}", program.display_name(), e))
            }
            _ => IdlError::Translation {
                file: file.to_path_buf(),
                reason: format!("failed to run {}: {}", program.display_name(), e),
            },
        })?;
        capture.record(&output);

        let marker_found = self
            .failure_marker
            .filter(|marker| capture.stderr().contains(marker));
        drop(capture);

        let reason = match (output.exit_code, marker_found) {
            (0, None) => return Ok(TranslationOutcome::Succeeded),
            (0, Some(marker)) => format!("{} reported '{}'", self.compiler, marker),
            (code, _) => format!("{} exited with code {}", self.compiler, code),
        };

        if self.settings.fail_on_error {
            return Err(IdlError::Translation {
                file: file.to_path_buf(),
                reason,
            });
        }

        warn!("{} failed for {} ({}); continuing", self.compiler, file.display(), reason);
        Ok(TranslationOutcome::FailedLeniently)
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::launcher::{CompilerProgram, LaunchOutput, Launcher};
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    /// Launcher double that records every call and replays a fixed output
    #[derive(Clone, Default)]
    pub(crate) struct RecordingLauncher {
        pub calls: Rc<RefCell<Vec<(CompilerProgram, Vec<String>)>>>,
        pub output: LaunchOutput,
    }

    impl RecordingLauncher {
        pub(crate) fn failing(exit_code: i32, stderr: &str) -> Self {
            Self {
                output: LaunchOutput {
                    exit_code,
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                },
                ..Default::default()
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub(crate) fn last_args(&self) -> Vec<String> {
            self.calls.borrow().last().map(|(_, a)| a.clone()).unwrap_or_default()
        }
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, program: &CompilerProgram, args: &[String]) -> io::Result<LaunchOutput> {
            self.calls.borrow_mut().push((program.clone(), args.to_vec()));
            Ok(self.output.clone())
        }
    }
}
