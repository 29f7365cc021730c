//! Generation runs
//!
//! [`Orchestrator::run`] drives one run: prepare the output and timestamp
//! directories, pick the backend, then for every source group translate each
//! stale file and record it in the timestamp store.
//!
//! Files are handled one at a time. A file only reaches the timestamp store
//! after its own translation returned, so a failure never marks another file
//! as processed.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::{GeneratorConfig, SourceRootKind};
use crate::error::{IdlError, Result};
use crate::fs::{FileSystem, OsFileSystem};
use crate::runtime::RuntimeFacts;
use crate::scanner::StaleSourceScanner;
use crate::source::SourceConfiguration;
use crate::translator::launcher::{Launcher, ProcessLauncher};
use crate::translator::{CompilerTranslator, TranslationRequest, select_translator};

pub use crate::translator::TranslationOutcome as FileOutcome;

/// Directory of generated code the build should compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRoot {
    /// The output directory
    pub path: PathBuf,
    /// Source set it belongs to
    pub kind: SourceRootKind,
}

/// A file the backend was run for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Source file
    pub file: PathBuf,
    /// What the backend reported
    pub outcome: FileOutcome,
}

/// What happened to one source group
#[derive(Debug, Default)]
pub struct SourceReport {
    /// Short label of the group
    pub description: String,
    /// Number of stale files found
    pub stale_count: usize,
    /// Files translated, in processing order
    pub processed: Vec<ProcessedFile>,
    /// Why the group could not be scanned, if it could not
    pub scan_failure: Option<IdlError>,
    /// Timestamp copies that failed
    pub timestamp_failures: Vec<IdlError>,
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunReport {
    /// The run was switched off
    pub skipped: bool,
    /// Per source group, in configuration order
    pub sources: Vec<SourceReport>,
    /// Root to register with the build; unset when skipped
    pub generated_root: Option<GeneratedRoot>,
}

impl RunReport {
    /// Total number of translated files
    pub fn processed_count(&self) -> usize {
        self.sources.iter().map(|s| s.processed.len()).sum()
    }

    /// Files whose translation failed without failing the run
    pub fn lenient_failures(&self) -> impl Iterator<Item = &ProcessedFile> {
        self.sources
            .iter()
            .flat_map(|s| &s.processed)
            .filter(|p| p.outcome == FileOutcome::FailedLeniently)
    }

    /// Whether any non-fatal problem was recorded
    pub fn has_warnings(&self) -> bool {
        self.lenient_failures().next().is_some()
            || self
                .sources
                .iter()
                .any(|s| s.scan_failure.is_some() || !s.timestamp_failures.is_empty())
    }
}

enum TranslatorChoice {
    Select {
        facts: RuntimeFacts,
        launcher: Box<dyn Launcher>,
    },
    Given(Box<dyn CompilerTranslator>),
}

/// Runs the generation for one configuration
pub struct Orchestrator {
    config: GeneratorConfig,
    fs: Box<dyn FileSystem>,
    translator: TranslatorChoice,
}

impl Orchestrator {
    /// Create an orchestrator working on the host: real filesystem, probed
    /// runtime and child processes.
    pub fn new(config: GeneratorConfig) -> Self {
        let facts = RuntimeFacts::probe(config.java_home.as_deref());
        Self::with_parts(config, Box::new(OsFileSystem), facts, Box::new(ProcessLauncher))
    }

    /// Create an orchestrator from explicit collaborators
    pub fn with_parts(
        config: GeneratorConfig,
        fs: Box<dyn FileSystem>,
        facts: RuntimeFacts,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        Self {
            config,
            fs,
            translator: TranslatorChoice::Select { facts, launcher },
        }
    }

    /// Create an orchestrator using `translator` instead of the configured
    /// compiler selector
    pub fn with_translator(
        config: GeneratorConfig,
        fs: Box<dyn FileSystem>,
        translator: Box<dyn CompilerTranslator>,
    ) -> Self {
        Self {
            config,
            fs,
            translator: TranslatorChoice::Given(translator),
        }
    }

    /// Run the generation.
    ///
    /// Returns the first fatal error. Scan failures, lenient translation
    /// failures and timestamp copy failures are logged and collected in the
    /// report instead.
    pub fn run(self) -> Result<RunReport> {
        let Self {
            config,
            fs,
            translator,
        } = self;

        if config.skip {
            info!("Skipping IDL generation");
            return Ok(RunReport {
                skipped: true,
                ..Default::default()
            });
        }

        let source_directory = config.source_directory();
        let output_directory = config.output_directory();
        let timestamp_directory = config.timestamp_directory();

        prepare_output(fs.as_ref(), &output_directory)?;

        if !fs.exists(&timestamp_directory) {
            if let Err(e) = fs.create_dir_all(&timestamp_directory) {
                debug!(
                    "Could not create timestamp directory {}: {}",
                    timestamp_directory.display(),
                    e
                );
            }
        }

        let mut translator = match translator {
            TranslatorChoice::Select { facts, launcher } => select_translator(
                &config.compiler,
                &facts,
                &config.compiler_classpath,
                launcher,
            )?,
            TranslatorChoice::Given(translator) => translator,
        };
        translator.set_debug(config.debug);
        translator.set_fail_on_error(config.fail_on_error);

        let run = Run {
            fs: fs.as_ref(),
            translator: translator.as_ref(),
            config: &config,
            source_directory: &source_directory,
            output_directory: &output_directory,
            timestamp_directory: &timestamp_directory,
        };

        let mut report = RunReport::default();
        for source in config.effective_sources() {
            report.sources.push(run.process(&source)?);
        }

        report.generated_root = Some(GeneratedRoot {
            path: output_directory,
            kind: config.source_root,
        });
        Ok(report)
    }
}

fn prepare_output(fs: &dyn FileSystem, output_directory: &Path) -> Result<()> {
    if !fs.exists(output_directory) {
        if let Err(e) = fs.create_dir_all(output_directory) {
            debug!("Could not create {}: {}", output_directory.display(), e);
        }
    }

    if !fs.is_writable(output_directory) {
        return Err(IdlError::OutputNotWritable(output_directory.to_path_buf()));
    }
    Ok(())
}

struct Run<'a> {
    fs: &'a dyn FileSystem,
    translator: &'a dyn CompilerTranslator,
    config: &'a GeneratorConfig,
    source_directory: &'a Path,
    output_directory: &'a Path,
    timestamp_directory: &'a Path,
}

impl Run<'_> {
    fn process(&self, source: &SourceConfiguration) -> Result<SourceReport> {
        let mut report = SourceReport {
            description: source.describe(),
            ..Default::default()
        };

        let stale = StaleSourceScanner::new(self.config.granularity_ms, &source.includes, &source.excludes)
            .and_then(|scanner| {
                self.fs
                    .stale_sources(&scanner, self.source_directory, self.timestamp_directory)
            })
            .map_err(|e| IdlError::Scan {
                root: self.source_directory.to_path_buf(),
                source: e,
            });

        let stale = match stale {
            Ok(stale) => stale,
            Err(e) => {
                let e = tolerate(e)?;
                error!("{}", e);
                report.scan_failure = Some(e);
                return Ok(report);
            }
        };

        report.stale_count = stale.len();
        if stale.is_empty() {
            info!("Nothing to compile - all IDL files are up to date");
            return Ok(report);
        }
        info!(
            "Compiling {} IDL file(s) ({}) with {}",
            stale.len(),
            report.description,
            self.translator.name()
        );

        for file in &stale {
            info!("Processing: {}", file.display());

            let outcome = self.translator.invoke(&TranslationRequest {
                source_directory: self.source_directory,
                include_directories: &self.config.include_directories,
                output_directory: self.output_directory,
                file,
                source,
            })?;

            report.processed.push(ProcessedFile {
                file: file.clone(),
                outcome,
            });

            if let Err(e) = self.record_timestamp(file) {
                let e = tolerate(e)?;
                warn!("{}", e);
                report.timestamp_failures.push(e);
            }
        }

        Ok(report)
    }

    fn record_timestamp(&self, file: &Path) -> Result<()> {
        let relative = match file.strip_prefix(self.source_directory) {
            Ok(relative) => relative,
            Err(_) => Path::new(file.file_name().unwrap_or(file.as_os_str())),
        };
        let target = self.timestamp_directory.join(relative);

        self.fs
            .copy_file(file, &target)
            .map_err(|source| IdlError::TimestampCopy {
                file: file.to_path_buf(),
                source,
            })
    }
}

/// Hand back a non-fatal error for the report; fatal ones end the run.
fn tolerate(e: IdlError) -> Result<IdlError> {
    if e.is_fatal() {
        return Err(e);
    }
    Ok(e)
}
