//! Build-time generation of Java bindings from CORBA IDL files.
//!
//! This crate finds the IDL files whose generated code is out of date and
//! runs an IDL compiler backend on each of them.
//!
//! # Features
//!
//! - Stale-source detection against a timestamp store that mirrors the
//!   source tree, with glob include/exclude filters
//! - Backends for the runtime-bundled idlj, the Glassfish idlj and JacORB
//! - `auto` backend selection from the probed Java runtime
//! - Per-group compiler options (package prefixes, defines, emitted sides)
//! - Captured backend output routed to `tracing`
//!
//! # Example
//!
//! ```no_run
//! use convenient_idl::{GeneratorConfig, Orchestrator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GeneratorConfig::from_file("idlgen.yaml")?;
//!     let report = Orchestrator::new(config).run()?;
//!     println!("{} file(s) processed", report.processed_count());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(unused_results)]

pub mod config;
pub mod error;
pub mod fs;
pub mod orchestrator;
pub mod runtime;
pub mod scanner;
pub mod source;
pub mod translator;

pub use config::{GeneratorConfig, SourceRootKind};
pub use error::{IdlError, Result};
pub use fs::{FileSystem, OsFileSystem};
pub use orchestrator::{
    FileOutcome, GeneratedRoot, Orchestrator, ProcessedFile, RunReport, SourceReport,
};
pub use runtime::RuntimeFacts;
pub use scanner::{ScanError, StaleFileSet, StaleSourceScanner};
pub use source::{Define, EmitPolicy, PackagePrefix, PackageTranslation, SourceConfiguration};
pub use translator::{
    CompilerTranslator, TranslationOutcome, TranslationRequest, TranslatorType, select_translator,
};
