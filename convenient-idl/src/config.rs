//! Run configuration
//!
//! A [`GeneratorConfig`] is usually loaded from a YAML file. Any path left
//! out is derived from `base_directory` and `build_directory` following the
//! usual `src/main` / `target` project layout:
//!
//! ```yaml
//! compiler: jacorb
//! include_directories: [/usr/share/idl/omniORB]
//! sources:
//!   - includes: ["bank/**/*.idl"]
//!     package_prefix: org.acme
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IdlError, Result};
use crate::source::SourceConfiguration;

/// Which source set the run generates for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRootKind {
    /// Production sources
    #[default]
    Main,
    /// Test sources
    Test,
}

impl SourceRootKind {
    fn directory(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
        }
    }

    fn generated_directory(self) -> &'static str {
        match self {
            Self::Main => "generated-sources",
            Self::Test => "generated-test-sources",
        }
    }
}

/// Everything one generation run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Project directory the defaults are relative to
    pub base_directory: PathBuf,
    /// Build output directory, `<base>/target` when unset
    pub build_directory: Option<PathBuf>,
    /// Source set to generate for
    pub source_root: SourceRootKind,
    /// Root of the IDL sources
    pub source_directory: Option<PathBuf>,
    /// Extra directories searched for included IDL files
    pub include_directories: Vec<PathBuf>,
    /// Directory receiving generated code
    pub output_directory: Option<PathBuf>,
    /// Directory holding copies of processed sources
    pub timestamp_directory: Option<PathBuf>,
    /// Source groups; one default group when empty
    pub sources: Vec<SourceConfiguration>,
    /// Tolerance in milliseconds when comparing modification times
    pub granularity_ms: u64,
    /// Verbose backend output and echoed command lines
    pub debug: bool,
    /// Abort on the first backend failure
    pub fail_on_error: bool,
    /// Backend selector: `auto`, `idlj`, `glassfish` or `jacorb`
    pub compiler: String,
    /// Runtime home used for probing and compiler lookup; `$JAVA_HOME` when unset
    pub java_home: Option<PathBuf>,
    /// Classpath searched for compiler classes
    pub compiler_classpath: Vec<PathBuf>,
    /// Do nothing at all
    pub skip: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("."),
            build_directory: None,
            source_root: SourceRootKind::Main,
            source_directory: None,
            include_directories: Vec::new(),
            output_directory: None,
            timestamp_directory: None,
            sources: Vec::new(),
            granularity_ms: 0,
            debug: false,
            fail_on_error: true,
            compiler: "auto".to_string(),
            java_home: None,
            compiler_classpath: Vec::new(),
            skip: false,
        }
    }
}

impl GeneratorConfig {
    /// Load a YAML configuration file.
    ///
    /// Relative paths inside the file are kept as written; they resolve
    /// against the working directory, like those given on the command line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| IdlError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(path, &content)
    }

    /// Parse YAML content; `origin` names the source in errors.
    pub fn from_yaml(origin: impl AsRef<Path>, content: &str) -> Result<Self> {
        // An empty document means all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| IdlError::Config {
            path: origin.as_ref().to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Build output directory
    pub fn build_directory(&self) -> PathBuf {
        self.build_directory
            .clone()
            .unwrap_or_else(|| self.base_directory.join("target"))
    }

    /// Root of the IDL sources
    pub fn source_directory(&self) -> PathBuf {
        self.source_directory.clone().unwrap_or_else(|| {
            self.base_directory
                .join("src")
                .join(self.source_root.directory())
                .join("idl")
        })
    }

    /// Directory receiving generated code
    pub fn output_directory(&self) -> PathBuf {
        self.output_directory.clone().unwrap_or_else(|| {
            self.build_directory()
                .join(self.source_root.generated_directory())
                .join("idl")
        })
    }

    /// Timestamp store
    pub fn timestamp_directory(&self) -> PathBuf {
        self.timestamp_directory
            .clone()
            .unwrap_or_else(|| self.build_directory().join("idlj-timestamp"))
    }

    /// Configured source groups, or the single default group
    pub fn effective_sources(&self) -> Vec<SourceConfiguration> {
        if self.sources.is_empty() {
            vec![SourceConfiguration::default()]
        } else {
            self.sources.clone()
        }
    }
}
