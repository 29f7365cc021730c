//! Host runtime probing
//!
//! Backend selection and location depend on a handful of facts about the
//! Java runtime on the host. They are gathered once into [`RuntimeFacts`],
//! read from the `release` file every JDK ships in its home directory. No
//! other module looks at the environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the runtime home directory
pub const JAVA_HOME_VAR: &str = "JAVA_HOME";

/// What is known about the host runtime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeFacts {
    /// Specification version, e.g. `1.8.0_292` or `17.0.2`; empty if unknown
    pub version: String,
    /// Implementor, e.g. `IBM Corporation`
    pub vendor: String,
    /// Virtual machine variant, e.g. `HotSpot`
    pub vm_name: String,
    /// Runtime home directory
    pub java_home: Option<PathBuf>,
    /// Executable search path used to locate compiler launchers
    pub search_path: Option<OsString>,
}

impl RuntimeFacts {
    /// Probe the runtime at `java_home`, or at `$JAVA_HOME` when `None`.
    ///
    /// A missing or unreadable `release` file leaves the facts empty.
    pub fn probe(java_home: Option<&Path>) -> Self {
        let search_path = std::env::var_os("PATH");
        let home = java_home
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(JAVA_HOME_VAR).map(PathBuf::from));

        let Some(home) = home else {
            debug!("No {} set, runtime facts unknown", JAVA_HOME_VAR);
            return Self {
                search_path,
                ..Self::default()
            };
        };

        let facts = match std::fs::read_to_string(home.join("release")) {
            Ok(content) => Self::from_release(home, &content),
            Err(e) => {
                debug!("Cannot read release file under {}: {}", home.display(), e);
                Self {
                    java_home: Some(home),
                    ..Self::default()
                }
            }
        };

        Self { search_path, ..facts }
    }

    /// Build facts from the content of a `release` file.
    pub fn from_release(java_home: impl Into<PathBuf>, content: &str) -> Self {
        let mut facts = Self {
            java_home: Some(java_home.into()),
            ..Self::default()
        };

        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "JAVA_VERSION" => facts.version = value,
                "IMPLEMENTOR" => facts.vendor = value,
                "JVM_VARIANT" => facts.vm_name = value,
                _ => {}
            }
        }

        debug!(
            "Runtime: version={} vendor={} vm={}",
            facts.version, facts.vendor, facts.vm_name
        );
        facts
    }

    /// Whether the runtime has a module system (anything after the `1.x` line).
    ///
    /// An unknown version counts as a legacy runtime.
    pub fn has_module_system(&self) -> bool {
        !self.version.is_empty() && !self.version.starts_with("1.")
    }

    /// Whether the runtime comes from IBM, which ships its own idlj classes
    pub fn is_ibm(&self) -> bool {
        self.vendor.contains("IBM")
    }

    /// Whether the runtime predates the portable inheritance model (1.0 to 1.3)
    pub fn predates_portable_model(&self) -> bool {
        matches!(self.version.as_bytes(), [b'0'..=b'1', b'.', b'0'..=b'3', ..])
    }
}
