//! Per-group source configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::scanner::DEFAULT_INCLUDE;

/// Package prefix applied to one IDL type or module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePrefix {
    /// Simple name of a top-level module or type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Package prepended to the generated package
    pub prefix: String,
}

/// Replacement package for one IDL type or module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTranslation {
    /// Simple name of a top-level module, or of a type outside any module
    #[serde(rename = "type")]
    pub type_name: String,
    /// Package used in place of the module name
    pub replacement_package: String,
}

/// Preprocessor symbol passed to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    /// Symbol name
    pub symbol: String,
    /// Optional value; only some backends accept one
    #[serde(default)]
    pub value: Option<String>,
}

impl Define {
    /// A symbol without value
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            value: None,
        }
    }

    /// A symbol with a value
    pub fn with_value(symbol: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            value: Some(value.into()),
        }
    }
}

/// Which bindings a backend should emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitPolicy {
    /// Client stubs and server skeletons
    All,
    /// Client stubs only
    Client,
    /// Server skeletons only
    Server,
    /// Server side with tie delegation wrapper only
    ServerTie,
}

/// One group of IDL files sharing compiler options.
///
/// The emission and compatibility flags are tri-state: they default to
/// `Some(true)`, and an explicit `null` in a configuration file turns them
/// into `None`, which counts as disabled.
///
/// `package_prefix` and `package_prefixes` may both be set. Whether a backend
/// can honor the singular prefix is decided when a file is translated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfiguration {
    /// Glob patterns selecting files, relative to the source directory
    pub includes: BTreeSet<String>,
    /// Glob patterns removing files from the selection
    pub excludes: BTreeSet<String>,
    /// Single package prefix applied to all modules
    pub package_prefix: Option<String>,
    /// Per-type package prefixes
    pub package_prefixes: Vec<PackagePrefix>,
    /// Per-type package replacements
    pub package_translations: Vec<PackageTranslation>,
    /// Preprocessor symbols
    pub defines: Vec<Define>,
    /// Emit client stubs
    pub emit_stubs: Option<bool>,
    /// Emit server skeletons
    pub emit_skeletons: Option<bool>,
    /// Generate code using the legacy inheritance model
    pub compatible: Option<bool>,
    /// Raw backend arguments, appended before the file name
    pub additional_arguments: Vec<String>,
}

impl Default for SourceConfiguration {
    fn default() -> Self {
        Self {
            includes: BTreeSet::from([DEFAULT_INCLUDE.to_string()]),
            excludes: BTreeSet::new(),
            package_prefix: None,
            package_prefixes: Vec::new(),
            package_translations: Vec::new(),
            defines: Vec::new(),
            emit_stubs: Some(true),
            emit_skeletons: Some(true),
            compatible: Some(true),
            additional_arguments: Vec::new(),
        }
    }
}

impl SourceConfiguration {
    /// Resolve the emission flags into a policy.
    pub fn emit_policy(&self) -> EmitPolicy {
        match (self.emit_stubs == Some(true), self.emit_skeletons == Some(true)) {
            (true, true) => EmitPolicy::All,
            (true, false) => EmitPolicy::Client,
            (false, true) => EmitPolicy::Server,
            (false, false) => EmitPolicy::ServerTie,
        }
    }

    /// Whether legacy inheritance-model code is requested
    pub fn is_compatible(&self) -> bool {
        self.compatible == Some(true)
    }

    /// Short label for log messages
    pub fn describe(&self) -> String {
        let includes: Vec<&str> = self.includes.iter().map(String::as_str).collect();
        if self.excludes.is_empty() {
            format!("includes [{}]", includes.join(", "))
        } else {
            let excludes: Vec<&str> = self.excludes.iter().map(String::as_str).collect();
            format!("includes [{}] excludes [{}]", includes.join(", "), excludes.join(", "))
        }
    }
}
