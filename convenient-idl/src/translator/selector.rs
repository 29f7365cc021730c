//! Backend selection
//!
//! The selector string comes from configuration. `auto` is the only value
//! whose meaning depends on the host: it resolves through
//! [`TranslatorType::resolve`], a pure function of the [`RuntimeFacts`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use super::idlj::{IdljFlavor, IdljTranslator};
use super::jacorb::JacorbTranslator;
use super::launcher::Launcher;
use super::CompilerTranslator;
use crate::error::{IdlError, Result};
use crate::runtime::RuntimeFacts;

/// Backend requested by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslatorType {
    /// Pick a built-in backend matching the host runtime
    #[default]
    Auto,
    /// The compiler bundled with the runtime
    BuiltIn,
    /// The module-aware Glassfish compiler
    Glassfish,
    /// The JacORB compiler
    Jacorb,
}

/// Concrete backend after resolving `auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The compiler bundled with the runtime
    BuiltIn,
    /// The module-aware Glassfish compiler
    Glassfish,
    /// The JacORB compiler
    Jacorb,
}

impl TranslatorType {
    /// Configuration string for this type
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::BuiltIn => "idlj",
            Self::Glassfish => "glassfish",
            Self::Jacorb => "jacorb",
        }
    }

    /// Resolve to a concrete backend.
    ///
    /// `auto` picks Glassfish when the runtime has a module system, since
    /// such runtimes no longer bundle idlj, and the bundled compiler otherwise.
    pub fn resolve(self, facts: &RuntimeFacts) -> Backend {
        match self {
            Self::Auto if facts.has_module_system() => Backend::Glassfish,
            Self::Auto | Self::BuiltIn => Backend::BuiltIn,
            Self::Glassfish => Backend::Glassfish,
            Self::Jacorb => Backend::Jacorb,
        }
    }
}

impl FromStr for TranslatorType {
    type Err = IdlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "idlj" => Ok(Self::BuiltIn),
            "glassfish" => Ok(Self::Glassfish),
            "jacorb" => Ok(Self::Jacorb),
            _ => Err(IdlError::UnsupportedTranslator(s.to_string())),
        }
    }
}

impl fmt::Display for TranslatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the translator for a run.
///
/// Fails with [`IdlError::UnsupportedTranslator`] for unknown selectors.
/// The backend itself is only located when the first file is translated.
pub fn select_translator(
    selector: &str,
    facts: &RuntimeFacts,
    classpath: &[PathBuf],
    launcher: Box<dyn Launcher>,
) -> Result<Box<dyn CompilerTranslator>> {
    let requested: TranslatorType = selector.parse()?;
    let backend = requested.resolve(facts);

    if requested == TranslatorType::Auto {
        info!(
            "Compiler 'auto' resolved to {:?} (runtime version '{}')",
            backend, facts.version
        );
    } else {
        debug!("Using compiler {:?}", backend);
    }

    let classpath = classpath.to_vec();
    let translator: Box<dyn CompilerTranslator> = match backend {
        Backend::BuiltIn => Box::new(IdljTranslator::new(
            IdljFlavor::BuiltIn,
            facts.clone(),
            classpath,
            launcher,
        )),
        Backend::Glassfish => Box::new(IdljTranslator::new(
            IdljFlavor::Glassfish,
            facts.clone(),
            classpath,
            launcher,
        )),
        Backend::Jacorb => Box::new(JacorbTranslator::new(facts.clone(), classpath, launcher)),
    };

    Ok(translator)
}
