//! idlj compiler backend
//!
//! Covers the compiler bundled with legacy JDKs (Oracle and IBM builds) and
//! the Glassfish build of the same compiler, which is the only option on
//! runtimes with a module system. Both accept the same arguments.

use std::path::PathBuf;
use tracing::debug;

use super::launcher::{CachedLocator, CompilerLocator, CompilerProgram, Launcher};
use super::{
    CompilerTranslator, Invocation, TranslationOutcome, TranslationRequest, TranslatorSettings,
    path_arg,
};
use crate::error::{IdlError, Result};
use crate::runtime::RuntimeFacts;
use crate::source::EmitPolicy;

/// Entry class of the compiler in Oracle and OpenJDK builds
pub const ORACLE_IDLJ_CLASS: &str = "com.sun.tools.corba.se.idl.toJavaPortable.Compile";
/// Entry class of the compiler in IBM builds
pub const IBM_IDLJ_CLASS: &str = "com.ibm.idl.toJavaPortable.Compile";
/// Entry class of the Glassfish compiler
pub const GLASSFISH_IDLJ_CLASS: &str = "com.sun.tools.corba.ee.idl.toJavaPortable.Compile";

const FAILURE_MARKER: &str = "Invalid argument";
const VERBOSE_FLAGS: &[&str] = &["-verbose"];

/// Which build of idlj to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdljFlavor {
    /// The compiler shipped with the runtime
    BuiltIn,
    /// The Glassfish compiler, supplied on the compiler classpath
    Glassfish,
}

impl IdljFlavor {
    /// Entry class for this flavor on the given runtime
    pub fn compiler_class(self, facts: &RuntimeFacts) -> &'static str {
        match self {
            Self::BuiltIn if facts.is_ibm() => IBM_IDLJ_CLASS,
            Self::BuiltIn => ORACLE_IDLJ_CLASS,
            Self::Glassfish => GLASSFISH_IDLJ_CLASS,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::BuiltIn => "idlj",
            Self::Glassfish => "glassfish",
        }
    }
}

/// idlj backend
pub struct IdljTranslator {
    flavor: IdljFlavor,
    facts: RuntimeFacts,
    locator: CachedLocator,
    launcher: Box<dyn Launcher>,
    settings: TranslatorSettings,
}

impl IdljTranslator {
    /// Create a translator that searches the host for the compiler.
    ///
    /// The built-in flavor looks for an `idlj` launcher first and falls back
    /// to `tools.jar` next to the runtime. `classpath` is searched by both
    /// flavors.
    pub fn new(
        flavor: IdljFlavor,
        facts: RuntimeFacts,
        classpath: Vec<PathBuf>,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        let mut candidates = Vec::new();
        let executable = match flavor {
            IdljFlavor::BuiltIn => {
                if let Some(home) = &facts.java_home {
                    candidates.push(home.join("../lib/tools.jar"));
                    candidates.push(home.join("lib/tools.jar"));
                }
                Some("idlj")
            }
            IdljFlavor::Glassfish => None,
        };
        candidates.extend(classpath);

        let locator = CompilerLocator::Search {
            executable,
            class: flavor.compiler_class(&facts).to_string(),
            classpath: candidates,
            facts: facts.clone(),
        };

        Self::with_locator(flavor, facts, locator, launcher)
    }

    /// Create a translator running a known program
    pub fn with_program(
        flavor: IdljFlavor,
        facts: RuntimeFacts,
        program: CompilerProgram,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        Self::with_locator(flavor, facts, CompilerLocator::Fixed(program), launcher)
    }

    fn with_locator(
        flavor: IdljFlavor,
        facts: RuntimeFacts,
        locator: CompilerLocator,
        launcher: Box<dyn Launcher>,
    ) -> Self {
        Self {
            flavor,
            facts,
            locator: CachedLocator::new(locator),
            launcher,
            settings: TranslatorSettings::default(),
        }
    }

    /// The flavor this translator runs
    pub fn flavor(&self) -> IdljFlavor {
        self.flavor
    }

    fn unsupported(&self, option: &str) -> IdlError {
        IdlError::UnsupportedOption {
            compiler: self.name(),
            option: option.to_string(),
        }
    }
}

impl CompilerTranslator for IdljTranslator {
    fn name(&self) -> &'static str {
        self.flavor.name()
    }

    fn set_debug(&mut self, debug: bool) {
        self.settings.debug = debug;
    }

    fn set_fail_on_error(&mut self, fail_on_error: bool) {
        self.settings.fail_on_error = fail_on_error;
    }

    fn arguments(&self, request: &TranslationRequest<'_>) -> Result<Vec<String>> {
        let source = request.source;
        let mut args = vec!["-i".to_string(), path_arg(request.source_directory)];

        for include in request.include_directories {
            args.push("-i".into());
            args.push(path_arg(include));
        }

        args.push("-td".into());
        args.push(path_arg(request.output_directory));

        if source.package_prefix.is_some() {
            return Err(self.unsupported("packagePrefix"));
        }

        for prefix in &source.package_prefixes {
            args.push("-pkgPrefix".into());
            args.push(prefix.type_name.clone());
            args.push(prefix.prefix.clone());
        }

        for translation in &source.package_translations {
            args.push("-pkgTranslate".into());
            args.push(translation.type_name.clone());
            args.push(translation.replacement_package.clone());
        }

        for define in &source.defines {
            if define.value.is_some() {
                return Err(self.unsupported("symbol values in defines"));
            }
            args.push("-d".into());
            args.push(define.symbol.clone());
        }

        args.push(
            match source.emit_policy() {
                EmitPolicy::All => "-fall",
                EmitPolicy::Client => "-fclient",
                EmitPolicy::Server => "-fserver",
                EmitPolicy::ServerTie => "-fserverTIE",
            }
            .into(),
        );

        if source.is_compatible() {
            if self.facts.predates_portable_model() {
                debug!("Runtime {} predates -oldImplBase, option ignored: compatible", self.facts.version);
            } else {
                args.push("-oldImplBase".into());
            }
        }

        args.extend(source.additional_arguments.iter().cloned());
        args.push(path_arg(request.file));

        Ok(args)
    }

    fn invoke(&self, request: &TranslationRequest<'_>) -> Result<TranslationOutcome> {
        let args = self.arguments(request)?;
        let program = self.locator.program()?;

        Invocation {
            compiler: self.name(),
            verbose_flags: VERBOSE_FLAGS,
            failure_marker: Some(FAILURE_MARKER),
            settings: self.settings,
        }
        .run(self.launcher.as_ref(), program, args, request.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Define, PackagePrefix, PackageTranslation, SourceConfiguration};
    use crate::translator::testing::RecordingLauncher;
    use std::path::Path;
    use tracing_test::traced_test;

    fn translator(launcher: &RecordingLauncher) -> IdljTranslator {
        IdljTranslator::with_program(
            IdljFlavor::BuiltIn,
            RuntimeFacts {
                version: "1.8.0_202".into(),
                ..Default::default()
            },
            CompilerProgram::Executable(PathBuf::from("/jdk/bin/idlj")),
            Box::new(launcher.clone()),
        )
    }

    fn request<'a>(source: &'a SourceConfiguration, includes: &'a [PathBuf]) -> TranslationRequest<'a> {
        TranslationRequest {
            source_directory: Path::new("src/main/idl"),
            include_directories: includes,
            output_directory: Path::new("target/generated-sources/idl"),
            file: Path::new("src/main/idl/bank.idl"),
            source,
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_arguments() {
        let source = SourceConfiguration::default();
        let args = translator(&RecordingLauncher::default())
            .arguments(&request(&source, &[]))
            .unwrap();
        assert_eq!(
            args,
            strings(&[
                "-i",
                "src/main/idl",
                "-td",
                "target/generated-sources/idl",
                "-fall",
                "-oldImplBase",
                "src/main/idl/bank.idl",
            ])
        );
    }

    #[test]
    fn test_full_argument_order() {
        let source = SourceConfiguration {
            package_prefixes: vec![PackagePrefix {
                type_name: "Bank".into(),
                prefix: "org.acme".into(),
            }],
            package_translations: vec![PackageTranslation {
                type_name: "Legacy".into(),
                replacement_package: "org.acme.legacy".into(),
            }],
            defines: vec![Define::symbol("DEBUG")],
            emit_skeletons: Some(false),
            compatible: Some(false),
            additional_arguments: vec!["-keep".into(), "-noWarn".into()],
            ..Default::default()
        };
        let includes = vec![PathBuf::from("/usr/share/idl")];
        let args = translator(&RecordingLauncher::default())
            .arguments(&request(&source, &includes))
            .unwrap();
        assert_eq!(
            args,
            strings(&[
                "-i",
                "src/main/idl",
                "-i",
                "/usr/share/idl",
                "-td",
                "target/generated-sources/idl",
                "-pkgPrefix",
                "Bank",
                "org.acme",
                "-pkgTranslate",
                "Legacy",
                "org.acme.legacy",
                "-d",
                "DEBUG",
                "-fclient",
                "-keep",
                "-noWarn",
                "src/main/idl/bank.idl",
            ])
        );
    }

    #[test]
    fn test_emit_policy_flags() {
        let flag = |stubs, skels| {
            let source = SourceConfiguration {
                emit_stubs: stubs,
                emit_skeletons: skels,
                compatible: None,
                ..Default::default()
            };
            let args = translator(&RecordingLauncher::default())
                .arguments(&request(&source, &[]))
                .unwrap();
            args[args.len() - 2].clone()
        };
        assert_eq!(flag(Some(true), Some(true)), "-fall");
        assert_eq!(flag(Some(true), Some(false)), "-fclient");
        assert_eq!(flag(Some(false), Some(true)), "-fserver");
        assert_eq!(flag(Some(false), Some(false)), "-fserverTIE");
    }

    #[test]
    fn test_compatible_ignored_on_ancient_runtime() {
        let launcher = RecordingLauncher::default();
        let translator = IdljTranslator::with_program(
            IdljFlavor::BuiltIn,
            RuntimeFacts {
                version: "1.3.1".into(),
                ..Default::default()
            },
            CompilerProgram::Executable(PathBuf::from("idlj")),
            Box::new(launcher),
        );
        let source = SourceConfiguration::default();
        let args = translator.arguments(&request(&source, &[])).unwrap();
        assert!(!args.contains(&"-oldImplBase".to_string()));
    }

    #[test]
    fn test_package_prefix_rejected_before_launch() {
        let launcher = RecordingLauncher::default();
        let source = SourceConfiguration {
            package_prefix: Some("org.acme".into()),
            ..Default::default()
        };
        let err = translator(&launcher).invoke(&request(&source, &[])).unwrap_err();
        assert!(matches!(err, IdlError::UnsupportedOption { compiler: "idlj", .. }));
        assert_eq!(launcher.call_count(), 0);
    }

    #[test]
    fn test_valued_define_rejected() {
        let launcher = RecordingLauncher::default();
        let source = SourceConfiguration {
            defines: vec![Define::with_value("LEVEL", "2")],
            ..Default::default()
        };
        let err = translator(&launcher).invoke(&request(&source, &[])).unwrap_err();
        assert!(matches!(err, IdlError::UnsupportedOption { .. }));
        assert_eq!(launcher.call_count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_debug_prepends_verbose_and_logs_command() {
        let launcher = RecordingLauncher::default();
        let mut translator = translator(&launcher);
        translator.set_debug(true);

        let source = SourceConfiguration::default();
        let outcome = translator.invoke(&request(&source, &[])).unwrap();

        assert_eq!(outcome, TranslationOutcome::Succeeded);
        let args = launcher.last_args();
        assert_eq!(args[0], "-verbose");
        assert_eq!(args.last().map(String::as_str), Some("src/main/idl/bank.idl"));
        assert!(logs_contain("/jdk/bin/idlj -verbose -i src/main/idl"));
    }

    #[test]
    fn test_nonzero_exit_fails() {
        let launcher = RecordingLauncher::failing(1, "");
        let source = SourceConfiguration::default();
        let err = translator(&launcher).invoke(&request(&source, &[])).unwrap_err();
        assert!(matches!(err, IdlError::Translation { .. }));
    }

    #[test]
    fn test_invalid_argument_marker_fails_with_zero_exit() {
        let launcher = RecordingLauncher::failing(0, "Invalid argument: -bogus");
        let source = SourceConfiguration::default();
        let err = translator(&launcher).invoke(&request(&source, &[])).unwrap_err();
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[traced_test]
    #[test]
    fn test_lenient_failure_is_logged() {
        let launcher = RecordingLauncher::failing(1, "bank.idl (line 3): syntax error");
        let mut translator = translator(&launcher);
        translator.set_fail_on_error(false);

        let source = SourceConfiguration::default();
        let outcome = translator.invoke(&request(&source, &[])).unwrap();

        assert_eq!(outcome, TranslationOutcome::FailedLeniently);
        assert!(logs_contain("idlj exited with code 1"));
        assert!(logs_contain("syntax error"));
    }

    #[test]
    fn test_vendor_selects_entry_class() {
        let ibm = RuntimeFacts {
            vendor: "IBM Corporation".into(),
            ..Default::default()
        };
        assert_eq!(IdljFlavor::BuiltIn.compiler_class(&ibm), IBM_IDLJ_CLASS);
        assert_eq!(
            IdljFlavor::BuiltIn.compiler_class(&RuntimeFacts::default()),
            ORACLE_IDLJ_CLASS
        );
        assert_eq!(IdljFlavor::Glassfish.compiler_class(&ibm), GLASSFISH_IDLJ_CLASS);
    }

    #[cfg(unix)]
    #[test]
    fn test_compiler_located_once_per_translator() {
        use std::os::unix::fs::PermissionsExt;

        let home = tempfile::TempDir::new().unwrap();
        let idlj = home.path().join("bin/idlj");
        std::fs::create_dir_all(idlj.parent().unwrap()).unwrap();
        std::fs::write(&idlj, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&idlj, std::fs::Permissions::from_mode(0o755)).unwrap();

        let launcher = RecordingLauncher::default();
        let translator = IdljTranslator::new(
            IdljFlavor::BuiltIn,
            RuntimeFacts {
                version: "1.8.0_202".into(),
                java_home: Some(home.path().to_path_buf()),
                search_path: None,
                ..Default::default()
            },
            Vec::new(),
            Box::new(launcher.clone()),
        );
        let source = SourceConfiguration::default();

        let first = translator.invoke(&request(&source, &[])).unwrap();
        // A second search would now come up empty
        std::fs::remove_file(&idlj).unwrap();
        let second = translator.invoke(&request(&source, &[])).unwrap();

        assert_eq!(first, TranslationOutcome::Succeeded);
        assert_eq!(second, TranslationOutcome::Succeeded);
        assert_eq!(launcher.call_count(), 2);
    }

    #[test]
    fn test_glassfish_without_classpath_is_unavailable() {
        let launcher = RecordingLauncher::default();
        let translator = IdljTranslator::new(
            IdljFlavor::Glassfish,
            RuntimeFacts::default(),
            Vec::new(),
            Box::new(launcher.clone()),
        );
        let source = SourceConfiguration::default();
        let err = translator.invoke(&request(&source, &[])).unwrap_err();
        assert!(matches!(err, IdlError::CompilerUnavailable(_)));
        assert_eq!(launcher.call_count(), 0);
    }
}
