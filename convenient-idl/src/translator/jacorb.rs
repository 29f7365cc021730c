//! JacORB IDL compiler backend

use std::path::PathBuf;
use tracing::debug;

use super::launcher::{CachedLocator, CompilerLocator, CompilerProgram, Launcher};
use super::{
    CompilerTranslator, Invocation, TranslationOutcome, TranslationRequest, TranslatorSettings,
    path_arg,
};
use crate::error::Result;
use crate::runtime::RuntimeFacts;
use crate::source::EmitPolicy;

/// Entry class of the JacORB compiler
pub const JACORB_CLASS: &str = "org.jacorb.idl.parser";

const VERBOSE_FLAGS: &[&str] = &["-verbosity", "4"];

/// JacORB backend
pub struct JacorbTranslator {
    locator: CachedLocator,
    launcher: Box<dyn Launcher>,
    settings: TranslatorSettings,
}

impl JacorbTranslator {
    /// Create a translator that looks for the `idl` launcher, then for the
    /// compiler classes on `classpath`.
    pub fn new(facts: RuntimeFacts, classpath: Vec<PathBuf>, launcher: Box<dyn Launcher>) -> Self {
        let locator = CompilerLocator::Search {
            executable: Some("idl"),
            class: JACORB_CLASS.to_string(),
            classpath,
            facts,
        };
        Self::with_locator(locator, launcher)
    }

    /// Create a translator running a known program
    pub fn with_program(program: CompilerProgram, launcher: Box<dyn Launcher>) -> Self {
        Self::with_locator(CompilerLocator::Fixed(program), launcher)
    }

    fn with_locator(locator: CompilerLocator, launcher: Box<dyn Launcher>) -> Self {
        Self {
            locator: CachedLocator::new(locator),
            launcher,
            settings: TranslatorSettings::default(),
        }
    }
}

impl CompilerTranslator for JacorbTranslator {
    fn name(&self) -> &'static str {
        "jacorb"
    }

    fn set_debug(&mut self, debug: bool) {
        self.settings.debug = debug;
    }

    fn set_fail_on_error(&mut self, fail_on_error: bool) {
        self.settings.fail_on_error = fail_on_error;
    }

    fn arguments(&self, request: &TranslationRequest<'_>) -> Result<Vec<String>> {
        let source = request.source;
        let mut args = vec![format!("-I{}", path_arg(request.source_directory))];

        args.extend(
            request
                .include_directories
                .iter()
                .map(|include| format!("-I{}", path_arg(include))),
        );

        args.push("-d".into());
        args.push(path_arg(request.output_directory));

        if let Some(prefix) = &source.package_prefix {
            args.push("-package".into());
            args.push(prefix.clone());
        }

        for prefix in &source.package_prefixes {
            args.push("-i2jpackage".into());
            args.push(format!("{0}:{1}.{0}", prefix.type_name, prefix.prefix));
        }

        for translation in &source.package_translations {
            args.push("-i2jpackage".into());
            args.push(format!("{}:{}", translation.type_name, translation.replacement_package));
        }

        for define in &source.defines {
            args.push(match &define.value {
                Some(value) => format!("-D{}={}", define.symbol, value),
                None => format!("-D{}", define.symbol),
            });
        }

        match source.emit_policy() {
            EmitPolicy::All => {}
            EmitPolicy::Client => args.push("-noskel".into()),
            EmitPolicy::Server | EmitPolicy::ServerTie => args.push("-nostub".into()),
        }

        if source.is_compatible() {
            debug!("jacorb has no legacy inheritance model, option ignored: compatible");
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
            failure_marker: None,
            settings: self.settings,
        }
        .run(self.launcher.as_ref(), program, args, request.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdlError;
    use crate::source::{Define, PackagePrefix, PackageTranslation, SourceConfiguration};
    use crate::translator::testing::RecordingLauncher;
    use std::path::Path;
    use tracing_test::traced_test;

    fn translator(launcher: &RecordingLauncher) -> JacorbTranslator {
        JacorbTranslator::with_program(
            CompilerProgram::Executable(PathBuf::from("/opt/jacorb/bin/idl")),
            Box::new(launcher.clone()),
        )
    }

    fn request(source: &SourceConfiguration) -> TranslationRequest<'_> {
        TranslationRequest {
            source_directory: Path::new("idl"),
            include_directories: &[],
            output_directory: Path::new("out"),
            file: Path::new("idl/bank.idl"),
            source,
        }
    }

    #[traced_test]
    #[test]
    fn test_default_arguments_ignore_compatible() {
        let source = SourceConfiguration::default();
        let args = translator(&RecordingLauncher::default())
            .arguments(&request(&source))
            .unwrap();
        assert_eq!(args, vec!["-Iidl", "-d", "out", "idl/bank.idl"]);
        assert!(logs_contain("option ignored: compatible"));
    }

    #[test]
    fn test_package_options_and_defines() {
        let source = SourceConfiguration {
            package_prefix: Some("org.acme".into()),
            package_prefixes: vec![PackagePrefix {
                type_name: "Bank".into(),
                prefix: "com.example".into(),
            }],
            package_translations: vec![PackageTranslation {
                type_name: "Legacy".into(),
                replacement_package: "org.acme.old".into(),
            }],
            defines: vec![Define::symbol("DEBUG"), Define::with_value("LEVEL", "2")],
            emit_stubs: Some(false),
            additional_arguments: vec!["-ami_callback".into()],
            ..Default::default()
        };
        let includes = vec![PathBuf::from("/usr/share/idl")];
        let request = TranslationRequest {
            include_directories: &includes,
            ..request(&source)
        };

        let args = translator(&RecordingLauncher::default())
            .arguments(&request)
            .unwrap();
        assert_eq!(
            args,
            vec![
                "-Iidl",
                "-I/usr/share/idl",
                "-d",
                "out",
                "-package",
                "org.acme",
                "-i2jpackage",
                "Bank:com.example.Bank",
                "-i2jpackage",
                "Legacy:org.acme.old",
                "-DDEBUG",
                "-DLEVEL=2",
                "-nostub",
                "-ami_callback",
                "idl/bank.idl",
            ]
        );
    }

    #[test]
    fn test_emit_policy_flags() {
        let flags = |stubs, skels| {
            let source = SourceConfiguration {
                emit_stubs: stubs,
                emit_skeletons: skels,
                ..Default::default()
            };
            let args = translator(&RecordingLauncher::default())
                .arguments(&request(&source))
                .unwrap();
            args[3..args.len() - 1].to_vec()
        };
        assert!(flags(Some(true), Some(true)).is_empty());
        assert_eq!(flags(Some(true), Some(false)), vec!["-noskel"]);
        assert_eq!(flags(Some(false), Some(true)), vec!["-nostub"]);
        assert_eq!(flags(Some(false), Some(false)), vec!["-nostub"]);
    }

    #[test]
    fn test_debug_prepends_verbosity() {
        let launcher = RecordingLauncher::default();
        let mut translator = translator(&launcher);
        translator.set_debug(true);

        let source = SourceConfiguration::default();
        let _ = translator.invoke(&request(&source)).unwrap();
        assert_eq!(&launcher.last_args()[..3], ["-verbosity", "4", "-Iidl"]);
    }

    #[test]
    fn test_stderr_alone_is_not_a_failure() {
        let launcher = RecordingLauncher::failing(0, "Invalid argument: ignored by jacorb");
        let source = SourceConfiguration::default();
        let outcome = translator(&launcher).invoke(&request(&source)).unwrap();
        assert_eq!(outcome, TranslationOutcome::Succeeded);
    }

    #[test]
    fn test_nonzero_exit_fails() {
        let launcher = RecordingLauncher::failing(2, "bank.idl: parse error");
        let source = SourceConfiguration::default();
        let err = translator(&launcher).invoke(&request(&source)).unwrap_err();
        match err {
            IdlError::Translation { file, reason } => {
                assert_eq!(file, PathBuf::from("idl/bank.idl"));
                assert_eq!(reason, "jacorb exited with code 2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
