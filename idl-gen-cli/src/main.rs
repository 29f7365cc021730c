//! idlgen - generate Java bindings from IDL files
//!
//! Usage:
//!   idlgen                          Use defaults for the current directory
//!   idlgen idlgen.yaml              Load a configuration file
//!   idlgen --compiler jacorb --test Override single settings

use clap::Parser;
use convenient_idl::{GeneratorConfig, Orchestrator, RunReport, SourceRootKind};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "idlgen")]
#[command(about = "Generate Java sources from stale IDL files", long_about = None)]
struct Cli {
    /// YAML configuration file
    config: Option<PathBuf>,

    /// Project directory (default: current directory)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Build output directory (default: <base>/target)
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Root of the IDL sources
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Additional include directory (repeatable)
    #[arg(long = "include-dir")]
    include_dirs: Vec<PathBuf>,

    /// Directory receiving generated sources
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory holding timestamp copies of processed files
    #[arg(long)]
    timestamp_dir: Option<PathBuf>,

    /// Compiler backend: auto, idlj, glassfish or jacorb
    #[arg(long)]
    compiler: Option<String>,

    /// Tolerance in milliseconds when comparing modification times
    #[arg(long)]
    granularity_ms: Option<u64>,

    /// Java runtime home (default: $JAVA_HOME)
    #[arg(long)]
    java_home: Option<PathBuf>,

    /// Classpath entry providing compiler classes (repeatable)
    #[arg(long = "classpath")]
    classpath: Vec<PathBuf>,

    /// Verbose compiler output and echoed command lines
    #[arg(long)]
    debug: bool,

    /// Log compiler failures and carry on
    #[arg(long)]
    no_fail_on_error: bool,

    /// Generate test sources
    #[arg(long)]
    test: bool,

    /// Do nothing
    #[arg(long)]
    skip: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> convenient_idl::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(dir) = self.base_dir {
            config.base_directory = dir;
        }
        if self.build_dir.is_some() {
            config.build_directory = self.build_dir;
        }
        if self.source_dir.is_some() {
            config.source_directory = self.source_dir;
        }
        config.include_directories.extend(self.include_dirs);
        if self.output_dir.is_some() {
            config.output_directory = self.output_dir;
        }
        if self.timestamp_dir.is_some() {
            config.timestamp_directory = self.timestamp_dir;
        }
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        if let Some(granularity) = self.granularity_ms {
            config.granularity_ms = granularity;
        }
        if self.java_home.is_some() {
            config.java_home = self.java_home;
        }
        config.compiler_classpath.extend(self.classpath);
        config.debug |= self.debug;
        config.skip |= self.skip;
        if self.no_fail_on_error {
            config.fail_on_error = false;
        }
        if self.test {
            config.source_root = SourceRootKind::Test;
        }

        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose || cli.debug {
        "idlgen=debug,convenient_idl=debug"
    } else {
        "idlgen=info,convenient_idl=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = cli
        .into_config()
        .and_then(|config| Orchestrator::new(config).run());

    match result {
        Ok(report) => print_summary(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn print_summary(report: &RunReport) {
    if report.skipped {
        println!("Skipped");
        return;
    }

    for source in &report.sources {
        println!(
            "{}: {} stale, {} processed",
            source.description,
            source.stale_count,
            source.processed.len()
        );
        if let Some(e) = &source.scan_failure {
            println!("  ✗ {}", e);
        }
        for e in &source.timestamp_failures {
            println!("  ⚠ {}", e);
        }
    }

    for file in report.lenient_failures() {
        println!("  ⚠ Compilation failed: {}", file.file.display());
    }

    if let Some(root) = &report.generated_root {
        let kind = match root.kind {
            SourceRootKind::Main => "source",
            SourceRootKind::Test => "test source",
        };
        println!("Generated {} root: {}", kind, root.path.display());
    }
}
