//! report-ci CLI - Detects test reports and prepares them for upload.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use report_ci::ci::{self, CiEnvironment};
use report_ci::config::{self, Config, DEFAULT_CONFIG_FILE};
use report_ci::framework::Framework;
use report_ci::orchestrator::Orchestrator;
use report_ci::report;
use report_ci::select::{FileSelector, Source};
use report_ci::upload::{UploadOptions, UploadRequest};

#[derive(Parser)]
#[command(name = "report-ci")]
#[command(about = "Detects test result formats and packages them for upload", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path [default: report-ci.toml, if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect, compose and describe the upload request
    Upload {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        upload: UploadArgs,
    },

    /// Classify files and report what was found
    Detect {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate configuration file
    Validate,

    /// Initialize a new configuration file
    Init {
        /// Framework to pin instead of detecting it
        #[arg(short, long)]
        framework: Option<Framework>,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Files to include, may contain shell-style wildcards [default: *.xml *.json *.trx *.tap]
    #[arg(short, long, num_args = 1..)]
    include: Vec<String>,

    /// Files to exclude, may contain shell-style wildcards
    #[arg(short = 'x', long, num_args = 1..)]
    exclude: Vec<String>,

    /// Explicit file list; include and exclude are ignored
    #[arg(short = 'l', long, num_args = 1..)]
    file_list: Vec<PathBuf>,

    /// Root directory of the project; walked for reports and sent with the upload
    #[arg(short, long)]
    root_dir: Option<PathBuf>,
}

#[derive(Args)]
struct UploadArgs {
    /// Test framework; detected from the files when omitted
    #[arg(short, long)]
    framework: Option<Framework>,

    /// Run name, for telling apart several uploads from one CI build
    #[arg(short, long)]
    name: Option<String>,

    /// CI system name, overriding detection
    #[arg(short = 's', long)]
    ci_system: Option<String>,

    /// Commit hash
    #[arg(short = 'a', long)]
    sha: Option<String>,

    /// Build identifier, detected on CI systems
    #[arg(short, long)]
    build_id: Option<String>,

    /// Check-run id to update
    #[arg(short, long)]
    check_run: Option<String>,

    /// File holding the check-run id of a previous upload
    #[arg(short = 'd', long)]
    id_file: Option<PathBuf>,

    /// Preprocessor token for the name lookup
    #[arg(short = 'D', long, num_args = 1..)]
    define: Vec<String>,

    /// Definition and include preset
    #[arg(short, long)]
    preset: Option<String>,

    /// Merge similar annotations from different check runs
    #[arg(short, long)]
    merge: Option<String>,

    /// Write the request body to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Upload { scan, upload } => run_upload(cli.config.as_deref(), scan, upload),
        Commands::Detect { scan, format } => run_detect(cli.config.as_deref(), scan, &format),
        Commands::Validate => validate_config(cli.config.as_deref()),
        Commands::Init { framework } => init_config(cli.config.as_deref(), framework),
    }
}

/// Builds the pipeline from CLI arguments, falling back to the config file.
fn build_orchestrator(config: &Config, scan: &ScanArgs, root_dir: &Path) -> Result<Orchestrator> {
    let include = if scan.include.is_empty() {
        &config.scan.include
    } else {
        &scan.include
    };
    let exclude = if scan.exclude.is_empty() {
        &config.scan.exclude
    } else {
        &scan.exclude
    };

    let selector = FileSelector::new(include, exclude)?;
    let source = if scan.file_list.is_empty() {
        Source::Walk(root_dir.to_path_buf())
    } else {
        Source::Files(scan.file_list.clone())
    };

    Ok(Orchestrator::new(selector, source))
}

/// Root directory precedence: flag, config file, CI, working directory.
fn resolve_root_dir(config: &Config, scan: &ScanArgs, ci: &CiEnvironment) -> Option<PathBuf> {
    scan.root_dir
        .clone()
        .or_else(|| config.scan.root_dir.clone())
        .or_else(|| ci.root_dir.as_ref().map(PathBuf::from))
}

fn run_upload(config_path: Option<&Path>, scan: ScanArgs, upload: UploadArgs) -> Result<()> {
    let config = config::load_or_default(config_path)?;
    let ci = ci::detect(&ci::process_env()).unwrap_or_default();

    let root_dir = resolve_root_dir(&config, &scan, &ci);
    let walk_root = root_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    let framework = upload.framework.or(config.upload.framework);
    let orchestrator = build_orchestrator(&config, &scan, &walk_root)?.with_framework(framework);
    let result = orchestrator.run()?;

    let mut define = upload.define;
    if define.is_empty() {
        define = config.upload.define.clone();
    }

    let options = UploadOptions {
        name: upload.name.or(config.upload.name),
        root_dir: root_dir.map(|dir| dir.to_string_lossy().into_owned()),
        ci_system: upload.ci_system,
        sha: upload.sha,
        build_id: upload.build_id,
        check_run: upload.check_run,
        id_file: Some(upload.id_file.unwrap_or(config.upload.id_file)),
        preset: upload.preset.or(config.upload.preset),
        merge: upload.merge.or(config.upload.merge),
        define,
    };

    let request = UploadRequest::build(result.payload.clone(), &ci, &options);

    if let Some(output) = &upload.output {
        std::fs::write(output, &request.body)
            .with_context(|| format!("Failed to write request body to {}", output.display()))?;
        info!("Wrote {} bytes to {}", request.body_length, output.display());
    }

    report::print_summary(&result, &request);

    let json = serde_json::to_string_pretty(&request)?;
    println!("{}", json);

    Ok(())
}

fn run_detect(config_path: Option<&Path>, scan: ScanArgs, format: &str) -> Result<()> {
    let config = config::load_or_default(config_path)?;
    let ci = ci::detect(&ci::process_env()).unwrap_or_default();

    let walk_root = resolve_root_dir(&config, &scan, &ci).unwrap_or_else(|| PathBuf::from("."));
    let result = build_orchestrator(&config, &scan, &walk_root)?.scan()?;
    let detected = result.detected();

    match format {
        "json" => {
            let buckets: serde_json::Map<String, serde_json::Value> = result
                .classification
                .counts()
                .into_iter()
                .map(|(name, count)| (name.to_string(), count.into()))
                .collect();
            let json = serde_json::json!({
                "framework": detected,
                "scanned": result.scanned.len(),
                "candidates": result.candidates,
                "skipped": result.skipped,
                "buckets": buckets,
                "ci": ci,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            match detected {
                Some(framework) => println!("Detected: {}", framework),
                None => println!("Detected: none"),
            }
            for (name, count) in result.classification.counts() {
                if count > 0 {
                    println!("  {}: {}", name, count);
                }
            }
        }
    }

    Ok(())
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

    match config::load_config(path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("Settings:");
            println!("  Include: {}", config.scan.include.join(" "));
            if !config.scan.exclude.is_empty() {
                println!("  Exclude: {}", config.scan.exclude.join(" "));
            }
            if let Some(root) = &config.scan.root_dir {
                println!("  Root dir: {}", root.display());
            }
            match config.upload.framework {
                Some(framework) => println!("  Framework: {}", framework),
                None => println!("  Framework: detect"),
            }
            if let Some(name) = &config.upload.name {
                println!("  Run name: {}", name);
            }
            println!("  Id file: {}", config.upload.id_file.display());

            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_config(config_path: Option<&Path>, framework: Option<Framework>) -> Result<()> {
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    if path.exists() {
        bail!(
            "{} already exists. Remove it first or edit manually.",
            path.display()
        );
    }

    let framework_line = match framework {
        Some(framework) => format!("framework = \"{}\"", framework),
        None => "# framework = \"junit\"".to_string(),
    };

    let config = format!(
        r#"# report-ci configuration file

[scan]
include = ["*.xml", "*.json", "*.trx", "*.tap"]
exclude = []
# root_dir = "."

[upload]
{}
# name = "Linux build"
id_file = ".report-ci-id.json"
# preset = "default"
# merge = "annotations"
# define = []
"#,
        framework_line
    );

    std::fs::write(path, config)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    println!();
    println!("Edit the configuration as needed, then run:");
    println!("  report-ci upload");

    Ok(())
}
