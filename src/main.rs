use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sdkprobe::engine::{AnalysisMode, Engine, ProbeConfig};
use sdkprobe::report::{self, ReportFormat};
use sdkprobe::{config, ProbeResult, SplitMerger};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sdkprobe",
    about = "Android SDK evidence engine: reconstruct split packages, prove or disprove SDK presence"
)]
#[command(version)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a package, split container or decompiled tree
    Analyze {
        /// .apk, .xapk/.apks/.apkm, a zip of .apk files, or a decompiled directory
        input: PathBuf,

        /// Keyword to search for (repeatable); omit for a full inventory
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Full inventory even if keywords are configured elsewhere
        #[arg(long, conflicts_with = "keywords")]
        list_all: bool,

        /// Report file name (default derived from the package id)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory for the report file
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Library reference database (name|description|vendor[|version])
        #[arg(long)]
        library_db: Option<PathBuf>,

        /// Competitor name list
        #[arg(long)]
        competitors: Option<PathBuf>,

        /// Keep scratch, decompiled and raw trees
        #[arg(long)]
        keep: bool,

        /// Configuration file (default: ./.sdkprobe.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,

        /// Maximum files read by the code content search
        #[arg(long)]
        code_scan_cap: Option<usize>,

        /// Decompiler launcher
        #[arg(long)]
        decompiler: Option<PathBuf>,
    },

    /// Reconstruct a split container into a single package
    Merge {
        /// Split container (.xapk/.apks/.apkm)
        split: PathBuf,

        /// Output package path
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(e.class().exit_code() as u8)
        }
    }
}

fn run(command: Commands) -> ProbeResult<()> {
    match command {
        Commands::Analyze {
            input,
            keywords,
            list_all,
            output,
            output_dir,
            library_db,
            competitors,
            keep,
            config: config_path,
            format,
            code_scan_cap,
            decompiler,
        } => {
            let mut cfg = config::resolve(config_path.as_deref())?;
            apply_overrides(
                &mut cfg,
                Overrides { output_dir, library_db, competitors, keep, format, code_scan_cap, decompiler },
            );

            let mode = if list_all {
                AnalysisMode::Inventory
            } else {
                AnalysisMode::from_keywords(&keywords)?
            };

            let engine = Engine::new(cfg.clone());
            let analysis = engine.run(&input, mode)?;
            let (path, text) =
                report::write_report(&analysis, cfg.report_format, &cfg.output_dir, output.as_deref())?;
            println!("{}", text);
            eprintln!("Report saved to {}", path.display());
            Ok(())
        }
        Commands::Merge { split, out } => {
            let outcome = SplitMerger::new().merge(&split, &out)?;
            println!(
                "Merged {} + {} architecture split(s) + {} other split(s) into {} ({} bytes)",
                outcome.base,
                outcome.architecture_splits.len(),
                outcome.config_splits.len(),
                outcome.output.display(),
                outcome.output_bytes
            );
            for c in &outcome.collisions {
                println!("  collision: {} (overwritten by {})", c.path.display(), c.overwritten_by);
            }
            for name in &outcome.rejected_entries {
                println!("  skipped unsafe entry: {}", name);
            }
            Ok(())
        }
    }
}

struct Overrides {
    output_dir: Option<PathBuf>,
    library_db: Option<PathBuf>,
    competitors: Option<PathBuf>,
    keep: bool,
    format: Option<ReportFormat>,
    code_scan_cap: Option<usize>,
    decompiler: Option<PathBuf>,
}

/// Command-line flags win over the configuration file
fn apply_overrides(cfg: &mut ProbeConfig, o: Overrides) {
    if let Some(dir) = o.output_dir {
        cfg.output_dir = dir;
    }
    if o.library_db.is_some() {
        cfg.library_db = o.library_db;
    }
    if o.competitors.is_some() {
        cfg.competitor_list = o.competitors;
    }
    if o.keep {
        cfg.keep_workdirs = true;
    }
    if let Some(f) = o.format {
        cfg.report_format = f;
    }
    if let Some(cap) = o.code_scan_cap {
        cfg.code_scan_file_cap = cap;
    }
    if let Some(d) = o.decompiler {
        cfg.decompiler = d;
    }
}
