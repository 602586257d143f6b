use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use pack_reorganizer::{
    reorganize_pack, AppConfig, CollisionPolicy, ReorganizeConfig, ReorganizeReport, TransferMode,
};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = Command::new("pack-reorganizer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Moves resource-pack textures, models and sounds into their canonical subfolders")
        .arg(
            Arg::new("root")
                .value_name("ROOT")
                .help("Pack root to reorganize")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("."),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Set the log level (trace, debug, info, warn, error)")
                .default_value("info"),
        )
        .arg(
            Arg::new("copy")
                .long("copy")
                .help("Copy files instead of moving them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("on-collision")
                .long("on-collision")
                .value_name("POLICY")
                .help("What to do when the destination already holds a different file")
                .value_parser(["overwrite", "rename", "skip"])
                .default_value("overwrite"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Report what would be moved without touching any file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("merge-manifests")
                .long("merge-manifests")
                .help("Merge nested sounds.json and fonts.json into the pack root")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keep-empty-dirs")
                .long("keep-empty-dirs")
                .help("Keep directories that end up empty after moving")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the run report as JSON on stdout")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config = create_app_config(&matches)?;

    initialize_logging(&config.log_level)?;

    run_application(config)
}

/// Builds the application configuration from CLI arguments
fn create_app_config(matches: &clap::ArgMatches) -> Result<AppConfig> {
    let root = matches
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| "info".to_string());

    let collision: CollisionPolicy = matches
        .get_one::<String>("on-collision")
        .map(|value| value.parse::<CollisionPolicy>())
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))?
        .unwrap_or_default();

    let mode = if matches.get_flag("copy") {
        TransferMode::Copy
    } else {
        TransferMode::Move
    };

    Ok(AppConfig {
        root,
        reorganize: ReorganizeConfig {
            mode,
            collision,
            dry_run: matches.get_flag("dry-run"),
            merge_manifests: matches.get_flag("merge-manifests"),
            keep_empty_dirs: matches.get_flag("keep-empty-dirs"),
        },
        log_level,
        json: matches.get_flag("json"),
    })
}

/// Initialize structured logging with tracing
fn initialize_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn run_application(config: AppConfig) -> Result<()> {
    info!("Starting pack reorganizer");
    info!("Configuration: {:?}", config);

    let report = match reorganize_pack(&config.root, &config.reorganize) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return Err(e).context("Reorganization aborted");
        }
    };

    if config.json {
        let rendered = serde_json::to_string_pretty(&report).context("Failed to render report")?;
        println!("{}", rendered);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ReorganizeReport) {
    info!("=== REORGANIZATION REPORT ===");
    info!("Pack root: {}", report.root);
    info!("Collision policy: {}", report.collision);
    if report.dry_run {
        info!("Dry run: {} files would be relocated", report.planned);
    } else {
        info!("Relocated: {}", report.relocated);
    }
    info!("Already in place: {}", report.in_place);
    info!("Identical at destination: {}", report.identical);
    info!("Skipped on collision: {}", report.skipped);
    info!("Unrecognized (left untouched): {}", report.unrecognized);
    info!("Pack metadata and manifests left untouched: {}", report.reserved);
    info!("Empty directories removed: {}", report.pruned_dirs);

    if let Some(manifests) = &report.manifests {
        for merged in manifests.sounds.iter().chain(manifests.fonts.iter()) {
            info!(
                "Manifest {}: {} sources, {} invalid, written: {}",
                merged.target, merged.sources, merged.invalid, merged.written
            );
        }
    }

    if report.has_errors() {
        warn!("{} files could not be relocated:", report.errors.len());
        for err in &report.errors {
            error!("  {}", err.error);
        }
    }
}
