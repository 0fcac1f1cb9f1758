mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use ms_av::{FfmpegSegmenter, FfprobeProber, MediaProber, SegmentPlan, ToolRegistry};
use ms_core::config::Config;
use ms_pipeline::{Ingestor, RetentionSweeper};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded first so a RUST_LOG from .env reaches the filter below.
    let dotenv = dotenvy::dotenv();

    // Respect RUST_LOG if set, otherwise pick defaults based on the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediasplit=debug,ms_core=debug,ms_av=trace,ms_pipeline=debug,ms_server=debug,tower_http=debug".to_string()
        } else {
            "mediasplit=info,ms_core=info,ms_av=info,ms_pipeline=info,ms_server=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so command output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = load_config(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            tracing::info!(
                "Starting mediasplit on {}:{}",
                config.server.host,
                config.server.port
            );
            runtime()?.block_on(ms_server::start(config))?;
            Ok(())
        }
        Commands::Split { file, size } => split_file(&file, size, cli.config.as_deref()),
        Commands::Probe { file, size, json } => {
            probe_file(&file, size, json, cli.config.as_deref())
        }
        Commands::Sweep => sweep(cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediasplit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}

/// Config file (or defaults), then `MEDIASPLIT_*` environment overrides.
fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env();
    config
}

fn target_size(config: &Config, size: Option<i64>) -> i64 {
    size.unwrap_or_else(|| i64::from(config.split.default_size_mb))
}

fn split_file(file: &Path, size: Option<i64>, config_path: Option<&Path>) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("Input file does not exist: {}", file.display());
    }

    let config = load_config(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProber::from_registry(&tools, config.split.probe_timeout())?;
    let segmenter = FfmpegSegmenter::from_registry(&tools, config.split.segment_timeout())?;
    let ingestor = Ingestor::from_config(&config, Arc::new(prober), Arc::new(segmenter));

    let target = target_size(&config, size);
    let urls = runtime()?
        .block_on(ingestor.split_local_file(file, target))
        .with_context(|| format!("failed to split {}", file.display()))?;

    for url in urls {
        println!("{url}");
    }
    Ok(())
}

fn probe_file(
    file: &Path,
    size: Option<i64>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let config = load_config(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProber::from_registry(&tools, config.split.probe_timeout())?;

    let probed = runtime()?.block_on(prober.probe(file));
    let probe = match probed {
        Ok(probe) => Some(probe),
        Err(e) if e.is_unusable_output() => {
            tracing::warn!("Unusable probe output: {e}");
            None
        }
        Err(e) => return Err(e).context(format!("failed to probe {}", file.display())),
    };

    let target = target_size(&config, size);
    let plan = SegmentPlan::for_target_with_fallback(
        target,
        probe.map(|p| p.bitrate()),
        config.split.fallback_segment_secs,
    )?;

    if json {
        let report = serde_json::json!({
            "file": file,
            "probe": probe,
            "bitrate": probe.map(|p| p.bitrate()),
            "target_size_mb": target,
            "plan": plan,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    match probe {
        Some(p) => {
            let secs = p.duration_secs as u64;
            println!(
                "Duration: {:02}:{:02}:{:02} ({:.3}s)",
                secs / 3600,
                (secs / 60) % 60,
                secs % 60,
                p.duration_secs
            );
            println!("Size: {} bytes", p.size_bytes);
            println!("Bitrate: {:.0} bit/s", p.bitrate());
        }
        None => println!("Duration/size: unavailable"),
    }
    println!(
        "Segments for {target} MB: {:.3}s each{}",
        plan.segment_secs,
        if plan.is_fallback { " (fallback)" } else { "" }
    );
    Ok(())
}

fn sweep(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let sweeper = RetentionSweeper::from_config(&config);
    let swept = sweeper.sweep_now();
    println!(
        "Swept {swept} entries older than {}h from {}",
        config.retention.max_age_hours,
        sweeper.dir().display()
    );
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = load_config(config_path);
    let tools = runtime()?.block_on(ToolRegistry::discover(&config.tools).check_all());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to split media.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            Config::load(p).with_context(|| format!("invalid config {}", p.display()))?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Locators: {}/<file>", config.server.locator_prefix());
    println!("  Storage: {}", config.storage.dir().display());
    println!(
        "  Retention: {}h, swept every {}h",
        config.retention.max_age_hours, config.retention.sweep_interval_hours
    );

    let warnings = config.validate();
    for warning in &warnings {
        println!("  ⚠ {warning}");
    }

    Ok(())
}
