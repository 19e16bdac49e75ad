mod cli;

use streamforge::{config, encoding, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamforge=trace,tower_http=debug".to_string()
        } else {
            "streamforge=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config::load_config_or_default(cli.config.as_deref())?;
            config.server.host = host;
            config.server.port = port;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::start_server(config))
        }
        Commands::Encode { force } => run_encode(cli.config.as_deref(), force),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("streamforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_encode(config_path: Option<&std::path::Path>, force: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let root = config::storage_root(&config)?;

    tracing::info!("Encoding sources under {:?}", root);

    let executor = encoding::EncodeExecutor::new(&config);
    let report = executor.run_batch(&root, force)?;

    println!(
        "Encoding finished. encoded={} skipped={} failed={}",
        report.encoded,
        report.skipped,
        report.failed.len()
    );
    for (asset_id, reason) in &report.failed {
        println!("  failed {}: {}", asset_id, reason);
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} encodes failed", report.failed.len(), report.total())
    }
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    match which::which(&config.tools.ffmpeg) {
        Ok(path) => {
            println!("✓ ffmpeg - {}", path.display());
            println!("\nAll required tools are available!");
        }
        Err(_) => {
            println!("✗ ffmpeg ({})", config.tools.ffmpeg.display());
            println!("\nffmpeg is missing. Install it to enable encoding.");
        }
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            match &config.storage.root {
                Some(root) => println!("  Storage root: {}", root.display()),
                None => println!("  Storage root: (unset)"),
            }
            println!("  Cache-Control: {}", config.storage.cache_control);
            println!(
                "  Encoding: {}s segments, crf {}, {}",
                config.encoding.segment_seconds, config.encoding.crf, config.encoding.scale
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
