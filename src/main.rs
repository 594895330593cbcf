mod cli;

use deskcast::{
    config::{self, Config, LoggingConfig},
    control,
    encoder::EncoderSupervisor,
    logging,
    quality::QualityController,
    segments::SegmentStore,
    server::{self, AppContext},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn start_server(config: Config) -> Result<()> {
    tracing::info!("=== deskcast starting ===");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    config::log_warnings(&config);

    let config = Arc::new(config);

    // Encoder supervisor: reaps orphans, clears the stream dir, starts ffmpeg
    let store = SegmentStore::new(&config.encoder.stream_dir);
    let quality = QualityController::new(config.encoder.default_quality);
    let (supervisor, supervisor_task) =
        EncoderSupervisor::spawn(config.encoder.clone(), store, quality).await;

    // Every shutdown trigger cancels the same token
    let shutdown = CancellationToken::new();

    let stop_watcher = control::start_stop_flag_watcher(
        config.control.stop_flag.clone(),
        Duration::from_secs(config.control.stop_poll_secs),
        shutdown.clone(),
    );

    // The encoder stops the moment shutdown starts, not after HTTP drains
    let encoder_stop = supervisor.shutdown_on(shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        signal_token.cancel();
    });

    let ctx = AppContext::new(config.clone(), supervisor.clone());
    let server_result = server::start_server(&config, ctx, shutdown.clone()).await;

    // Cleanup
    tracing::info!("Shutting down...");
    shutdown.cancel();
    let _ = encoder_stop.await;
    let _ = supervisor_task.await;
    let _ = stop_watcher.await;
    tracing::info!("Goodbye.");

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = config::load_config_or_default(cli.config.as_deref())?;

            // Override host/port from CLI if specified
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            logging::init_logging(cli.verbose, &config.logging)?;

            // Create tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(config))
        }
        Commands::Stop => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            control::request_stop(&config.control.stop_flag)?;
            println!(
                "Stop requested via {}",
                config.control.stop_flag.display()
            );
            Ok(())
        }
        Commands::CheckTools => {
            init_console_logging(cli.verbose)?;
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&config)
        }
        Commands::Validate { file } => {
            init_console_logging(cli.verbose)?;
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("deskcast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_console_logging(verbose: bool) -> Result<()> {
    let console_only = LoggingConfig {
        file: None,
        ..Default::default()
    };
    logging::init_logging(verbose, &console_only)
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tool = deskcast_av::check_encoder(config.encoder.ffmpeg_path.as_deref());
    let status = if tool.available { "✓" } else { "✗" };

    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("The encoder is available!");
    } else {
        println!("ffmpeg was not found. Install it or set encoder.ffmpeg_path.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };
    config::log_warnings(&config);

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Stream dir: {}", config.encoder.stream_dir.display());
    println!("  Default quality: {}", config.encoder.default_quality);
    println!(
        "  Restart delay: {} ms",
        config.encoder.restart_delay_ms
    );
    println!("  Browse roots: {}", config.browse.roots.len());
    for root in &config.browse.roots {
        println!("    {}", root.display());
    }
    println!("  Stop flag: {}", config.control.stop_flag.display());

    Ok(())
}
