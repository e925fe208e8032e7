use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use tokio::signal;
use virtual_ess_peripheral::config::{self, Config};
use virtual_ess_peripheral::ess::CATALOG;
use virtual_ess_peripheral::peripheral;

#[derive(Parser)]
#[command(name = "virtual-ess-peripheral")]
#[command(about = "Virtual Environmental Sensing peripheral with trigger-driven notifications")]
struct Cli {
    /// JSON configuration file (defaults to the user config directory)
    #[arg(long, env = "ESS_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Print the channel catalog as JSON and exit
    #[arg(long)]
    catalog: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load_config(cli: &Cli) -> virtual_ess_peripheral::error::Result<Config> {
    let path = cli
        .config
        .clone()
        .or_else(|| config::default_config_path().filter(|p| p.exists()));

    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::load(&path)?
        }
        None => return Config::from_env(),
    };
    config.with_env()
}

fn main() {
    // Load .env file before anything else, while still single-threaded
    config::load_dotenv();
    init_logger();

    let cli = Cli::parse();

    if cli.catalog {
        match serde_json::to_string_pretty(CATALOG) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to encode catalog: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(serve(config));
}

async fn serve(config: Config) {
    info!("Starting Virtual ESS Peripheral");
    info!("  Device Name: {}", config.device.device_name);
    info!("  Handle Base: 0x{:04X}", config.device.handle_base);
    match config.sampling.default_interval_secs {
        Some(secs) => info!("  Default Trigger: every {} s", secs),
        None => info!("  Default Trigger: inactive"),
    }

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    };

    if let Err(e) = peripheral::run(config, shutdown).await {
        error!("Peripheral error: {}", e);
        std::process::exit(1);
    }

    info!("Virtual ESS Peripheral stopped");
}
