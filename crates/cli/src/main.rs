use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mediarelay")]
#[command(about = "mediarelay: WhatsApp media relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory, a default config.json and the download directory. Set relay.baseUrl (or MEDIARELAY_RELAY_URL) before running the gateway.
    Init {
        /// Config file path (default: MEDIARELAY_CONFIG_PATH or ~/.mediarelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway: POST /twilio_webhook (Twilio) and POST /webhook (Infobip).
    Gateway {
        /// Config file path (default: MEDIARELAY_CONFIG_PATH or ~/.mediarelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 5000)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("mediarelay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(mediarelay::config::default_config_path);
    let dir = mediarelay::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    println!("set relay.baseUrl in {} before starting the gateway", path.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = mediarelay::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    mediarelay::gateway::run_gateway(config, path).await
}
