use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dhcpdash::{Config, DashboardServer, Result};

#[derive(Parser)]
#[command(name = "dhcpdash")]
#[command(author, version, about = "An HTTP dashboard for isc-dhcpd lease files", long_about = None)]
struct Cli {
    /// Config file to use
    #[arg(short, long, env = "DHCPD_CONFIG")]
    config: Option<PathBuf>,

    /// Host on which to listen
    #[arg(short = 'H', long, env = "DHCPD_HTTP_HOST")]
    host: Option<String>,

    /// Port on which to listen
    #[arg(short, long, env = "DHCPD_HTTP_PORT")]
    port: Option<u16>,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// dhcpd.leases(5) file to serve
    #[arg(env = "DHCPD_LEASES_FILE")]
    leases_file: Option<PathBuf>,
}

impl Cli {
    /// Folds CLI and environment values over the config file: a flag (or its
    /// environment fallback, which clap resolves) beats the file, which
    /// beats the defaults.
    fn resolve(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = self.leases_file {
            config.leases_file = Some(path);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = cli.resolve()?;
    let server = DashboardServer::new(config)?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping dashboard...");
            Ok(())
        }
    }
}
