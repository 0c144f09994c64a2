use clap::Parser;
use shortcut_core::{BackendKind, Config, Environment};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shortcut-organizer", version, about = "Shortcut Organizer host process")]
struct Args {
    /// Use the development data set
    #[arg(long)]
    dev: bool,
    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Preferred storage backend (sqlite or json)
    #[arg(long)]
    backend: Option<BackendKind>,
    /// Flat-file write coalescing window in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = Config::from_env()?;
        if self.dev {
            config.environment = Environment::Development;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    shortcut_organizer_lib::run(config).await
}
