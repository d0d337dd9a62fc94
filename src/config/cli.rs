use crate::config::toml_config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "pretty-map")]
#[command(about = "Render stylized boundary maps for a place name or coordinate pair")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override server.host from config
    #[arg(long)]
    pub host: Option<String>,

    /// Override server.port from config
    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn load_config(&self) -> crate::utils::error::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        // 命令列參數優先於設定檔
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        Ok(config)
    }
}
