use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use depot_server::{LogFormat, ServerConfig};
use depot_store::{BackendConfig, LocalConfig, S3Config};

#[derive(Parser)]
#[command(
    name = "depot",
    about = "Depot: a private registry for Terraform modules and providers",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the registry server
    Serve(ServeArgs),
    /// Inspect signing keys
    Key(KeyArgs),
    /// Print the storage keys a provider platform maps to
    Layout(LayoutArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Local,
    S3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Text,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Text => LogFormat::Text,
        }
    }
}

/// Flags override the configuration file, which overrides built-in defaults.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long, env = "DEPOT_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "DEPOT_BIND")]
    pub bind: Option<SocketAddr>,
    /// Public URL advertised in service discovery
    #[arg(long, env = "DEPOT_BASE_URL")]
    pub base_url: Option<String>,
    /// Request body limit for uploads, in bytes
    #[arg(long, env = "DEPOT_MAX_UPLOAD_SIZE")]
    pub max_upload_size: Option<usize>,
    #[arg(long, env = "DEPOT_DISABLE_MODULES")]
    pub disable_modules: bool,
    #[arg(long, env = "DEPOT_DISABLE_PROVIDERS")]
    pub disable_providers: bool,
    #[arg(long, env = "DEPOT_BACKEND", value_enum)]
    pub backend: Option<BackendKind>,
    /// Root directory of the local backend
    #[arg(long, env = "DEPOT_ROOT")]
    pub root: Option<PathBuf>,
    /// Bucket of the s3 backend
    #[arg(long, env = "DEPOT_BUCKET")]
    pub bucket: Option<String>,
    #[arg(long, env = "DEPOT_LOG_LEVEL")]
    pub log_level: Option<String>,
    #[arg(long, env = "DEPOT_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormatArg>,
}

impl ServeArgs {
    pub fn load_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut ServerConfig) -> anyhow::Result<()> {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(limit) = self.max_upload_size {
            config.max_upload_size = limit;
        }
        if self.disable_modules {
            config.enable_modules = false;
        }
        if self.disable_providers {
            config.enable_providers = false;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log.format = format.into();
        }

        let is_local = matches!(config.backend, BackendConfig::Local(_));
        match self.backend {
            Some(BackendKind::Local) if !is_local => {
                config.backend = BackendConfig::Local(LocalConfig::default());
            }
            Some(BackendKind::S3) if is_local => {
                let bucket = self
                    .bucket
                    .clone()
                    .context("--bucket is required for the s3 backend")?;
                config.backend = BackendConfig::S3(S3Config::new(bucket));
            }
            _ => {}
        }
        match &mut config.backend {
            BackendConfig::Local(local) => {
                if let Some(root) = &self.root {
                    local.root_path = root.clone();
                }
            }
            BackendConfig::S3(s3) => {
                if let Some(bucket) = &self.bucket {
                    s3.bucket = bucket.clone();
                }
            }
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub action: KeyAction,
}

#[derive(Subcommand)]
pub enum KeyAction {
    /// Decode an ASCII-armored public key and print its identifiers
    Inspect {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args)]
pub struct LayoutArgs {
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub os: String,
    pub arch: String,
}
