use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the cafe binary.
#[derive(Debug, Parser)]
#[command(name = "cafe", version, about = "Cafe demo service")]
pub struct CliArgs {
    /// Extra TOML file layered over `config/default` and `./cafe`.
    #[arg(long = "config-file", env = "CAFE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Directory holding the `.env.dev` / `.env.prod` files.
    #[arg(
        long = "env-dir",
        env = "CAFE_ENV_DIR",
        value_name = "DIR",
        default_value = "."
    )]
    pub env_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Load and validate configuration, print a redacted summary, then exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Interface to bind.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Port to bind.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Seconds to wait for in-flight requests on shutdown.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Base log level; `RUST_LOG` still takes precedence.
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the primary database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle schema synchronisation on the primary database.
    #[arg(
        long = "database-synchronize",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub database_synchronize: Option<bool>,

    /// Override the secondary database connection URL.
    #[arg(long = "secondary-url", value_name = "URL")]
    pub secondary_url: Option<String>,

    /// Override the secondary database pool size.
    #[arg(long = "secondary-max-connections", value_name = "COUNT")]
    pub secondary_max_connections: Option<u32>,

    /// Override the document store connection string.
    #[arg(long = "document-uri", value_name = "URI")]
    pub document_uri: Option<String>,

    /// Toggle the global error-translation filter.
    #[arg(
        long = "policies-error-filter",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub policies_error_filter: Option<bool>,
}
