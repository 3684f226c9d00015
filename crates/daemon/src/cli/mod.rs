use clap::Parser;

pub mod op;
pub mod ops;

pub use op::{Op, OpContext};

pub const DEFAULT_REMOTE: &str = "http://localhost:5000";

#[derive(Parser, Debug)]
#[command(name = "libris", version, about = "Book catalog service")]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,

    /// Address of a running daemon, for client commands
    #[arg(long, global = true, default_value = DEFAULT_REMOTE)]
    pub remote: String,

    #[command(subcommand)]
    pub command: ops::Command,
}
