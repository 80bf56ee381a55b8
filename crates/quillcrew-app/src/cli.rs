use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use quillcrew_types::{DEFAULT_BIND_ADDR, DEFAULT_ENGINE_URL};

/// CLI arguments for quillcrew
#[derive(Parser)]
#[command(name = "quillcrew")]
#[command(about = "Quillcrew - an AI writing team behind a local HTTP endpoint")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server and browser UI
    Serve(ServeArgs),

    /// Send one writing request from the terminal and print the replies
    Ask(AskArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Bind address for the HTTP server
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// Base URL of the orchestration engine
    #[arg(long, env = "QUILLCREW_ENGINE_URL", default_value = DEFAULT_ENGINE_URL)]
    pub engine_url: String,

    /// Team configuration file, exported to the process environment.
    /// Can also be set directly via QUILLCREW_TEAM_FILE.
    #[arg(long, value_name = "PATH")]
    pub team_file: Option<String>,

    /// Directory with the compiled browser UI assets, served under /static
    #[arg(long, value_name = "DIR")]
    pub web_dir: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct AskArgs {
    /// The writing request to send to the team
    pub task: String,

    /// Base URL of a running quillcrew server
    #[arg(long, default_value = "http://127.0.0.1:8084")]
    pub base_url: String,

    /// Dump the full JSON envelope after the replies
    #[arg(long)]
    pub debug: bool,

    /// Pretty-print the JSON dump (only useful with --debug)
    #[arg(long)]
    pub pretty: bool,
}
