use anyhow::Result;
use clap::Parser;
use std::env;

use quillcrew::{Cli, Commands, ServeArgs};
use quillcrew_types::TEAM_FILE_ENV;

use quillcrew::client::run_ask;
use quillcrew::web::server::{WebServer, WebServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => run_serve(args).await,
        Some(Commands::Ask(args)) => run_ask(&args).await,
        None => {
            println!("No subcommand provided. Try 'quillcrew-cli serve' or 'quillcrew-cli ask <text>'.");
            Ok(())
        }
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    // Bridge the CLI flag to the request-time environment lookup
    if let Some(team_file) = &args.team_file {
        env::set_var(TEAM_FILE_ENV, team_file);
    }

    let config = WebServerConfig {
        bind_addr: args.bind.parse()?,
        engine_url: args.engine_url,
        web_dir: args.web_dir,
    };

    WebServer::new(config).start().await
}
