pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "gatectl")]
#[command(about = "Inspect and exercise the institute authorization gate")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show or validate the role-path registry")]
    Registry {
        #[command(subcommand)]
        cmd: commands::registry::RegistryCommands,
    },

    #[command(about = "Evaluate the gate decision for a path without a server")]
    Check(commands::check::CheckArgs),

    #[command(about = "Mint a signed session token")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Registry { cmd } => commands::registry::handle(cmd, output_format),
        Commands::Check(args) => commands::check::handle(args, output_format),
        Commands::Token(args) => commands::token::handle(args, output_format),
    }
}
