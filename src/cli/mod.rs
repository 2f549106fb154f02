pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "siteledger-admin")]
#[command(about = "SiteLedger admin - database and account maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Issue an access token for a user id")]
    Token {
        #[arg(help = "User id (UUID)")]
        user_id: uuid::Uuid,
        #[arg(long, help = "Token lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<i64>,
    },

    #[command(about = "Set a new password for an account")]
    ResetPassword {
        #[arg(help = "Account email")]
        email: String,
        #[arg(help = "New password")]
        password: String,
    },

    #[command(about = "Check a running server's /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
        Commands::Migrate => commands::user::migrate(output_format).await,
        Commands::Token { user_id, hours } => commands::user::token(user_id, hours, output_format).await,
        Commands::ResetPassword { email, password } => {
            commands::user::reset_password(&email, &password, output_format).await
        }
        Commands::Health { url } => commands::server::health(&url, output_format).await,
    }
}
