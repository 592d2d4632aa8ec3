pub mod commands;

use clap::{Parser, Subcommand};

use crate::database::Database;
use crate::server;

#[derive(Parser)]
#[command(name = "anitomo", about = "Anitomo API administration CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Port to bind (falls back to ANITOMO_API_PORT / PORT / 3000)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Apply pending database migrations
    InitDb,

    /// Create an account, optionally with elevated roles
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Comma-separated roles (user, editor, moderator, admin)
        #[arg(long, default_value = "user")]
        roles: String,
    },

    /// Seed the reference-data tables with a starter set
    Seed,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or_else(server::resolve_port);
            server::serve(port).await
        }
        Command::InitDb => {
            Database::migrate().await?;
            println!("Migrations applied");
            Ok(())
        }
        Command::CreateUser { username, email, password, roles } => {
            commands::user::create_user(&username, &email, &password, &roles).await
        }
        Command::Seed => commands::seed::seed_reference_data().await,
    }
}
