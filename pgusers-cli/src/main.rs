//! pgusers CLI - users, sessions and events on PostgreSQL
//!
//! Connects with settings from flags, environment and ./pgusers.toml
//! (password from DATABASE_PASSWORD only), creates tables on demand and
//! runs one subcommand. Every error propagates here and ends the process
//! with a non-zero exit code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pgusers_db::ConnectionHandle;
use tracing::debug;

mod commands;
mod config;
mod tracing_setup;

use config::{DbArgs, PgusersConfig};
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "pgusers",
    author,
    version,
    about = "Create and query the users, sessions and events tables on PostgreSQL"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(flatten)]
    db: DbArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect, ping and disconnect
    Check,
    /// Create the users, sessions and events tables if missing
    Setup,
    /// Insert a user
    AddUser(commands::AddUserArgs),
    /// Look up a user by username
    GetUser(commands::GetUserArgs),
    /// Insert a session for a user
    AddSession(commands::AddSessionArgs),
    /// List the sessions stored for a user
    Sessions(commands::SessionsArgs),
    /// Insert an event
    AddEvent(commands::EventArgs),
    /// List events of a type
    Events(commands::EventArgs),
    /// Run the demonstration sequence (user + two sessions + lookup)
    Demo(commands::DemoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so env-backed flags see .env values
    let env_file = dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug })?;
    match env_file {
        Some(path) => debug!("Loaded .env from {}", path.display()),
        None => debug!("No .env file found, using environment only"),
    }

    let password = config::database_password()?;
    let connection = PgusersConfig::load().connection(&cli.db, password);

    let mut handle = ConnectionHandle::connect(connection)
        .await
        .context("Couldn't connect to database")?;

    let outcome = run(cli.command, &handle).await;
    let closed = handle
        .close()
        .await
        .context("Couldn't close database connection");

    outcome?;
    closed
}

async fn run(command: Commands, handle: &ConnectionHandle) -> Result<()> {
    match command {
        Commands::Check => {
            commands::check(handle);
            Ok(())
        }
        Commands::Setup => commands::setup(handle).await,
        Commands::AddUser(args) => commands::add_user(handle, args).await,
        Commands::GetUser(args) => commands::get_user(handle, args).await,
        Commands::AddSession(args) => commands::add_session(handle, args).await,
        Commands::Sessions(args) => commands::list_sessions(handle, args).await,
        Commands::AddEvent(args) => commands::add_event(handle, args).await,
        Commands::Events(args) => commands::list_events(handle, args).await,
        Commands::Demo(args) => commands::demo(handle, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_connection_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "pgusers", "--host", "db", "--port", "6543", "--database", "app", "get-user", "alice",
        ])
        .unwrap();
        assert_eq!(cli.db.host.as_deref(), Some("db"));
        assert_eq!(cli.db.port.as_deref(), Some("6543"));
        assert_eq!(cli.db.database.as_deref(), Some("app"));
        assert!(matches!(cli.command, Commands::GetUser(ref a) if a.username == "alice"));
    }

    #[test]
    fn add_session_defaults_to_active() {
        let cli = Cli::try_parse_from(["pgusers", "add-session", "--user-id", "u1"]).unwrap();
        match cli.command {
            Commands::AddSession(args) => {
                assert_eq!(args.user_id, "u1");
                assert!(!args.inactive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn demo_has_default_password() {
        let cli = Cli::try_parse_from(["pgusers", "demo"]).unwrap();
        match cli.command {
            Commands::Demo(args) => {
                assert!(args.username.is_none());
                assert_eq!(args.password, "thisisthepassword");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
