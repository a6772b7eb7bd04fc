//! Subcommand implementations
//!
//! Each command borrows the open handle, builds the gateways it needs
//! (creating their tables if missing) and prints records as JSON.

use anyhow::{bail, Context, Result};
use clap::Args;
use pgusers_db::{ConnectionHandle, EventsTable, SessionsTable, UsersTable};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Password used by `demo` when none is given
const DEMO_PASSWORD: &str = "thisisthepassword";

#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Unique username
    #[arg(long)]
    pub username: String,

    /// Password (stored as given)
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct GetUserArgs {
    /// Username to look up
    pub username: String,
}

#[derive(Args, Debug)]
pub struct AddSessionArgs {
    /// Id of the user owning the session
    #[arg(long)]
    pub user_id: String,

    /// Store the session as inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Args, Debug)]
pub struct SessionsArgs {
    /// Id of the user whose sessions to list
    pub user_id: String,
}

#[derive(Args, Debug)]
pub struct EventArgs {
    /// Event type
    #[arg(value_name = "TYPE")]
    pub kind: String,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Username for the demo user (default: generated)
    #[arg(long)]
    pub username: Option<String>,

    /// Password for the demo user
    #[arg(long, default_value = DEMO_PASSWORD)]
    pub password: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn check(handle: &ConnectionHandle) {
    println!("Connected to database {}", handle.config().database);
}

pub async fn setup(handle: &ConnectionHandle) -> Result<()> {
    UsersTable::new(handle).await?;
    SessionsTable::new(handle).await?;
    EventsTable::new(handle).await?;
    info!("Tables users, sessions and events are ready");
    Ok(())
}

pub async fn add_user(handle: &ConnectionHandle, args: AddUserArgs) -> Result<()> {
    let users = UsersTable::new(handle).await?;
    let user = users
        .insert_user(&args.username, &args.password)
        .await
        .with_context(|| format!("Couldn't add user '{}'", args.username))?;
    print_json(&user)
}

pub async fn get_user(handle: &ConnectionHandle, args: GetUserArgs) -> Result<()> {
    let users = UsersTable::new(handle).await?;
    match users.get_by_username(&args.username).await? {
        Some(user) => print_json(&user),
        None => bail!("No user named '{}'", args.username),
    }
}

pub async fn add_session(handle: &ConnectionHandle, args: AddSessionArgs) -> Result<()> {
    let sessions = SessionsTable::new(handle).await?;
    let session = sessions
        .insert_session(&args.user_id, !args.inactive)
        .await
        .with_context(|| format!("Couldn't insert session for user {}", args.user_id))?;
    print_json(&session)
}

pub async fn list_sessions(handle: &ConnectionHandle, args: SessionsArgs) -> Result<()> {
    let sessions = SessionsTable::new(handle).await?;
    print_json(&sessions.list_for_user(&args.user_id).await?)
}

pub async fn add_event(handle: &ConnectionHandle, args: EventArgs) -> Result<()> {
    let events = EventsTable::new(handle).await?;
    print_json(&events.insert_event(&args.kind).await?)
}

pub async fn list_events(handle: &ConnectionHandle, args: EventArgs) -> Result<()> {
    let events = EventsTable::new(handle).await?;
    print_json(&events.list_by_type(&args.kind).await?)
}

/// Fixed demonstration: a user with one active and one inactive session.
pub async fn demo(handle: &ConnectionHandle, args: DemoArgs) -> Result<()> {
    let users = UsersTable::new(handle).await?;
    let sessions = SessionsTable::new(handle).await?;

    let username = args
        .username
        .unwrap_or_else(|| format!("demo-{}", Uuid::new_v4().simple()));

    let user = users
        .insert_user(&username, &args.password)
        .await
        .with_context(|| format!("Couldn't add demo user '{}'", username))?;
    info!(id = %user.id, %username, "Demo user created");
    print_json(&user)?;

    for active in [true, false] {
        let session = sessions.insert_session(&user.id, active).await?;
        print_json(&session)?;
    }

    let found = users
        .get_by_username(&username)
        .await?
        .with_context(|| format!("Demo user '{}' not found after insert", username))?;
    print_json(&found)
}
