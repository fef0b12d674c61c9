mod config;
mod http;

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_authn::issue_token;
use platform_authz::{Role, Viewer};
use platform_db::{DatabaseSettings, DbPool, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{EmployeeTransformer, InputMode, add_training_entry};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "hr-server", version, about = "Employee records service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert demo employees and training-list entries into an empty database.
    Seed,
    /// Print a bearer token for local use.
    #[command(name = "token:issue")]
    TokenIssue(TokenCommand),
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[derive(Args, Debug)]
struct TokenCommand {
    /// Subject of the token; a fresh id when omitted.
    #[arg(long)]
    user_id: Option<Uuid>,
    #[arg(long = "role", default_value = "HR")]
    roles: Vec<Role>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::from_env("hr-server"))?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, Arc::new(AppConfig::load()?)).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed => run_seed().await,
        Command::TokenIssue(cmd) => token_issue(cmd, &AppConfig::load()?),
    }
}

fn token_issue(cmd: TokenCommand, config: &AppConfig) -> Result<()> {
    let user_id = cmd.user_id.unwrap_or_else(Uuid::new_v4);
    let token = issue_token(user_id, &cmd.roles, &config.auth)?;
    println!("{token}");
    Ok(())
}

async fn run_seed() -> Result<()> {
    let pool = setup_pool().await?;
    ensure_migrations(&pool, false).await?;
    if entity::employee::Entity::find().count(&pool).await? > 0 {
        info!("employees already present; skipping seed");
        return Ok(());
    }

    for login in ["jdoe", "asmith", "mlee"] {
        add_training_entry(&pool, login).await?;
    }

    let seeder = Viewer::new(Uuid::new_v4(), vec![Role::Admin]);
    let transformer = EmployeeTransformer::short();
    let boss = transformer
        .deserialize(
            &json!({"additional_info": {
                "full_name": "Alex Boss",
                "email": "aboss@example.com",
                "position": "Head of Engineering",
                "department": "Engineering",
            }}),
            InputMode::Create,
        )?;
    let boss = transformer.create(&pool, &seeder, boss).await?;
    let report = transformer
        .deserialize(
            &json!({
                "manager": boss.employee_id,
                "additional_info": {
                    "full_name": "Jane Doe",
                    "email": "jdoe@example.com",
                    "position": "Engineer",
                    "department": "Engineering",
                    "start_date": "2025-03-01",
                },
            }),
            InputMode::Create,
        )?;
    transformer.create(&pool, &seeder, report).await?;
    info!(creator_id = %seeder.user_id, "seed data inserted");
    Ok(())
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = setup_pool().await?;
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let state = AppState { pool, config };
    http::serve(cmd.into(), state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p server -- migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
