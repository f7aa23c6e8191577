use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::Value;

use tavle_client::columns::ColumnSync;
use tavle_client::error::{AuthError, SessionError};
use tavle_client::session::SessionManager;
use tavle_client::token_store::{FileTokenStore, TokenStore};
use tavle_client::transport::HttpTransport;
use tavle_client::ReportClient;
use tavle_common::models::column::{humanize_header, ColumnDescriptor, ColumnUpdate};
use tavle_common::models::report::ReportPeriod;
use tavle_common::models::theme::Theme;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "tavle", version, about = "Tavle CLI - employee report console")]
struct Cli {
    /// Server URL
    #[arg(long, env = "TAVLE_URL")]
    server: Option<String>,

    /// Directory holding the session token files
    #[arg(long, env = "TAVLE_STATE_DIR")]
    state_dir: Option<String>,

    /// CSRF token sent with login requests
    #[arg(long, env = "TAVLE_CSRF_TOKEN")]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session tokens
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Fetch the employee report for a date range
    Employees {
        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
    },
    /// Inspect or change the column workspace
    Columns {
        #[command(subcommand)]
        command: ColumnsCommand,
    },
    /// Show or change the display theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    /// Read or write a raw preference key
    Option {
        #[command(subcommand)]
        command: OptionCommand,
    },
}

#[derive(Subcommand)]
enum ColumnsCommand {
    /// Print the current workspace
    Show,
    /// Hide a column
    Hide { key: String },
    /// Make a hidden column visible again
    Unhide { key: String },
    /// Reorder columns (complete list of keys, left to right)
    Order { keys: Vec<String> },
    /// Set a session-local pixel width for a column
    Width { key: String, width: f64 },
}

#[derive(Subcommand)]
enum ThemeCommand {
    /// Print the stored theme
    Get,
    /// Set the theme (light or dark)
    Set { theme: String },
    /// Switch to the other theme
    Toggle,
}

#[derive(Subcommand)]
enum OptionCommand {
    /// Print a stored preference value
    Get { key: String },
    /// Overwrite a preference value (JSON, or a bare string)
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let file_config = match std::env::var("TAVLE_CONFIG") {
        Ok(path) => config::load_config(&path)?,
        Err(_) => CliConfig::default(),
    };

    let server = cli
        .server
        .or(file_config.server_url)
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let store: Arc<dyn TokenStore> = match cli.state_dir.or(file_config.state_dir) {
        Some(dir) => Arc::new(FileTokenStore::new(dir)?),
        None => Arc::new(FileTokenStore::default_location()?),
    };

    let transport = Arc::new(HttpTransport::new(&server));
    let mut session = SessionManager::new(transport, store);
    if let Some(csrf) = cli.csrf_token.or(file_config.csrf_token) {
        session = session.with_csrf_token(&csrf);
    }
    let client = ReportClient::new(session);

    match cli.command {
        Commands::Login { username, password } => {
            cmd_login(&client, &username, &password).await?;
        }
        Commands::Logout => {
            client.session().logout()?;
            println!("Logged out.");
        }
        Commands::Employees { from, to } => {
            cmd_employees(&client, from, to).await?;
        }
        Commands::Columns { command } => {
            cmd_columns(&client, command).await?;
        }
        Commands::Theme { command } => {
            cmd_theme(&client, command).await?;
        }
        Commands::Option { command } => {
            cmd_option(&client, command).await?;
        }
    }

    Ok(())
}

async fn cmd_login(client: &ReportClient, username: &str, password: &str) -> Result<()> {
    match client.session().login(username, password).await {
        Ok(_) => {
            println!("Logged in as {}.", username);
            Ok(())
        }
        Err(AuthError::Rejected(message)) => bail!("{}", message),
        Err(AuthError::Unreachable(e)) => {
            tracing::debug!("Login failed: {}", e);
            bail!("Something went wrong. Please try again later.")
        }
    }
}

async fn cmd_employees(client: &ReportClient, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let period = ReportPeriod::new(from, to)?;

    let mut sync = ColumnSync::new(client.clone());
    sync.load().await;

    let records = client.employees(&period).await.map_err(describe)?;
    if records.is_empty() {
        println!("No employees found for {} - {}.", from, to);
        return Ok(());
    }

    // Project through the workspace: visible columns in their saved order.
    // With no workspace configured, fall back to the record's own fields.
    let columns: Vec<(String, String)> = if sync.columns().is_empty() {
        records[0]
            .keys()
            .map(|key| (humanize_header(key), key.clone()))
            .collect()
    } else {
        sync.columns()
            .iter()
            .filter(|c| c.visible)
            .map(|c| (c.header.clone(), c.key.clone()))
            .collect()
    };

    for (header, _) in &columns {
        print!("{:20} ", header);
    }
    println!();
    println!("{}", "-".repeat(21 * columns.len()));
    for record in &records {
        for (_, key) in &columns {
            let value = record
                .get(key)
                .map(display_value)
                .unwrap_or_else(|| "-".to_string());
            print!("{:20} ", value);
        }
        println!();
    }

    Ok(())
}

async fn cmd_columns(client: &ReportClient, command: ColumnsCommand) -> Result<()> {
    let mut sync = ColumnSync::new(client.clone());
    if !client.session().is_logged_in() {
        bail!("Not logged in. Run 'tavle login' first.");
    }
    sync.load().await;

    match command {
        ColumnsCommand::Show => {
            print_columns(sync.columns());
        }
        ColumnsCommand::Hide { key } => {
            sync.set_visibility(&key, false).await;
            print_columns(sync.columns());
        }
        ColumnsCommand::Unhide { key } => {
            sync.set_visibility(&key, true).await;
            print_columns(sync.columns());
        }
        ColumnsCommand::Order { keys } => {
            let updates: Vec<ColumnUpdate> =
                keys.iter().map(|key| ColumnUpdate::from(key.as_str())).collect();
            sync.set_order(updates).await;
            print_columns(sync.columns());
        }
        ColumnsCommand::Width { key, width } => {
            sync.set_width(&key, width);
            print_columns(sync.columns());
        }
    }

    Ok(())
}

async fn cmd_theme(client: &ReportClient, command: ThemeCommand) -> Result<()> {
    match command {
        ThemeCommand::Get => {
            let theme = client.theme().await.map_err(describe)?;
            println!("{}", theme);
        }
        ThemeCommand::Set { theme } => {
            let theme = parse_theme(&theme)?;
            client.set_theme(theme).await.map_err(describe)?;
            println!("Theme set to {}.", theme);
        }
        ThemeCommand::Toggle => {
            let next = client.theme().await.map_err(describe)?.toggled();
            client.set_theme(next).await.map_err(describe)?;
            println!("Theme set to {}.", next);
        }
    }
    Ok(())
}

async fn cmd_option(client: &ReportClient, command: OptionCommand) -> Result<()> {
    match command {
        OptionCommand::Get { key } => match client.option(&key).await.map_err(describe)? {
            Some(value) => println!("{}", value),
            None => println!("Option '{}' is not set.", key),
        },
        OptionCommand::Set { key, value } => {
            // Accept raw JSON; a bare word becomes a JSON string
            let value: Value =
                serde_json::from_str(&value).unwrap_or(Value::String(value));
            client.set_option(&key, value).await.map_err(describe)?;
            println!("Option '{}' saved.", key);
        }
    }
    Ok(())
}

fn print_columns(columns: &[ColumnDescriptor]) {
    if columns.is_empty() {
        println!("No columns configured.");
        return;
    }

    println!("{:20} {:20} {:6} {:8} WIDTH", "KEY", "HEADER", "ORDER", "VISIBLE");
    println!("{}", "-".repeat(64));
    for column in columns {
        let width = column
            .width
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:20} {:20} {:<6} {:8} {}",
            column.key, column.header, column.order, column.visible, width
        );
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn parse_theme(name: &str) -> Result<Theme> {
    match name {
        "light" => Ok(Theme::Light),
        "dark" => Ok(Theme::Dark),
        other => bail!("Unknown theme '{}' (expected light or dark)", other),
    }
}

fn describe(err: SessionError) -> anyhow::Error {
    match err {
        SessionError::NoToken => anyhow::anyhow!("Not logged in. Run 'tavle login' first."),
        SessionError::RefreshFailed => {
            anyhow::anyhow!("Session expired. Run 'tavle login' again.")
        }
        SessionError::RequestFailed { .. } => {
            tracing::debug!("Request failed: {}", err);
            anyhow::anyhow!("Something went wrong. Please try again later.")
        }
    }
}
