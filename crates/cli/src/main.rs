//! Inventory Live CLI - Products, accounts and the live product feed.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (prompts for missing values)
//! inv login -u alice
//!
//! # List products, filtered by name, description or category
//! inv products list --search lamp
//!
//! # Server-side filter and order
//! inv products list --category books --active true --ordering -price
//!
//! # Add a product with an image
//! inv products add -n "Desk Lamp" -d "LED, dimmable" -c home -p 24.50 -q 4 -i lamp.png
//!
//! # Change one field
//! inv products edit 7 --price 19.99
//!
//! # Watch the live feed; type a line to change the search
//! inv watch
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami`, `refresh` - Account and session
//! - `products list|show|add|update|edit|delete` - Product management
//! - `watch` - Live product feed
//!
//! # Environment Variables
//!
//! - `INVENTORY_API_URL` - REST base URL (required)
//! - `INVENTORY_WS_URL` - Websocket base URL (default: derived from the API URL)
//! - `INVENTORY_SESSION_FILE` - Session file (default: `.inventory-session.json`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use inventory_client::ClientConfig;
use inventory_core::ProductId;

mod commands;
mod render;
mod telemetry;

use commands::App;
use commands::products::{ListArgs, PatchArgs, ProductArgs};

#[derive(Parser)]
#[command(name = "inv")]
#[command(author, version, about = "Inventory Live command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and save the session
    Login {
        #[arg(short, long, env = "INVENTORY_USERNAME")]
        username: Option<String>,

        #[arg(short, long, env = "INVENTORY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long, env = "INVENTORY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Renew the access token
    Refresh,
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Follow the live product feed
    Watch {
        /// Initial search query
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        #[command(flatten)]
        args: ListArgs,
    },
    /// Show one product
    Show {
        id: ProductId,

        #[arg(long)]
        json: bool,
    },
    /// Create a product
    Add {
        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Replace a product; unspecified fields keep their current values
    Update {
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Change only the given fields
    Edit {
        id: ProductId,

        #[command(flatten)]
        fields: PatchArgs,
    },
    /// Delete a product
    Delete {
        id: ProductId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let telemetry = telemetry::TelemetryConfig::from_env();
    let _sentry_guard = telemetry::init_sentry(&telemetry);
    telemetry::init_tracing(&telemetry);

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match ClientConfig::from_env() {
        Ok(config) => match App::new(config) {
            Ok(app) => run(cli, &app).await,
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, app: &App) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(app, username, password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(app, username, email, password).await?,
        Commands::Logout => commands::auth::logout(app).await?,
        Commands::Whoami => commands::auth::whoami(app).await?,
        Commands::Refresh => commands::auth::refresh(app).await?,
        Commands::Products { action } => match action {
            ProductsAction::List { args } => commands::products::list(app, args).await?,
            ProductsAction::Show { id, json } => commands::products::show(app, id, json).await?,
            ProductsAction::Add { fields } => commands::products::add(app, fields).await?,
            ProductsAction::Update { id, fields } => {
                commands::products::update(app, id, fields).await?;
            }
            ProductsAction::Edit { id, fields } => {
                commands::products::edit(app, id, fields).await?;
            }
            ProductsAction::Delete { id, yes } => {
                commands::products::delete(app, id, yes).await?;
            }
        },
        Commands::Watch { search } => commands::watch::run(app, search).await?,
    }
    Ok(())
}
