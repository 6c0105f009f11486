//! Storefront cart CLI - drive the cart API from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of product 42
//! cart-cli add 42 -q 2
//!
//! # Show the cart
//! cart-cli items
//!
//! # Clear without being asked
//! cart-cli --yes clear
//!
//! # Keep one session across several commands
//! cart-cli shell
//! ```
//!
//! One-shot commands each start a fresh server session; use `shell` to build
//! up a cart across commands.
//!
//! # Environment Variables
//!
//! - `CART_API_BASE_URL` and the other `CART_*` settings of the client
//! - `SENTRY_DSN` - Enables error reporting when set
//! - `SENTRY_ENVIRONMENT` - Environment tag for Sentry events
//! - `RUST_LOG` - Log filter (default: `storefront_cart_client=info,storefront_cart_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storefront_cart_client::{CartClient, CartClientConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod terminal;

use commands::{CartCommand, CliError};
use terminal::TerminalUi;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Storefront cart from the terminal")]
struct Cli {
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Cart(CartCommand),
    /// Read commands interactively, keeping one cart session
    Shell,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Sentry settings may come from .env
    dotenvy::dotenv().ok();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_cart_client=info,storefront_cart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CartClientConfig::from_env()?;
    tracing::debug!(base_url = %config.base_url, "Loaded configuration");

    let client = CartClient::new(&config, TerminalUi::new(cli.yes))?;

    match cli.command {
        Commands::Cart(command) => commands::execute(&client, command).await,
        Commands::Shell => commands::shell(&client).await,
    }
}
