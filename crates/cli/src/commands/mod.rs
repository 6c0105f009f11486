//! Cart commands, shared by one-shot invocations and the interactive shell.

use clap::{Parser, Subcommand};
use storefront_cart_client::{CartClient, CartError, ConfigError, Outcome};
use storefront_cart_core::{CartItemId, ProductId};
use thiserror::Error;

use crate::terminal::TerminalUi;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cart API error: {0}")]
    Client(#[from] CartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The action ran but did not succeed; the reason was already shown.
    #[error("{command} did not complete ({outcome:?})")]
    Unsuccessful {
        command: &'static str,
        outcome: Outcome,
    },

    #[error("Cart is not ready for checkout")]
    NotReady,
}

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line (below 1 removes it)
    Update {
        /// Cart line ID
        item_id: CartItemId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line ID
        item_id: CartItemId,
    },
    /// Remove every line
    Clear,
    /// List cart lines
    Items,
    /// Show the item count
    Count,
    /// Show the cart total
    Total,
    /// Check the cart can go to checkout
    Validate,
}

/// One line typed into the shell.
#[derive(Parser)]
#[command(name = "cart", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: CartCommand,
}

/// Run one cart command.
///
/// # Errors
///
/// Returns error if a read fails or a mutation does not succeed.
#[allow(clippy::print_stdout)]
pub async fn execute(client: &CartClient<TerminalUi>, command: CartCommand) -> Result<(), CliError> {
    match command {
        CartCommand::Add {
            product_id,
            quantity,
        } => finished("add", client.add_item(product_id, quantity).await),
        CartCommand::Update { item_id, quantity } => {
            finished("update", client.update_quantity(item_id, quantity).await)
        }
        CartCommand::Remove { item_id } => finished("remove", client.remove_item(item_id).await),
        CartCommand::Clear => finished("clear", client.clear_cart().await),
        CartCommand::Items => {
            let snapshot = client.try_fetch_items().await?;
            TerminalUi::print_items(&snapshot);
            Ok(())
        }
        CartCommand::Count => {
            println!("{}", client.try_fetch_count().await?);
            Ok(())
        }
        CartCommand::Total => {
            println!("{}", client.cart_total().await);
            Ok(())
        }
        CartCommand::Validate => {
            if client.validate_for_checkout().await {
                println!("Cart is ready for checkout");
                Ok(())
            } else {
                Err(CliError::NotReady)
            }
        }
    }
}

/// A declined confirmation is a normal ending, not a failure.
fn finished(command: &'static str, outcome: Outcome) -> Result<(), CliError> {
    match outcome {
        Outcome::Succeeded | Outcome::Declined => Ok(()),
        outcome => Err(CliError::Unsuccessful { command, outcome }),
    }
}

/// Read commands from stdin until `quit` or end of input.
///
/// Every command runs on the same client, so the cart session persists.
///
/// # Errors
///
/// Returns error only if stdin or stdout fails; command failures are printed.
#[allow(clippy::print_stdout)]
pub async fn shell(client: &CartClient<TerminalUi>) -> Result<(), CliError> {
    println!("Connected to {}. Type `help` for commands, `quit` to leave.", client.base_url());
    client.refresh_count().await;

    while let Some(line) = client.ui().read_line("cart> ").await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit" | "exit"] => break,
            _ => {}
        }

        match ShellLine::try_parse_from(words) {
            Ok(ShellLine { command }) => {
                if let Err(e) = execute(client, command).await {
                    tracing::debug!(error = %e, "Shell command failed");
                    if !matches!(e, CliError::Unsuccessful { .. } | CliError::NotReady) {
                        println!("{e}");
                    }
                }
            }
            Err(e) => e.print()?,
        }
    }

    Ok(())
}
