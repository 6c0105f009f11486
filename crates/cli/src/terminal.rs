//! Terminal rendering of cart UI calls.

use std::io;

use storefront_cart_client::{CartUi, Control, Notification, NotificationKind};
use storefront_cart_core::{CartItemId, CartSnapshot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// A [`CartUi`] that prints to stdout and reads answers from stdin.
///
/// Stdin is shared with the interactive shell, so prompts and commands read
/// from the same line buffer.
pub struct TerminalUi {
    auto_confirm: bool,
    input: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalUi {
    #[must_use]
    pub fn new(auto_confirm: bool) -> Self {
        Self {
            auto_confirm,
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns error if stdout or stdin fails.
    pub async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        self.input.lock().await.next_line().await
    }

    /// Print the item list as a table.
    #[allow(clippy::print_stdout)]
    pub fn print_items(snapshot: &CartSnapshot) {
        if snapshot.is_empty() {
            println!("(cart is empty)");
            return;
        }

        println!("{:>6}  {:<32} {:>5} {:>12}", "ID", "PRODUCT", "QTY", "SUBTOTAL");
        for item in snapshot {
            println!(
                "{:>6}  {:<32} {:>5} {:>12}",
                item.id.to_string(),
                item.display_name(),
                item.quantity,
                item.subtotal_formatted
            );
        }
        println!(
            "{:>6}  {:<32} {:>5} {:>12}",
            "",
            "TOTAL",
            snapshot.total_quantity(),
            snapshot.total().to_string()
        );
    }
}

#[allow(clippy::print_stdout)]
impl CartUi for TerminalUi {
    fn set_control_enabled(&self, control: Control, enabled: bool) {
        tracing::trace!(%control, enabled, "Control toggled");
    }

    fn notify(&self, notification: Notification) {
        let tag = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        };
        println!("[{tag}] {}", notification.message);
    }

    async fn confirm(&self, prompt: &str) -> bool {
        if self.auto_confirm {
            println!("{prompt} [y/N] y");
            return true;
        }

        match self.read_line(&format!("{prompt} [y/N] ")).await {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read confirmation");
                false
            }
        }
    }

    fn set_count(&self, count: u32) {
        println!("Cart: {count}");
    }

    fn remove_row(&self, item_id: CartItemId) {
        println!("- removed line {item_id}");
    }

    fn render_items(&self, snapshot: &CartSnapshot) {
        Self::print_items(snapshot);
    }
}
