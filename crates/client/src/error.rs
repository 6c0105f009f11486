//! Cart API error taxonomy and Sentry breadcrumbs.
//!
//! Errors are split the way the UI reports them: anything where the server
//! did not give a usable answer gets the operation's generic message, while an
//! application failure (`success: false`) carries the server's own message.

use thiserror::Error;

/// Maximum number of body characters kept in a [`CartError::Status`].
const MAX_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the cart API.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request did not complete (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status and a non-JSON body.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server processed the request and reported failure.
    #[error("Cart API error: {}", .0.as_deref().unwrap_or("(no message)"))]
    Application(Option<String>),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CartError {
    /// Build a [`CartError::Status`], truncating the body.
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: body.chars().take(MAX_BODY_CHARS).collect(),
        }
    }

    /// Build an application error, dropping empty messages.
    #[must_use]
    pub fn application(message: Option<String>) -> Self {
        Self::Application(message.filter(|m| !m.trim().is_empty()))
    }

    /// The server-provided message, if this is an application failure.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Application(message) => message.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user: the server's message when present, else `generic`.
    #[must_use]
    pub fn user_message(&self, generic: &str) -> String {
        self.server_message()
            .map_or_else(|| generic.to_string(), |msg| format!("Error: {msg}"))
    }

    /// Whether the request never produced a usable response.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { .. })
    }
}

/// Add a breadcrumb for a cart action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error. Without an initialized Sentry client this
/// is a no-op.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("add_item", &[("product_id", "42")]);
/// ```
pub fn add_breadcrumb(message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some("cart".to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = CartError::application(Some("Out of stock".to_string()));
        assert_eq!(err.user_message("Error adding to cart"), "Error: Out of stock");
    }

    #[test]
    fn test_user_message_generic_without_server_message() {
        let err = CartError::application(None);
        assert_eq!(err.user_message("Error adding to cart"), "Error adding to cart");

        let err = CartError::application(Some("   ".to_string()));
        assert_eq!(err.server_message(), None);

        let err = CartError::status(502, "<html>bad gateway</html>");
        assert_eq!(err.user_message("Error clearing cart"), "Error clearing cart");
        assert!(err.is_network());
    }

    #[test]
    fn test_status_body_truncated() {
        let err = CartError::status(500, &"x".repeat(1000));
        let CartError::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert_eq!(body.len(), MAX_BODY_CHARS);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CartError::application(Some("Cart item not found".to_string())).to_string(),
            "Cart API error: Cart item not found"
        );
        assert_eq!(
            CartError::application(None).to_string(),
            "Cart API error: (no message)"
        );
        assert_eq!(
            CartError::status(404, "missing").to_string(),
            "HTTP 404: missing"
        );
    }
}
