//! Upload error types.

use mediastash_protocol::ProtocolError;

/// Prefixes the backend and its bridge wrap around error text.
const WRAPPER_PREFIXES: &[&str] = &[
    "Error: ",
    "Validation error: ",
    "API error: ",
    "Network error: ",
    "IO error: ",
];

/// Errors returned by a [`TransferBackend`](crate::TransferBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Error: {0}")]
    Other(String),
}

/// Errors produced by the upload queue.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Keypair encryption requires a loaded key bundle. Unlock your keys and retry.")]
    MissingKeyBundle,

    #[error("Password encryption requires a password. Enter one and retry.")]
    MissingSecret,

    #[error("{0}")]
    Backend(String),

    #[error("upload item not found: {0}")]
    ItemNotFound(String),

    #[error("upload item is in progress and cannot be removed: {0}")]
    ItemActive(String),
}

impl From<BackendError> for UploadError {
    fn from(e: BackendError) -> Self {
        UploadError::Backend(e.to_string())
    }
}

impl UploadError {
    /// Text suitable for showing on a failed item.
    pub fn user_message(&self) -> String {
        strip_error_prefixes(&self.to_string())
    }
}

/// Removes wrapper prefixes such as `"Error: "` or `"API error: "`,
/// repeatedly, so nested wrapping collapses to the underlying message.
pub fn strip_error_prefixes(message: &str) -> String {
    let mut msg = message.trim();
    while let Some(rest) = WRAPPER_PREFIXES.iter().find_map(|p| msg.strip_prefix(p)) {
        msg = rest.trim_start();
    }
    msg.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_nested_prefixes() {
        assert_eq!(
            strip_error_prefixes("Error: API error: 422 name already exists"),
            "422 name already exists"
        );
        assert_eq!(strip_error_prefixes("Network error: timed out"), "timed out");
        assert_eq!(strip_error_prefixes("plain message"), "plain message");
    }

    #[test]
    fn prefix_inside_message_is_kept() {
        assert_eq!(
            strip_error_prefixes("API error: upstream said Error: nope"),
            "upstream said Error: nope"
        );
    }

    #[test]
    fn backend_error_user_message() {
        let e: UploadError = BackendError::Api("rate limited".into()).into();
        assert_eq!(e.user_message(), "rate limited");

        let e: UploadError =
            BackendError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
                .into();
        assert_eq!(e.user_message(), "no such file");
    }

    #[test]
    fn precondition_messages_are_descriptive() {
        assert!(UploadError::MissingKeyBundle.user_message().contains("key bundle"));
        assert!(UploadError::MissingSecret.user_message().contains("password"));
    }
}
