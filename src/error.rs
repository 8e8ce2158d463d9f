use thiserror::Error;

/// Any failure of the counter store call. All variants surface to the
/// caller as a single 500 response carrying the display message.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("store response is missing the `{0}` attribute")]
    MissingAttribute(&'static str),

    #[error("store returned a non-integer counter value: {0}")]
    InvalidNumber(String),
}
