use thiserror::Error; // Use thiserror for cleaner error definitions

// --- Infrastructure Errors ---

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("Token file IO failed: {0}")]
    Io(#[from] std::io::Error),
}

// --- Component Errors ---

/// Client-side validation failures of the upload form. The display text is the inline message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Please select a JPG or PNG image")]
    UnsupportedType(String),
    #[error("File size must be less than 5MB")]
    TooLarge(u64),
    #[error("Title must be at most {0} characters")]
    TitleTooLong(usize),
    #[error("Please provide a title and select an image")]
    MissingFields,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error("Failed to upload meme. Please try again.")]
    Failed { code: u16, message: Option<String> },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("Login to vote on memes")]
    NotLoggedIn,
    #[error("No meme is open")]
    Closed,
    #[error("A vote is already in flight for meme {0}")]
    Busy(String),
    #[error("Vote failed for meme {meme_id} (code {code})")]
    Failed { meme_id: String, code: u16 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("No meme is open")]
    Closed,
    #[error("Only admins can delete memes")]
    NotAdmin,
    #[error("A delete is already in flight for meme {0}")]
    Busy(String),
    #[error("Failed to delete meme. Please try again.")]
    DeleteFailed { code: u16 },
}

// --- Top-level Client Error ---

/// Startup failures. Everything after startup is reported through the component errors above.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Could not build the HTTP transport")]
    Transport(#[source] TransportError),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}

impl From<crate::config::ConfigError> for ClientError {
    fn from(err: crate::config::ConfigError) -> Self {
        ClientError::ConfigError(err.to_string())
    }
}
