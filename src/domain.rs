use crate::errors::{TokenStoreError, TransportError};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// An image picked by the user, held in memory until it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    /// Declared MIME type, when the picker reported one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart { title: String, image: ImageFile },
}

/// A single outbound call, already resolved to a path and credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait defining how requests reach the remote backend.
#[async_trait]
pub trait Transport: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Performs the request and returns the raw status and body.
    /// Err is reserved for failures where no response was received at all.
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Trait defining durable storage of the bearer token.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Returns Ok(None) when no token has been stored.
    async fn load(&self) -> Result<Option<String>, TokenStoreError>;

    async fn save(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Removing a token that does not exist is not an error.
    async fn clear(&self) -> Result<(), TokenStoreError>;
}
