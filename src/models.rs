use serde::{Deserialize, Serialize};

/// The viewer's own vote on a meme. Travels over the wire as `true` / `false` / `null`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum VoteState {
    Up,
    Down,
    #[default]
    None,
}

impl From<Option<bool>> for VoteState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => VoteState::Up,
            Some(false) => VoteState::Down,
            None => VoteState::None,
        }
    }
}

impl From<VoteState> for Option<bool> {
    fn from(value: VoteState) -> Self {
        match value {
            VoteState::Up => Some(true),
            VoteState::Down => Some(false),
            VoteState::None => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Meme {
    pub meme_id: String,
    pub title: String,
    pub username: String,
    pub votes: i64,
    // Seconds since the epoch; the backend may send a fractional value.
    pub created_at: f64,
    #[serde(default)]
    pub user_vote: VoteState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Envelope every backend response is wrapped in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// The shape every transport-level failure is normalized into.
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            code: 500,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Successful responses that actually carried a payload.
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteRequest {
    pub upvote: bool,
    pub clicked: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AuthTokenData {
    pub auth_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProfileData {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemesListData {
    pub memes: Vec<Meme>,
}

/// The signed-in identity held by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    // The backend does not expose user ids yet.
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<ProfileData> for User {
    fn from(profile: ProfileData) -> Self {
        User {
            id: String::new(),
            username: profile.username,
            email: profile.email,
            is_admin: profile.is_admin.unwrap_or(false),
        }
    }
}
