use crate::{
    domain::{ApiRequest, ImageFile, Method, RequestBody, TokenStore, Transport},
    errors::TokenStoreError,
    models::{
        ApiResponse, AuthTokenData, LoginRequest, Meme, MemesListData, ProfileData,
        RegisterRequest, VoteRequest,
    },
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// Paths of the backend API, relative to the configured base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const PROFILE: &str = "/auth/profile";
    pub const MEMES: &str = "/meme";

    pub fn meme_by_id(id: &str) -> String {
        format!("/meme/{}", id)
    }

    pub fn meme_vote(id: &str) -> String {
        format!("/meme/{}/vote", id)
    }

    pub fn meme_delete(id: &str) -> String {
        format!("/meme/{}/delete", id)
    }
}

/// Wraps every outbound call: attaches the bearer token and normalizes the result into an
/// `ApiResponse`. Remote failures never surface as `Err`; they come back with `success: false`.
#[derive(Clone)]
pub struct ApiGateway {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
}

impl ApiGateway {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { transport, tokens }
    }

    pub async fn set_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.tokens.save(token).await
    }

    pub async fn clear_token(&self) -> Result<(), TokenStoreError> {
        self.tokens.clear().await
    }

    pub async fn has_token(&self) -> bool {
        self.bearer().await.is_some()
    }

    // Read from the store on every request so a logout elsewhere takes effect immediately.
    async fn bearer(&self) -> Option<String> {
        match self.tokens.load().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read auth token, sending request unauthenticated");
                None
            }
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> ApiResponse<T> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            bearer: self.bearer().await,
            body,
        };

        let raw = match self.transport.send(request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(method = method.as_str(), path, error = %e, "API request failed");
                return ApiResponse::failure(e.to_string());
            }
        };

        if !raw.is_success() {
            tracing::error!(method = method.as_str(), path, status = raw.status, "API request failed");
            return ApiResponse::failure(format!("HTTP error! status: {}", raw.status));
        }

        match serde_json::from_slice::<ApiResponse<T>>(&raw.body) {
            Ok(response) => {
                tracing::debug!(
                    method = method.as_str(),
                    path,
                    success = response.success,
                    code = response.code,
                    "API request completed"
                );
                response
            }
            Err(e) => {
                tracing::error!(method = method.as_str(), path, error = %e, "Undecodable API response");
                ApiResponse::failure(format!("Invalid response body: {}", e))
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(Method::Get, path, RequestBody::Empty).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResponse<T> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(Method::Post, path, RequestBody::Json(value)).await,
            Err(e) => ApiResponse::failure(e.to_string()),
        }
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResponse<T> {
        match serde_json::to_value(body) {
            Ok(value) => self.request(Method::Put, path, RequestBody::Json(value)).await,
            Err(e) => ApiResponse::failure(e.to_string()),
        }
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResponse<T> {
        self.request(Method::Delete, path, RequestBody::Empty).await
    }

    // --- Auth endpoints ---

    pub async fn login(&self, credentials: &LoginRequest) -> ApiResponse<AuthTokenData> {
        let response = self.post(endpoints::LOGIN, credentials).await;
        self.store_token(response).await
    }

    pub async fn register(&self, details: &RegisterRequest) -> ApiResponse<AuthTokenData> {
        let response = self.post(endpoints::REGISTER, details).await;
        self.store_token(response).await
    }

    pub async fn profile(&self) -> ApiResponse<ProfileData> {
        self.get(endpoints::PROFILE).await
    }

    async fn store_token(&self, response: ApiResponse<AuthTokenData>) -> ApiResponse<AuthTokenData> {
        let token = response
            .data
            .as_ref()
            .filter(|_| response.success)
            .map(|data| data.auth_token.clone());
        let Some(token) = token else {
            return ApiResponse { success: false, ..response };
        };
        if let Err(e) = self.set_token(&token).await {
            tracing::error!(error = %e, "Could not persist auth token");
            return ApiResponse::failure(e.to_string());
        }
        response
    }

    // --- Meme endpoints ---

    pub async fn list_memes(&self) -> ApiResponse<MemesListData> {
        self.get(endpoints::MEMES).await
    }

    pub async fn get_meme(&self, id: &str) -> ApiResponse<Meme> {
        self.get(&endpoints::meme_by_id(id)).await
    }

    pub async fn upload_meme(&self, title: &str, image: ImageFile) -> ApiResponse<Meme> {
        let body = RequestBody::Multipart {
            title: title.to_string(),
            image,
        };
        self.request(Method::Post, endpoints::MEMES, body).await
    }

    pub async fn vote_meme(&self, id: &str, vote: VoteRequest) -> ApiResponse<Meme> {
        self.put(&endpoints::meme_vote(id), &vote).await
    }

    pub async fn delete_meme(&self, id: &str) -> ApiResponse<serde_json::Value> {
        self.delete(&endpoints::meme_delete(id)).await
    }
}
