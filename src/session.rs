use crate::{
    gateway::ApiGateway,
    models::{LoginRequest, RegisterRequest, User},
};
use tokio::sync::Mutex;

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    loading: bool,
}

/// Holds at most one signed-in identity. Construct once and share it by reference (or `Arc`)
/// with whatever needs to know who is signed in.
pub struct SessionManager {
    gateway: ApiGateway,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            state: Mutex::new(SessionState {
                user: None,
                loading: true,
            }),
        }
    }

    /// Hydrates the session from a persisted token, if there is one.
    pub async fn init(&self) {
        if self.gateway.has_token().await {
            tracing::debug!("Persisted token found, hydrating session");
            self.refresh().await;
        } else {
            tracing::debug!("No persisted token, starting signed out");
        }
        self.state.lock().await.loading = false;
    }

    /// Re-fetches the profile. An invalid or expired token logs the session out locally.
    pub async fn refresh(&self) {
        if !self.gateway.has_token().await {
            self.state.lock().await.user = None;
            return;
        }

        let response = self.gateway.profile().await;
        match response.into_data() {
            Some(profile) => {
                let user = User::from(profile);
                tracing::info!(username = %user.username, is_admin = user.is_admin, "Session hydrated");
                self.state.lock().await.user = Some(user);
            }
            None => {
                tracing::warn!("Profile fetch failed, clearing session");
                self.logout().await;
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> bool {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        if !self.gateway.login(&credentials).await.success {
            tracing::info!(%username, "Login rejected");
            return false;
        }
        self.refresh().await;
        true
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> bool {
        let details = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        };
        if !self.gateway.register(&details).await.success {
            tracing::info!(%username, "Registration rejected");
            return false;
        }
        self.refresh().await;
        true
    }

    pub async fn logout(&self) {
        if let Err(e) = self.gateway.clear_token().await {
            tracing::error!(error = %e, "Could not remove persisted token");
        }
        self.state.lock().await.user = None;
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.lock().await.user.clone()
    }

    pub async fn is_admin(&self) -> bool {
        self.state
            .lock()
            .await
            .user
            .as_ref()
            .is_some_and(|user| user.is_admin)
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }
}
