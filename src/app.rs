use crate::{
    config::Config,
    dialog::MemeDialog,
    domain::{ImageFile, TokenStore, Transport},
    errors::{ClientError, DialogError, UploadError, UploadRejection, VoteError},
    gateway::ApiGateway,
    leaderboard::{Leaderboard, ListState, Selection},
    models::User,
    routes::Route,
    session::SessionManager,
    token_store::FileTokenStore,
    transport::HttpTransport,
    upload::UploadForm,
    view,
    vote::{VoteDirection, VoteSnapshot},
};
use std::sync::Arc;

/// Wires the session, leaderboard, dialog and upload form to one gateway and tracks the
/// current route.
pub struct App {
    config: Config,
    gateway: ApiGateway,
    session: SessionManager,
    leaderboard: Leaderboard,
    dialog: MemeDialog,
    upload: UploadForm,
    route: Route,
}

impl App {
    /// Loads `Config` from the environment and builds the app from it.
    pub fn from_env() -> Result<Self, ClientError> {
        let config = Config::load()?;
        Self::new(config)
    }

    /// Builds the app against the real backend and the token file from `config`.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
        Ok(Self::with_parts(config, transport, tokens))
    }

    pub fn with_parts(config: Config, transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>) -> Self {
        let gateway = ApiGateway::new(transport, tokens);
        Self {
            session: SessionManager::new(gateway.clone()),
            leaderboard: Leaderboard::new(gateway.clone()),
            dialog: MemeDialog::new(gateway.clone()),
            upload: UploadForm::new(),
            route: Route::Home,
            gateway,
            config,
        }
    }

    /// Hydrates the session, loads the leaderboard and applies `route`.
    pub async fn start(&mut self, route: Route) {
        self.session.init().await;
        self.leaderboard.load().await;
        self.navigate(route).await;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn dialog(&self) -> &MemeDialog {
        &self.dialog
    }

    pub fn upload_form(&mut self) -> &mut UploadForm {
        &mut self.upload
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.current_user().await
    }

    /// Moves to `route` and brings the dialog in line with the resulting selection.
    pub async fn navigate(&mut self, route: Route) {
        tracing::debug!(route = %route, "Navigating");
        let selection = self.leaderboard.select(route.selected_meme()).await;
        self.route = route;
        match selection {
            Selection::Resolved(meme) => self.dialog.open(meme).await,
            Selection::NoSelection => self.dialog.close().await,
            Selection::Pending { .. } | Selection::Fetching { .. } | Selection::Refetching { .. } => {}
        }
    }

    pub async fn close_dialog(&mut self) {
        self.navigate(Route::Home).await;
    }

    /// Reloads the list. A meme route whose selection had given up is resolved again from the
    /// fresh cache, or the route falls back to home.
    pub async fn retry_load(&mut self) -> ListState {
        let list = self.leaderboard.retry().await;
        let Route::Meme(id) = &self.route else {
            return list;
        };

        let selection = match self.leaderboard.selection().await {
            Selection::NoSelection => self.leaderboard.select_cached(id).await,
            other => other,
        };
        match selection {
            Selection::Resolved(meme) => self.dialog.open(meme).await,
            Selection::NoSelection => {
                self.dialog.close().await;
                self.route = Route::Home;
            }
            Selection::Pending { .. } | Selection::Fetching { .. } | Selection::Refetching { .. } => {}
        }
        list
    }

    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        let ok = self.session.login(username, password).await;
        if ok && self.route == Route::Login {
            self.navigate(Route::Home).await;
        }
        ok
    }

    pub async fn register(&mut self, username: &str, password: &str, email: &str) -> bool {
        let ok = self.session.register(username, password, email).await;
        if ok && self.route == Route::Login {
            self.navigate(Route::Home).await;
        }
        ok
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    pub async fn vote(&self, direction: VoteDirection) -> Result<VoteSnapshot, VoteError> {
        self.dialog.vote(direction, &self.session, &self.leaderboard).await
    }

    pub async fn delete_selected(&mut self) -> Result<String, DialogError> {
        let id = self.dialog.delete(&self.session, &self.leaderboard).await?;
        self.navigate(Route::Home).await;
        Ok(id)
    }

    pub fn select_upload_file(&mut self, file: ImageFile) -> Result<(), UploadRejection> {
        self.upload.select_file(file)
    }

    /// Submits the upload form and, on success, opens the new meme.
    pub async fn submit_upload(&mut self) -> Result<Route, UploadError> {
        let route = self.upload.submit(&self.gateway).await?;
        self.navigate(route.clone()).await;
        Ok(route)
    }

    pub async fn share_link(&self) -> Option<String> {
        self.dialog.share_link(&self.config.web_origin).await
    }

    /// Renders the whole screen for the current route.
    pub async fn render(&self) -> String {
        let user = self.session.current_user().await;
        let mut sections = vec![view::render_header(user.as_ref())];

        if self.route == Route::Login {
            sections.push(match &user {
                Some(user) => format!("Signed in as {}", user.username),
                None => "Login or sign up to vote and upload".to_string(),
            });
            return sections.join("\n\n");
        }

        sections.push(view::render_leaderboard(&self.leaderboard.list_state().await));
        if let Some(dialog) = self.dialog.view().await {
            let link = self.share_link().await;
            sections.push(view::render_dialog(&dialog, user.as_ref(), link.as_deref()));
        }
        if user.is_some() {
            sections.push(view::render_upload(&self.upload));
        }
        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Method;
    use crate::test_support::{FakeTransport, meme, meme_list};
    use crate::token_store::MemoryTokenStore;
    use serde_json::json;

    fn app(transport: &Arc<FakeTransport>, token: Option<&str>) -> App {
        let tokens = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        App::with_parts(Config::default(), transport.clone(), Arc::new(tokens))
    }

    fn signed_in_transport() -> Arc<FakeTransport> {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_ok(
            Method::Get,
            "/auth/profile",
            json!({ "username": "alice", "email": "a@example.com" }),
        );
        transport
    }

    #[tokio::test]
    async fn deep_link_opens_dialog_after_load() {
        let transport = signed_in_transport();
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        let mut app = app(&transport, Some("t"));

        app.start(Route::parse("/meme/a")).await;

        assert_eq!(app.dialog().view().await.unwrap().meme.meme_id, "a");
        let screen = app.render().await;
        assert!(screen.contains("MemeArena | alice"));
        assert!(screen.contains("Share: http://localhost:5173/meme/a"));
    }

    #[tokio::test]
    async fn closing_dialog_returns_home() {
        let transport = signed_in_transport();
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        let mut app = app(&transport, Some("t"));
        app.start(Route::Meme("a".into())).await;

        app.close_dialog().await;

        assert_eq!(app.route(), &Route::Home);
        assert!(app.dialog().view().await.is_none());
    }

    #[tokio::test]
    async fn upload_navigates_to_new_meme_via_direct_fetch() {
        let transport = signed_in_transport();
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        transport.respond_ok(Method::Post, "/meme", serde_json::to_value(meme("new", 0)).unwrap());
        transport.respond_ok(Method::Get, "/meme/new", serde_json::to_value(meme("new", 0)).unwrap());
        let mut app = app(&transport, Some("t"));
        app.start(Route::Home).await;

        app.upload_form().set_title("new one").unwrap();
        app.select_upload_file(ImageFile {
            file_name: "cat.png".into(),
            content_type: None,
            bytes: vec![1, 2, 3],
        })
        .unwrap();
        let route = app.submit_upload().await.unwrap();

        assert_eq!(route, Route::Meme("new".into()));
        assert_eq!(app.route(), &Route::Meme("new".into()));
        assert_eq!(app.dialog().view().await.unwrap().meme.meme_id, "new");
        assert_eq!(transport.count(Method::Get, "/meme/new"), 1);
    }

    #[tokio::test]
    async fn anonymous_viewer_sees_login_prompt() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        let mut app = app(&transport, None);
        app.start(Route::Meme("a".into())).await;

        assert_eq!(app.vote(VoteDirection::Up).await, Err(VoteError::NotLoggedIn));
        assert!(app.render().await.contains("Login to vote on memes"));
    }

    #[tokio::test]
    async fn failed_list_can_be_retried() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_status(Method::Get, "/meme", 502);
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        let mut app = app(&transport, None);
        app.start(Route::Home).await;
        assert!(app.render().await.contains("Failed to load memes"));

        assert!(matches!(app.retry_load().await, ListState::Loaded(ref m) if m.len() == 1));
        assert!(app.render().await.contains("meme a by alice"));
    }

    #[tokio::test]
    async fn retry_reopens_deep_link_that_had_given_up() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2), meme("c", 1)]));
        transport.fail(Method::Get, "/meme/c");
        let mut app = app(&transport, None);
        app.start(Route::Meme("c".into())).await;
        assert!(app.dialog().view().await.is_none());

        app.retry_load().await;

        assert_eq!(app.route(), &Route::Meme("c".into()));
        assert_eq!(app.dialog().view().await.unwrap().meme.meme_id, "c");
        assert_eq!(transport.count(Method::Get, "/meme/c"), 1);
    }

    #[tokio::test]
    async fn retry_without_the_meme_returns_home() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 2)]));
        transport.fail(Method::Get, "/meme/gone");
        let mut app = app(&transport, None);
        app.start(Route::Meme("gone".into())).await;

        app.retry_load().await;

        assert_eq!(app.route(), &Route::Home);
        assert!(app.dialog().view().await.is_none());
        assert_eq!(transport.count(Method::Get, "/meme/gone"), 1);
    }

    #[tokio::test]
    async fn logout_without_start_makes_no_requests() {
        let transport = Arc::new(FakeTransport::new());
        let tokens = Arc::new(MemoryTokenStore::with_token("t"));
        let app = App::with_parts(Config::default(), transport.clone(), tokens.clone());

        app.logout().await;

        assert!(transport.requests().is_empty());
        assert_eq!(tokens.load().await.unwrap(), None);
    }
}
