use std::fmt;

/// Client-side locations. `Home` and `Meme` show the same leaderboard view; `Meme` also opens
/// the dialog for its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Meme(String),
}

impl Route {
    /// Parses a path; anything unrecognised falls back to `Home`.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Route::Login,
            ["meme", id] => Route::Meme(id.to_string()),
            _ => Route::Home,
        }
    }

    /// The meme id the dialog should target, if any.
    pub fn selected_meme(&self) -> Option<&str> {
        match self {
            Route::Meme(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Meme(id) => write!(f, "/meme/{}", id),
        }
    }
}
