//! Plain-text rendering of client state. Nothing here talks to the network.

use crate::{
    dialog::DialogView,
    leaderboard::ListState,
    models::{User, VoteState},
    upload::UploadForm,
};
use std::fmt::Write;

pub fn render_header(user: Option<&User>) -> String {
    match user {
        Some(user) if user.is_admin => format!("MemeArena | {} (admin) | logout", user.username),
        Some(user) => format!("MemeArena | {} | logout", user.username),
        None => "MemeArena | login".to_string(),
    }
}

pub fn render_leaderboard(list: &ListState) -> String {
    match list {
        ListState::Loading => "Loading top memes...".to_string(),
        ListState::Failed(message) => format!("{}\n[retry] Try Again", message),
        ListState::Loaded(memes) if memes.is_empty() => {
            "No memes yet!\nBe the first to upload a meme!".to_string()
        }
        ListState::Loaded(memes) => {
            let mut out = String::new();
            for (index, meme) in memes.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "#{:<3} {} by {}  {} votes  [{}]",
                    index + 1,
                    meme.title,
                    meme.username,
                    meme.votes,
                    meme.meme_id
                );
            }
            out
        }
    }
}

fn format_uploaded(created_at: f64) -> Option<String> {
    if created_at <= 0.0 {
        return None;
    }
    let secs = created_at.trunc() as i64;
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// Detail view. Voting hints only appear for signed-in viewers and the delete hint only for
/// admins.
pub fn render_dialog(view: &DialogView, user: Option<&User>, share_link: Option<&str>) -> String {
    let meme = &view.meme;
    let mut out = String::new();
    let _ = writeln!(out, "{}", meme.title);
    let _ = writeln!(out, "by {}", meme.username);
    if let Some(description) = meme.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "{}", description);
    }

    let marker = match view.vote.vote {
        VoteState::Up => " (you upvoted)",
        VoteState::Down => " (you downvoted)",
        VoteState::None => "",
    };
    let _ = writeln!(out, "{} votes{}", view.vote.count, marker);

    match user {
        Some(user) => {
            if view.voting {
                let _ = writeln!(out, "Voting...");
            } else {
                let _ = writeln!(out, "[up] Upvote  [down] Downvote");
            }
            if user.is_admin {
                let label = if view.deleting { "Deleting..." } else { "[delete] Delete" };
                let _ = writeln!(out, "{}", label);
            }
        }
        None => {
            let _ = writeln!(out, "Login to vote on memes");
        }
    }

    if let Some(link) = share_link {
        let _ = writeln!(out, "Share: {}", link);
    }
    if let Some(uploaded) = format_uploaded(meme.created_at) {
        let _ = writeln!(out, "Uploaded {}", uploaded);
    }
    out
}

pub fn render_upload(form: &UploadForm) -> String {
    if let Some(error) = form.error() {
        return error.to_string();
    }
    if form.succeeded() {
        return "Meme uploaded successfully! It will appear in the leaderboard soon.".to_string();
    }
    match form.file() {
        Some(file) => format!("Selected {} ({} bytes)", file.file_name, file.size()),
        None => "Choose JPG or PNG file (max 5MB)".to_string(),
    }
}
