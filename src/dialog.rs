use crate::{
    errors::{DialogError, VoteError},
    gateway::ApiGateway,
    leaderboard::Leaderboard,
    models::Meme,
    session::SessionManager,
    vote::{VoteDirection, VotePhase, VoteSnapshot, reconcile},
};
use tokio::sync::Mutex;

/// Read-only copy of what the dialog currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogView {
    pub meme: Meme,
    pub vote: VoteSnapshot,
    pub phase: VotePhase,
    pub voting: bool,
    pub deleting: bool,
}

// A vote whose request has not answered yet. Outlives close/open so a reopened dialog shows it.
#[derive(Debug, Clone)]
struct InFlightVote {
    meme_id: String,
    previous: VoteSnapshot,
    next: VoteSnapshot,
}

#[derive(Debug, Default)]
struct DialogState {
    meme: Option<Meme>,
    vote: Option<VoteSnapshot>,
    phase: VotePhase,
    // One vote and one delete in flight at most.
    in_flight: Option<InFlightVote>,
    deleting: bool,
}

/// Detail view of one meme. Owns the viewer's vote state for that meme once opened; the
/// leaderboard cache is only ever patched from here, never read back.
pub struct MemeDialog {
    gateway: ApiGateway,
    state: Mutex<DialogState>,
}

impl MemeDialog {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            state: Mutex::new(DialogState::default()),
        }
    }

    /// Shows `meme`. Local vote state is only reset when switching to a different meme.
    pub async fn open(&self, meme: Meme) {
        let mut state = self.state.lock().await;
        let same = state
            .meme
            .as_ref()
            .is_some_and(|current| current.meme_id == meme.meme_id);
        if same {
            return;
        }
        tracing::debug!(meme_id = %meme.meme_id, "Opening meme dialog");
        match state.in_flight.clone().filter(|v| v.meme_id == meme.meme_id) {
            Some(pending) => {
                state.vote = Some(pending.next);
                state.phase = VotePhase::Pending(pending.previous);
            }
            None => {
                state.vote = Some(VoteSnapshot {
                    vote: meme.user_vote,
                    count: meme.votes,
                });
                state.phase = VotePhase::Idle;
            }
        }
        state.meme = Some(meme);
    }

    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.meme = None;
        state.vote = None;
        state.phase = VotePhase::Idle;
    }

    pub async fn view(&self) -> Option<DialogView> {
        let state = self.state.lock().await;
        let meme = state.meme.clone()?;
        let vote = state.vote?;
        Some(DialogView {
            meme,
            vote,
            phase: state.phase,
            voting: state.in_flight.is_some(),
            deleting: state.deleting,
        })
    }

    /// Casts a vote optimistically. The new state is visible before the request goes out and
    /// is rolled back only if the request fails.
    pub async fn vote(
        &self,
        direction: VoteDirection,
        session: &SessionManager,
        leaderboard: &Leaderboard,
    ) -> Result<VoteSnapshot, VoteError> {
        if session.current_user().await.is_none() {
            return Err(VoteError::NotLoggedIn);
        }

        let (meme, previous, outcome) = {
            let mut state = self.state.lock().await;
            let (Some(meme), Some(previous)) = (state.meme.clone(), state.vote) else {
                return Err(VoteError::Closed);
            };
            if state.in_flight.is_some() {
                tracing::debug!(meme_id = %meme.meme_id, "Vote rejected, one is already in flight");
                return Err(VoteError::Busy(meme.meme_id));
            }
            let outcome = reconcile(previous, direction);
            state.vote = Some(outcome.next);
            state.phase = VotePhase::Pending(previous);
            state.in_flight = Some(InFlightVote {
                meme_id: meme.meme_id.clone(),
                previous,
                next: outcome.next,
            });
            (meme, previous, outcome)
        };

        let response = self.gateway.vote_meme(&meme.meme_id, outcome.request).await;

        let mut state = self.state.lock().await;
        state.in_flight = None;
        // A response for a meme the dialog no longer shows must not touch what it shows now.
        let still_open = state
            .meme
            .as_ref()
            .is_some_and(|current| current.meme_id == meme.meme_id);

        if !response.success {
            tracing::warn!(meme_id = %meme.meme_id, code = response.code, "Vote failed, rolling back");
            if still_open {
                state.vote = Some(previous);
                state.phase = VotePhase::RolledBack(previous);
            }
            return Err(VoteError::Failed {
                meme_id: meme.meme_id,
                code: response.code,
            });
        }

        if still_open {
            state.phase = VotePhase::Committed;
        }
        drop(state);

        // The local count stays authoritative; a disagreeing server count is only reported.
        if let Some(server) = &response.data {
            if server.votes != outcome.next.count {
                tracing::warn!(
                    meme_id = %meme.meme_id,
                    local = outcome.next.count,
                    server = server.votes,
                    "Server vote count differs from the optimistic count"
                );
            }
        }

        let updated = Meme {
            votes: outcome.next.count,
            user_vote: outcome.next.vote,
            ..meme
        };
        leaderboard.apply_vote_update(&updated).await;
        tracing::info!(meme_id = %updated.meme_id, votes = updated.votes, "Vote committed");
        Ok(outcome.next)
    }

    /// Admin-only removal of the open meme. Closes the dialog on success.
    pub async fn delete(
        &self,
        session: &SessionManager,
        leaderboard: &Leaderboard,
    ) -> Result<String, DialogError> {
        if !session.is_admin().await {
            return Err(DialogError::NotAdmin);
        }

        let id = {
            let mut state = self.state.lock().await;
            let Some(meme) = state.meme.as_ref() else {
                return Err(DialogError::Closed);
            };
            let id = meme.meme_id.clone();
            if state.deleting {
                return Err(DialogError::Busy(id));
            }
            state.deleting = true;
            id
        };

        let response = self.gateway.delete_meme(&id).await;

        {
            let mut state = self.state.lock().await;
            state.deleting = false;
            if !response.success {
                tracing::warn!(meme_id = %id, code = response.code, "Delete failed");
                return Err(DialogError::DeleteFailed { code: response.code });
            }
            if state.meme.as_ref().is_some_and(|m| m.meme_id == id) {
                state.meme = None;
                state.vote = None;
                state.phase = VotePhase::Idle;
            }
        }

        leaderboard.remove(&id).await;
        tracing::info!(meme_id = %id, "Meme deleted");
        Ok(id)
    }

    /// Shareable link to the open meme.
    pub async fn share_link(&self, origin: &str) -> Option<String> {
        let state = self.state.lock().await;
        state
            .meme
            .as_ref()
            .map(|meme| format!("{}/meme/{}", origin.trim_end_matches('/'), meme.meme_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Method;
    use crate::models::VoteState;
    use crate::test_support::{FakeTransport, meme, meme_list};
    use crate::token_store::MemoryTokenStore;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        transport: Arc<FakeTransport>,
        session: SessionManager,
        leaderboard: Leaderboard,
        dialog: MemeDialog,
    }

    async fn fixture(is_admin: bool) -> Fixture {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_ok(
            Method::Get,
            "/auth/profile",
            json!({ "username": "alice", "email": "a@example.com", "is_admin": is_admin }),
        );
        transport.respond_ok(Method::Get, "/meme", meme_list(&[meme("a", 10), meme("b", 3)]));
        let gateway = ApiGateway::new(transport.clone(), Arc::new(MemoryTokenStore::with_token("t")));

        let session = SessionManager::new(gateway.clone());
        session.init().await;
        let leaderboard = Leaderboard::new(gateway.clone());
        leaderboard.load().await;
        let dialog = MemeDialog::new(gateway);
        dialog.open(meme("a", 10)).await;

        Fixture {
            transport,
            session,
            leaderboard,
            dialog,
        }
    }

    #[tokio::test]
    async fn successful_vote_keeps_optimistic_state_and_patches_cache() {
        let f = fixture(false).await;
        f.transport.respond_ok(Method::Put, "/meme/a/vote", serde_json::to_value(meme("a", 99)).unwrap());

        let next = f.dialog.vote(VoteDirection::Up, &f.session, &f.leaderboard).await.unwrap();

        assert_eq!(next, VoteSnapshot { vote: VoteState::Up, count: 11 });
        let view = f.dialog.view().await.unwrap();
        // The server's count is not adopted.
        assert_eq!(view.vote.count, 11);
        assert_eq!(view.phase, VotePhase::Committed);
        assert!(!view.voting);

        let cached = &f.leaderboard.memes().await[0];
        assert_eq!(cached.votes, 11);
        assert_eq!(cached.user_vote, VoteState::Up);
    }

    #[tokio::test]
    async fn failed_vote_rolls_back_exactly() {
        let f = fixture(false).await;
        f.transport.respond_ok(Method::Put, "/meme/a/vote", json!(null));
        f.transport.respond_status(Method::Put, "/meme/a/vote", 500);
        f.dialog.vote(VoteDirection::Up, &f.session, &f.leaderboard).await.unwrap();

        let err = f
            .dialog
            .vote(VoteDirection::Down, &f.session, &f.leaderboard)
            .await
            .unwrap_err();

        assert!(matches!(err, VoteError::Failed { code: 500, .. }));
        let before = VoteSnapshot { vote: VoteState::Up, count: 11 };
        let view = f.dialog.view().await.unwrap();
        assert_eq!(view.vote, before);
        assert_eq!(view.phase, VotePhase::RolledBack(before));
        assert!(!view.voting);
        // The cache still carries the last committed vote.
        assert_eq!(f.leaderboard.memes().await[0].votes, 11);
    }

    #[tokio::test]
    async fn second_click_while_in_flight_is_rejected() {
        let f = fixture(false).await;
        f.transport.respond_ok(Method::Put, "/meme/a/vote", json!(null));
        let gate = f.transport.hold();

        let first = f.dialog.vote(VoteDirection::Up, &f.session, &f.leaderboard);
        let second = async {
            tokio::task::yield_now().await;
            let pending = f.dialog.view().await.unwrap();
            let result = f.dialog.vote(VoteDirection::Down, &f.session, &f.leaderboard).await;
            gate.notify_one();
            (pending, result)
        };
        let (first, (pending, second)) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(pending.voting);
        assert_eq!(pending.vote.count, 11);
        assert!(pending.phase.is_pending());
        assert_eq!(second, Err(VoteError::Busy("a".into())));
        assert_eq!(f.transport.count(Method::Put, "/meme/a/vote"), 1);
    }

    #[tokio::test]
    async fn reopening_during_vote_shows_the_pending_vote() {
        let f = fixture(false).await;
        f.transport.respond_ok(Method::Put, "/meme/a/vote", json!(null));
        let gate = f.transport.hold();

        let vote = f.dialog.vote(VoteDirection::Up, &f.session, &f.leaderboard);
        let reopen = async {
            tokio::task::yield_now().await;
            f.dialog.close().await;
            let cached = f.leaderboard.memes().await[0].clone();
            f.dialog.open(cached).await;
            let reopened = f.dialog.view().await.unwrap();
            gate.notify_one();
            reopened
        };
        let (vote, reopened) = tokio::join!(vote, reopen);

        let up = VoteSnapshot { vote: VoteState::Up, count: 11 };
        assert_eq!(vote, Ok(up));
        assert_eq!(reopened.vote, up);
        assert!(reopened.voting);
        assert!(reopened.phase.is_pending());

        let view = f.dialog.view().await.unwrap();
        assert_eq!(view.vote, up);
        assert_eq!(view.phase, VotePhase::Committed);
        let cached = &f.leaderboard.memes().await[0];
        assert_eq!((cached.votes, cached.user_vote), (11, VoteState::Up));
    }

    #[tokio::test]
    async fn reopening_during_failed_vote_rolls_back() {
        let f = fixture(false).await;
        f.transport.respond_status(Method::Put, "/meme/a/vote", 500);
        let gate = f.transport.hold();

        let vote = f.dialog.vote(VoteDirection::Down, &f.session, &f.leaderboard);
        let reopen = async {
            tokio::task::yield_now().await;
            f.dialog.close().await;
            f.dialog.open(meme("a", 10)).await;
            gate.notify_one();
        };
        let (vote, _) = tokio::join!(vote, reopen);

        assert!(vote.is_err());
        let before = VoteSnapshot { vote: VoteState::None, count: 10 };
        let view = f.dialog.view().await.unwrap();
        assert_eq!(view.vote, before);
        assert_eq!(view.phase, VotePhase::RolledBack(before));
    }

    #[tokio::test]
    async fn signed_out_viewer_cannot_vote() {
        let f = fixture(false).await;
        f.session.logout().await;

        let result = f.dialog.vote(VoteDirection::Up, &f.session, &f.leaderboard).await;

        assert_eq!(result, Err(VoteError::NotLoggedIn));
        assert_eq!(f.transport.count(Method::Put, "/meme/a/vote"), 0);
    }

    #[tokio::test]
    async fn reopening_same_meme_keeps_local_state() {
        let f = fixture(false).await;
        f.transport.respond_ok(Method::Put, "/meme/a/vote", json!(null));
        f.dialog.vote(VoteDirection::Down, &f.session, &f.leaderboard).await.unwrap();

        f.dialog.open(meme("a", 10)).await;
        assert_eq!(f.dialog.view().await.unwrap().vote.count, 9);

        f.dialog.open(meme("b", 3)).await;
        assert_eq!(f.dialog.view().await.unwrap().vote, VoteSnapshot { vote: VoteState::None, count: 3 });
    }

    #[tokio::test]
    async fn only_admins_delete() {
        let f = fixture(false).await;
        assert_eq!(f.dialog.delete(&f.session, &f.leaderboard).await, Err(DialogError::NotAdmin));
        assert_eq!(f.transport.count(Method::Delete, "/meme/a/delete"), 0);
    }

    #[tokio::test]
    async fn admin_delete_closes_dialog_and_drops_from_cache() {
        let f = fixture(true).await;
        f.transport.respond(Method::Delete, "/meme/a/delete", json!({ "success": true, "code": 200 }));

        assert_eq!(f.dialog.delete(&f.session, &f.leaderboard).await, Ok("a".to_string()));
        assert!(f.dialog.view().await.is_none());
        assert_eq!(f.leaderboard.memes().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_keeps_dialog_open() {
        let f = fixture(true).await;
        f.transport.respond(Method::Delete, "/meme/a/delete", json!({ "success": false, "code": 403 }));

        assert_eq!(
            f.dialog.delete(&f.session, &f.leaderboard).await,
            Err(DialogError::DeleteFailed { code: 403 })
        );
        assert!(f.dialog.view().await.is_some());
    }

    #[tokio::test]
    async fn share_link_points_at_meme_route() {
        let f = fixture(false).await;
        assert_eq!(
            f.dialog.share_link("http://localhost:5173/").await.as_deref(),
            Some("http://localhost:5173/meme/a")
        );
    }
}
