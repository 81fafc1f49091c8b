//! Client for the MemeArena meme-voting service.
//!
//! The interesting parts are the optimistic vote flow in [`dialog`] and the list/selection
//! synchronization in [`leaderboard`]; the rest is a thin gateway over the REST API.

pub mod app;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod leaderboard;
pub mod models;
pub mod routes;
pub mod session;
pub mod token_store;
pub mod transport;
pub mod upload;
pub mod view;
pub mod vote;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::App;
pub use config::Config;
pub use gateway::ApiGateway;
pub use models::{Meme, User, VoteState};
