use thiserror::Error;

use crate::modules::graph::RoomId;

/// Errors surfaced by the agent core.
///
/// Remote-reported `errors`/`messages` are not represented here; they travel back to the
/// caller inside `ResponseMeta` and only get logged.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network failure talking to the remote world.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote world answered with a non-success status.
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    /// No path over resolved edges connects the two rooms.
    #[error("no route from room {from} to room {to}")]
    NoRoute { from: RoomId, to: RoomId },

    #[error("room {0} is not in the map")]
    UnknownRoom(RoomId),

    #[error("puzzle decoder failed: {0}")]
    Puzzle(String),

    /// The stop signal was raised between two requests.
    #[error("stopped by user")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, AgentError>;
