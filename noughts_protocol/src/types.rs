// Core wire types for the match protocol.
//
// Lightweight newtypes and enums shared by `message.rs` (envelopes) and the
// coordinator's session management in `noughts_server`. Every enum here
// serializes as a stable string token so a remote peer can deserialize
// envelopes without sharing the server's internal enumeration types.

use serde::{Deserialize, Serialize};

/// Coordinator-assigned player ID.
///
/// Assigned monotonically at join time and never reused within a session,
/// even after the player is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// The symbol a player plays as. Wire tokens are the display characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "o")]
    Nought,
    #[serde(rename = "x")]
    Cross,
}

impl Mark {
    /// Display character, used when rendering the board.
    pub fn symbol(self) -> char {
        match self {
            Mark::Nought => 'o',
            Mark::Cross => 'x',
        }
    }
}

/// Lifecycle phase of a match session.
///
/// Exactly one value is active at a time, and transitions happen only
/// through the coordinator's action pipeline: `Waiting → ReadyToStart →
/// Ongoing → Finished`, with `Ongoing`/`Finished` returning to `Waiting`
/// via restart. Statuses double as broadcastable banner message types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    ReadyToStart,
    Ongoing,
    Finished,
}
