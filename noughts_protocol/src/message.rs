// Protocol messages for client-coordinator communication.
//
// Everything on the wire is one shape: an `Envelope` of `{type, payload}`.
// The `type` is a string token drawn from three closed sets — request
// actions, session statuses, and outcome values — and the payload is an
// open struct of optional fields. Clients send action envelopes; the
// coordinator answers with outcome envelopes whose `type` is the outcome
// token itself, and the server broadcasts status banners between rounds.
//
// Outcome values are carried in-band (`payload.error`), never thrown:
// every gameplay validation failure is a normal return value. The invariant
// that `payload.error` is set exactly when the outcome is outside the safe
// set is enforced in `Envelope::outcome`, the one response constructor.

use serde::{Deserialize, Serialize};

use crate::types::{GameStatus, Mark, PlayerId};

/// Request kinds a client can put on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Claim a board slot (`payload.slot`).
    MakeMovement,
    /// Ask for the match to begin.
    Start,
    /// Reset a running or finished match back to the lobby.
    Restart,
    /// Leave the session.
    Exit,
    /// Connection handshake (`payload.name` + `payload.mark`). Handled by
    /// the server during connection setup, never by the coordinator's
    /// action pipeline — roster changes do not go through `apply_action`.
    Join,
}

/// Result of one validation or action step, carried in-band.
///
/// A single closed enum covers success, informational warnings, and
/// validation errors alike; whether a value counts as success is a plain
/// equality test over the safe set (`is_safe`), nothing more.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The request was applied.
    Ok,
    /// Both seats are filled and the match may begin.
    GameReadyToStart,
    /// Directive to the connection layer: drop this client.
    DisconnectClient,
    /// A player left the roster (broadcast by the server on removal).
    PlayerRemoved,
    /// A winning line is on the board; no further moves are accepted.
    WinnerReached,
    /// Every cell is filled and no line was completed.
    GameDraw,
    /// Start refused: a round is already running.
    GameHasStarted,
    /// The action needs a running round and there is none.
    GameNotStarted,
    /// Join refused: two players are already seated.
    FullRoster,
    /// Removal refused: there is nobody to remove.
    EmptyRoster,
    /// Join refused: the other player already holds that mark.
    MarkAlreadyTaken,
    /// No player with the requested id.
    PlayerNotFound,
    /// Start refused: fewer than two players are seated.
    InsufficientPlayers,
    /// The slot is outside the board.
    InvalidSlot,
    /// The slot already holds a mark.
    OccupiedSlot,
    /// The move came from the player whose turn it is not.
    NotPlayerTurn,
    /// The message `type` is not a recognized game action.
    InvalidAction,
    /// The payload is missing a field the action requires.
    GameActionError,
}

impl Outcome {
    /// Outcomes that count as success when carried in a response payload.
    pub fn is_safe(self) -> bool {
        matches!(
            self,
            Outcome::Ok | Outcome::GameReadyToStart | Outcome::DisconnectClient
        )
    }

    /// The payload-level error view of this outcome: `Some(self)` unless
    /// it is in the safe set.
    pub fn as_error(self) -> Option<Outcome> {
        (!self.is_safe()).then_some(self)
    }
}

/// The `type` field of an envelope.
///
/// `Other` catches tokens outside the known sets, so an unrecognized type
/// still decodes and the coordinator can answer `invalid_action`; only
/// malformed JSON or framing is a decode error (and a dropped message).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageKind {
    Action(Action),
    Status(GameStatus),
    Outcome(Outcome),
    Other(String),
}

impl From<Action> for MessageKind {
    fn from(action: Action) -> Self {
        MessageKind::Action(action)
    }
}

impl From<GameStatus> for MessageKind {
    fn from(status: GameStatus) -> Self {
        MessageKind::Status(status)
    }
}

impl From<Outcome> for MessageKind {
    fn from(outcome: Outcome) -> Self {
        MessageKind::Outcome(outcome)
    }
}

/// Envelope payload: an open map of optional fields.
///
/// Unknown incoming fields are ignored and absent fields are omitted on
/// the wire, so both sides can extend the payload without breaking the
/// other.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Board slot, 0-8 in row-major order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<i64>,
    /// Acting player on requests; winner on `winner_reached` responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    /// Whether the producing outcome was in the safe set (responses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Echo of the action a response answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// The failing outcome. Set if and only if `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Outcome>,
    /// Display name (join handshake).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Requested mark (join handshake).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<Mark>,
}

impl Payload {
    /// Payload for a `make_movement` request.
    pub fn with_slot(slot: i64) -> Self {
        Payload {
            slot: Some(slot),
            ..Payload::default()
        }
    }

    /// Payload for a `join` handshake.
    pub fn join(name: &str, mark: Mark) -> Self {
        Payload {
            name: Some(name.to_owned()),
            mark: Some(mark),
            ..Payload::default()
        }
    }
}

/// The uniform `{type, payload}` wire message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub payload: Payload,
}

impl Envelope {
    /// Request envelope for a game action.
    pub fn request(action: Action, payload: Payload) -> Self {
        build_message(action, payload)
    }

    /// Response envelope for an outcome. The envelope `type` is the outcome
    /// itself; `payload.success` and `payload.error` are derived from the
    /// safe set here and nowhere else.
    pub fn outcome(outcome: Outcome, mut payload: Payload) -> Self {
        let error = outcome.as_error();
        payload.success = Some(error.is_none());
        payload.error = error;
        build_message(outcome, payload)
    }

    /// Whether this envelope reports success.
    pub fn is_success(&self) -> bool {
        self.payload.success == Some(true)
    }
}

/// Build an envelope, stamping the kind's wire token into `type` and
/// carrying the payload unchanged.
pub fn build_message(kind: impl Into<MessageKind>, payload: Payload) -> Envelope {
    Envelope {
        kind: kind.into(),
        payload,
    }
}

/// Serialize an envelope to JSON bytes.
pub fn encode(envelope: &Envelope) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(envelope)
}

/// Deserialize an envelope from JSON bytes.
///
/// A failure here means the message is malformed; the connection layer
/// treats it as a dropped message (and a dead client), never as a game
/// outcome.
pub fn decode(bytes: &[u8]) -> serde_json::Result<Envelope> {
    serde_json::from_slice(bytes)
}
