// noughts_protocol — wire protocol for the Noughts match coordinator.
//
// This crate defines the message envelope, framing, and serialization used
// by the coordinator (`noughts_server`) and game clients to communicate
// over TCP. It is shared between both sides and has no dependency on the
// game logic.
//
// Module overview:
// - `types.rs`:   Core wire types — `PlayerId`, `Mark`, `GameStatus`.
// - `message.rs`: The `{type, payload}` envelope, the closed token sets
//                 (`Action`, `Outcome`), and `encode`/`decode`.
// - `framing.rs`: Length-delimited framing over any `Read`/`Write` stream:
//                 4-byte big-endian length prefix, then JSON payload.
// - `connect.rs`: The connection-establishment error catalogue (numeric
//                 codes mapped to display text; dial-time only).
//
// Design decisions:
// - **JSON serialization.** Envelopes are small and debuggability matters
//   more than bandwidth for a turn-based game.
// - **String tokens, not indices.** Every action, status, and outcome maps
//   to a distinct stable token, so a peer in any language can speak the
//   protocol from the token tables alone.
// - **No async runtime.** Uses `std::io::Read`/`Write` for framing,
//   compatible with blocking TCP streams and buffered wrappers.

pub mod connect;
pub mod framing;
pub mod message;
pub mod types;

pub use connect::{ConnectCode, ConnectFailure};
pub use framing::{MAX_MESSAGE_SIZE, read_message, write_message};
pub use message::{Action, Envelope, MessageKind, Outcome, Payload, build_message, decode, encode};
pub use types::{GameStatus, Mark, PlayerId};
