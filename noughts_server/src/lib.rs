// noughts_server — authoritative match coordinator for noughts and crosses.
//
// One server instance hosts one two-player match over persistent TCP
// connections. Clients send action envelopes; the coordinator validates
// them against the session state and the server broadcasts every outcome
// envelope to all seated players, so each client mirrors the match from
// the same stream of messages.
//
// Module overview:
// - `board.rs`:       Pure board state — cells, turn cursor, winner memo,
//                     win/draw detection behind a calling-discipline guard.
// - `roster.rs`:      Seated players with identity, marks, connection
//                     write halves, and turn rotation.
// - `coordinator.rs`: The authoritative state machine: owns Board + Roster
//                     + status, runs the `apply_action` validation
//                     pipeline.
// - `server.rs`:      TCP listener, reader threads (one per client), and
//                     the main event loop. `std::net` with thread-per-
//                     reader and an `mpsc` channel funneling into the
//                     single-threaded coordinator.
// - `client.rs`:      Blocking TCP client with a background reader and a
//                     non-blocking `poll()` inbox.
//
// Dependencies: `noughts_protocol` (shared envelope types and framing),
// `rand` (random opening player).
//
// The server can run as a standalone binary (`main.rs`) or be embedded in
// another process via the library API (`start_server`).

pub mod board;
pub mod client;
pub mod coordinator;
pub mod roster;
pub mod server;

pub use client::NetClient;
pub use coordinator::Coordinator;
pub use server::start_server;
