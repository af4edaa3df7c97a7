// The authoritative match coordinator.
//
// `Coordinator` owns the one Board, the one Roster, and the session status
// — it is the single source of truth, and no other component mutates any
// of the three. The server's event loop is the only caller, so mutation is
// serialized by single ownership: actions apply in the order the event
// channel delivers them, with no internal locking.
//
// `apply_action` is the single entry point for gameplay requests. Each
// action runs an ordered validation pipeline; every validation failure is
// an `Outcome` carried inside the response payload, never a thrown error.
// The response envelope's `type` is the outcome itself, and the server
// broadcasts it to all seated players, not just the sender.
//
// Roster changes (`add_player`, `remove_player`) are separate calls made
// by the connection layer during connection setup and teardown; they do
// not travel through `apply_action`.

use std::io::BufWriter;
use std::net::TcpStream;

use noughts_protocol::message::{Envelope, MessageKind, Payload};
use noughts_protocol::{Action, GameStatus, Mark, Outcome, PlayerId};

use crate::board::{Board, SLOT_COUNT, Verdict};
use crate::roster::{MAX_PLAYERS, Roster};

pub struct Coordinator {
    board: Board,
    roster: Roster,
    status: GameStatus,
    winner: Option<PlayerId>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Coordinator::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Coordinator {
            board: Board::new(),
            roster: Roster::new(),
            status: GameStatus::Waiting,
            winner: None,
        }
    }

    // ---- roster delegation ----

    /// Seat a player and return their assigned id.
    pub fn add_player(
        &mut self,
        name: &str,
        mark: Mark,
        writer: BufWriter<TcpStream>,
    ) -> Result<PlayerId, Outcome> {
        self.roster.add_player(name, mark, writer)
    }

    /// Remove a player from the roster.
    pub fn remove_player(&mut self, id: PlayerId) -> Outcome {
        self.roster.remove_player(id)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    // ---- match lifecycle ----

    /// Begin a round: fresh board, status `Ongoing`. The caller is
    /// expected to pick an opening player next (`switch_current_player`).
    pub fn start_game(&mut self) {
        self.status = GameStatus::Ongoing;
        self.reset_board();
    }

    /// Reset the board only.
    pub fn reset_board(&mut self) {
        self.board.reset();
    }

    /// Tear the whole session down: board, roster, id assignment, winner
    /// memo, and status. Ready for a fresh first join afterwards.
    pub fn reset_all(&mut self) {
        self.reset_board();
        let _ = self.roster.remove_all();
        self.reset_manager();
    }

    fn reset_manager(&mut self) {
        self.roster.reset_ids();
        self.winner = None;
        self.status = GameStatus::Waiting;
    }

    /// Hand the turn to the next player in roster order, or pick an
    /// opening player when no turn mark is set yet (the first player, or a
    /// random one with `random_initial`). No-op on an empty roster.
    pub fn switch_current_player(&mut self, random_initial: bool) {
        if let Some(mark) = self.roster.advance_turn(self.board.turn(), random_initial) {
            self.board.set_turn(mark);
        }
    }

    /// Make a specific player the current one.
    pub fn set_current_player(&mut self, id: PlayerId) -> Outcome {
        match self.roster.find_by_id(id) {
            Some(player) => {
                self.board.set_turn(player.mark);
                Outcome::Ok
            }
            None => Outcome::PlayerNotFound,
        }
    }

    // ---- introspection ----

    /// Whether the session is currently in `expected`.
    pub fn is_status(&self, expected: GameStatus) -> bool {
        self.status == expected
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// The match winner, once one is recorded.
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Whether any board cell holds a mark.
    pub fn board_has_any_move(&self) -> bool {
        self.board.has_any_move()
    }

    /// Whether `slot` already holds a mark.
    pub fn slot_occupied(&self, slot: usize) -> bool {
        self.board.is_occupied(slot)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    /// The player whose turn it is, if a turn mark is set and its holder
    /// is still seated.
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.board
            .turn()
            .and_then(|mark| self.roster.find_by_mark(mark))
    }

    // ---- the action pipeline ----

    /// Single entry point for gameplay requests.
    ///
    /// Decodes the message kind into an action, runs the matching branch,
    /// and wraps the outcome into a response envelope. `slot` and
    /// `player_id` are echoed from the request so a broadcast response is
    /// enough for every client to mirror the move; on `winner_reached` the
    /// response `player_id` is the winner's.
    pub fn apply_action(&mut self, message: &Envelope) -> Envelope {
        let action = match &message.kind {
            MessageKind::Action(action) => Some(*action),
            _ => None,
        };
        let result = match action {
            Some(action) => self.process_action(action, &message.payload),
            None => Outcome::InvalidAction,
        };
        let player_id = if result == Outcome::WinnerReached {
            self.winner.or(message.payload.player_id)
        } else {
            message.payload.player_id
        };
        Envelope::outcome(
            result,
            Payload {
                slot: message.payload.slot,
                player_id,
                action,
                ..Payload::default()
            },
        )
    }

    fn process_action(&mut self, action: Action, payload: &Payload) -> Outcome {
        match action {
            Action::MakeMovement => self.process_make_movement(payload),
            Action::Restart => self.process_restart(),
            Action::Exit => self.process_exit(),
            Action::Start => self.process_start(),
            // Join is a connection-setup concern; a seated client
            // re-sending it is not a game action.
            Action::Join => Outcome::InvalidAction,
        }
    }

    fn process_start(&mut self) -> Outcome {
        let validation = self.validate_start();
        if validation != Outcome::Ok {
            return validation;
        }
        self.status = GameStatus::ReadyToStart;
        Outcome::GameReadyToStart
    }

    fn process_restart(&mut self) -> Outcome {
        let validation = self.validate_restart();
        if validation == Outcome::Ok {
            self.status = GameStatus::Waiting;
            self.board.reset();
            // A stale winner memo would answer every post-restart movement
            // with `winner_reached`.
            self.winner = None;
        }
        validation
    }

    fn process_exit(&mut self) -> Outcome {
        self.status = GameStatus::Finished;
        Outcome::DisconnectClient
    }

    fn process_make_movement(&mut self, payload: &Payload) -> Outcome {
        let Some(slot) = payload.slot else {
            return Outcome::GameActionError;
        };
        let validation = self.validate_movement(slot, payload.player_id);
        if validation != Outcome::Ok {
            return validation;
        }
        let slot = slot as usize;
        if let Err(violation) = self.board.apply_move(slot) {
            unreachable!("validated move rejected by board guard: {violation}");
        }
        match self.board.detect_outcome() {
            Ok(Verdict::Winner(mark)) => {
                self.winner = self.roster.find_by_mark(mark);
                self.status = GameStatus::Finished;
                Outcome::WinnerReached
            }
            Ok(Verdict::Draw) => {
                self.status = GameStatus::Finished;
                Outcome::GameDraw
            }
            Ok(Verdict::Undecided) => {
                self.switch_current_player(false);
                Outcome::Ok
            }
            Err(violation) => {
                unreachable!("outcome check rejected by board guard: {violation}")
            }
        }
    }

    // ---- validations ----

    fn validate_start(&self) -> Outcome {
        if self.roster.len() < MAX_PLAYERS {
            return Outcome::InsufficientPlayers;
        }
        let already_running = self.status == GameStatus::Ongoing;
        if already_running || (self.winner.is_some() && self.board.has_any_move()) {
            return Outcome::GameHasStarted;
        }
        Outcome::Ok
    }

    fn validate_restart(&self) -> Outcome {
        if matches!(
            self.status,
            GameStatus::Waiting | GameStatus::ReadyToStart
        ) {
            return Outcome::GameNotStarted;
        }
        Outcome::Ok
    }

    /// Ordered movement validation: concluded round, phase, slot range,
    /// occupancy, then turn ownership when the sender is known.
    ///
    /// Moves require a running round with a turn mark set; the board's
    /// guard can therefore never fire on a validated call. A payload
    /// without `player_id` skips the ownership check — the server always
    /// stamps the sender's id, so only direct library callers take the
    /// permissive branch.
    fn validate_movement(&self, slot: i64, sender: Option<PlayerId>) -> Outcome {
        if self.board.winner().is_some() {
            return Outcome::WinnerReached;
        }
        if self.status != GameStatus::Ongoing || self.board.turn().is_none() {
            return Outcome::GameNotStarted;
        }
        if !(0..SLOT_COUNT as i64).contains(&slot) {
            return Outcome::InvalidSlot;
        }
        if self.board.is_occupied(slot as usize) {
            return Outcome::OccupiedSlot;
        }
        if let Some(sender) = sender {
            if self.current_player_id() != Some(sender) {
                return Outcome::NotPlayerTurn;
            }
        }
        Outcome::Ok
    }
}
