// Player roster for one match session.
//
// An ordered list of up to two seated players, each with identity, chosen
// mark, and the write half of their connection. The roster owns player
// identity: ids are handed out monotonically and never reused within a
// session, even after a removal. Turn rotation follows roster order.
//
// The connection handle is stored so the server's event loop can broadcast
// through it; the game logic itself never reads or writes the stream.

use std::io::BufWriter;
use std::net::TcpStream;

use noughts_protocol::{Mark, Outcome, PlayerId};
use rand::Rng;

/// Maximum seated players.
pub const MAX_PLAYERS: usize = 2;

/// A seated player.
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub mark: Mark,
    writer: BufWriter<TcpStream>,
}

#[derive(Default)]
pub struct Roster {
    players: Vec<Player>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    /// Seat a player and return their fresh id.
    ///
    /// Fails with `FullRoster` when both seats are taken, then with
    /// `MarkAlreadyTaken` when the other player already holds `mark`.
    pub fn add_player(
        &mut self,
        name: &str,
        mark: Mark,
        writer: BufWriter<TcpStream>,
    ) -> Result<PlayerId, Outcome> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(Outcome::FullRoster);
        }
        if self.players.iter().any(|p| p.mark == mark) {
            return Err(Outcome::MarkAlreadyTaken);
        }
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        self.players.push(Player {
            id,
            name: name.to_owned(),
            mark,
            writer,
        });
        Ok(id)
    }

    /// Remove the player with `id`.
    pub fn remove_player(&mut self, id: PlayerId) -> Outcome {
        if self.players.is_empty() {
            return Outcome::EmptyRoster;
        }
        match self.players.iter().position(|p| p.id == id) {
            Some(index) => {
                self.players.remove(index);
                Outcome::Ok
            }
            None => Outcome::PlayerNotFound,
        }
    }

    /// Remove everyone. Id assignment continues from where it was; a fresh
    /// session resets it through `reset_ids`.
    pub fn remove_all(&mut self) -> Outcome {
        if self.players.is_empty() {
            return Outcome::EmptyRoster;
        }
        self.players.clear();
        Outcome::Ok
    }

    /// Restart id assignment for a fresh session.
    pub(crate) fn reset_ids(&mut self) {
        self.next_id = 0;
    }

    pub fn find_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The id of the player holding `mark`.
    pub fn find_by_mark(&self, mark: Mark) -> Option<PlayerId> {
        self.players.iter().find(|p| p.mark == mark).map(|p| p.id)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Writers for every seated player, for the server's broadcast path.
    pub fn writers_mut(&mut self) -> impl Iterator<Item = &mut BufWriter<TcpStream>> {
        self.players.iter_mut().map(|p| &mut p.writer)
    }

    /// The mark that should move next.
    ///
    /// With no current mark the first player opens, or a uniformly random
    /// player when `random_initial` is set. With a current mark, rotation
    /// is cyclic in roster order. Returns `None` on an empty roster.
    pub fn advance_turn(&self, current: Option<Mark>, random_initial: bool) -> Option<Mark> {
        if self.players.is_empty() {
            return None;
        }
        let index = match current.and_then(|mark| self.players.iter().position(|p| p.mark == mark))
        {
            Some(position) => (position + 1) % self.players.len(),
            None if random_initial => rand::thread_rng().gen_range(0..self.players.len()),
            None => 0,
        };
        Some(self.players[index].mark)
    }
}
