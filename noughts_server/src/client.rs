// TCP client for connecting to the match coordinator.
//
// `connect()` dials, performs the join handshake on the calling thread,
// then spawns a background reader thread. The reader pushes every
// broadcast envelope into an `mpsc` channel; `poll()` drains it
// non-blocking, so a caller (a UI loop, a bot, a test) never blocks on
// network I/O.
//
// Dial failures are classified through the connection error catalogue
// (`connect.rs` in the protocol crate). That is a separate channel from
// in-game outcomes, which arrive as ordinary envelopes via `poll()` — the
// two never mix.

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use noughts_protocol::framing::{read_message, write_message};
use noughts_protocol::message::{Envelope, Payload, decode, encode};
use noughts_protocol::{Action, ConnectFailure, Mark, Outcome, PlayerId};

/// Why a connection attempt failed.
#[derive(Debug)]
pub enum ConnectError {
    /// The dial itself failed (connection catalogue channel).
    Transport(ConnectFailure),
    /// The coordinator answered the join with a rejection outcome.
    Rejected(Outcome),
    /// The handshake response was missing or unreadable.
    Handshake(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Transport(failure) => write!(f, "{failure}"),
            ConnectError::Rejected(outcome) => write!(f, "join rejected: {outcome:?}"),
            ConnectError::Handshake(detail) => write!(f, "handshake failed: {detail}"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// TCP client for one seated player.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<Envelope>,
    _reader_thread: Option<JoinHandle<()>>,
    player_id: PlayerId,
}

impl NetClient {
    /// Dial the coordinator, perform the join handshake, and spawn a
    /// reader thread. Returns the client holding its assigned player id.
    pub fn connect(addr: &str, name: &str, mark: Mark) -> Result<Self, ConnectError> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| ConnectError::Transport(ConnectFailure::from_io(e)))?;

        // Bound the handshake; cleared again before the reader loop.
        stream.set_read_timeout(Some(Duration::from_secs(5))).ok();

        let reader_stream = stream
            .try_clone()
            .map_err(|e| ConnectError::Transport(ConnectFailure::from_io(e)))?;
        let mut writer = BufWriter::new(stream);

        let join = Envelope::request(Action::Join, Payload::join(name, mark));
        send_envelope(&mut writer, &join).map_err(ConnectError::Handshake)?;

        // The first envelope we can receive is the answer to our join:
        // the seating broadcast with our id, or a rejection.
        let mut reader = BufReader::new(reader_stream);
        let response_bytes = read_message(&mut reader)
            .map_err(|e| ConnectError::Handshake(format!("read join response: {e}")))?;
        let response = decode(&response_bytes)
            .map_err(|e| ConnectError::Handshake(format!("parse join response: {e}")))?;

        if !response.is_success() {
            let outcome = response.payload.error.unwrap_or(Outcome::GameActionError);
            return Err(ConnectError::Rejected(outcome));
        }
        let player_id = response.payload.player_id.ok_or_else(|| {
            ConnectError::Handshake("join response carried no player id".into())
        })?;

        if let Ok(inner) = reader.get_ref().try_clone() {
            inner.set_read_timeout(None).ok();
        }

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(reader, tx);
        });

        Ok(Self {
            writer,
            inbox: rx,
            _reader_thread: Some(reader_thread),
            player_id,
        })
    }

    /// The id the coordinator assigned at join time.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Claim a board slot.
    pub fn send_move(&mut self, slot: i64) -> Result<(), String> {
        let msg = Envelope::request(
            Action::MakeMovement,
            Payload {
                slot: Some(slot),
                player_id: Some(self.player_id),
                ..Payload::default()
            },
        );
        send_envelope(&mut self.writer, &msg)
    }

    /// Ask for the match to begin.
    pub fn send_start(&mut self) -> Result<(), String> {
        send_envelope(
            &mut self.writer,
            &Envelope::request(Action::Start, Payload::default()),
        )
    }

    /// Reset the match back to the lobby.
    pub fn send_restart(&mut self) -> Result<(), String> {
        send_envelope(
            &mut self.writer,
            &Envelope::request(Action::Restart, Payload::default()),
        )
    }

    /// Leave the session.
    pub fn send_exit(&mut self) -> Result<(), String> {
        send_envelope(
            &mut self.writer,
            &Envelope::request(Action::Exit, Payload::default()),
        )
    }

    /// Drain all queued broadcast envelopes (non-blocking).
    pub fn poll(&self) -> Vec<Envelope> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

/// Encode an envelope and write it with length-delimited framing.
fn send_envelope(writer: &mut BufWriter<TcpStream>, envelope: &Envelope) -> Result<(), String> {
    let json = encode(envelope).map_err(|e| e.to_string())?;
    write_message(writer, &json).map_err(|e| e.to_string())
}

/// Reader thread: read framed envelopes in a loop, push to the channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<Envelope>) {
    while let Ok(bytes) = read_message(&mut reader) {
        match decode(&bytes) {
            Ok(envelope) => {
                if tx.send(envelope).is_err() {
                    break; // Client dropped the receiver
                }
            }
            Err(_) => break, // Malformed message
        }
    }
}
