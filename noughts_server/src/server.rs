// TCP server and main event loop for the match coordinator.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main
//   thread.
// - **Reader threads** (one per client): call `framing::read_message()` in
//   a loop, decode the envelope, and send `InternalEvent::MessageFrom`. On
//   error or EOF they send `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Coordinator` and dispatches events from the
//   channel. All state mutation is serialized here — at most one action
//   applies at a time, in the order the channel delivers them.
//
// The main thread is the only writer to client TCP streams (through the
// write halves stored in the roster). Reader threads only read.
//
// Broadcast discipline: every `apply_action` response goes to every seated
// player, not just the sender — game state is shared, so each client
// mirrors the match from the same stream of outcome envelopes.

use std::io::{BufReader, BufWriter};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use noughts_protocol::framing::{read_message, write_message};
use noughts_protocol::message::{Envelope, MessageKind, Payload, build_message, decode, encode};
use noughts_protocol::{Action, GameStatus, Outcome, PlayerId};

use crate::coordinator::Coordinator;

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    MessageFrom {
        player_id: PlayerId,
        envelope: Envelope,
    },
    Disconnected {
        player_id: PlayerId,
    },
}

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a match server.
pub struct ServerConfig {
    pub port: u16,
    /// Pick the opening player at random instead of by seating order.
    pub random_first_player: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            random_first_player: false,
        }
    }
}

/// Start the match server on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used
/// to let the OS pick a free port).
pub fn start_server(
    config: ServerConfig,
) -> std::io::Result<(ServerHandle, std::net::SocketAddr)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_server(listener, config, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main server loop. Runs until `keep_running` is set to false.
fn run_server(listener: TcpListener, config: ServerConfig, keep_running: Arc<AtomicBool>) {
    let mut coordinator = Coordinator::new();

    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Set the listener to non-blocking so the accept thread can check
    // keep_running periodically.
    listener.set_nonblocking(true).ok();

    // Listener thread: accepts new connections.
    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    // Main event loop. The timeout only bounds the shutdown check; there
    // is no timer-driven work.
    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                handle_event(&mut coordinator, event, &config, &tx, &keep_running);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Dispatch a single event to the coordinator.
fn handle_event(
    coordinator: &mut Coordinator,
    event: InternalEvent,
    config: &ServerConfig,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            handle_new_connection(coordinator, stream, tx, keep_running);
        }
        InternalEvent::MessageFrom {
            player_id,
            envelope,
        } => {
            handle_message(coordinator, player_id, envelope, config);
        }
        InternalEvent::Disconnected { player_id } => {
            handle_disconnect(coordinator, player_id);
        }
    }
}

/// Handle a new TCP connection: read the join handshake, seat the player,
/// and spawn a reader thread.
fn handle_new_connection(
    coordinator: &mut Coordinator,
    stream: TcpStream,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    // Set a read timeout so the handshake doesn't block the event loop
    // forever.
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok();

    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let join_bytes = match read_message(&mut reader) {
        Ok(bytes) => bytes,
        Err(_) => return,
    };

    // Malformed bytes are a dropped message (and a dropped connection),
    // never a crash.
    let join = match decode(&join_bytes) {
        Ok(envelope) => envelope,
        Err(_) => return,
    };

    let (name, mark) = match (&join.kind, &join.payload.name, join.payload.mark) {
        (MessageKind::Action(Action::Join), Some(name), Some(mark)) => (name.clone(), mark),
        _ => {
            // Expected a join as the first message — drop the connection.
            return;
        }
    };

    let write_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };

    match coordinator.add_player(&name, mark, BufWriter::new(write_stream)) {
        Ok(player_id) => {
            println!("player {name} joined as {} (id {})", mark.symbol(), player_id.0);

            // Clear the handshake timeout for the long-lived reader loop.
            stream.set_read_timeout(None).ok();

            // Everyone learns about the new seat, the joiner included —
            // the broadcast carries the assigned id.
            let response = Envelope::outcome(
                Outcome::Ok,
                Payload {
                    player_id: Some(player_id),
                    action: Some(Action::Join),
                    name: Some(name),
                    mark: Some(mark),
                    ..Payload::default()
                },
            );
            broadcast(coordinator, &response);

            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(reader, player_id, tx_reader, keep_running_reader);
            });
        }
        Err(outcome) => {
            // full_roster / mark_already_taken — answer the joiner alone
            // and close the connection.
            let response = Envelope::outcome(
                outcome,
                Payload {
                    action: Some(Action::Join),
                    ..Payload::default()
                },
            );
            if let Ok(json) = encode(&response) {
                let mut writer = BufWriter::new(stream);
                let _ = write_message(&mut writer, &json);
            }
        }
    }
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    player_id: PlayerId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_message(&mut reader) {
            Ok(bytes) => match decode(&bytes) {
                Ok(envelope) => {
                    let _ = tx.send(InternalEvent::MessageFrom {
                        player_id,
                        envelope,
                    });
                }
                Err(_) => {
                    // Malformed message — treat the client as gone.
                    let _ = tx.send(InternalEvent::Disconnected { player_id });
                    break;
                }
            },
            Err(_) => {
                // Read error or EOF — disconnect.
                let _ = tx.send(InternalEvent::Disconnected { player_id });
                break;
            }
        }
    }
}

/// Apply one gameplay request and broadcast the response.
fn handle_message(
    coordinator: &mut Coordinator,
    player_id: PlayerId,
    mut envelope: Envelope,
    config: &ServerConfig,
) {
    // The server vouches for the sender: a request acts as the
    // connection's player, whatever the payload claimed.
    envelope.payload.player_id = Some(player_id);

    let response = coordinator.apply_action(&envelope);
    broadcast(coordinator, &response);

    match response.kind {
        MessageKind::Outcome(Outcome::GameReadyToStart) => {
            if coordinator.is_status(GameStatus::ReadyToStart) {
                begin_round(coordinator, config.random_first_player);
            }
        }
        MessageKind::Outcome(Outcome::DisconnectClient) => {
            drop_player(coordinator, player_id);
        }
        _ => {}
    }
}

/// Both seats are filled and start was accepted: begin the round and tell
/// everyone who opens.
fn begin_round(coordinator: &mut Coordinator, random_first: bool) {
    coordinator.start_game();
    coordinator.switch_current_player(random_first);
    let banner = build_message(
        GameStatus::Ongoing,
        Payload {
            player_id: coordinator.current_player_id(),
            ..Payload::default()
        },
    );
    broadcast(coordinator, &banner);
}

/// A dropped connection counts as that player exiting.
fn handle_disconnect(coordinator: &mut Coordinator, player_id: PlayerId) {
    if coordinator.roster().find_by_id(player_id).is_none() {
        // Already removed after an explicit exit.
        return;
    }
    let exit = Envelope::request(
        Action::Exit,
        Payload {
            player_id: Some(player_id),
            ..Payload::default()
        },
    );
    let response = coordinator.apply_action(&exit);
    broadcast(coordinator, &response);
    drop_player(coordinator, player_id);
}

/// Remove a player, announce it, and tear the match down once the last
/// seat empties.
fn drop_player(coordinator: &mut Coordinator, player_id: PlayerId) {
    if coordinator.remove_player(player_id) != Outcome::Ok {
        // Already gone (an explicit exit raced the reader's EOF).
        return;
    }
    println!("player {} left", player_id.0);

    let notice = Envelope::outcome(
        Outcome::PlayerRemoved,
        Payload {
            player_id: Some(player_id),
            ..Payload::default()
        },
    );
    broadcast(coordinator, &notice);

    if coordinator.roster().is_empty() {
        // The session dies with its last player.
        coordinator.reset_all();
        println!("session reset, waiting for players");
    }
}

/// Broadcast an envelope to every seated player. Write errors are ignored:
/// a broken pipe surfaces through that client's reader thread as a
/// disconnect.
fn broadcast(coordinator: &mut Coordinator, envelope: &Envelope) {
    let json = match encode(envelope) {
        Ok(json) => json,
        Err(_) => return,
    };
    for writer in coordinator.roster_mut().writers_mut() {
        let _ = write_message(writer, &json);
    }
}
