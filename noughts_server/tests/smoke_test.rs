// Integration smoke test for the match server.
//
// Starts a server on localhost, connects real clients, and exercises the
// full protocol lifecycle: join handshake, start, turn-by-turn play to a
// win, restart, explicit exit, abrupt disconnect, and session teardown.
//
// Clients are `NetClient` instances plus one raw TCP socket (for the
// abrupt-disconnect case) — the same code paths as a live game.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use noughts_protocol::message::{Envelope, MessageKind, Payload, decode, encode};
use noughts_protocol::{
    Action, ConnectCode, GameStatus, Mark, Outcome, PlayerId, read_message, write_message,
};
use noughts_server::client::{ConnectError, NetClient};
use noughts_server::server::{ServerConfig, ServerHandle, start_server};

/// Start a server on a random port and give the listener a moment.
fn start_test_server() -> (ServerHandle, SocketAddr) {
    let config = ServerConfig {
        port: 0, // OS picks a free port
        random_first_player: false,
    };
    let (handle, addr) = start_server(config).unwrap();
    thread::sleep(Duration::from_millis(50));
    (handle, addr)
}

fn connect(addr: SocketAddr, name: &str, mark: Mark) -> NetClient {
    NetClient::connect(&addr.to_string(), name, mark).unwrap()
}

/// Poll until an envelope satisfying `pred` arrives (discarding everything
/// else), or panic after ~2 seconds.
fn wait_for(client: &NetClient, what: &str, pred: impl Fn(&Envelope) -> bool) -> Envelope {
    for _ in 0..200 {
        for envelope in client.poll() {
            if pred(&envelope) {
                return envelope;
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for {what}");
}

fn is_outcome(envelope: &Envelope, outcome: Outcome) -> bool {
    envelope.kind == MessageKind::Outcome(outcome)
}

#[test]
fn full_match_lifecycle() {
    let (handle, addr) = start_test_server();

    // 1. Two players join; the first sees the second's seating broadcast.
    let mut alice = connect(addr, "Sato", Mark::Nought);
    assert_eq!(alice.player_id(), PlayerId(0));

    let mut bob = connect(addr, "Diogo", Mark::Cross);
    assert_eq!(bob.player_id(), PlayerId(1));

    let joined = wait_for(&alice, "Diogo's seating broadcast", |e| {
        is_outcome(e, Outcome::Ok) && e.payload.action == Some(Action::Join)
    });
    assert_eq!(joined.payload.player_id, Some(PlayerId(1)));
    assert_eq!(joined.payload.name.as_deref(), Some("Diogo"));
    assert_eq!(joined.payload.mark, Some(Mark::Cross));

    // 2. Start: both receive the ready response, then the ongoing banner
    //    naming the opening player (seating order, so Sato).
    alice.send_start().unwrap();
    for client in [&alice, &bob] {
        let ready = wait_for(client, "game_ready_to_start", |e| {
            is_outcome(e, Outcome::GameReadyToStart)
        });
        assert!(ready.is_success());

        let banner = wait_for(client, "ongoing banner", |e| {
            e.kind == MessageKind::Status(GameStatus::Ongoing)
        });
        assert_eq!(banner.payload.player_id, Some(PlayerId(0)));
    }

    // 3. Alternating moves: Sato takes the top row while Diogo answers.
    //    Every response is broadcast to both clients with the slot echoed.
    let script: [(i64, bool); 5] = [(0, true), (3, false), (1, true), (4, false), (2, true)];
    for (slot, satos_move) in script {
        if satos_move {
            alice.send_move(slot).unwrap();
        } else {
            bob.send_move(slot).unwrap();
        }
        let expected = if slot == 2 {
            Outcome::WinnerReached
        } else {
            Outcome::Ok
        };
        for client in [&alice, &bob] {
            let response = wait_for(client, "move response", |e| {
                e.payload.action == Some(Action::MakeMovement) && e.payload.slot == Some(slot)
            });
            assert!(is_outcome(&response, expected), "slot {slot}: {response:?}");
        }
    }

    // 4. Restart brings the session back to the lobby.
    bob.send_restart().unwrap();
    for client in [&alice, &bob] {
        let response = wait_for(client, "restart response", |e| {
            e.payload.action == Some(Action::Restart)
        });
        assert!(is_outcome(&response, Outcome::Ok));
    }

    // 5. Diogo exits: both see the disconnect directive, Sato then sees
    //    the roster notice.
    bob.send_exit().unwrap();
    let response = wait_for(&alice, "disconnect_client", |e| {
        is_outcome(e, Outcome::DisconnectClient)
    });
    assert_eq!(response.payload.success, Some(true));

    let removed = wait_for(&alice, "player_removed", |e| {
        is_outcome(e, Outcome::PlayerRemoved)
    });
    assert_eq!(removed.payload.player_id, Some(PlayerId(1)));

    handle.stop();
}

#[test]
fn winner_broadcast_names_the_winner() {
    let (handle, addr) = start_test_server();
    let mut alice = connect(addr, "Sato", Mark::Nought);
    let mut bob = connect(addr, "Diogo", Mark::Cross);

    alice.send_start().unwrap();
    wait_for(&alice, "ongoing banner", |e| {
        e.kind == MessageKind::Status(GameStatus::Ongoing)
    });

    for (slot, satos_move) in [(0, true), (3, false), (1, true), (4, false), (2, true)] {
        if satos_move {
            alice.send_move(slot).unwrap();
        } else {
            bob.send_move(slot).unwrap();
        }
        wait_for(&bob, "move response", |e| e.payload.slot == Some(slot));
    }

    let win = wait_for(&alice, "winner_reached", |e| {
        is_outcome(e, Outcome::WinnerReached)
    });
    assert_eq!(win.payload.player_id, Some(alice.player_id()));

    handle.stop();
}

#[test]
fn third_join_is_rejected_when_full() {
    let (handle, addr) = start_test_server();
    let _alice = connect(addr, "Sato", Mark::Nought);
    let _bob = connect(addr, "Diogo", Mark::Cross);

    match NetClient::connect(&addr.to_string(), "Input", Mark::Nought) {
        Err(ConnectError::Rejected(outcome)) => assert_eq!(outcome, Outcome::FullRoster),
        Err(other) => panic!("expected a full-roster rejection, got {other}"),
        Ok(_) => panic!("expected a full-roster rejection, got a seat"),
    }

    handle.stop();
}

#[test]
fn duplicate_mark_is_rejected() {
    let (handle, addr) = start_test_server();
    let _alice = connect(addr, "Sato", Mark::Nought);

    match NetClient::connect(&addr.to_string(), "Input", Mark::Nought) {
        Err(ConnectError::Rejected(outcome)) => {
            assert_eq!(outcome, Outcome::MarkAlreadyTaken);
        }
        Err(other) => panic!("expected a mark rejection, got {other}"),
        Ok(_) => panic!("expected a mark rejection, got a seat"),
    }

    handle.stop();
}

#[test]
fn refused_dial_maps_to_the_catalogue() {
    // Bind a port and release it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    match NetClient::connect(&addr.to_string(), "Sato", Mark::Nought) {
        Err(ConnectError::Transport(failure)) => {
            assert_eq!(failure.code, ConnectCode::ConnectionRefused);
            assert_eq!(failure.code.code(), 1002);
        }
        Err(other) => panic!("expected a transport failure, got {other}"),
        Ok(_) => panic!("expected a transport failure, got a seat"),
    }
}

#[test]
fn abrupt_disconnect_is_an_implicit_exit() {
    let (handle, addr) = start_test_server();
    let alice = connect(addr, "Sato", Mark::Nought);

    // A raw socket joins, then vanishes without an exit message.
    let mut stream = TcpStream::connect(addr).unwrap();
    let join = Envelope::request(Action::Join, Payload::join("Diogo", Mark::Cross));
    write_message(&mut stream, &encode(&join).unwrap()).unwrap();
    let response = decode(&read_message(&mut stream).unwrap()).unwrap();
    assert!(response.is_success());
    let bob_id = response.payload.player_id.unwrap();
    drop(stream);

    // The dropped connection counts as Diogo exiting: the session
    // finishes and the roster notice follows.
    let exit = wait_for(&alice, "implicit exit broadcast", |e| {
        is_outcome(e, Outcome::DisconnectClient)
    });
    assert_eq!(exit.payload.player_id, Some(bob_id));

    let removed = wait_for(&alice, "player_removed", |e| {
        is_outcome(e, Outcome::PlayerRemoved)
    });
    assert_eq!(removed.payload.player_id, Some(bob_id));

    handle.stop();
}

#[test]
fn session_resets_after_everyone_leaves() {
    let (handle, addr) = start_test_server();
    let mut alice = connect(addr, "Sato", Mark::Nought);
    let mut bob = connect(addr, "Diogo", Mark::Cross);
    assert_eq!(bob.player_id(), PlayerId(1));

    alice.send_exit().unwrap();
    wait_for(&bob, "Sato's removal", |e| {
        is_outcome(e, Outcome::PlayerRemoved)
    });
    bob.send_exit().unwrap();
    thread::sleep(Duration::from_millis(100));

    // The match was torn down with its last player: a fresh session hands
    // out ids from zero again, and the old mark is free.
    let charlie = connect(addr, "Aki", Mark::Nought);
    assert_eq!(charlie.player_id(), PlayerId(0));

    handle.stop();
}

#[test]
fn movement_before_start_is_refused_over_the_wire() {
    let (handle, addr) = start_test_server();
    let mut alice = connect(addr, "Sato", Mark::Nought);
    let _bob = connect(addr, "Diogo", Mark::Cross);

    alice.send_move(0).unwrap();
    let response = wait_for(&alice, "movement response", |e| {
        e.payload.action == Some(Action::MakeMovement)
    });
    assert!(is_outcome(&response, Outcome::GameNotStarted));
    assert_eq!(response.payload.success, Some(false));
    assert_eq!(response.payload.error, Some(Outcome::GameNotStarted));

    handle.stop();
}
