use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use futures::future::join_all;
use rpc_chat::common::Message;
use rpc_chat::error::{CallError, SessionError};
use rpc_chat::network::{ChatServer, ChatService, Dialer, TcpDialer, listen};
use rpc_chat::storage::HistoryStore;
use rpc_chat::ui::{Session, SubmitOutcome};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

async fn start_server() -> (SocketAddr, Arc<HistoryStore>) {
    let store = Arc::new(HistoryStore::new());
    let listener = listen("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ChatServer::new(Arc::clone(&store));
    tokio::spawn(async move { server.serve(listener).await });
    (addr, store)
}

fn at(secs: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, secs).unwrap()
}

#[tokio::test]
async fn fetch_from_fresh_server_is_empty() {
    let (addr, _) = start_server().await;
    let mut client = TcpDialer::new(addr.to_string()).dial().await.unwrap();
    assert!(client.fetch_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn appends_return_growing_history() {
    let (addr, _) = start_server().await;
    let mut client = TcpDialer::new(addr.to_string()).dial().await.unwrap();

    let alice = Message::at("alice", "hi", at(1));
    let bob = Message::at("bob", "yo", at(2));

    assert_eq!(client.send_message(&alice).await.unwrap(), vec![alice.clone()]);
    assert_eq!(client.send_message(&bob).await.unwrap(), vec![alice.clone(), bob.clone()]);
    assert_eq!(client.fetch_history().await.unwrap(), vec![alice, bob]);
}

#[tokio::test]
async fn empty_text_is_rejected_and_history_stays_empty() {
    let (addr, store) = start_server().await;
    let mut client = TcpDialer::new(addr.to_string()).dial().await.unwrap();

    let err = client.send_message(&Message::at("alice", "", at(1))).await.unwrap_err();
    match err {
        CallError::Remote(reason) => assert_eq!(reason, "empty message"),
        other => panic!("expected remote error, got {other}"),
    }
    // The connection survives the rejection.
    assert!(client.fetch_history().await.unwrap().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn history_is_shared_between_connections() {
    let (addr, _) = start_server().await;
    let mut alice = Session::connect("alice", TcpDialer::new(addr.to_string())).await.unwrap();
    let mut bob = Session::connect("bob", TcpDialer::new(addr.to_string())).await.unwrap();

    alice.submit_text("hi").await.unwrap();
    bob.submit_text("yo").await.unwrap();

    let seen_by_alice = alice.request_history().await.unwrap();
    let authors: Vec<_> = seen_by_alice.iter().map(|m| m.author.as_str()).collect();
    assert_eq!(authors, ["alice", "bob"]);
}

#[tokio::test]
async fn concurrent_sessions_each_append_once() {
    const CLIENTS: usize = 24;
    let (addr, store) = start_server().await;

    let sends = (0..CLIENTS).map(|n| {
        let addr = addr.to_string();
        async move {
            let mut session = Session::connect(format!("user{n}"), TcpDialer::new(addr)).await.unwrap();
            match session.submit_text(&format!("message {n}")).await.unwrap() {
                SubmitOutcome::Delivered(history) => history.len(),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    });
    let lengths = join_all(sends).await;

    let history = store.fetch();
    assert_eq!(history.len(), CLIENTS);
    let texts: HashSet<_> = history.iter().map(|m| m.text.clone()).collect();
    assert_eq!(texts.len(), CLIENTS);
    // Every reply saw its own append, so snapshot sizes are exactly 1..=N.
    let sizes: HashSet<_> = lengths.into_iter().collect();
    assert_eq!(sizes, (1..=CLIENTS).collect());
}

#[tokio::test]
async fn severed_connection_is_retried_once_and_lands_once() {
    let store = Arc::new(HistoryStore::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ChatServer::new(Arc::clone(&store));

    tokio::spawn(async move {
        // The first connection is dropped unanswered, the second is served.
        let (first, _) = listener.accept().await.unwrap();
        drop(first);
        let (second, peer) = listener.accept().await.unwrap();
        server.handle_connection(second, peer).await;
    });

    let mut session = Session::connect("alice", TcpDialer::new(addr.to_string())).await.unwrap();
    match session.submit_text("hi").await.unwrap() {
        SubmitOutcome::Redelivered { history, cause } => {
            assert!(cause.is_transport());
            assert_eq!(history.len(), 1);
        }
        other => panic!("expected a redelivery, got {other:?}"),
    }

    let history = session.request_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, "hi");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn send_fails_fatally_when_server_is_gone() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Listener and stream both close here; the redial is refused.
        drop(stream);
    });

    let mut session = Session::connect("alice", TcpDialer::new(addr.to_string())).await.unwrap();
    accept.await.unwrap();

    let err = session.submit_text("hi").await.unwrap_err();
    assert!(matches!(err, SessionError::Reconnect { .. }), "got {err}");
}

#[tokio::test]
async fn malformed_frames_do_not_break_the_connection() {
    let (addr, store) = start_server().await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half
        .write_all(b"{\"id\":1,\"method\":\"\xff\xfe\"}\n")
        .await
        .unwrap();
    let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply["id"], 0);
    assert!(reply["error"].as_str().unwrap().starts_with("malformed request"));

    write_half.write_all(b"this is not json\n").await.unwrap();
    let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply["id"], 0);
    assert!(reply["error"].as_str().unwrap().starts_with("malformed request"));

    write_half
        .write_all(b"{\"id\":5,\"method\":\"ChatServer.Nope\",\"params\":{}}\n")
        .await
        .unwrap();
    let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply, json!({ "id": 5, "error": "unknown method ChatServer.Nope" }));

    let request = json!({
        "id": 6,
        "method": "ChatServer.SendMessage",
        "params": { "msg": { "author": "alice", "text": "still here", "timestamp": "2024-06-01T12:00:00Z" } }
    });
    write_half
        .write_all(format!("{request}\n").as_bytes())
        .await
        .unwrap();
    let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply["id"], 6);
    assert_eq!(reply["result"]["history"][0]["text"], "still here");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn undecodable_success_reply_is_not_resent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Every connection gets a well-formed frame whose result has the wrong shape.
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let (read_half, mut write_half) = stream.into_split();
                let mut lines = BufReader::new(read_half).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let request: Value = serde_json::from_str(&line).unwrap();
                    let reply = json!({ "id": request["id"], "result": { "history": "nope" } });
                    write_half
                        .write_all(format!("{reply}\n").as_bytes())
                        .await
                        .unwrap();
                }
            });
        }
    });

    let mut session = Session::connect("alice", TcpDialer::new(addr.to_string())).await.unwrap();
    match session.submit_text("hi").await.unwrap() {
        SubmitOutcome::Unconfirmed(err) => assert!(matches!(err, CallError::Protocol(_))),
        other => panic!("expected an unconfirmed send, got {other:?}"),
    }
}
