mod common;

use common::TestApp;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use ticketing_backend::domain::models::seat::SeatStatus;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, hello: Value) -> WsClient {
    let (mut socket, _) = connect_async(format!("ws://{}/api/v1/ws", addr)).await.unwrap();
    socket.send(Message::Text(hello.to_string().into())).await.unwrap();
    socket
}

async fn next_event(socket: &mut WsClient) -> Value {
    loop {
        let frame = socket.next().await.expect("socket closed").unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
        // skip pings
    }
}

#[tokio::test]
async fn hello_is_answered_with_a_full_snapshot() {
    let app = TestApp::new().await;
    let addr = spawn_server(&app).await;
    app.create_booking(5, 3, "+4917612345678").await;

    let mut socket = connect(addr, json!({ "role": "student" })).await;

    let snapshot = next_event(&mut socket).await;
    assert_eq!(snapshot["type"], "seats_changed");
    let updates = snapshot["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 36 * 14);
    let entry = updates.iter().find(|u| u["seat"] == "5-3").unwrap();
    assert_eq!(entry["status"], "pending");
}

#[tokio::test]
async fn snapshot_is_followed_by_live_events() {
    let app = TestApp::new().await;
    let addr = spawn_server(&app).await;

    let mut socket = connect(addr, json!({ "role": "student" })).await;
    next_event(&mut socket).await;
    // Snapshot received; give the handler a beat to subscribe.
    sleep(Duration::from_millis(100)).await;

    app.state.fanout.seat_changed("7-2".into(), SeatStatus::Paid);

    let event = next_event(&mut socket).await;
    assert_eq!(event["type"], "seat_changed");
    assert_eq!(event["seat"], "7-2");
    assert_eq!(event["status"], "paid");
}

#[tokio::test]
async fn bad_admin_token_downgrades_to_student() {
    let app = TestApp::new().await;
    let addr = spawn_server(&app).await;

    let mut socket = connect(addr, json!({ "role": "admin", "token": "bogus" })).await;

    // The connection survives the bad token and still gets the snapshot.
    let snapshot = next_event(&mut socket).await;
    assert_eq!(snapshot["type"], "seats_changed");
    sleep(Duration::from_millis(100)).await;

    // Admin notices stay off a downgraded connection; the next frame the
    // client sees is the public seat event.
    app.state.fanout.admin_notice("delivery failed".into());
    app.state.fanout.seat_changed("1-1".into(), SeatStatus::Pending);

    let event = next_event(&mut socket).await;
    assert_eq!(event["type"], "seat_changed");
    assert_eq!(event["seat"], "1-1");
}

#[tokio::test]
async fn valid_admin_token_receives_admin_notices() {
    let app = TestApp::new().await;
    let addr = spawn_server(&app).await;
    let token = app.login().await;

    let mut socket = connect(addr, json!({ "role": "admin", "token": token })).await;
    next_event(&mut socket).await;
    sleep(Duration::from_millis(100)).await;

    app.state.fanout.admin_notice("delivery failed for booking x".into());

    let event = next_event(&mut socket).await;
    assert_eq!(event["type"], "admin_notice");
    assert_eq!(event["message"], "delivery failed for booking x");
}

#[tokio::test]
async fn malformed_hello_closes_the_connection() {
    let app = TestApp::new().await;
    let addr = spawn_server(&app).await;

    let (mut socket, _) = connect_async(format!("ws://{}/api/v1/ws", addr)).await.unwrap();
    socket.send(Message::Text("not json".into())).await.unwrap();

    match socket.next().await {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {}
        other => panic!("expected close, got {:?}", other),
    }
}
