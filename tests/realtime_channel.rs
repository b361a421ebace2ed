use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as Frame;

use huixing_partner::client::services::websocket_client::{websocket_url, ChannelState, ChatChannel};
use huixing_partner::common::chat::ChatId;

const SELF_ID: u64 = 7;

fn frame(id: u64, sender_id: u64, content: &str) -> Frame {
    Frame::Text(
        json!({
            "id": id,
            "chatId": "team_42",
            "senderId": sender_id,
            "senderName": format!("user{}", sender_id),
            "content": content,
            "messageType": "text",
            "isSelf": false,
            "timestamp": 1_700_000_000_000i64 + id as i64
        })
        .to_string(),
    )
}

/// Accepts one socket, pushes `frames`, then reports whether the client
/// closed the connection.
async fn serve(frames: Vec<Frame>) -> (String, oneshot::Receiver<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/api", listener.local_addr().unwrap());
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        for f in frames {
            ws.send(f).await.unwrap();
        }
        let mut saw_close = false;
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                saw_close = true;
                break;
            }
        }
        let _ = closed_tx.send(saw_close);
    });

    (base, closed_rx)
}

#[tokio::test]
async fn delivers_messages_and_skips_malformed_frames() {
    let (base, closed) = serve(vec![
        Frame::Text("{not json".into()),
        frame(1, 3, "hello"),
        Frame::Text(json!({"type": "ping"}).to_string()),
        frame(2, SELF_ID, "mine"),
    ])
    .await;

    let url = websocket_url(&base, ChatId::team(42)).unwrap();
    assert_eq!(url.path(), "/ws/chat/team_42");

    let mut channel = ChatChannel::connect(url, Some(SELF_ID));
    channel.wait_open().await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);

    let first = tokio::time::timeout(Duration::from_secs(5), channel.next()).await.unwrap().unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(first.content, "hello");
    assert!(!first.is_self);

    let second = tokio::time::timeout(Duration::from_secs(5), channel.next()).await.unwrap().unwrap();
    assert_eq!(second.id, 2);
    assert!(second.is_self);

    channel.close().await;
    assert_eq!(channel.state(), ChannelState::Closed);
    assert!(tokio::time::timeout(Duration::from_secs(5), closed).await.unwrap().unwrap());
}

#[tokio::test]
async fn server_close_ends_the_stream() {
    let (base, _closed) = serve(vec![frame(5, 3, "bye"), Frame::Close(None)]).await;
    let url = websocket_url(&base, ChatId::team(42)).unwrap();

    let mut channel = ChatChannel::connect(url, None);
    let mut states = channel.watch_state();

    let only = tokio::time::timeout(Duration::from_secs(5), channel.next()).await.unwrap().unwrap();
    assert_eq!(only.id, 5);
    assert!(tokio::time::timeout(Duration::from_secs(5), channel.next()).await.unwrap().is_none());

    tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| s.is_terminal()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn refused_connection_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = websocket_url(&format!("http://{}", addr), ChatId::user(1)).unwrap();
    let channel = ChatChannel::connect(url, None);
    assert!(channel.wait_open().await.is_err());
    assert!(matches!(channel.state(), ChannelState::Errored(_)));
}
