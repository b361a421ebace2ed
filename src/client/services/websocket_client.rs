//! Realtime chat channel: one WebSocket per open conversation.
//!
//! [`ChatChannel::connect`] spawns a task that owns the socket and forwards
//! every decoded [`Message`] to the consumer. The lifecycle is published on
//! a `watch` channel as [`ChannelState`]. Frames that fail to decode are
//! logged and dropped without closing the connection. There is no
//! reconnect: once the state is `Closed` or `Errored` the caller opens a
//! new channel if it wants one.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as Frame};
use url::Url;

use crate::common::chat::{ChatId, Message};
use crate::common::models::UserId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid realtime url: {0}")]
    InvalidUrl(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("channel closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Errored(String),
}

impl ChannelState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Errored(_))
    }
}

/// `ws(s)://host/ws/chat/{chatId}` for a REST or realtime base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; any path on the base is
/// replaced since the socket lives at the host root.
pub fn websocket_url(base: &str, chat_id: ChatId) -> Result<Url, ChannelError> {
    let mut url = Url::parse(base).map_err(|e| ChannelError::InvalidUrl(format!("{}: {}", base, e)))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ChannelError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| ChannelError::InvalidUrl(format!("cannot use scheme '{}' for {}", scheme, base)))?;
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ChannelError::InvalidUrl(base.to_string()))?
        .clear()
        .push("ws")
        .push("chat")
        .push(&chat_id.to_string());
    Ok(url)
}

pub struct ChatChannel {
    url: Url,
    frames: mpsc::UnboundedReceiver<Message>,
    state: watch::Receiver<ChannelState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatChannel")
            .field("url", &self.url.as_str())
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl ChatChannel {
    /// Opens the socket in the background. Must be called inside a tokio
    /// runtime. When `self_id` is set, inbound messages get `is_self`
    /// recomputed against it.
    pub fn connect(url: Url, self_id: Option<UserId>) -> Self {
        let (frame_tx, frames) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ChannelState::Connecting);
        let (shutdown, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(url.clone(), self_id, frame_tx, state_tx, shutdown_rx));

        Self { url, frames, state, shutdown: Some(shutdown), task: Some(task) }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> ChannelState {
        self.state.borrow().clone()
    }

    /// Receiver for lifecycle changes, for callers that want to react to them.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Resolves once the socket is open, or with the reason it never opened.
    pub async fn wait_open(&self) -> Result<(), ChannelError> {
        let mut rx = self.state.clone();
        loop {
            {
                let current = rx.borrow_and_update();
                match &*current {
                    ChannelState::Open => return Ok(()),
                    ChannelState::Closed => return Err(ChannelError::Closed),
                    ChannelState::Errored(reason) => return Err(ChannelError::Connect(reason.clone())),
                    ChannelState::Connecting => {}
                }
            }
            if rx.changed().await.is_err() {
                // Sender gone: the task ended; report its last state.
                return match &*rx.borrow() {
                    ChannelState::Open => Ok(()),
                    ChannelState::Errored(reason) => Err(ChannelError::Connect(reason.clone())),
                    _ => Err(ChannelError::Closed),
                };
            }
        }
    }

    /// Next inbound message; `None` once the channel has closed and every
    /// buffered message was consumed.
    pub async fn next(&mut self) -> Option<Message> {
        self.frames.recv().await
    }

    /// Unsubscribes: sends a close frame and waits for the task to finish.
    pub async fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("[WS:CHANNEL] Channel task for {} ended abnormally: {}", self.url, e);
            }
        }
    }
}

impl Stream for ChatChannel {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx)
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    url: Url,
    self_id: Option<UserId>,
    frames: mpsc::UnboundedSender<Message>,
    state: watch::Sender<ChannelState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!("[WS:CHANNEL] Connecting to {}", url);
    let ws = tokio::select! {
        connected = connect_async(url.as_str()) => match connected {
            Ok((ws, _)) => ws,
            Err(e) => {
                error!("[WS:CHANNEL] Connection to {} failed: {}", url, e);
                let _ = state.send(ChannelState::Errored(e.to_string()));
                return;
            }
        },
        _ = &mut shutdown => {
            debug!("[WS:CHANNEL] Closed before the connection opened");
            let _ = state.send(ChannelState::Closed);
            return;
        }
    };

    info!("[WS:CHANNEL] Connected to {}", url);
    let _ = state.send(ChannelState::Open);
    let (mut sink, mut stream) = ws.split();

    let final_state = loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("[WS:CHANNEL] Closing {} on request", url);
                if let Err(e) = sink.send(Frame::Close(None)).await {
                    debug!("[WS:CHANNEL] Close frame not delivered: {}", e);
                }
                break ChannelState::Closed;
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Frame::Text(text))) => {
                    if let Some(message) = parse_frame(&text, self_id) {
                        if frames.send(message).is_err() {
                            debug!("[WS:CHANNEL] Consumer dropped, stopping");
                            break ChannelState::Closed;
                        }
                    }
                }
                Some(Ok(Frame::Close(_))) | None => {
                    info!("[WS:CHANNEL] {} closed by server", url);
                    break ChannelState::Closed;
                }
                Some(Ok(_)) => {
                    // binary, ping, pong
                }
                Some(Err(e)) => {
                    error!("[WS:CHANNEL] {} errored: {}", url, e);
                    break ChannelState::Errored(e.to_string());
                }
            }
        }
    };

    let _ = state.send(final_state);
}

/// Decodes one text frame; malformed frames are logged and skipped.
fn parse_frame(text: &str, self_id: Option<UserId>) -> Option<Message> {
    match serde_json::from_str::<Message>(text) {
        Ok(mut message) => {
            if let Some(id) = self_id {
                message.mark_self(id);
            }
            Some(message)
        }
        Err(e) => {
            error!("[WS:CHANNEL] Dropping malformed frame ({}): {}", e, text);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_upgrades_scheme_and_drops_api_path() {
        let url = websocket_url("http://127.0.0.1:8080/api", ChatId::user(12)).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/ws/chat/user_12");

        let url = websocket_url("https://partner.example.com/api/?x=1", ChatId::team(42)).unwrap();
        assert_eq!(url.as_str(), "wss://partner.example.com/ws/chat/team_42");

        let url = websocket_url("wss://rt.example.com", ChatId::team(1)).unwrap();
        assert_eq!(url.as_str(), "wss://rt.example.com/ws/chat/team_1");
    }

    #[test]
    fn url_rejects_other_schemes() {
        assert!(matches!(
            websocket_url("ftp://example.com", ChatId::user(1)),
            Err(ChannelError::InvalidUrl(_))
        ));
        assert!(matches!(websocket_url("not a url", ChatId::user(1)), Err(ChannelError::InvalidUrl(_))));
    }

    #[test]
    fn malformed_frames_are_skipped() {
        assert!(parse_frame("{not json", Some(1)).is_none());
        assert!(parse_frame(r#"{"id":1}"#, Some(1)).is_none());

        let good = r#"{"id":5,"chatId":"user_2","senderId":1,"content":"hey","timestamp":10,"isSelf":false}"#;
        let message = parse_frame(good, Some(1)).unwrap();
        assert!(message.is_self);
        assert!(!parse_frame(good, None).unwrap().is_self);
    }

    #[test]
    fn terminal_states() {
        assert!(ChannelState::Closed.is_terminal());
        assert!(ChannelState::Errored("x".into()).is_terminal());
        assert!(!ChannelState::Open.is_terminal());
    }
}
