//! Real-time transport: one WebSocket per admitted session.
//!
//! A connection must present a known town id and a live session token; both
//! are checked before the upgrade, so a refused connection never touches the
//! controller. Once connected, the socket receives every town event as
//! `{"event": ..., "payload": ...}` JSON and may send
//! `{"type": "move", "position": {...}}` frames. Closing the socket releases
//! the session.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use plaza_core::error::TownError;
use plaza_town::application::handle::TownHandle;
use plaza_town::domain::events::TownEvent;
use plaza_town::domain::listener::TownListener;
use plaza_town::domain::participant::Position;
use plaza_town::domain::session::Session;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Session token returned by the join endpoint.
    pub token: String,
}

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// The participant's new position.
    Move {
        /// Reported location, optionally with a zone label.
        position: Position,
    },
}

/// Forwards town events into a connection's outbound queue.
#[derive(Debug)]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<TownEvent>,
}

impl ChannelListener {
    /// Wraps the sending half of a connection's queue.
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<TownEvent>) -> Self {
        Self { sender }
    }
}

impl TownListener for ChannelListener {
    fn on_event(&self, event: &TownEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(event = event.event_type(), "connection gone, event dropped");
        }
    }
}

/// GET /{town_id}/ws?token=...
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Query(params): Query<ConnectParams>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let (town, participant_id) = match authorize(&state, &town_id, &params.token) {
        Ok(found) => found,
        Err(e) => {
            warn!(town_id = %town_id, error = %e, "refusing connection");
            return ApiError(e).into_response();
        }
    };

    match upgrade {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_socket(socket, town, params.token, participant_id))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

fn authorize(
    state: &AppState,
    town_id: &str,
    token: &str,
) -> Result<(TownHandle, Uuid), TownError> {
    let town = state.towns.get(town_id)?;
    let participant_id = town
        .read(|t| t.session_by_token(token).map(Session::participant_id))?
        .ok_or(TownError::SessionNotFound)?;
    Ok((town, participant_id))
}

/// Applies one inbound text frame to the town.
///
/// # Errors
///
/// Returns `TownError::Validation` for a frame that does not parse, or the
/// error raised by the controller.
pub fn apply_frame(town: &TownHandle, participant_id: Uuid, text: &str) -> Result<(), TownError> {
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|e| TownError::Validation(format!("malformed frame: {e}")))?;
    match frame {
        ClientFrame::Move { position } => {
            town.write(|t| t.update_participant_location(participant_id, position))?
        }
    }
}

/// What the connection loop does with one inbound message.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Frame(String),
    Close,
    Ignore,
}

fn classify(message: WsMessage) -> Inbound {
    match message {
        WsMessage::Text(text) => Inbound::Frame(text.as_str().to_owned()),
        WsMessage::Close(_) => Inbound::Close,
        // Pings are answered by the websocket layer itself.
        WsMessage::Binary(_) | WsMessage::Ping(_) | WsMessage::Pong(_) => Inbound::Ignore,
    }
}

async fn send_event(socket: &mut WebSocket, event: &TownEvent) -> Result<(), String> {
    let json = serde_json::to_string(event).map_err(|e| e.to_string())?;
    socket
        .send(WsMessage::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

async fn handle_socket(
    mut socket: WebSocket,
    town: TownHandle,
    token: String,
    participant_id: Uuid,
) {
    let (sender, mut events) = mpsc::unbounded_channel();
    let subscription =
        match town.write(|t| t.subscribe(Arc::new(ChannelListener::new(sender)))) {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(participant_id = %participant_id, error = %e, "could not subscribe");
                return;
            }
        };
    info!(participant_id = %participant_id, "transport connected");

    loop {
        tokio::select! {
            frame = socket.recv() => match frame.map(|r| r.map(classify)) {
                Some(Ok(Inbound::Frame(text))) => {
                    if let Err(e) = apply_frame(&town, participant_id, &text) {
                        warn!(participant_id = %participant_id, error = %e, "frame rejected");
                    }
                }
                Some(Ok(Inbound::Close)) | None => break,
                Some(Ok(Inbound::Ignore)) => {}
                Some(Err(e)) => {
                    warn!(participant_id = %participant_id, error = %e, "socket error");
                    break;
                }
            },
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = send_event(&mut socket, &event).await {
                    warn!(participant_id = %participant_id, error = %e, "failed to send event");
                    break;
                }
                if matches!(event, TownEvent::TownClosing) {
                    if let Err(e) = socket.send(WsMessage::Close(None)).await {
                        debug!("close frame not delivered: {}", e);
                    }
                    break;
                }
            }
        }
    }

    let released = town.write(|t| {
        t.unsubscribe(subscription);
        t.release_session(&token)
    });
    match released {
        Ok(Ok(_)) => info!(participant_id = %participant_id, "transport disconnected"),
        Ok(Err(e)) | Err(e) => {
            debug!(participant_id = %participant_id, error = %e, "session already released");
        }
    }
}
