//! WebSocket Connection Handling
//!
//! Upgrades clients onto the real-time hub and runs the two per-connection
//! loops:
//! - a read loop that enforces the maximum frame size, treats prolonged
//!   silence as a dead connection, and forwards `"chat"` frames through the
//!   persistence path before relaying them, and
//! - a write loop that drains the hub-fed outbound queue, coalescing queued
//!   frames into one write and sending periodic pings.
//!
//! Persistence runs in the read loop, never inside the hub loop, so one
//! slow storage call cannot stall every connection.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::services;
use crate::state::AppState;
use crate::types::{ChatPayload, WsFrame};
use deskline_core::SenderType;
use deskline_storage::Store;

#[derive(Debug, Deserialize)]
pub struct WsConnectQuery {
    /// End-user id or agent id; authenticated out-of-band before upgrade.
    pub user_id: String,
}

/// GET /ws - upgrade to the real-time channel.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsConnectQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: String) {
    info!(user_id, "websocket connected");
    let (connection_id, outbound_rx) = state.hub.register(&user_id);

    // Agents are tracked online while their connection lives; plain users
    // have no agent row and the call is a no-op.
    let is_agent = matches!(state.store.agent_get(&user_id).await, Ok(Some(_)));
    if is_agent {
        let _ = state
            .store
            .agent_set_online(&user_id, true, Some(chrono::Utc::now()))
            .await;
    }

    let (sender, receiver) = socket.split();
    let mut write_task = tokio::spawn(write_loop(
        sender,
        outbound_rx,
        state.config.ws_ping_period,
    ));

    read_loop(receiver, &state, &user_id, is_agent).await;

    state.hub.unregister(&user_id, connection_id);
    write_task.abort();
    let _ = (&mut write_task).await;
    if is_agent {
        let _ = state.store.agent_set_online(&user_id, false, None).await;
    }
    info!(user_id, "websocket disconnected");
}

/// Drain the outbound queue into the socket. Queued frames are coalesced
/// into a single newline-joined write; pings go out on a fixed interval.
/// Queue closure means the hub evicted this connection.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<String>,
    ping_period: Duration,
) {
    let mut ping = tokio::time::interval(ping_period);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it.
    ping.tick().await;

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                let Some(first) = frame else { break };
                let mut buffer = vec![first];
                while let Ok(more) = outbound_rx.try_recv() {
                    buffer.push(more);
                }
                if sender.send(Message::Text(buffer.join("\n"))).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
    let _ = sender.send(Message::Close(None)).await;
}

/// Consume inbound frames until the peer closes, errors, sends an
/// oversized frame, or goes silent past the pong deadline. Any inbound
/// traffic (pongs included) refreshes the deadline.
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: &AppState,
    user_id: &str,
    is_agent: bool,
) {
    let pong_wait = state.config.ws_pong_wait;
    let max_frame = state.config.ws_max_frame_bytes;

    loop {
        let message = match tokio::time::timeout(pong_wait, receiver.next()).await {
            Err(_) => {
                warn!(user_id, "read deadline exceeded, dropping connection");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!(user_id, error = %e, "websocket read error");
                break;
            }
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => {
                if text.len() > max_frame {
                    warn!(user_id, bytes = text.len(), "oversized frame, dropping connection");
                    break;
                }
                handle_frame(state, user_id, is_agent, &text).await;
            }
            Message::Binary(_) => {
                debug!(user_id, "ignoring binary frame");
            }
            // Pings are answered by axum automatically; both directions of
            // heartbeat traffic just refresh the deadline.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => break,
        }
    }
}

/// Dispatch one inbound frame. Only `"chat"` is currently understood:
/// persist the message, then deliver it both back to the sender (ack)
/// and to the addressed recipient.
async fn handle_frame(state: &AppState, user_id: &str, is_agent: bool, raw: &str) {
    let frame: WsFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            send_error(state, user_id, &format!("malformed frame: {}", e)).await;
            return;
        }
    };
    if frame.frame_type != "chat" {
        send_error(
            state,
            user_id,
            &format!("unsupported frame type '{}'", frame.frame_type),
        )
        .await;
        return;
    }
    let payload: ChatPayload = match serde_json::from_value(frame.payload) {
        Ok(payload) => payload,
        Err(e) => {
            send_error(state, user_id, &format!("malformed chat payload: {}", e)).await;
            return;
        }
    };

    let sender_type = if is_agent {
        SenderType::Agent
    } else {
        SenderType::User
    };
    let stored = match services::conversation::send_message(
        state.store.as_ref(),
        &state.encryptor,
        payload.conversation_id,
        sender_type,
        user_id,
        &payload.content,
        false,
        None,
    )
    .await
    {
        Ok(stored) => stored,
        Err(e) => {
            send_error(state, user_id, &e.message).await;
            return;
        }
    };

    let outbound = serde_json::json!({
        "type": "chat",
        "payload": {
            "conversation_id": payload.conversation_id,
            "message_id": stored.message_id,
            "from_user_id": user_id,
            "to_user_id": payload.to_user_id,
            "content": payload.content,
            "msg_type": payload.msg_type,
            "sent_at": stored.sent_at,
        },
    })
    .to_string();

    // Ack to the sender, relay to the recipient. Offline recipients are a
    // no-op; they will read the message from history.
    state.hub.send_to_user(user_id, outbound.clone()).await;
    if payload.to_user_id != user_id {
        state.hub.send_to_user(&payload.to_user_id, outbound).await;
    }
}

async fn send_error(state: &AppState, user_id: &str, message: &str) {
    let frame = serde_json::json!({
        "type": "error",
        "payload": { "msg": message },
    })
    .to_string();
    state.hub.send_to_user(user_id, frame).await;
}
