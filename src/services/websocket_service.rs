//! Per-connection WebSocket lifecycle: identify, join rooms, relay commands.

use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::EngineError,
    scoring::Dart,
    services::identity::UserIdentity,
    state::{
        SharedState,
        rooms::{RoomCommand, RoomHandle},
    },
};

/// Internal error type for command relay operations.
///
/// These never reach HTTP responses; they either terminate the connection or
/// turn into a `ServerMessage::Error` frame on it.
#[derive(Debug, Error)]
enum SocketError {
    /// Writer channel closed - connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
    /// A match command arrived before any `join_game`.
    #[error("join a game before sending match commands")]
    NotJoined,
    /// A match command named a different game than the joined room.
    #[error("command targets game `{got}` but this connection joined `{expected}`")]
    WrongRoom { expected: Uuid, got: Uuid },
    /// The joined room's actor has already wound down.
    #[error("the game room is no longer active, rejoin to continue")]
    RoomGone,
    /// A message with an unrecognized `type` field.
    #[error("unsupported message type")]
    Unsupported,
    /// Error from match lookup while joining.
    #[error("{0}")]
    Engine(#[from] EngineError),
}

/// Everything the relay loop tracks for one identified connection.
struct Session {
    conn_id: Uuid,
    user: UserIdentity,
    joined: Option<RoomHandle>,
}

impl Session {
    /// Resolve the room a match command targets, enforcing that the
    /// connection joined it first.
    fn room_for(&self, game_id: Uuid) -> Result<&RoomHandle, SocketError> {
        let handle = self.joined.as_ref().ok_or(SocketError::NotJoined)?;
        if handle.match_id() != game_id {
            return Err(SocketError::WrongRoom {
                expected: handle.match_id(),
                got: game_id,
            });
        }
        Ok(handle)
    }

    /// Forward a command to the joined room, dropping the handle when the
    /// room's actor has already exited.
    fn relay(
        &mut self,
        game_id: Uuid,
        command: impl FnOnce(Uuid) -> RoomCommand,
    ) -> Result<(), SocketError> {
        let conn_id = self.conn_id;
        let delivered = self.room_for(game_id)?.send(command(conn_id));
        if !delivered {
            self.joined = None;
            return Err(SocketError::RoomGone);
        }
        Ok(())
    }
}

/// Handle the full lifecycle for an individual scoring WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let identify_timeout = state.config().identify_timeout;
    let initial_message = match tokio::time::timeout(identify_timeout, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match ClientMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse client message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let token = match expect_identify(inbound) {
        Ok(token) => token,
        Err(err) => {
            warn!("first message was not an identification");
            let _ = send_message(&outbound_tx, &ServerMessage::Error {
                message: err.to_string(),
            });
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let user = match state.identity().resolve(&token).await {
        Ok(user) => user,
        Err(err) => {
            // The detailed reason stays in the log; the client only learns
            // that the connection never became authenticated.
            warn!(error = %err, "identification rejected");
            let _ = send_message(&outbound_tx, &ServerMessage::Error {
                message: EngineError::Unauthenticated.to_string(),
            });
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    info!(user_id = %user.user_id, name = %user.name, "scorer connected");
    if send_message(&outbound_tx, &ServerMessage::Welcome {
        user_id: user.user_id,
        name: user.name.clone(),
    })
    .is_err()
    {
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let mut session = Session {
        conn_id: Uuid::new_v4(),
        user,
        joined: None,
    };

    let heartbeat_timeout = state.config().heartbeat_timeout;
    let mut heartbeat = tokio::time::interval(state.config().heartbeat_interval);
    heartbeat.tick().await;
    let mut last_heard = Instant::now();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if last_heard.elapsed() > heartbeat_timeout {
                    info!(user_id = %session.user.user_id, "heartbeat timed out, dropping connection");
                    break;
                }
                if outbound_tx.send(Message::Ping(Vec::new().into())).is_err() {
                    break;
                }
            }
            frame = receiver.next() => {
                let Some(frame) = frame else { break };
                last_heard = Instant::now();
                match frame {
                    Ok(Message::Text(text)) => {
                        debug!(user_id = %session.user.user_id, payload = %text, "received client message");
                        match handle_text(&state, &mut session, &outbound_tx, &text) {
                            Ok(()) => {}
                            Err(SocketError::ConnectionClosed) => break,
                            Err(err) => {
                                debug!(user_id = %session.user.user_id, error = %err, "client command rejected");
                                if send_message(&outbound_tx, &ServerMessage::Error {
                                    message: err.to_string(),
                                })
                                .is_err()
                                {
                                    break;
                                }
                            }
                        }
                    }
                    Ok(Message::Ping(payload)) => {
                        let _ = outbound_tx.send(Message::Pong(payload));
                    }
                    Ok(Message::Pong(_)) => {}
                    Ok(Message::Binary(_)) => {}
                    Ok(Message::Close(frame)) => {
                        let _ = outbound_tx.send(Message::Close(frame));
                        break;
                    }
                    Err(err) => {
                        warn!(user_id = %session.user.user_id, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    if let Some(room) = session.joined.take() {
        room.send(RoomCommand::Leave {
            conn_id: session.conn_id,
        });
    }
    info!(user_id = %session.user.user_id, "scorer disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Require the connection's first decoded message to be an identification.
fn expect_identify(message: ClientMessage) -> Result<String, EngineError> {
    match message {
        ClientMessage::Identify { token } => Ok(token),
        _ => Err(EngineError::Unauthenticated),
    }
}

/// Decode one text frame and apply the command it carries.
fn handle_text(
    state: &SharedState,
    session: &mut Session,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    text: &str,
) -> Result<(), SocketError> {
    let message = match ClientMessage::from_json_str(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(user_id = %session.user.user_id, error = %err, "failed to parse client message");
            return send_message(outbound_tx, &ServerMessage::Error {
                message: format!("malformed message: {err}"),
            });
        }
    };

    match message {
        ClientMessage::Identify { .. } => {
            warn!(user_id = %session.user.user_id, "ignoring duplicate identification message");
            Ok(())
        }
        ClientMessage::JoinGame { game_id } => {
            if let Some(current) = session.joined.take() {
                current.send(RoomCommand::Leave {
                    conn_id: session.conn_id,
                });
            }
            let handle = state.rooms().join(
                game_id,
                session.conn_id,
                session.user.clone(),
                outbound_tx.clone(),
            )?;
            session.joined = Some(handle);
            Ok(())
        }
        ClientMessage::LeaveGame => {
            let room = session.joined.take().ok_or(SocketError::NotJoined)?;
            room.send(RoomCommand::Leave {
                conn_id: session.conn_id,
            });
            Ok(())
        }
        ClientMessage::ThrowDart {
            game_id,
            segment,
            multiplier,
        } => session.relay(game_id, |conn_id| RoomCommand::Throw {
            conn_id,
            dart: Dart {
                segment,
                multiplier,
            },
        }),
        ClientMessage::UndoThrow { game_id } => {
            session.relay(game_id, |conn_id| RoomCommand::Undo { conn_id })
        }
        ClientMessage::StartGame { game_id } => {
            session.relay(game_id, |conn_id| RoomCommand::Start { conn_id })
        }
        ClientMessage::EndGame { game_id } => {
            session.relay(game_id, |conn_id| RoomCommand::End { conn_id })
        }
        ClientMessage::Unknown => Err(SocketError::Unsupported),
    }
}

/// Serialize a payload and push it onto the connection's writer channel.
///
/// Serialization failures are permanent (a bug in the payload type), so they
/// are logged and swallowed; a closed writer means the connection is gone.
fn send_message(
    tx: &mpsc::UnboundedSender<Message>,
    message: &ServerMessage,
) -> Result<(), SocketError> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| SocketError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
