//! Rooms: per-match actors that serialize mutations and fan out broadcasts.
//!
//! Every live match with at least one connected client has exactly one room
//! actor. All mutating operations for that match flow through the actor's
//! command channel and execute one at a time in arrival order, while rooms
//! for different matches run fully in parallel. Snapshots for broadcast are
//! taken inside the same serialized path, so clients never observe a
//! half-applied operation.

use std::{collections::HashMap, sync::Arc};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{live::MatchSnapshot, ws::ServerMessage},
    error::EngineError,
    scoring::Dart,
    services::{
        finalize::{FinalizeSink, MatchSummary},
        identity::UserIdentity,
    },
    state::{
        live_match::{LiveMatch, MatchStatus},
        match_store::MatchStore,
    },
};

/// Operations accepted by a room actor. Each carries the id of the
/// connection it originated from so failures can be reported back to it.
#[derive(Debug)]
pub enum RoomCommand {
    /// Attach a connection to the room.
    Join {
        /// Connection identifier.
        conn_id: Uuid,
        /// Identity bound to the connection.
        user: UserIdentity,
        /// Writer channel for outbound frames.
        tx: mpsc::UnboundedSender<Message>,
    },
    /// Detach a connection (explicit leave, close, or heartbeat timeout).
    Leave {
        /// Connection identifier.
        conn_id: Uuid,
    },
    /// Record one dart.
    Throw {
        /// Originating connection.
        conn_id: Uuid,
        /// The reported dart.
        dart: Dart,
    },
    /// Undo the most recent throw.
    Undo {
        /// Originating connection.
        conn_id: Uuid,
    },
    /// Start the match (creator only).
    Start {
        /// Originating connection.
        conn_id: Uuid,
    },
    /// End the match early (creator only).
    End {
        /// Originating connection.
        conn_id: Uuid,
    },
}

/// Cheap handle used to enqueue commands for one room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    match_id: Uuid,
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Match this room serializes.
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    /// Enqueue a command; returns false when the actor has already exited.
    pub fn send(&self, command: RoomCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Registry of active rooms keyed by match id.
///
/// Owned by the application state and injected where needed; spawns a room
/// actor lazily on first join and forgets it once the actor exits.
pub struct RoomRegistry {
    rooms: Arc<DashMap<Uuid, RoomHandle>>,
    store: Arc<MatchStore>,
    finalizer: Arc<dyn FinalizeSink>,
}

impl RoomRegistry {
    /// Build an empty registry over the given store and finalization sink.
    pub fn new(store: Arc<MatchStore>, finalizer: Arc<dyn FinalizeSink>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            store,
            finalizer,
        }
    }

    /// Attach a connection to the room for `match_id`, spawning the actor if
    /// none is running. Fails with [`EngineError::NoSuchMatch`] when the
    /// match does not exist.
    pub fn join(
        &self,
        match_id: Uuid,
        conn_id: Uuid,
        user: UserIdentity,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Result<RoomHandle, EngineError> {
        // Matches outlive rooms, so the store decides existence.
        self.store.snapshot(match_id)?;

        Ok(attach(
            &self.rooms,
            &self.store,
            &self.finalizer,
            match_id,
            conn_id,
            user,
            tx,
        ))
    }

    /// Number of rooms with a running actor.
    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }
}

/// Route a connection into the room for `match_id`, spawning the actor when
/// none is running and retrying past a handle whose actor just exited.
fn attach(
    rooms: &Arc<DashMap<Uuid, RoomHandle>>,
    store: &Arc<MatchStore>,
    finalizer: &Arc<dyn FinalizeSink>,
    match_id: Uuid,
    conn_id: Uuid,
    user: UserIdentity,
    tx: mpsc::UnboundedSender<Message>,
) -> RoomHandle {
    loop {
        let handle = rooms
            .entry(match_id)
            .or_insert_with(|| {
                spawn_room(match_id, store.clone(), finalizer.clone(), rooms.clone())
            })
            .clone();

        let joined = handle.send(RoomCommand::Join {
            conn_id,
            user: user.clone(),
            tx: tx.clone(),
        });
        if joined {
            return handle;
        }

        rooms.remove_if(&match_id, |_, stale| stale.tx.is_closed());
    }
}

/// Spawn the actor task for one room and hand back its command channel.
fn spawn_room(
    match_id: Uuid,
    store: Arc<MatchStore>,
    finalizer: Arc<dyn FinalizeSink>,
    rooms: Arc<DashMap<Uuid, RoomHandle>>,
) -> RoomHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = RoomActor {
        match_id,
        tx: tx.clone(),
        store,
        finalizer,
        rooms,
        connections: HashMap::new(),
    };
    tokio::spawn(actor.run(rx));
    RoomHandle { match_id, tx }
}

struct RoomConnection {
    user: UserIdentity,
    tx: mpsc::UnboundedSender<Message>,
}

struct RoomActor {
    match_id: Uuid,
    tx: mpsc::UnboundedSender<RoomCommand>,
    store: Arc<MatchStore>,
    finalizer: Arc<dyn FinalizeSink>,
    rooms: Arc<DashMap<Uuid, RoomHandle>>,
    connections: HashMap<Uuid, RoomConnection>,
}

impl RoomActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        info!(match_id = %self.match_id, "room opened");

        while let Some(command) = rx.recv().await {
            let had_connections = !self.connections.is_empty();
            self.handle(command).await;

            if had_connections && self.connections.is_empty() {
                break;
            }
        }

        // Deregister, then drain the queue: joins that were accepted while
        // we were winding down are routed to a fresh actor instead of being
        // lost.
        self.rooms
            .remove_if(&self.match_id, |_, handle| handle.tx.same_channel(&self.tx));
        rx.close();
        let mut rerouted = false;
        while let Some(command) = rx.recv().await {
            if let RoomCommand::Join { conn_id, user, tx } = command {
                attach(
                    &self.rooms,
                    &self.store,
                    &self.finalizer,
                    self.match_id,
                    conn_id,
                    user,
                    tx,
                );
                rerouted = true;
            }
        }

        if !rerouted && !self.rooms.contains_key(&self.match_id) {
            self.seal_if_finished().await;
        }
        info!(match_id = %self.match_id, "room closed");
    }

    async fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { conn_id, user, tx } => self.on_join(conn_id, user, tx),
            RoomCommand::Leave { conn_id } => self.on_leave(conn_id),
            RoomCommand::Throw { conn_id, dart } => self.on_throw(conn_id, dart).await,
            RoomCommand::Undo { conn_id } => self.on_undo(conn_id),
            RoomCommand::Start { conn_id } => self.on_start(conn_id),
            RoomCommand::End { conn_id } => self.on_end(conn_id),
        }
    }

    fn on_join(&mut self, conn_id: Uuid, user: UserIdentity, tx: mpsc::UnboundedSender<Message>) {
        let joined = ServerMessage::PlayerJoined {
            user_id: user.user_id,
            user_name: user.name.clone(),
        };
        self.broadcast(&joined);

        self.connections
            .insert(conn_id, RoomConnection { user, tx });

        // A fresh (or re-joining) connection always gets a full snapshot;
        // there is no replay cursor to resume from.
        match self.store.snapshot(self.match_id) {
            Ok(state) => {
                self.send_to(conn_id, &ServerMessage::GameState(MatchSnapshot::from(&state)));
            }
            Err(err) => self.report(conn_id, &err),
        }
    }

    fn on_leave(&mut self, conn_id: Uuid) {
        let Some(connection) = self.connections.remove(&conn_id) else {
            return;
        };
        self.broadcast(&ServerMessage::PlayerLeft {
            user_id: connection.user.user_id,
            user_name: connection.user.name,
        });
    }

    async fn on_throw(&mut self, conn_id: Uuid, dart: Dart) {
        let Some(user_id) = self.user_of(conn_id) else {
            return;
        };

        match self.store.apply_throw(self.match_id, dart, user_id) {
            Ok(committed) => {
                let player_name = committed
                    .state
                    .participants
                    .get(&committed.record.participant_id)
                    .map(|participant| participant.name.clone())
                    .unwrap_or_default();

                self.broadcast(&ServerMessage::ThrowRecorded {
                    throw_id: committed.record.id,
                    player_id: committed.record.participant_id,
                    player_name,
                    segment: committed.record.segment,
                    multiplier: committed.record.multiplier,
                    raw_value: committed.record.raw_value,
                    is_bust: committed.record.bust,
                    entered_by: committed.record.entered_by,
                    finished: committed.finished,
                });
                self.broadcast_state(&committed.state);

                if committed.finished {
                    self.announce_winner(&committed.state);
                }
            }
            Err(err) => self.report(conn_id, &err),
        }
    }

    fn on_undo(&mut self, conn_id: Uuid) {
        let Some(user_id) = self.user_of(conn_id) else {
            return;
        };

        let authorized = self
            .store
            .snapshot(self.match_id)
            .map(|state| state.is_participant(user_id));
        match authorized {
            Ok(true) => {}
            Ok(false) => {
                return self.report(
                    conn_id,
                    &EngineError::NotAuthorized(
                        "only match participants can undo throws".into(),
                    ),
                );
            }
            Err(err) => return self.report(conn_id, &err),
        }

        match self.store.undo_last_throw(self.match_id) {
            Ok((record, state)) => {
                self.broadcast(&ServerMessage::ThrowUndone {
                    throw_id: record.id,
                    player_id: record.participant_id,
                    undone_by: user_id,
                });
                self.broadcast_state(&state);
            }
            Err(err) => self.report(conn_id, &err),
        }
    }

    fn on_start(&mut self, conn_id: Uuid) {
        let Some(user_id) = self.user_of(conn_id) else {
            return;
        };

        match self.store.start(self.match_id, user_id) {
            Ok(state) => {
                self.broadcast(&ServerMessage::GameStarted {
                    game_id: self.match_id,
                });
                self.broadcast_state(&state);
            }
            Err(err) => self.report(conn_id, &err),
        }
    }

    fn on_end(&mut self, conn_id: Uuid) {
        let Some(user_id) = self.user_of(conn_id) else {
            return;
        };

        match self.store.end(self.match_id, user_id) {
            Ok(state) => {
                self.broadcast(&ServerMessage::GameAbandoned {
                    game_id: self.match_id,
                    abandoned_by: user_id,
                });
                self.broadcast_state(&state);
            }
            Err(err) => self.report(conn_id, &err),
        }
    }

    fn announce_winner(&mut self, state: &LiveMatch) {
        let Some(winner_id) = state.winner else {
            return;
        };
        let Some(winner) = state.participants.get(&winner_id) else {
            return;
        };

        self.broadcast(&ServerMessage::GameEnded {
            game_id: self.match_id,
            winner_id,
            winner_user_id: winner.user_id,
            reason: "won".into(),
        });
    }

    /// Hand the summary to the finalization sink and drop the live record.
    ///
    /// Runs once, when the room winds down with the match Finished; while
    /// scorers are still connected the record stays live so a mis-entered
    /// winning dart can be undone.
    async fn seal_if_finished(&self) {
        let Ok(state) = self.store.snapshot(self.match_id) else {
            return;
        };
        if state.status != MatchStatus::Finished {
            return;
        }

        let summary = MatchSummary::from_finished(&state);
        match self.finalizer.finalize(summary).await {
            Ok(record_id) => {
                info!(match_id = %self.match_id, %record_id, "match finalized");
            }
            Err(err) => {
                warn!(match_id = %self.match_id, error = %err, "finalization sink rejected the match");
            }
        }
        self.store.remove(self.match_id);
    }

    fn user_of(&mut self, conn_id: Uuid) -> Option<Uuid> {
        match self.connections.get(&conn_id) {
            Some(connection) => Some(connection.user.user_id),
            None => {
                // Command raced past its own leave; nothing to report to.
                debug!(match_id = %self.match_id, %conn_id, "command from detached connection");
                None
            }
        }
    }

    fn broadcast_state(&mut self, state: &LiveMatch) {
        self.broadcast(&ServerMessage::GameState(MatchSnapshot::from(state)));
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        let Some(frame) = encode(message) else {
            return;
        };
        // Drop connections whose writer has gone away mid-broadcast.
        self.connections
            .retain(|_, connection| connection.tx.send(frame.clone()).is_ok());
    }

    fn send_to(&mut self, conn_id: Uuid, message: &ServerMessage) {
        let Some(frame) = encode(message) else {
            return;
        };
        if let Some(connection) = self.connections.get(&conn_id)
            && connection.tx.send(frame).is_err()
        {
            self.connections.remove(&conn_id);
        }
    }

    fn report(&mut self, conn_id: Uuid, err: &EngineError) {
        debug!(match_id = %self.match_id, %conn_id, error = %err, "operation rejected");
        self.send_to(
            conn_id,
            &ServerMessage::Error {
                message: err.to_string(),
            },
        );
    }
}

/// Serialize a server message into a text frame.
fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(Message::Text(payload.into())),
        Err(err) => {
            warn!(error = %err, "failed to serialize broadcast payload");
            None
        }
    }
}
