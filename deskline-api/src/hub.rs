//! Real-Time Connection Hub
//!
//! Membership for live duplex connections, keyed by user id. The hub runs
//! a single event loop over three channels (register, unregister,
//! broadcast); all membership mutation happens inside that loop. A shared
//! read/write lock mirrors the map for point lookups (unicast, stats)
//! from request handlers.
//!
//! Policy decisions:
//! - One live connection per user id. Registering a user who already has a
//!   connection closes the old one ("last writer wins", no multi-device
//!   fan-out).
//! - Unicast to an offline user is a no-op.
//! - A full outbound buffer evicts that connection instead of blocking the
//!   hub loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sender half of one connection's outbound queue, as seen by the hub.
#[derive(Debug, Clone)]
struct ConnectionHandle {
    connection_id: Uuid,
    tx: mpsc::Sender<String>,
}

#[derive(Debug)]
struct Registration {
    user_id: String,
    connection_id: Uuid,
    tx: mpsc::Sender<String>,
}

#[derive(Debug)]
struct Unregistration {
    user_id: String,
    /// Only the connection that registered may unregister itself; an
    /// evicted connection racing its own cleanup must not drop its
    /// replacement.
    connection_id: Uuid,
}

/// Shared hub handle. Cloning is cheap; all clones drive the same loop.
#[derive(Debug, Clone)]
pub struct Hub {
    register_tx: mpsc::UnboundedSender<Registration>,
    unregister_tx: mpsc::UnboundedSender<Unregistration>,
    broadcast_tx: mpsc::UnboundedSender<String>,
    connections: Arc<RwLock<HashMap<String, ConnectionHandle>>>,
    send_buffer: usize,
}

impl Hub {
    /// Create the hub and spawn its event loop. `send_buffer` is the
    /// per-connection outbound queue capacity.
    pub fn new(send_buffer: usize) -> Self {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
        let connections = Arc::new(RwLock::new(HashMap::new()));

        tokio::spawn(run_loop(
            register_rx,
            unregister_rx,
            broadcast_rx,
            Arc::clone(&connections),
        ));

        Hub {
            register_tx,
            unregister_tx,
            broadcast_tx,
            connections,
            send_buffer,
        }
    }

    /// Register a connection for `user_id`. Returns the connection id and
    /// the receiver its write loop drains. Any previous connection for the
    /// same user is evicted by closing its queue.
    pub fn register(&self, user_id: &str) -> (Uuid, mpsc::Receiver<String>) {
        let connection_id = Uuid::now_v7();
        let (tx, rx) = mpsc::channel(self.send_buffer);
        let _ = self.register_tx.send(Registration {
            user_id: user_id.to_string(),
            connection_id,
            tx,
        });
        (connection_id, rx)
    }

    /// Remove the connection if it is still the live one for `user_id`.
    pub fn unregister(&self, user_id: &str, connection_id: Uuid) {
        let _ = self.unregister_tx.send(Unregistration {
            user_id: user_id.to_string(),
            connection_id,
        });
    }

    /// Queue a frame for every connected client.
    pub fn broadcast(&self, frame: String) {
        let _ = self.broadcast_tx.send(frame);
    }

    /// Deliver a frame to one user. Returns true when the frame was
    /// queued. An offline user is a no-op; a full queue evicts the slow
    /// connection and reports failure.
    pub async fn send_to_user(&self, user_id: &str, frame: String) -> bool {
        let handle = {
            let map = self.connections.read().await;
            map.get(user_id).cloned()
        };
        let Some(handle) = handle else {
            debug!(user_id, "unicast to offline user dropped");
            return false;
        };
        match handle.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(user_id, "outbound buffer full, evicting slow connection");
                self.unregister(user_id, handle.connection_id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.unregister(user_id, handle.connection_id);
                false
            }
        }
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    pub async fn connected_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn online_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.connections.read().await.keys().cloned().collect();
        users.sort();
        users
    }
}

/// The serialized event loop. Owns all membership mutation; never does
/// I/O beyond non-blocking queue pushes.
async fn run_loop(
    mut register_rx: mpsc::UnboundedReceiver<Registration>,
    mut unregister_rx: mpsc::UnboundedReceiver<Unregistration>,
    mut broadcast_rx: mpsc::UnboundedReceiver<String>,
    connections: Arc<RwLock<HashMap<String, ConnectionHandle>>>,
) {
    loop {
        tokio::select! {
            registration = register_rx.recv() => {
                let Some(reg) = registration else { break };
                let mut map = connections.write().await;
                let replaced = map.insert(
                    reg.user_id.clone(),
                    ConnectionHandle {
                        connection_id: reg.connection_id,
                        tx: reg.tx,
                    },
                );
                if replaced.is_some() {
                    // Dropping the old handle closes its queue; the evicted
                    // write loop sees the closure and shuts the socket.
                    info!(user_id = %reg.user_id, "evicted previous connection");
                }
                debug!(user_id = %reg.user_id, connection_id = %reg.connection_id, "registered");
            }
            unregistration = unregister_rx.recv() => {
                let Some(unreg) = unregistration else { break };
                let mut map = connections.write().await;
                if map
                    .get(&unreg.user_id)
                    .is_some_and(|h| h.connection_id == unreg.connection_id)
                {
                    map.remove(&unreg.user_id);
                    debug!(user_id = %unreg.user_id, "unregistered");
                }
            }
            frame = broadcast_rx.recv() => {
                let Some(frame) = frame else { break };
                let mut stale: Vec<(String, Uuid)> = Vec::new();
                {
                    let map = connections.read().await;
                    for (user_id, handle) in map.iter() {
                        if handle.tx.try_send(frame.clone()).is_err() {
                            stale.push((user_id.clone(), handle.connection_id));
                        }
                    }
                }
                if !stale.is_empty() {
                    let mut map = connections.write().await;
                    for (user_id, connection_id) in stale {
                        if map
                            .get(&user_id)
                            .is_some_and(|h| h.connection_id == connection_id)
                        {
                            warn!(user_id = %user_id, "dropped slow consumer during broadcast");
                            map.remove(&user_id);
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
