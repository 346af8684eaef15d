//! The command actor
//!
//! One consumer task owns the only path for locally-initiated mutations.
//! Commands are processed strictly in arrival order, and each mutation
//! triggers exactly one broadcast attempt against the snapshot the store
//! returned. Reads bypass the queue; the store's own lock covers them.

use driftkv_core::{DriftError, DriftResult};
use driftkv_state::SharedReplica;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::transport::SharedBroadcast;

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Mutation and wiring requests accepted by the actor, processed FIFO.
enum Command {
    Set {
        key: String,
        value: String,
        reply: oneshot::Sender<String>,
    },
    Delete {
        key: String,
        reply: oneshot::Sender<()>,
    },
    Register {
        transport: SharedBroadcast,
    },
}

/// Handle to a peer's command actor.
///
/// Cloneable; all clones feed the same FIFO queue. `set` and `delete`
/// block the caller until the mutation is applied and the broadcast has
/// been initiated.
#[derive(Clone)]
pub struct PeerHandle {
    replica: SharedReplica,
    commands: mpsc::Sender<Command>,
    quit: mpsc::Sender<()>,
}

impl PeerHandle {
    /// Spawn the actor with no transport bound yet. Mutations before
    /// [`PeerHandle::register`] apply locally but are not disseminated.
    pub fn spawn(replica: SharedReplica) -> Self {
        Self::start(replica, None)
    }

    /// Spawn the actor with the transport wired from the start, so no
    /// mutation can slip through before dissemination is possible.
    pub fn spawn_with_transport(replica: SharedReplica, transport: SharedBroadcast) -> Self {
        Self::start(replica, Some(transport))
    }

    fn start(replica: SharedReplica, transport: Option<SharedBroadcast>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (quit_tx, quit_rx) = mpsc::channel(1);

        let worker = ActorLoop {
            replica: replica.clone(),
            transport,
        };
        tokio::spawn(worker.run(commands_rx, quit_rx));

        Self {
            replica,
            commands: commands_tx,
            quit: quit_tx,
        }
    }

    /// Insert or overwrite a key. Returns the value read back from the
    /// post-mutation snapshot once the broadcast has been initiated.
    pub async fn set(&self, key: &str, value: &str) -> DriftResult<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Set {
                key: key.to_string(),
                value: value.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| DriftError::ActorStopped)?;
        reply_rx.await.map_err(|_| DriftError::ActorStopped)
    }

    /// Tombstone a key. Blocks until applied and broadcast-initiated.
    pub async fn delete(&self, key: &str) -> DriftResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Delete {
                key: key.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| DriftError::ActorStopped)?;
        reply_rx.await.map_err(|_| DriftError::ActorStopped)
    }

    /// Read one key directly from the store. May not observe a concurrent
    /// write from another caller until that caller's `set` has returned.
    pub fn get(&self, key: &str) -> Option<String> {
        self.replica.get(key)
    }

    /// All visible key-value pairs, read directly from the store.
    pub fn get_all(&self) -> BTreeMap<String, String> {
        self.replica.get_all()
    }

    /// Bind the transport used for subsequent broadcasts. Queued after
    /// earlier mutations, so ordering with respect to them is preserved.
    pub async fn register(&self, transport: SharedBroadcast) -> DriftResult<()> {
        self.commands
            .send(Command::Register { transport })
            .await
            .map_err(|_| DriftError::ActorStopped)
    }

    /// Stop the actor. Queued commands may be abandoned; their callers
    /// observe [`DriftError::ActorStopped`].
    pub fn stop(&self) {
        let _ = self.quit.try_send(());
    }
}

/// The consumer side, owned by the spawned task.
struct ActorLoop {
    replica: SharedReplica,
    transport: Option<SharedBroadcast>,
}

impl ActorLoop {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, mut quit: mpsc::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = quit.recv() => {
                    info!("command actor stopping");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Set { key, value, reply } => {
                let snapshot = self.replica.set(&key, &value);
                // Visibility-filtered read-back: empty if the entry is
                // still masked by a fresher tombstone.
                let stored = snapshot.get(&key).unwrap_or_default().to_string();
                self.broadcast(&snapshot);
                let _ = reply.send(stored);
            }
            Command::Delete { key, reply } => {
                let snapshot = self.replica.delete(&key);
                self.broadcast(&snapshot);
                let _ = reply.send(());
            }
            Command::Register { transport } => {
                info!("broadcast transport registered");
                self.transport = Some(transport);
            }
        }
    }

    fn broadcast(&self, snapshot: &driftkv_state::Snapshot) {
        match &self.transport {
            Some(transport) => transport.broadcast(snapshot),
            None => debug!("no transport registered; not broadcasting this update"),
        }
    }
}
