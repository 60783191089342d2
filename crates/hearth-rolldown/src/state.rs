//! Shared state for the dev server.
//!
//! Tracks connected change-stream clients using parking_lot locks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

/// Connected change-stream clients.
pub type ClientRegistry = RwLock<HashMap<usize, mpsc::Sender<String>>>;

pub struct ServerState {
    clients: ClientRegistry,
    next_client_id: AtomicUsize,
    outdir: PathBuf,
}

impl ServerState {
    pub fn new(outdir: PathBuf) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_client_id: AtomicUsize::new(0),
            outdir,
        }
    }

    /// Register a new client; events arrive on the returned receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(16);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send `data` to every client, dropping the ones that went away.
    pub async fn broadcast(&self, data: &str) {
        let clients: Vec<_> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut gone = Vec::new();
        for (id, tx) in clients {
            if tx.send(data.to_string()).await.is_err() {
                gone.push(id);
            }
        }
        let dropped = gone.len();
        for id in gone {
            self.unregister_client(id);
        }
        tracing::debug!(clients = self.client_count(), dropped, "change event sent");
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }
}

pub type SharedState = Arc<ServerState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_client() {
        let state = ServerState::new(PathBuf::from("dist"));
        let (_, mut a) = state.register_client();
        let (_, mut b) = state.register_client();
        assert_eq!(state.client_count(), 2);

        state.broadcast("{\"generation\":1}").await;
        assert_eq!(a.recv().await.as_deref(), Some("{\"generation\":1}"));
        assert_eq!(b.recv().await.as_deref(), Some("{\"generation\":1}"));
    }

    #[tokio::test]
    async fn disconnected_clients_are_dropped() {
        let state = ServerState::new(PathBuf::from("dist"));
        let (_, rx) = state.register_client();
        let (_, _keep) = state.register_client();
        drop(rx);

        state.broadcast("x").await;
        assert_eq!(state.client_count(), 1);
    }

    #[test]
    fn client_ids_are_unique() {
        let state = ServerState::new(PathBuf::from("dist"));
        let (a, _) = state.register_client();
        let (b, _) = state.register_client();
        assert_ne!(a, b);
        state.unregister_client(a);
        assert_eq!(state.client_count(), 1);
    }
}
