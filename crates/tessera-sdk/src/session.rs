//! Session management for collaborative editing sessions.

use crate::document::TextDoc;
use crate::error::{Result, SdkError};
use crate::network::{Message, NetworkTransport, Peer, PeerId};
use crate::operation::Operation;
use parking_lot::{Mutex as SyncMutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tessera_core::{Char, SiteId};
use tessera_doc::{CrdtConfig, Position};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info, warn};

type Incoming = mpsc::Receiver<(PeerId, Message)>;

/// Events emitted by a session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A peer announced itself.
    PeerJoined {
        peer_id: PeerId,
        site_id: SiteId,
        user_name: String,
    },
    /// A document was opened.
    DocumentOpened { document_id: String },
    /// A document was closed.
    DocumentClosed { document_id: String },
    /// Session connected.
    Connected,
    /// Session disconnected.
    Disconnected,
}

/// A collaborative session that manages documents and peers.
///
/// Local edits are broadcast as soon as they are applied. Remote edits are
/// applied when the host calls [`Session::receive`] or
/// [`Session::process_incoming`]. Edits for a document that is not open yet
/// are held back and replayed, in arrival order, when it is opened.
pub struct Session<T: NetworkTransport> {
    session_id: String,
    local_peer_id: PeerId,
    user_name: String,
    config: CrdtConfig,
    transport: Arc<T>,
    docs: Arc<RwLock<HashMap<String, Arc<TextDoc>>>>,
    /// Remote operations for documents not open here. Locked after `docs`.
    parked: SyncMutex<HashMap<String, Vec<Operation>>>,
    incoming: Mutex<Option<Incoming>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<T: NetworkTransport> Session<T> {
    /// Create a new session. Every document opened in it uses `config`.
    pub fn new(
        session_id: impl Into<String>,
        local_peer_id: PeerId,
        user_name: impl Into<String>,
        config: CrdtConfig,
        transport: Arc<T>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            session_id: session_id.into(),
            local_peer_id,
            user_name: user_name.into(),
            config,
            transport,
            docs: Arc::new(RwLock::new(HashMap::new())),
            parked: SyncMutex::new(HashMap::new()),
            incoming: Mutex::new(None),
            event_tx,
        }
    }

    /// Get the session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the local peer ID.
    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    /// Get the user name.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn site_id(&self) -> SiteId {
        self.config.site_id
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Connect to the session (announce this site to peers).
    pub async fn connect(&self) -> Result<()> {
        let message = Message::Hello {
            site_id: self.config.site_id,
            user_name: self.user_name.clone(),
        };

        self.transport.broadcast(message).await?;

        info!(session = %self.session_id, site = %self.config.site_id, "connected");
        let _ = self.event_tx.send(SessionEvent::Connected);

        Ok(())
    }

    /// Disconnect from the session.
    pub async fn disconnect(&self) -> Result<()> {
        let _ = self.event_tx.send(SessionEvent::Disconnected);
        Ok(())
    }

    /// Create or open a text document.
    pub fn open_doc(&self, document_id: impl Into<String>) -> Arc<TextDoc> {
        let document_id = document_id.into();
        let mut docs = self.docs.write();

        if let Some(doc) = docs.get(&document_id) {
            doc.clone()
        } else {
            let doc = Arc::new(TextDoc::new(document_id.clone(), self.config.clone()));
            self.replay_parked(&document_id, &doc);
            docs.insert(document_id.clone(), doc.clone());

            let _ = self
                .event_tx
                .send(SessionEvent::DocumentOpened { document_id });

            doc
        }
    }

    /// Get an open document.
    pub fn get_doc(&self, document_id: &str) -> Option<Arc<TextDoc>> {
        self.docs.read().get(document_id).cloned()
    }

    /// Close a document.
    pub fn close_doc(&self, document_id: &str) {
        if self.docs.write().remove(document_id).is_some() {
            let _ = self.event_tx.send(SessionEvent::DocumentClosed {
                document_id: document_id.to_string(),
            });
        }
    }

    /// Get list of open document IDs.
    pub fn open_documents(&self) -> Vec<String> {
        self.docs.read().keys().cloned().collect()
    }

    /// Get connected peers.
    pub async fn peers(&self) -> Vec<Peer> {
        self.transport.connected_peers().await
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Insert a character and broadcast it.
    pub async fn insert(&self, document_id: &str, position: Position, value: char) -> Result<Char> {
        let doc = self.doc(document_id)?;
        let ch = doc.insert(position, value)?;
        self.broadcast_pending(&doc).await?;
        Ok(ch)
    }

    /// Insert a string and broadcast every created character.
    pub async fn insert_str(
        &self,
        document_id: &str,
        position: Position,
        text: &str,
    ) -> Result<Vec<Char>> {
        let doc = self.doc(document_id)?;
        let chars = doc.insert_str(position, text)?;
        self.broadcast_pending(&doc).await?;
        Ok(chars)
    }

    /// Delete `[start, end)` and broadcast the removed characters.
    pub async fn delete(
        &self,
        document_id: &str,
        start: Position,
        end: Position,
    ) -> Result<Vec<Char>> {
        let doc = self.doc(document_id)?;
        let removed = doc.delete(start, end)?;
        self.broadcast_pending(&doc).await?;
        Ok(removed)
    }

    /// Broadcast edits made directly on a [`TextDoc`] handle.
    pub async fn flush(&self, document_id: &str) -> Result<usize> {
        let doc = self.doc(document_id)?;
        self.broadcast_pending(&doc).await
    }

    // ------------------------------------------------------------------
    // Incoming
    // ------------------------------------------------------------------

    /// Wait for the next message and apply it.
    ///
    /// Returns `Ok(false)` once every peer has hung up.
    pub async fn receive(&self) -> Result<bool> {
        let mut incoming = self.incoming.lock().await;
        let rx = self.claim_incoming(&mut incoming)?;
        match rx.recv().await {
            Some((from, message)) => {
                self.handle_message(from, message)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply every message already waiting, returning how many remote
    /// operations changed a document.
    ///
    /// A message that fails does not stop the drain. The first failure is
    /// returned once the queue is empty.
    pub async fn process_incoming(&self) -> Result<usize> {
        let mut incoming = self.incoming.lock().await;
        let rx = self.claim_incoming(&mut incoming)?;

        let mut applied = 0;
        let mut first_error = None;
        while let Ok((from, message)) = rx.try_recv() {
            match self.handle_message(from.clone(), message) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(session = %self.session_id, peer = %from, error = %err, "failed to apply message");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(applied),
        }
    }

    fn claim_incoming<'a>(&self, slot: &'a mut Option<Incoming>) -> Result<&'a mut Incoming> {
        if slot.is_none() {
            *slot = Some(self.transport.subscribe()?);
        }
        slot.as_mut()
            .ok_or_else(|| SdkError::Internal("incoming stream unavailable".to_string()))
    }

    fn handle_message(&self, from: PeerId, message: Message) -> Result<bool> {
        match message {
            Message::Hello { site_id, user_name } => {
                debug!(peer = %from, site = %site_id, "peer joined");
                let _ = self.event_tx.send(SessionEvent::PeerJoined {
                    peer_id: from,
                    site_id,
                    user_name,
                });
                Ok(false)
            }
            Message::Operation {
                document_id,
                payload,
            } => {
                let op = Operation::decode(&payload)?;
                let doc = {
                    let docs = self.docs.read();
                    match docs.get(&document_id) {
                        Some(doc) => doc.clone(),
                        None => {
                            debug!(document = %document_id, peer = %from, "holding operation for unopened document");
                            self.parked.lock().entry(document_id).or_default().push(op);
                            return Ok(false);
                        }
                    }
                };
                doc.apply_remote(op)
            }
        }
    }

    /// Apply operations that arrived before `doc` was opened. Runs under the
    /// `docs` write lock, so nothing newer can reach the document first.
    fn replay_parked(&self, document_id: &str, doc: &TextDoc) {
        let Some(ops) = self.parked.lock().remove(document_id) else {
            return;
        };
        debug!(document = %document_id, count = ops.len(), "replaying held operations");
        for op in ops {
            if let Err(err) = doc.apply_remote(op) {
                warn!(document = %document_id, error = %err, "failed to replay held operation");
            }
        }
    }

    /// Send the document's queued operations in order. On failure the
    /// unsent ones go back to the queue for the next attempt.
    async fn broadcast_pending(&self, doc: &TextDoc) -> Result<usize> {
        let pending = doc.take_pending();
        for (sent, op) in pending.iter().enumerate() {
            if let Err(err) = self.send_operation(doc.id(), op).await {
                doc.requeue(pending[sent..].to_vec());
                return Err(err);
            }
        }
        Ok(pending.len())
    }

    async fn send_operation(&self, document_id: &str, op: &Operation) -> Result<()> {
        let message = Message::Operation {
            document_id: document_id.to_string(),
            payload: op.encode()?,
        };
        self.transport.broadcast(message).await?;
        Ok(())
    }

    fn doc(&self, document_id: &str) -> Result<Arc<TextDoc>> {
        self.get_doc(document_id)
            .ok_or_else(|| SdkError::DocumentNotFound(document_id.to_string()))
    }
}
