//! Collaborative text document wrapper.

use crate::error::Result;
use crate::operation::Operation;
use parking_lot::{Mutex, RwLock};
use tessera_core::{Char, SiteId};
use tessera_doc::{Crdt, CrdtConfig, Position};
use tokio::sync::broadcast;
use tracing::debug;

/// Events emitted when a document changes.
#[derive(Clone, Debug, PartialEq)]
pub enum DocEvent {
    /// Text was typed locally.
    Insert { position: Position, text: String },
    /// A local range was deleted.
    Delete {
        start: Position,
        end: Position,
        removed: usize,
    },
    /// A remote character was merged in.
    RemoteInsert { position: Position, value: char },
    /// A remote delete removed a character.
    RemoteDelete { position: Position, value: char },
}

/// A collaborative plain text document.
///
/// Each operation runs in one critical section over the store, and the
/// operations it produces are queued until [`TextDoc::take_pending`].
pub struct TextDoc {
    id: String,
    crdt: RwLock<Crdt>,
    pending: Mutex<Vec<Operation>>,
    event_tx: broadcast::Sender<DocEvent>,
}

impl TextDoc {
    /// Create a new text document.
    pub fn new(id: impl Into<String>, config: CrdtConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            id: id.into(),
            crdt: RwLock::new(Crdt::with_config(config)),
            pending: Mutex::new(Vec::new()),
            event_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn site_id(&self) -> SiteId {
        self.crdt.read().site_id()
    }

    /// Subscribe to document events.
    pub fn subscribe(&self) -> broadcast::Receiver<DocEvent> {
        self.event_tx.subscribe()
    }

    /// Insert one character at `position`.
    pub fn insert(&self, position: Position, value: char) -> Result<Char> {
        let mut crdt = self.crdt.write();
        let ch = crdt.handle_local_insert(value, position)?;
        let position = crdt.position_of(&ch).unwrap_or(position);
        self.pending.lock().push(Operation::Insert(ch.clone()));
        drop(crdt);

        let _ = self.event_tx.send(DocEvent::Insert {
            position,
            text: value.to_string(),
        });
        Ok(ch)
    }

    /// Insert a string at `position`, one character after another.
    pub fn insert_str(&self, position: Position, text: &str) -> Result<Vec<Char>> {
        let mut crdt = self.crdt.write();
        let chars = crdt.handle_local_insert_str(text, position)?;
        let position = chars
            .first()
            .and_then(|ch| crdt.position_of(ch))
            .unwrap_or(position);
        self.pending
            .lock()
            .extend(chars.iter().cloned().map(Operation::Insert));
        drop(crdt);

        if !chars.is_empty() {
            let _ = self.event_tx.send(DocEvent::Insert {
                position,
                text: text.to_string(),
            });
        }
        Ok(chars)
    }

    /// Delete the characters in `[start, end)`.
    pub fn delete(&self, start: Position, end: Position) -> Result<Vec<Char>> {
        let removed = {
            let mut crdt = self.crdt.write();
            let removed = crdt.handle_local_delete(start, end)?;
            self.pending
                .lock()
                .extend(removed.iter().cloned().map(Operation::Delete));
            removed
        };

        if !removed.is_empty() {
            let _ = self.event_tx.send(DocEvent::Delete {
                start,
                end,
                removed: removed.len(),
            });
        }
        Ok(removed)
    }

    /// Apply an operation received from another replica.
    ///
    /// Returns `false` when the operation was a delete of a character this
    /// replica no longer holds; that case is dropped.
    pub fn apply_remote(&self, op: Operation) -> Result<bool> {
        match op {
            Operation::Insert(ch) => {
                let (ch, position) = self.crdt.write().handle_remote_insert(ch)?;
                let _ = self.event_tx.send(DocEvent::RemoteInsert {
                    position,
                    value: ch.value(),
                });
                Ok(true)
            }
            Operation::Delete(ch) => {
                let result = self.crdt.write().handle_remote_delete(&ch);
                match result {
                    Ok(position) => {
                        let _ = self.event_tx.send(DocEvent::RemoteDelete {
                            position,
                            value: ch.value(),
                        });
                        Ok(true)
                    }
                    Err(err) if err.is_benign() => {
                        debug!(document = %self.id, %ch, "remote delete of absent character ignored");
                        Ok(false)
                    }
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    /// Drain the operations produced locally since the last call.
    pub fn take_pending(&self) -> Vec<Operation> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Put operations that could not be sent back at the front of the queue,
    /// ahead of anything produced since they were taken.
    pub fn requeue(&self, ops: Vec<Operation>) {
        if ops.is_empty() {
            return;
        }
        let mut pending = self.pending.lock();
        let newer = std::mem::replace(&mut *pending, ops);
        pending.extend(newer);
    }

    /// Run a read-only query against the underlying store.
    pub fn read<R>(&self, f: impl FnOnce(&Crdt) -> R) -> R {
        f(&self.crdt.read())
    }

    /// Get the current text content.
    pub fn text(&self) -> String {
        self.crdt.read().text()
    }

    /// Get each line's text, newline included.
    pub fn lines(&self) -> Vec<String> {
        self.crdt
            .read()
            .lines()
            .iter()
            .map(|line| line.iter().map(Char::value).collect())
            .collect()
    }

    pub fn line_count(&self) -> usize {
        self.crdt.read().line_count()
    }

    pub fn len(&self) -> usize {
        self.crdt.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.crdt.read().is_empty()
    }
}
