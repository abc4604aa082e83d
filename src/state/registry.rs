use crate::types::{ConnId, Participant, ParticipantName};

/// Display name -> live connection, in registration order
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Participant>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or re-register a name. Last registration wins; the name keeps
    /// its original roster position. Returns the handle that was replaced, if
    /// any.
    pub fn register(&mut self, name: ParticipantName, conn: ConnId) -> Option<ConnId> {
        match self.entries.iter_mut().find(|p| p.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.conn, conn)),
            None => {
                self.entries.push(Participant { name, conn });
                None
            }
        }
    }

    /// Drop every name routed to this connection (no-op for unregistered
    /// connections such as the teacher's)
    pub fn unregister(&mut self, conn: &str) -> Vec<ParticipantName> {
        let mut removed = Vec::new();
        self.entries.retain(|p| {
            if p.conn == conn {
                removed.push(p.name.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove a name explicitly, returning its handle for out-of-band notification
    pub fn remove(&mut self, name: &str) -> Option<ConnId> {
        let pos = self.entries.iter().position(|p| p.name == name)?;
        Some(self.entries.remove(pos).conn)
    }

    pub fn names_snapshot(&self) -> Vec<ParticipantName> {
        self.entries.iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
