use crate::types::ConnectionId;
use std::collections::HashMap;

/// Display-name overlay keyed by connection.
///
/// Room membership is not stored here, see [`super::groups::RoomGroups`].
#[derive(Debug, Default, Clone)]
pub struct SessionRegistry {
    names: HashMap<ConnectionId, Option<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite the name a connection joined with
    pub fn record(&mut self, connection_id: &str, display_name: Option<String>) {
        self.names.insert(connection_id.to_string(), display_name);
    }

    /// Name recorded for a connection, `None` if it never joined, was
    /// removed, or joined without a name
    pub fn lookup(&self, connection_id: &str) -> Option<String> {
        self.names.get(connection_id).cloned().flatten()
    }

    /// Whether the connection has a recorded entry (even a nameless one)
    pub fn contains(&self, connection_id: &str) -> bool {
        self.names.contains_key(connection_id)
    }

    pub fn remove(&mut self, connection_id: &str) {
        self.names.remove(connection_id);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
