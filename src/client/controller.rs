use super::JoinParams;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::{ConnectionId, Member, RoomId};

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The server told us our own connection id
    Welcomed { connection_id: ConnectionId },
    /// Someone else joined the room
    PeerJoined { display_name: Option<String> },
    MembersChanged { members: Vec<Member> },
    /// A remote edit or sync overwrote the local document
    DocumentReplaced { content: String },
    OutputReplaced { output: String },
    PeerLeft {
        connection_id: ConnectionId,
        display_name: Option<String>,
    },
    /// The channel failed or closed underneath us; the session is over
    ConnectionError { reason: String },
    ProtocolError { code: String, msg: String },
}

/// Result of handling one server message: what to show, what to send
#[derive(Debug, Default, PartialEq)]
pub struct Reaction {
    pub events: Vec<SessionEvent>,
    pub outbound: Vec<ClientMessage>,
}

/// Local mirror of one room session.
///
/// Remote content always replaces the local mirror, there is no merging.
pub struct SessionController {
    room_id: RoomId,
    display_name: String,
    connection_id: Option<ConnectionId>,
    document: Option<String>,
    output: Option<String>,
    members: Vec<Member>,
    closed: bool,
}

impl SessionController {
    pub fn new(params: JoinParams) -> Self {
        Self {
            room_id: params.room_id,
            display_name: params.display_name,
            connection_id: None,
            document: None,
            output: None,
            members: Vec::new(),
            closed: false,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::Join {
            room_id: self.room_id.clone(),
            display_name: Some(self.display_name.clone()),
        }
    }

    /// Apply a local edit and return the message announcing it.
    /// Nothing is sent once the session is torn down.
    pub fn local_edit(&mut self, content: impl Into<String>) -> Option<ClientMessage> {
        if self.closed {
            return None;
        }
        let content = content.into();
        self.document = Some(content.clone());
        Some(ClientMessage::CodeChange {
            room_id: self.room_id.clone(),
            content: Some(content),
        })
    }

    pub fn local_output(&mut self, output: impl Into<String>) -> Option<ClientMessage> {
        if self.closed {
            return None;
        }
        let output = output.into();
        self.output = Some(output.clone());
        Some(ClientMessage::OutputChange {
            room_id: self.room_id.clone(),
            output: Some(output),
        })
    }

    /// Stop reacting to anything the channel delivers
    pub fn teardown(&mut self) {
        self.closed = true;
    }

    /// The channel broke. Ends the session and returns the event to surface.
    pub fn connection_error(&mut self, reason: impl Into<String>) -> SessionEvent {
        self.closed = true;
        SessionEvent::ConnectionError {
            reason: reason.into(),
        }
    }

    /// React to one server message.
    ///
    /// The own connection id comes from `welcome`. If none was seen, the
    /// first `joined` carrying our display name is assumed to be ours; that
    /// guess is wrong when another member already uses the same name.
    pub fn handle(&mut self, msg: ServerMessage) -> Reaction {
        let mut reaction = Reaction::default();
        if self.closed {
            return reaction;
        }

        match msg {
            ServerMessage::Welcome { connection_id, .. } => {
                self.connection_id = Some(connection_id.clone());
                reaction
                    .events
                    .push(SessionEvent::Welcomed { connection_id });
            }

            ServerMessage::Joined {
                members,
                display_name,
                connection_id,
            } => {
                let is_own_name = display_name.as_deref() == Some(self.display_name.as_str());

                // Only reached when no welcome arrived. Names are not unique, so a
                // peer sharing our name that joins first would be taken for us.
                if self.connection_id.is_none() && is_own_name {
                    self.connection_id = Some(connection_id.clone());
                }

                if !is_own_name {
                    reaction.events.push(SessionEvent::PeerJoined {
                        display_name: display_name.clone(),
                    });
                }

                self.members = members.clone();
                reaction
                    .events
                    .push(SessionEvent::MembersChanged { members });

                // The newcomer needs our copy; our own entry needs nothing
                if self.connection_id.as_deref() != Some(connection_id.as_str()) {
                    reaction.outbound.push(ClientMessage::SyncCode {
                        target_connection_id: connection_id,
                        content: self.document.clone(),
                    });
                }
            }

            ServerMessage::CodeChange { content } => {
                // A peer without any content yet has nothing to offer
                if let Some(content) = content {
                    self.document = Some(content.clone());
                    reaction
                        .events
                        .push(SessionEvent::DocumentReplaced { content });
                }
            }

            ServerMessage::OutputChange { output } => {
                if let Some(output) = output {
                    self.output = Some(output.clone());
                    reaction.events.push(SessionEvent::OutputReplaced { output });
                }
            }

            ServerMessage::Disconnected {
                connection_id,
                display_name,
            } => {
                self.members.retain(|m| m.connection_id != connection_id);
                reaction.events.push(SessionEvent::PeerLeft {
                    connection_id,
                    display_name,
                });
                reaction.events.push(SessionEvent::MembersChanged {
                    members: self.members.clone(),
                });
            }

            ServerMessage::Error { code, msg } => {
                tracing::warn!("Server reported error {}: {}", code, msg);
                reaction
                    .events
                    .push(SessionEvent::ProtocolError { code, msg });
            }
        }

        reaction
    }
}
