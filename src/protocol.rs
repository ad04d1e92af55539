use crate::types::*;
use serde::{Deserialize, Serialize};

/// Protocol version announced in the welcome message
pub const PROTOCOL_VERSION: &str = "1.0";

/// Messages a client sends over the room channel.
///
/// Missing fields are not rejected: an absent room token becomes the empty
/// token, absent names and contents travel on as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join {
        #[serde(default)]
        room_id: RoomId,
        display_name: Option<String>,
    },
    /// Local edit, relayed to the rest of the room
    CodeChange {
        #[serde(default)]
        room_id: RoomId,
        content: Option<String>,
    },
    /// Targeted re-sync: deliver `content` to one connection only
    SyncCode {
        #[serde(default)]
        target_connection_id: ConnectionId,
        content: Option<String>,
    },
    /// Latest execution output, relayed to the rest of the room
    OutputChange {
        #[serde(default)]
        room_id: RoomId,
        output: Option<String>,
    },
    /// Graceful leave; the server closes the channel afterwards
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// First message on every channel, tells the client its own id
    Welcome {
        protocol: String,
        connection_id: ConnectionId,
        server_now: String,
    },
    /// Sent to every member (including the joiner) after a join
    Joined {
        members: Vec<Member>,
        display_name: Option<String>,
        connection_id: ConnectionId,
    },
    /// Document content, either relayed from a peer edit or a targeted sync
    CodeChange {
        content: Option<String>,
    },
    OutputChange {
        output: Option<String>,
    },
    /// A member's channel closed
    Disconnected {
        connection_id: ConnectionId,
        display_name: Option<String>,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn welcome(connection_id: impl Into<ConnectionId>) -> Self {
        ServerMessage::Welcome {
            protocol: PROTOCOL_VERSION.to_string(),
            connection_id: connection_id.into(),
            server_now: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"join","room_id":"r1","display_name":"Alice"}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                room_id: "r1".to_string(),
                display_name: Some("Alice".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_fields_become_absent_values() {
        let msg: ClientMessage = serde_json::from_str(r#"{"t":"join"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                room_id: String::new(),
                display_name: None,
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"sync-code"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SyncCode {
                target_connection_id: String::new(),
                content: None,
            }
        );
    }

    #[test]
    fn test_kebab_case_event_names() {
        let json = serde_json::to_value(ServerMessage::CodeChange {
            content: Some("print(1)".to_string()),
        })
        .unwrap();
        assert_eq!(json["t"], "code-change");
        assert_eq!(json["content"], "print(1)");

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"leave"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Leave);
    }

    #[test]
    fn test_joined_carries_members() {
        let msg = ServerMessage::Joined {
            members: vec![Member::new("A", Some("Alice".to_string())), Member::new("B", None)],
            display_name: None,
            connection_id: "B".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "joined");
        assert_eq!(json["members"][0]["connection_id"], "A");
        assert_eq!(json["members"][1]["display_name"], serde_json::Value::Null);
        assert_eq!(json["display_name"], serde_json::Value::Null);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"t":"rename"}"#).is_err());
    }
}
