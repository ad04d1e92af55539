use crate::protocol::ServerMessage;
use crate::state::hub::Hub;

impl Hub {
    /// Queue `msg` for every current member of a room, optionally skipping
    /// one connection (the sender). Best effort: a member whose socket task
    /// already stopped is logged and skipped.
    ///
    /// Returns how many members the message was queued for.
    pub fn broadcast_to_room(
        &self,
        room_id: &str,
        except: Option<&str>,
        msg: &ServerMessage,
    ) -> usize {
        let mut delivered = 0;
        for member in self.groups.members_of(room_id) {
            if except == Some(member.as_str()) {
                continue;
            }
            if self.send_to(&member, msg.clone()) {
                delivered += 1;
            } else {
                tracing::warn!("Dropped broadcast to {} in room {}", member, room_id);
            }
        }
        delivered
    }
}
