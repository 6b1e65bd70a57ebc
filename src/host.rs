//! Seam to the game server hosting the guard.

use crate::cache::Identity;

/// Operations the guard asks of the host server.
///
/// The host owns sessions and ban enforcement; the guard only tells it what
/// to do. Implementations must be callable from any worker thread.
pub trait HostRuntime: Send + Sync {
    /// Disconnect a connected player with a user-facing reason.
    fn force_disconnect(&self, identity: &Identity, reason: &str);

    /// Ban a literal network address.
    fn ban_address(&self, address: &str);

    /// Resolve an online player's name to their identity.
    fn find_player(&self, name: &str) -> Option<Identity>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Host double that records every call.
    #[derive(Default)]
    pub struct RecordingHost {
        pub disconnects: Mutex<Vec<(Identity, String)>>,
        pub bans: Mutex<Vec<String>>,
        pub players: Mutex<HashMap<String, Identity>>,
    }

    impl RecordingHost {
        pub fn with_player(self, name: &str, identity: Identity) -> Self {
            self.players
                .lock()
                .unwrap()
                .insert(name.to_lowercase(), identity);
            self
        }

        pub fn disconnects(&self) -> Vec<(Identity, String)> {
            self.disconnects.lock().unwrap().clone()
        }

        pub fn bans(&self) -> Vec<String> {
            self.bans.lock().unwrap().clone()
        }
    }

    impl HostRuntime for RecordingHost {
        fn force_disconnect(&self, identity: &Identity, reason: &str) {
            self.disconnects
                .lock()
                .unwrap()
                .push((*identity, reason.to_string()));
        }

        fn ban_address(&self, address: &str) {
            self.bans.lock().unwrap().push(address.to_string());
        }

        fn find_player(&self, name: &str) -> Option<Identity> {
            self.players.lock().unwrap().get(&name.to_lowercase()).copied()
        }
    }
}
