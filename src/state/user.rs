//! Connected user records.

use std::collections::HashSet;

use crate::state::Uid;

/// A registered user.
#[derive(Debug)]
pub struct User {
    pub uid: Uid,
    pub nick: String,
    pub user: String,
    pub realname: String,
    /// Host as seen by the server (the peer address).
    pub host: String,
    /// Connection password from PASS, if any was sent.
    pub password: Option<String>,
    /// Away message when the user is marked away.
    pub away: Option<String>,
    /// Channels this user is in (lowercase names).
    pub channels: HashSet<String>,
    /// Unix timestamp of registration.
    pub created: i64,
    /// Unix timestamp of the last command from this user.
    pub last_action: i64,
}

impl User {
    pub fn new(
        uid: Uid,
        nick: String,
        user: String,
        realname: String,
        host: String,
        password: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            uid,
            nick,
            user,
            realname,
            host,
            password,
            away: None,
            channels: HashSet::new(),
            created: now,
            last_action: now,
        }
    }

    /// The `nick!user@host` mask used as this user's message prefix and
    /// matched against ban masks.
    pub fn mask(&self) -> String {
        format!("{}!{}@{}", self.nick, self.user, self.host)
    }

    pub fn is_away(&self) -> bool {
        self.away.is_some()
    }

    pub fn touch(&mut self) {
        self.last_action = chrono::Utc::now().timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_full_hostmask() {
        let user = User::new(
            "w000001".into(),
            "alice".into(),
            "alice".into(),
            "Alice A".into(),
            "127.0.0.1".into(),
            None,
        );
        assert_eq!(user.mask(), "alice!alice@127.0.0.1");
        assert!(!user.is_away());
    }
}
