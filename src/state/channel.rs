//! Channel records.

use std::collections::{HashMap, HashSet};

use crate::state::Uid;

/// An IRC channel.
#[derive(Debug)]
pub struct Channel {
    pub name: String,
    pub topic: Option<Topic>,
    pub created: i64,
    /// Members: uid -> membership flags.
    pub members: HashMap<Uid, MemberModes>,
    /// Channel modes.
    pub modes: ChannelModes,
    /// Ban list (+b), checked at join time only.
    pub bans: Vec<ListEntry>,
    /// Nicks (lowercase) holding a standing invite.
    pub invites: HashSet<String>,
}

/// Channel modes.
#[derive(Debug, Default, Clone)]
pub struct ChannelModes {
    pub invite_only: bool,    // +i
    pub moderated: bool,      // +m
    pub secret: bool,         // +s
    pub topic_lock: bool,     // +t
    pub key: Option<String>,  // +k
    pub limit: Option<u32>,   // +l
}

impl ChannelModes {
    /// The flag string for RPL_CHANNELMODEIS, e.g. "+tkl".
    pub fn as_mode_string(&self) -> String {
        let mut s = String::from("+");
        if self.invite_only {
            s.push('i');
        }
        if self.moderated {
            s.push('m');
        }
        if self.secret {
            s.push('s');
        }
        if self.topic_lock {
            s.push('t');
        }
        if self.key.is_some() {
            s.push('k');
        }
        if self.limit.is_some() {
            s.push('l');
        }
        s
    }

    /// Arguments accompanying the flag string, in flag order.
    pub fn mode_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(key) = &self.key {
            args.push(key.clone());
        }
        if let Some(limit) = self.limit {
            args.push(limit.to_string());
        }
        args
    }
}

/// An entry in the ban list.
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub mask: String,
    pub set_by: String,
    pub set_at: i64,
}

/// Channel topic with metadata.
#[derive(Debug, Clone)]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    pub set_at: i64,
}

/// Per-member channel flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemberModes {
    pub op: bool,    // +o
    pub voice: bool, // +v
}

impl MemberModes {
    /// Highest prefix character for NAMES/WHOIS decoration.
    pub fn prefix_char(&self) -> Option<char> {
        if self.op {
            Some('@')
        } else if self.voice {
            Some('+')
        } else {
            None
        }
    }
}

impl Channel {
    pub fn new(name: String) -> Self {
        Self {
            name,
            topic: None,
            created: chrono::Utc::now().timestamp(),
            members: HashMap::new(),
            modes: ChannelModes::default(),
            bans: Vec::new(),
            invites: HashSet::new(),
        }
    }

    pub fn add_member(&mut self, uid: Uid, modes: MemberModes) {
        self.members.insert(uid, modes);
    }

    pub fn remove_member(&mut self, uid: &str) -> bool {
        self.members.remove(uid).is_some()
    }

    pub fn is_member(&self, uid: &str) -> bool {
        self.members.contains_key(uid)
    }

    pub fn is_op(&self, uid: &str) -> bool {
        self.members.get(uid).is_some_and(|m| m.op)
    }

    /// Voice or better, for moderated channels.
    pub fn can_speak(&self, uid: &str) -> bool {
        self.members.get(uid).is_some_and(|m| m.op || m.voice)
    }

    pub fn member_uids(&self) -> Vec<Uid> {
        self.members.keys().cloned().collect()
    }
}
