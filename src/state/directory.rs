//! The Directory - central shared state for the server.
//!
//! One Directory instance is created at startup and injected into every
//! connection supervisor. It owns the user and channel registries and the
//! per-connection outbound links, and every mutation of shared state goes
//! through it. Each operation returns a definite success or typed error,
//! never a partial state.
//!
//! Lock discipline: when a user record and a channel record are both
//! needed, the user lock is taken first. Snapshots of member lists are
//! taken before any cross-entity sends, so no entity lock is held while
//! reading other users.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use wren_proto::mode::{ChannelMode, Mode};
use wren_proto::{irc_to_lower, ChannelExt, Command, Message, Prefix};

use crate::config::Config;
use crate::error::{ChannelError, HandlerError};
use crate::state::{Channel, ListEntry, MemberModes, Topic, Uid, UidGenerator, User};
use crate::util::matches_hostmask;

/// This server's identity.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub network: String,
    pub description: String,
    pub created: i64,
}

/// Central shared state container.
pub struct Directory {
    /// All registered users, indexed by uid.
    pub users: DashMap<Uid, Arc<RwLock<User>>>,

    /// All channels, indexed by lowercase name.
    pub channels: DashMap<String, Arc<RwLock<Channel>>>,

    /// Nick (lowercase) to uid index.
    pub nicks: DashMap<String, Uid>,

    /// Per-connection outbound message queues.
    links: DashMap<Uid, mpsc::Sender<Message>>,

    /// This server's identity.
    pub server_info: ServerInfo,

    /// Message of the day lines.
    pub motd: Vec<String>,

    /// Session id generator for new connections.
    pub uid_gen: UidGenerator,
}

/// Result of a successful JOIN.
#[derive(Debug)]
pub struct JoinOutcome {
    /// Canonical channel name.
    pub channel: String,
    /// True when this join created the channel (joiner became operator).
    pub granted_op: bool,
    /// Member uids after the join, the joiner included.
    pub members: Vec<Uid>,
    /// Current topic, shown to the joiner.
    pub topic: Option<Topic>,
}

/// Result of a successful PART.
#[derive(Debug)]
pub struct PartOutcome {
    pub channel: String,
    /// Member uids before the part, the leaver included.
    pub members: Vec<Uid>,
}

/// Result of a successful KICK.
#[derive(Debug)]
pub struct KickOutcome {
    pub channel: String,
    pub target_uid: Uid,
    /// Member uids before the removal, the target included.
    pub members: Vec<Uid>,
}

/// Result of a successful TOPIC change.
#[derive(Debug)]
pub struct TopicOutcome {
    pub channel: String,
    pub members: Vec<Uid>,
}

/// Result of a successful MODE change.
#[derive(Debug)]
pub struct ModeOutcome {
    pub channel: String,
    pub members: Vec<Uid>,
    /// The deltas that were actually applied, for the broadcast echo.
    pub applied: Vec<Mode<ChannelMode>>,
}

/// Result of a successful INVITE.
#[derive(Debug)]
pub struct InviteOutcome {
    pub channel: String,
    pub target_uid: Uid,
}

impl Directory {
    /// Create a new Directory from the server configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            users: DashMap::new(),
            channels: DashMap::new(),
            nicks: DashMap::new(),
            links: DashMap::new(),
            server_info: ServerInfo {
                name: config.server.name.clone(),
                network: config.server.network.clone(),
                description: config.server.description.clone(),
                created: chrono::Utc::now().timestamp(),
            },
            motd: config.motd.lines.clone(),
            uid_gen: UidGenerator::new(),
        }
    }

    // === Links ===

    /// Register a connection's outbound queue for routing.
    pub fn register_link(&self, uid: &str, tx: mpsc::Sender<Message>) {
        self.links.insert(uid.to_string(), tx);
    }

    /// Unregister a connection's outbound queue.
    pub fn unregister_link(&self, uid: &str) {
        self.links.remove(uid);
    }

    /// Queue a message for one connection.
    ///
    /// Non-blocking: a full or closed queue drops the message, so one slow
    /// member can never stall delivery to the others.
    pub fn send_to_user(&self, uid: &str, msg: Message) -> bool {
        let tx = self.links.get(uid).map(|e| e.value().clone());
        match tx {
            Some(tx) => tx.try_send(msg).is_ok(),
            None => false,
        }
    }

    /// Queue a message for each of the given connections.
    pub fn send_to_many(&self, uids: &[Uid], msg: &Message) {
        for uid in uids {
            self.send_to_user(uid, msg.clone());
        }
    }

    // === Users ===

    /// Look up a uid by nickname.
    pub fn resolve_nick(&self, nick: &str) -> Option<Uid> {
        self.nicks.get(&irc_to_lower(nick)).map(|e| e.value().clone())
    }

    /// Returns true if the nick is bound to some other connection.
    pub fn nick_in_use(&self, nick: &str, uid: &str) -> bool {
        self.nicks
            .get(&irc_to_lower(nick))
            .is_some_and(|e| e.value() != uid)
    }

    /// The user record for a uid.
    pub fn user_ref(&self, uid: &str) -> Option<Arc<RwLock<User>>> {
        self.users.get(uid).map(|e| e.value().clone())
    }

    /// Create the Directory entry for a newly registered connection.
    ///
    /// Fails with `NicknameInUse` if the nick was claimed since the NICK
    /// command was accepted.
    pub fn create_user(
        &self,
        uid: &str,
        nick: &str,
        username: &str,
        realname: &str,
        host: &str,
        password: Option<String>,
    ) -> Result<(), HandlerError> {
        let lower = irc_to_lower(nick);
        match self.nicks.entry(lower) {
            Entry::Occupied(e) if e.get() != uid => {
                return Err(HandlerError::NicknameInUse(nick.to_string()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(v) => {
                v.insert(uid.to_string());
            }
        }

        let user = User::new(
            uid.to_string(),
            nick.to_string(),
            username.to_string(),
            realname.to_string(),
            host.to_string(),
            password,
        );
        self.users.insert(uid.to_string(), Arc::new(RwLock::new(user)));
        info!(%uid, %nick, "User registered");
        Ok(())
    }

    /// Atomically rebind a registered user to a new nick.
    ///
    /// Returns the connections to notify (channel peers plus the user),
    /// or `NicknameInUse` without any mutation.
    pub async fn rename_user(&self, uid: &str, new_nick: &str) -> Result<Vec<Uid>, HandlerError> {
        let new_lower = irc_to_lower(new_nick);
        match self.nicks.entry(new_lower.clone()) {
            Entry::Occupied(e) if e.get() != uid => {
                return Err(HandlerError::NicknameInUse(new_nick.to_string()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(v) => {
                v.insert(uid.to_string());
            }
        }

        let Some(user_ref) = self.user_ref(uid) else {
            self.nicks.remove(&new_lower);
            return Err(HandlerError::NotRegistered);
        };

        let (old_lower, channels) = {
            let mut user = user_ref.write().await;
            let old = irc_to_lower(&user.nick);
            user.nick = new_nick.to_string();
            user.touch();
            (old, user.channels.iter().cloned().collect::<Vec<_>>())
        };
        if old_lower != new_lower {
            self.nicks.remove(&old_lower);
        }

        let mut recipients: HashSet<Uid> = HashSet::new();
        recipients.insert(uid.to_string());
        for lower in channels {
            let chan_ref = self.channels.get(&lower).map(|e| e.value().clone());
            if let Some(chan_ref) = chan_ref {
                let chan = chan_ref.read().await;
                recipients.extend(chan.member_uids());
            }
        }
        Ok(recipients.into_iter().collect())
    }

    /// Set or clear a user's away message. Returns the new away state.
    pub async fn set_away(&self, uid: &str, message: Option<String>) -> Option<bool> {
        let user_ref = self.user_ref(uid)?;
        let mut user = user_ref.write().await;
        user.away = message;
        user.touch();
        Some(user.is_away())
    }

    // === Channels ===

    /// Join a channel, creating it if needed.
    ///
    /// Gate checks run in precedence order: bad key, member limit, ban
    /// mask, invite-only. A fresh channel applies no gates and makes the
    /// joiner its operator.
    pub async fn join_channel(
        &self,
        uid: &str,
        name: &str,
        key: Option<&str>,
    ) -> Result<JoinOutcome, ChannelError> {
        if !name.is_channel_name() {
            return Err(ChannelError::NoSuchChannel);
        }
        let Some(user_ref) = self.user_ref(uid) else {
            return Err(ChannelError::NoLogin);
        };
        let lower = irc_to_lower(name);

        // User lock before channel lock.
        let mut user = user_ref.write().await;

        loop {
            let existing = self.channels.get(&lower).map(|e| e.value().clone());
            if let Some(chan_ref) = existing {
                let mut chan = chan_ref.write().await;

                if let Some(expected) = &chan.modes.key {
                    if key != Some(expected.as_str()) {
                        return Err(ChannelError::BadChannelKey);
                    }
                }
                if let Some(limit) = chan.modes.limit {
                    if !chan.is_member(uid) && chan.members.len() as u32 >= limit {
                        return Err(ChannelError::ChannelIsFull);
                    }
                }
                let mask = user.mask();
                if chan.bans.iter().any(|b| matches_hostmask(&b.mask, &mask)) {
                    return Err(ChannelError::BannedFromChan);
                }
                let nick_lower = irc_to_lower(&user.nick);
                if chan.modes.invite_only && !chan.invites.contains(&nick_lower) {
                    return Err(ChannelError::InviteOnlyChan);
                }
                if chan.is_member(uid) {
                    return Err(ChannelError::AlreadyMember);
                }

                chan.invites.remove(&nick_lower);
                chan.add_member(uid.to_string(), MemberModes::default());
                user.channels.insert(lower.clone());
                return Ok(JoinOutcome {
                    channel: chan.name.clone(),
                    granted_op: false,
                    members: chan.member_uids(),
                    topic: chan.topic.clone(),
                });
            }

            // Fresh channel: the creator becomes operator.
            let mut chan = Channel::new(name.to_string());
            chan.add_member(uid.to_string(), MemberModes { op: true, voice: false });
            match self.channels.entry(lower.clone()) {
                Entry::Vacant(v) => {
                    v.insert(Arc::new(RwLock::new(chan)));
                    user.channels.insert(lower.clone());
                    debug!(channel = %name, %uid, "Channel created");
                    return Ok(JoinOutcome {
                        channel: name.to_string(),
                        granted_op: true,
                        members: vec![uid.to_string()],
                        topic: None,
                    });
                }
                // Lost a creation race; retry against the existing channel.
                Entry::Occupied(_) => continue,
            }
        }
    }

    /// Leave a channel. Deletes the channel once its last member is gone.
    pub async fn part_channel(&self, uid: &str, name: &str) -> Result<PartOutcome, ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let Some(user_ref) = self.user_ref(uid) else {
            return Err(ChannelError::NoLogin);
        };

        let mut user = user_ref.write().await;
        let mut chan = chan_ref.write().await;

        if !chan.is_member(uid) {
            return Err(ChannelError::NoLogin);
        }

        let members = chan.member_uids();
        chan.remove_member(uid);
        user.channels.remove(&lower);
        let canonical = chan.name.clone();
        let empty = chan.members.is_empty();
        drop(chan);
        drop(user);

        if empty {
            self.channels.remove(&lower);
            debug!(channel = %canonical, "Channel removed (empty)");
        }

        Ok(PartOutcome {
            channel: canonical,
            members,
        })
    }

    /// Kick a member from a channel. The issuer must hold operator role.
    pub async fn kick_member(
        &self,
        issuer_uid: &str,
        name: &str,
        target_nick: &str,
    ) -> Result<KickOutcome, ChannelError> {
        let lower = irc_to_lower(name);
        // Without the channel the issuer cannot hold operator role on it;
        // the privilege error takes precedence per the command table.
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::ChanOpPrivsNeeded);
        };
        let Some(target_uid) = self.resolve_nick(target_nick) else {
            // Op check still comes first.
            let chan = chan_ref.read().await;
            if !chan.is_op(issuer_uid) {
                return Err(ChannelError::ChanOpPrivsNeeded);
            }
            return Err(ChannelError::NoLogin);
        };
        let target_ref = self.user_ref(&target_uid);

        let mut target_user = match &target_ref {
            Some(r) => Some(r.write().await),
            None => None,
        };
        let mut chan = chan_ref.write().await;

        if !chan.is_op(issuer_uid) {
            return Err(ChannelError::ChanOpPrivsNeeded);
        }
        if !chan.is_member(&target_uid) {
            return Err(ChannelError::NoLogin);
        }

        let members = chan.member_uids();
        chan.remove_member(&target_uid);
        if let Some(user) = target_user.as_mut() {
            user.channels.remove(&lower);
        }
        let canonical = chan.name.clone();
        let empty = chan.members.is_empty();
        drop(chan);
        drop(target_user);

        if empty {
            self.channels.remove(&lower);
            debug!(channel = %canonical, "Channel removed (empty)");
        }

        Ok(KickOutcome {
            channel: canonical,
            target_uid,
            members,
        })
    }

    /// Read a channel's topic. `Ok(None)` means the channel has no topic.
    pub async fn get_topic(&self, name: &str) -> Result<(String, Option<Topic>), ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let chan = chan_ref.read().await;
        Ok((chan.name.clone(), chan.topic.clone()))
    }

    /// Set or clear a channel's topic. On a topic-protected channel the
    /// issuer must hold operator role.
    pub async fn set_topic(
        &self,
        uid: &str,
        name: &str,
        text: &str,
        set_by: &str,
    ) -> Result<TopicOutcome, ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let mut chan = chan_ref.write().await;

        if !chan.is_member(uid) {
            return Err(ChannelError::NotOnChannel);
        }
        if chan.modes.topic_lock && !chan.is_op(uid) {
            return Err(ChannelError::ChanOpPrivsNeeded);
        }

        chan.topic = if text.is_empty() {
            None
        } else {
            Some(Topic {
                text: text.to_string(),
                set_by: set_by.to_string(),
                set_at: chrono::Utc::now().timestamp(),
            })
        };

        Ok(TopicOutcome {
            channel: chan.name.clone(),
            members: chan.member_uids(),
        })
    }

    /// Current channel modes for RPL_CHANNELMODEIS.
    pub async fn get_channel_modes(
        &self,
        name: &str,
    ) -> Result<(String, String, Vec<String>), ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let chan = chan_ref.read().await;
        Ok((
            chan.name.clone(),
            chan.modes.as_mode_string(),
            chan.modes.mode_args(),
        ))
    }

    /// The ban list for a `MODE #chan +b` query.
    pub async fn list_bans(&self, name: &str) -> Result<(String, Vec<ListEntry>), ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let chan = chan_ref.read().await;
        Ok((chan.name.clone(), chan.bans.clone()))
    }

    /// Apply a parsed mode delta to a channel. All deltas are validated
    /// before any is applied, so a rejected change mutates nothing.
    pub async fn apply_channel_modes(
        &self,
        issuer_uid: &str,
        name: &str,
        modes: &[Mode<ChannelMode>],
        set_by: &str,
    ) -> Result<ModeOutcome, ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let mut chan = chan_ref.write().await;

        if !chan.is_op(issuer_uid) {
            return Err(ChannelError::ChanOpPrivsNeeded);
        }

        // Validation pass.
        for m in modes {
            match m.mode() {
                ChannelMode::Unknown(c) => return Err(ChannelError::UnknownMode(*c)),
                ChannelMode::Oper | ChannelMode::Voice => {
                    let nick = m.arg().unwrap_or_default();
                    let target_uid = self
                        .resolve_nick(nick)
                        .ok_or_else(|| ChannelError::UserNotInChannel(nick.to_string()))?;
                    if !chan.is_member(&target_uid) {
                        return Err(ChannelError::UserNotInChannel(nick.to_string()));
                    }
                }
                _ => {}
            }
        }

        // Application pass.
        let mut applied = Vec::new();
        for m in modes {
            let plus = m.is_plus();
            match m.mode() {
                ChannelMode::InviteOnly => chan.modes.invite_only = plus,
                ChannelMode::Moderated => chan.modes.moderated = plus,
                ChannelMode::Secret => chan.modes.secret = plus,
                ChannelMode::ProtectedTopic => chan.modes.topic_lock = plus,
                ChannelMode::Key => {
                    chan.modes.key = if plus { m.arg().map(String::from) } else { None };
                }
                ChannelMode::Limit => {
                    if plus {
                        // A malformed limit leaves the channel unchanged.
                        match m.arg().unwrap_or_default().parse::<u32>() {
                            Ok(n) => chan.modes.limit = Some(n),
                            Err(_) => continue,
                        }
                    } else {
                        chan.modes.limit = None;
                    }
                }
                ChannelMode::Ban => match m.arg() {
                    Some(mask) if plus => {
                        if !chan.bans.iter().any(|b| b.mask == mask) {
                            chan.bans.push(ListEntry {
                                mask: mask.to_string(),
                                set_by: set_by.to_string(),
                                set_at: chrono::Utc::now().timestamp(),
                            });
                        }
                    }
                    Some(mask) => chan.bans.retain(|b| b.mask != mask),
                    // Bare +b is a list query, handled by the caller.
                    None => continue,
                },
                ChannelMode::Oper | ChannelMode::Voice => {
                    let nick = m.arg().unwrap_or_default();
                    if let Some(target_uid) = self.resolve_nick(nick) {
                        if let Some(member) = chan.members.get_mut(&target_uid) {
                            match m.mode() {
                                ChannelMode::Oper => member.op = plus,
                                ChannelMode::Voice => member.voice = plus,
                                _ => unreachable!(),
                            }
                        }
                    }
                }
                ChannelMode::Unknown(_) => unreachable!("rejected during validation"),
            }
            applied.push(m.clone());
        }

        Ok(ModeOutcome {
            channel: chan.name.clone(),
            members: chan.member_uids(),
            applied,
        })
    }

    /// Record an invite so the target may pass a `+i` gate.
    pub async fn invite(
        &self,
        issuer_uid: &str,
        target_nick: &str,
        name: &str,
    ) -> Result<InviteOutcome, ChannelError> {
        let Some(target_uid) = self.resolve_nick(target_nick) else {
            return Err(ChannelError::NoSuchNick(target_nick.to_string()));
        };
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };
        let mut chan = chan_ref.write().await;

        if !chan.is_member(issuer_uid) {
            return Err(ChannelError::NotOnChannel);
        }
        if chan.modes.invite_only && !chan.is_op(issuer_uid) {
            return Err(ChannelError::ChanOpPrivsNeeded);
        }
        if chan.is_member(&target_uid) {
            return Err(ChannelError::UserOnChannel(target_nick.to_string()));
        }

        chan.invites.insert(irc_to_lower(target_nick));
        Ok(InviteOutcome {
            channel: chan.name.clone(),
            target_uid,
        })
    }

    /// Recipients for a channel message from `sender_uid`: every member
    /// except the sender and members marked away.
    pub async fn channel_recipients(
        &self,
        sender_uid: &str,
        name: &str,
    ) -> Result<(String, Vec<Uid>), ChannelError> {
        let lower = irc_to_lower(name);
        let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
            return Err(ChannelError::NoSuchChannel);
        };

        let (canonical, members) = {
            let chan = chan_ref.read().await;
            if chan.modes.moderated && !chan.can_speak(sender_uid) {
                return Err(ChannelError::CannotSendToChan('m'));
            }
            (chan.name.clone(), chan.member_uids())
        };

        let mut recipients = Vec::new();
        for uid in members {
            if uid == sender_uid {
                continue;
            }
            if let Some(user_ref) = self.user_ref(&uid) {
                if !user_ref.read().await.is_away() {
                    recipients.push(uid);
                }
            }
        }
        Ok((canonical, recipients))
    }

    /// Decorated member nicks for NAMES: `@` for operators, `+` for voice.
    pub async fn names_of(&self, name: &str) -> Option<(String, Vec<String>)> {
        let lower = irc_to_lower(name);
        let chan_ref = self.channels.get(&lower).map(|e| e.value().clone())?;
        let (canonical, members) = {
            let chan = chan_ref.read().await;
            let members: Vec<(Uid, MemberModes)> =
                chan.members.iter().map(|(u, m)| (u.clone(), *m)).collect();
            (chan.name.clone(), members)
        };

        let mut names = Vec::new();
        for (uid, modes) in members {
            if let Some(user_ref) = self.user_ref(&uid) {
                let nick = user_ref.read().await.nick.clone();
                names.push(match modes.prefix_char() {
                    Some(prefix) => format!("{}{}", prefix, nick),
                    None => nick,
                });
            }
        }
        names.sort();
        Some((canonical, names))
    }

    /// Visible channels for LIST: name, member count, topic text.
    pub async fn list_channels(&self) -> Vec<(String, usize, String)> {
        let refs: Vec<Arc<RwLock<Channel>>> =
            self.channels.iter().map(|e| e.value().clone()).collect();

        let mut out = Vec::new();
        for chan_ref in refs {
            let chan = chan_ref.read().await;
            if chan.modes.secret {
                continue;
            }
            let topic = chan
                .topic
                .as_ref()
                .map(|t| t.text.clone())
                .unwrap_or_default();
            out.push((chan.name.clone(), chan.members.len(), topic));
        }
        out.sort();
        out
    }

    /// Channels of one user, decorated with the user's role for WHOIS.
    pub async fn channels_of_user(&self, uid: &str) -> Vec<String> {
        let Some(user_ref) = self.user_ref(uid) else {
            return vec![];
        };
        let channels: Vec<String> = {
            let user = user_ref.read().await;
            user.channels.iter().cloned().collect()
        };

        let mut out = Vec::new();
        for lower in channels {
            let chan_ref = self.channels.get(&lower).map(|e| e.value().clone());
            if let Some(chan_ref) = chan_ref {
                let chan = chan_ref.read().await;
                let decorated = match chan.members.get(uid).and_then(|m| m.prefix_char()) {
                    Some(prefix) => format!("{}{}", prefix, chan.name),
                    None => chan.name.clone(),
                };
                out.push(decorated);
            }
        }
        out.sort();
        out
    }

    /// Remove a user entirely: leave every channel (broadcasting QUIT to
    /// the remaining members), free the nick, drop the link.
    ///
    /// This is the shared cleanup path for QUIT, transport errors, and
    /// liveness reaping.
    pub async fn quit_user(&self, uid: &str, reason: &str) {
        let Some(user_ref) = self.user_ref(uid) else {
            self.unregister_link(uid);
            return;
        };

        let (nick, mask, channels) = {
            let mut user = user_ref.write().await;
            let channels = std::mem::take(&mut user.channels);
            (user.nick.clone(), user.mask(), channels)
        };

        let quit_msg = Message {
            prefix: Some(Prefix::parse(&mask)),
            command: Command::QUIT(Some(reason.to_string())),
        };

        for lower in channels {
            let Some(chan_ref) = self.channels.get(&lower).map(|e| e.value().clone()) else {
                continue;
            };
            let (members, empty, canonical) = {
                let mut chan = chan_ref.write().await;
                chan.remove_member(uid);
                (chan.member_uids(), chan.members.is_empty(), chan.name.clone())
            };
            if empty {
                self.channels.remove(&lower);
                debug!(channel = %canonical, "Channel removed (empty)");
            } else {
                self.send_to_many(&members, &quit_msg);
            }
        }

        self.nicks.remove(&irc_to_lower(&nick));
        self.users.remove(uid);
        self.unregister_link(uid);
        info!(%uid, %nick, %reason, "User removed");
    }
}
