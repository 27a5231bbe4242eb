//! Unified error handling for wrend.
//!
//! Handler and channel errors each know how to render themselves as the
//! matching numeric reply, so every rejected command produces exactly one
//! reply line addressed to the offending connection.

use thiserror::Error;
use tokio::sync::mpsc;
use wren_proto::{Command, Message, Prefix, Response};

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not enough parameters for {0}")]
    NeedMoreParams(String),

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("no such nick")]
    NoSuchNick(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("not registered")]
    NotRegistered,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("send error: {0}")]
    Send(#[from] mpsc::error::SendError<Message>),

    #[error("client quit: {0:?}")]
    Quit(Option<String>),
}

impl HandlerError {
    /// Convert to an IRC error reply.
    ///
    /// Returns `None` for errors that end the connection instead of
    /// producing a client-visible reply.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str) -> Option<Message> {
        let (response, params) = match self {
            Self::NeedMoreParams(cmd) => (
                Response::ERR_NEEDMOREPARAMS,
                vec![
                    nick.to_string(),
                    cmd.clone(),
                    "Not enough parameters".to_string(),
                ],
            ),
            Self::NoNicknameGiven => (
                Response::ERR_NONICKNAMEGIVEN,
                vec![nick.to_string(), "No nickname given".to_string()],
            ),
            Self::NoSuchNick(target) => (
                Response::ERR_NOSUCHNICK,
                vec![
                    nick.to_string(),
                    target.clone(),
                    "No such nick/channel".to_string(),
                ],
            ),
            Self::ErroneousNickname(bad) => (
                Response::ERR_ERRONEOUSNICKNAME,
                vec![
                    nick.to_string(),
                    bad.clone(),
                    "Erroneous nickname".to_string(),
                ],
            ),
            Self::NicknameInUse(bad) => (
                Response::ERR_NICKNAMEINUSE,
                vec![
                    nick.to_string(),
                    bad.clone(),
                    "Nickname is already in use".to_string(),
                ],
            ),
            Self::NotRegistered => (
                Response::ERR_NOTREGISTERED,
                vec![nick.to_string(), "You have not registered".to_string()],
            ),
            Self::AlreadyRegistered => (
                Response::ERR_ALREADYREGISTRED,
                vec![nick.to_string(), "You may not reregister".to_string()],
            ),

            Self::Send(_) | Self::Quit(_) => return None,
        };

        Some(Message {
            prefix: Some(Prefix::ServerName(server_name.to_string())),
            command: Command::Response(response, params),
        })
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Channel operation errors returned by the Directory.
///
/// Each maps to the RFC numeric the command table prescribes; the
/// precedence between them is fixed by the order the Directory runs its
/// checks in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("no such channel")]
    NoSuchChannel,

    #[error("user not logged in")]
    NoLogin,

    #[error("not on channel")]
    NotOnChannel,

    #[error("you're not channel operator")]
    ChanOpPrivsNeeded,

    #[error("user {0} is not on that channel")]
    UserNotInChannel(String),

    #[error("user {0} is already on that channel")]
    UserOnChannel(String),

    #[error("no such nick {0}")]
    NoSuchNick(String),

    #[error("cannot join channel (+b)")]
    BannedFromChan,

    #[error("cannot join channel (+i)")]
    InviteOnlyChan,

    #[error("cannot join channel (+l)")]
    ChannelIsFull,

    #[error("cannot join channel (+k)")]
    BadChannelKey,

    #[error("already a member")]
    AlreadyMember,

    #[error("cannot send to channel (+{0})")]
    CannotSendToChan(char),

    #[error("unknown mode character {0}")]
    UnknownMode(char),
}

impl ChannelError {
    /// Convert to an IRC error reply.
    ///
    /// `AlreadyMember` yields `None`: a redundant JOIN is dropped without
    /// comment.
    pub fn to_irc_reply(&self, server_name: &str, nick: &str, channel: &str) -> Option<Message> {
        let (response, params) = match self {
            Self::NoSuchChannel => (
                Response::ERR_NOSUCHCHANNEL,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "No such channel".to_string(),
                ],
            ),
            Self::NoLogin => (
                Response::ERR_NOLOGIN,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "User not logged in".to_string(),
                ],
            ),
            Self::NotOnChannel => (
                Response::ERR_NOTONCHANNEL,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "You're not on that channel".to_string(),
                ],
            ),
            Self::ChanOpPrivsNeeded => (
                Response::ERR_CHANOPRIVSNEEDED,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "You're not channel operator".to_string(),
                ],
            ),
            Self::UserNotInChannel(target) => (
                Response::ERR_USERNOTINCHANNEL,
                vec![
                    nick.to_string(),
                    target.clone(),
                    channel.to_string(),
                    "They aren't on that channel".to_string(),
                ],
            ),
            Self::UserOnChannel(target) => (
                Response::ERR_USERONCHANNEL,
                vec![
                    nick.to_string(),
                    target.clone(),
                    channel.to_string(),
                    "is already on channel".to_string(),
                ],
            ),
            Self::NoSuchNick(target) => (
                Response::ERR_NOSUCHNICK,
                vec![
                    nick.to_string(),
                    target.clone(),
                    "No such nick/channel".to_string(),
                ],
            ),
            Self::BannedFromChan => (
                Response::ERR_BANNEDFROMCHAN,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "Cannot join channel (+b)".to_string(),
                ],
            ),
            Self::InviteOnlyChan => (
                Response::ERR_INVITEONLYCHAN,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "Cannot join channel (+i)".to_string(),
                ],
            ),
            Self::ChannelIsFull => (
                Response::ERR_CHANNELISFULL,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "Cannot join channel (+l)".to_string(),
                ],
            ),
            Self::BadChannelKey => (
                Response::ERR_BADCHANNELKEY,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    "Cannot join channel (+k)".to_string(),
                ],
            ),
            Self::CannotSendToChan(flag) => (
                Response::ERR_CANNOTSENDTOCHAN,
                vec![
                    nick.to_string(),
                    channel.to_string(),
                    format!("Cannot send to channel (+{})", flag),
                ],
            ),
            Self::UnknownMode(flag) => (
                Response::ERR_UNKNOWNMODE,
                vec![
                    nick.to_string(),
                    flag.to_string(),
                    "is unknown mode char to me".to_string(),
                ],
            ),

            Self::AlreadyMember => return None,
        };

        Some(Message {
            prefix: Some(Prefix::ServerName(server_name.to_string())),
            command: Command::Response(response, params),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_renders_numeric() {
        let reply = HandlerError::NicknameInUse("alice".into())
            .to_irc_reply("irc.wren.local", "*")
            .unwrap();
        assert_eq!(reply.response(), Some(Response::ERR_NICKNAMEINUSE));
        assert!(reply.to_string().contains("Nickname is already in use"));
    }

    #[test]
    fn quit_has_no_reply() {
        assert!(HandlerError::Quit(None)
            .to_irc_reply("irc.wren.local", "alice")
            .is_none());
    }

    #[test]
    fn channel_error_renders_numeric() {
        let reply = ChannelError::ChanOpPrivsNeeded
            .to_irc_reply("irc.wren.local", "alice", "#test")
            .unwrap();
        assert_eq!(reply.response(), Some(Response::ERR_CHANOPRIVSNEEDED));
    }

    #[test]
    fn redundant_join_is_silent() {
        assert!(ChannelError::AlreadyMember
            .to_irc_reply("irc.wren.local", "alice", "#test")
            .is_none());
    }
}
