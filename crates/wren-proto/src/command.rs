//! Typed IRC commands.
//!
//! `Command::new` turns a command word plus positional parameters into a
//! typed value (or a parse error naming the command), so handlers never
//! index into raw parameter arrays.

use crate::chan::ChannelExt;
use crate::error::MessageParseError;
use crate::mode::{format_modes, ChannelMode, Mode, UserMode};
use crate::response::Response;

/// An IRC command with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    // === Connection registration ===
    /// `PASS password`
    PASS(String),
    /// `NICK nickname` (empty when the client sent none)
    NICK(String),
    /// `USER username mode realname`
    USER(String, String, String),
    /// `QUIT [message]`
    QUIT(Option<String>),

    // === Channel operations ===
    /// `JOIN channels [keys]`
    JOIN(String, Option<String>),
    /// `PART channels [message]`
    PART(String, Option<String>),
    /// Channel MODE: `MODE channel [modes]`
    ChannelMODE(String, Vec<Mode<ChannelMode>>),
    /// User MODE: `MODE nickname [modes]`
    UserMODE(String, Vec<Mode<UserMode>>),
    /// `TOPIC channel [topic]`
    TOPIC(String, Option<String>),
    /// `NAMES [channel]`
    NAMES(Option<String>),
    /// `LIST [channels]`
    LIST(Option<String>),
    /// `INVITE nickname channel`
    INVITE(String, String),
    /// `KICK channel user [comment]`
    KICK(String, String, Option<String>),

    // === Messaging ===
    /// `PRIVMSG target text`
    PRIVMSG(String, String),
    /// `NOTICE target text`
    NOTICE(String, String),

    // === Queries ===
    /// `WHO [mask]`
    WHO(Option<String>),
    /// `WHOIS nickname` (empty when the client sent none)
    WHOIS(String),
    /// `MOTD [target]`
    MOTD(Option<String>),

    // === Miscellaneous ===
    /// `AWAY [message]`
    AWAY(Option<String>),
    /// `PING server1 [server2]`
    PING(String, Option<String>),
    /// `PONG server1 [server2]`
    PONG(String, Option<String>),
    /// `ERROR message`
    ERROR(String),

    /// A numeric reply.
    Response(Response, Vec<String>),
    /// Anything not recognized above.
    Raw(String, Vec<String>),
}

fn opt(args: &[&str], index: usize) -> Option<String> {
    args.get(index).map(|s| s.to_string())
}

fn req(
    command: &str,
    args: &[&str],
    index: usize,
) -> Result<String, MessageParseError> {
    args.get(index)
        .map(|s| s.to_string())
        .ok_or_else(|| MessageParseError::MissingParams {
            command: command.to_string(),
        })
}

impl Command {
    /// Construct a typed command from a command word and parameters.
    pub fn new(cmd: &str, args: Vec<&str>) -> Result<Command, MessageParseError> {
        if cmd.is_empty() {
            return Err(MessageParseError::InvalidCommand);
        }

        // Numeric replies parse into their Response form.
        if cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit()) {
            let code: u16 = cmd.parse().map_err(|_| MessageParseError::InvalidCommand)?;
            return Ok(match Response::from_code(code) {
                Some(resp) => {
                    Command::Response(resp, args.iter().map(|s| s.to_string()).collect())
                }
                None => Command::Raw(
                    cmd.to_string(),
                    args.iter().map(|s| s.to_string()).collect(),
                ),
            });
        }

        let upper = cmd.to_ascii_uppercase();
        let command = match upper.as_str() {
            "PASS" => Command::PASS(req(&upper, &args, 0)?),
            "NICK" => Command::NICK(opt(&args, 0).unwrap_or_default()),
            "USER" => {
                if args.len() < 4 {
                    return Err(MessageParseError::MissingParams { command: upper });
                }
                Command::USER(
                    args[0].to_string(),
                    args[1].to_string(),
                    args[3].to_string(),
                )
            }
            "QUIT" => Command::QUIT(opt(&args, 0)),
            "JOIN" => Command::JOIN(req(&upper, &args, 0)?, opt(&args, 1)),
            "PART" => Command::PART(req(&upper, &args, 0)?, opt(&args, 1)),
            "MODE" => {
                let target = req(&upper, &args, 0)?;
                if target.is_channel_name() {
                    Command::ChannelMODE(target, Mode::as_channel_modes(&args[1..])?)
                } else {
                    Command::UserMODE(target, Mode::as_user_modes(&args[1..])?)
                }
            }
            "TOPIC" => Command::TOPIC(req(&upper, &args, 0)?, opt(&args, 1)),
            "NAMES" => Command::NAMES(opt(&args, 0)),
            "LIST" => Command::LIST(opt(&args, 0)),
            "INVITE" => Command::INVITE(req(&upper, &args, 0)?, req(&upper, &args, 1)?),
            "KICK" => Command::KICK(
                req(&upper, &args, 0)?,
                req(&upper, &args, 1)?,
                opt(&args, 2),
            ),
            "PRIVMSG" => Command::PRIVMSG(req(&upper, &args, 0)?, req(&upper, &args, 1)?),
            "NOTICE" => Command::NOTICE(req(&upper, &args, 0)?, req(&upper, &args, 1)?),
            "WHO" => Command::WHO(opt(&args, 0)),
            "WHOIS" => Command::WHOIS(opt(&args, 0).unwrap_or_default()),
            "MOTD" => Command::MOTD(opt(&args, 0)),
            "AWAY" => Command::AWAY(opt(&args, 0)),
            "PING" => Command::PING(req(&upper, &args, 0)?, opt(&args, 1)),
            "PONG" => Command::PONG(req(&upper, &args, 0)?, opt(&args, 1)),
            "ERROR" => Command::ERROR(req(&upper, &args, 0)?),
            _ => Command::Raw(upper, args.iter().map(|s| s.to_string()).collect()),
        };
        Ok(command)
    }

    /// The command word as written on the wire.
    pub fn name(&self) -> String {
        match self {
            Command::PASS(..) => "PASS".to_string(),
            Command::NICK(..) => "NICK".to_string(),
            Command::USER(..) => "USER".to_string(),
            Command::QUIT(..) => "QUIT".to_string(),
            Command::JOIN(..) => "JOIN".to_string(),
            Command::PART(..) => "PART".to_string(),
            Command::ChannelMODE(..) | Command::UserMODE(..) => "MODE".to_string(),
            Command::TOPIC(..) => "TOPIC".to_string(),
            Command::NAMES(..) => "NAMES".to_string(),
            Command::LIST(..) => "LIST".to_string(),
            Command::INVITE(..) => "INVITE".to_string(),
            Command::KICK(..) => "KICK".to_string(),
            Command::PRIVMSG(..) => "PRIVMSG".to_string(),
            Command::NOTICE(..) => "NOTICE".to_string(),
            Command::WHO(..) => "WHO".to_string(),
            Command::WHOIS(..) => "WHOIS".to_string(),
            Command::MOTD(..) => "MOTD".to_string(),
            Command::AWAY(..) => "AWAY".to_string(),
            Command::PING(..) => "PING".to_string(),
            Command::PONG(..) => "PONG".to_string(),
            Command::ERROR(..) => "ERROR".to_string(),
            Command::Response(resp, _) => format!("{:03}", resp.code()),
            Command::Raw(cmd, _) => cmd.clone(),
        }
    }

    /// The positional parameters as written on the wire.
    pub fn params(&self) -> Vec<String> {
        fn with_opt(mut head: Vec<String>, tail: &Option<String>) -> Vec<String> {
            if let Some(t) = tail {
                head.push(t.clone());
            }
            head
        }

        match self {
            Command::PASS(p) => vec![p.clone()],
            Command::NICK(n) => vec![n.clone()],
            Command::USER(user, mode, realname) => vec![
                user.clone(),
                mode.clone(),
                "*".to_string(),
                realname.clone(),
            ],
            Command::QUIT(msg) => with_opt(vec![], msg),
            Command::JOIN(chans, keys) => with_opt(vec![chans.clone()], keys),
            Command::PART(chans, msg) => with_opt(vec![chans.clone()], msg),
            Command::ChannelMODE(target, modes) => {
                let mut params = vec![target.clone()];
                if !modes.is_empty() {
                    params.extend(format_modes(modes));
                }
                params
            }
            Command::UserMODE(target, modes) => {
                let mut params = vec![target.clone()];
                if !modes.is_empty() {
                    params.extend(format_modes(modes));
                }
                params
            }
            Command::TOPIC(chan, topic) => with_opt(vec![chan.clone()], topic),
            Command::NAMES(chan) => with_opt(vec![], chan),
            Command::LIST(chans) => with_opt(vec![], chans),
            Command::INVITE(nick, chan) => vec![nick.clone(), chan.clone()],
            Command::KICK(chan, user, comment) => {
                with_opt(vec![chan.clone(), user.clone()], comment)
            }
            Command::PRIVMSG(target, text) => vec![target.clone(), text.clone()],
            Command::NOTICE(target, text) => vec![target.clone(), text.clone()],
            Command::WHO(mask) => with_opt(vec![], mask),
            Command::WHOIS(target) => vec![target.clone()],
            Command::MOTD(target) => with_opt(vec![], target),
            Command::AWAY(msg) => with_opt(vec![], msg),
            Command::PING(s1, s2) => with_opt(vec![s1.clone()], s2),
            Command::PONG(s1, s2) => with_opt(vec![s1.clone()], s2),
            Command::ERROR(msg) => vec![msg.clone()],
            Command::Response(_, params) => params.clone(),
            Command::Raw(_, params) => params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registration_commands() {
        assert_eq!(
            Command::new("NICK", vec!["alice"]).unwrap(),
            Command::NICK("alice".into())
        );
        assert_eq!(
            Command::new("USER", vec!["alice", "0", "*", "Alice A"]).unwrap(),
            Command::USER("alice".into(), "0".into(), "Alice A".into())
        );
        assert_eq!(Command::new("NICK", vec![]).unwrap(), Command::NICK("".into()));
    }

    #[test]
    fn user_requires_four_params() {
        assert_eq!(
            Command::new("USER", vec!["alice", "0"]),
            Err(MessageParseError::MissingParams {
                command: "USER".into()
            })
        );
    }

    #[test]
    fn command_word_is_case_insensitive() {
        assert_eq!(
            Command::new("privmsg", vec!["#a", "hi"]).unwrap(),
            Command::PRIVMSG("#a".into(), "hi".into())
        );
    }

    #[test]
    fn mode_splits_channel_and_user_targets() {
        assert!(matches!(
            Command::new("MODE", vec!["#test", "+i"]).unwrap(),
            Command::ChannelMODE(_, _)
        ));
        assert!(matches!(
            Command::new("MODE", vec!["alice"]).unwrap(),
            Command::UserMODE(_, _)
        ));
    }

    #[test]
    fn mode_with_missing_argument_fails() {
        assert!(matches!(
            Command::new("MODE", vec!["#test", "+k"]),
            Err(MessageParseError::InvalidModeArg(_))
        ));
    }

    #[test]
    fn numeric_commands_become_responses() {
        let cmd = Command::new("433", vec!["*", "alice", "Nickname is already in use"]).unwrap();
        match cmd {
            Command::Response(resp, params) => {
                assert_eq!(resp, Response::ERR_NICKNAMEINUSE);
                assert_eq!(params.len(), 3);
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn unknown_commands_become_raw() {
        let cmd = Command::new("SUMMON", vec!["alice"]).unwrap();
        assert_eq!(cmd, Command::Raw("SUMMON".into(), vec!["alice".into()]));
        assert_eq!(cmd.name(), "SUMMON");
    }

    #[test]
    fn params_round_trip_through_new() {
        let original = Command::new("KICK", vec!["#test", "bob", "bye now"]).unwrap();
        let params = original.params();
        let reparsed =
            Command::new("KICK", params.iter().map(|s| s.as_str()).collect()).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn response_name_is_zero_padded() {
        let cmd = Command::Response(Response::RPL_WELCOME, vec![]);
        assert_eq!(cmd.name(), "001");
    }
}
