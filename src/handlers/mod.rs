//! IRC command handlers.
//!
//! The `Registry` maps command names to `Handler` trait objects; the
//! connection supervisor parses each inbound line and dispatches it here.
//! Handlers validate preconditions, mutate the Directory, and queue
//! replies and broadcasts.

mod channel;
mod connection;
mod helpers;
mod messaging;
mod mode;
mod server_query;
mod user_query;
mod user_status;

pub use helpers::server_reply;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use wren_proto::{Command, Message, Prefix};

use crate::error::{HandlerError, HandlerResult};
use crate::state::Directory;

use channel::{
    InviteHandler, JoinHandler, KickHandler, ListHandler, NamesHandler, PartHandler, TopicHandler,
};
use connection::{NickHandler, PassHandler, PingHandler, PongHandler, QuitHandler, UserHandler};
use messaging::{NoticeHandler, PrivmsgHandler};
use mode::ModeHandler;
use server_query::MotdHandler;
use user_query::{WhoHandler, WhoisHandler};
use user_status::AwayHandler;

/// Registration stage of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    Unregistered,
    NickSet,
    Registered,
}

/// Per-connection state owned by the supervisor, never shared.
#[derive(Debug, Default)]
pub struct Session {
    /// Nick from NICK.
    pub nick: Option<String>,
    /// Username from USER.
    pub user: Option<String>,
    /// Realname from USER.
    pub realname: Option<String>,
    /// Password from PASS, if any.
    pub password: Option<String>,
    /// Whether registration completed.
    pub registered: bool,
    /// Peer host, fixed at accept time.
    pub host: String,
}

impl Session {
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Self::default()
        }
    }

    pub fn stage(&self) -> RegistrationStage {
        if self.registered {
            RegistrationStage::Registered
        } else if self.nick.is_some() {
            RegistrationStage::NickSet
        } else {
            RegistrationStage::Unregistered
        }
    }

    /// Both NICK and USER have arrived and registration has not run yet.
    pub fn can_register(&self) -> bool {
        !self.registered && self.nick.is_some() && self.user.is_some()
    }

    /// Current nick for reply targets, `*` before NICK.
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// The cached `nick!user@host` source prefix for outbound messages.
    pub fn prefix(&self) -> Prefix {
        Prefix::new(
            self.nick.as_deref().unwrap_or("*"),
            self.user.as_deref().unwrap_or(""),
            &self.host,
        )
    }
}

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// This connection's session id.
    pub uid: &'a str,
    /// Shared server state.
    pub directory: &'a Arc<Directory>,
    /// Outbound queue of this connection.
    pub sender: &'a mpsc::Sender<Message>,
    /// This connection's registration state.
    pub session: &'a mut Session,
}

impl Context<'_> {
    /// The configured server name, used as the prefix of numeric replies.
    pub fn server_name(&self) -> &str {
        &self.directory.server_info.name
    }

    /// Queue a reply to this connection.
    pub async fn reply(&self, msg: Message) -> HandlerResult {
        self.sender.send(msg).await?;
        Ok(())
    }

    /// Fail with `ERR_NOTREGISTERED` unless registration has completed.
    pub fn require_registered(&self) -> Result<(), HandlerError> {
        if self.session.registered {
            Ok(())
        } else {
            Err(HandlerError::NotRegistered)
        }
    }
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a registry with every supported command registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Connection and registration
        handlers.insert("PASS", Box::new(PassHandler));
        handlers.insert("NICK", Box::new(NickHandler));
        handlers.insert("USER", Box::new(UserHandler));
        handlers.insert("PING", Box::new(PingHandler));
        handlers.insert("PONG", Box::new(PongHandler));
        handlers.insert("QUIT", Box::new(QuitHandler));

        // Channels
        handlers.insert("JOIN", Box::new(JoinHandler));
        handlers.insert("PART", Box::new(PartHandler));
        handlers.insert("TOPIC", Box::new(TopicHandler));
        handlers.insert("NAMES", Box::new(NamesHandler));
        handlers.insert("LIST", Box::new(ListHandler));
        handlers.insert("INVITE", Box::new(InviteHandler));
        handlers.insert("KICK", Box::new(KickHandler));
        handlers.insert("MODE", Box::new(ModeHandler));

        // Messaging
        handlers.insert("PRIVMSG", Box::new(PrivmsgHandler));
        handlers.insert("NOTICE", Box::new(NoticeHandler));

        // Queries
        handlers.insert("WHO", Box::new(WhoHandler));
        handlers.insert("WHOIS", Box::new(WhoisHandler));
        handlers.insert("MOTD", Box::new(MotdHandler));

        // Status
        handlers.insert("AWAY", Box::new(AwayHandler));

        Self { handlers }
    }

    /// Dispatch one parsed message to its handler.
    ///
    /// Unknown commands answer `ERR_UNKNOWNCOMMAND`; numeric replies from
    /// a client are ignored.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if matches!(msg.command, Command::Response(_, _)) {
            return Ok(());
        }

        let name = msg.command.name();
        match self.handlers.get(name.as_str()) {
            Some(handler) => handler.handle(ctx, msg).await,
            None => {
                let reply = helpers::err_unknowncommand(
                    ctx.server_name(),
                    ctx.session.nick_or_star(),
                    &name,
                );
                ctx.reply(reply).await
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
