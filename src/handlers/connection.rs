//! Connection and registration handlers: PASS, NICK, USER, PING, PONG, QUIT.

use async_trait::async_trait;
use tracing::{debug, info};
use wren_proto::{is_valid_nick, Command, Message, Response};

use super::{server_reply, Context, Handler, RegistrationStage};
use crate::error::{HandlerError, HandlerResult};

/// Handler for PASS.
///
/// The password is recorded on the session and stored with the user entry
/// at registration; it is not checked against anything.
pub struct PassHandler;

#[async_trait]
impl Handler for PassHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::PASS(password) = &msg.command else {
            return Ok(());
        };

        if ctx.session.registered {
            return Err(HandlerError::AlreadyRegistered);
        }
        ctx.session.password = Some(password.clone());
        Ok(())
    }
}

/// Handler for NICK: initial nick, and renames after registration.
pub struct NickHandler;

#[async_trait]
impl Handler for NickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::NICK(nick) = &msg.command else {
            return Ok(());
        };

        if nick.is_empty() {
            return Err(HandlerError::NoSuchNick(
                ctx.session.nick_or_star().to_string(),
            ));
        }
        if !is_valid_nick(nick) {
            return Err(HandlerError::ErroneousNickname(nick.clone()));
        }

        if ctx.session.registered {
            return rename(ctx, nick).await;
        }

        if ctx.directory.nick_in_use(nick, ctx.uid) {
            return Err(HandlerError::NicknameInUse(nick.clone()));
        }

        ctx.session.nick = Some(nick.clone());
        debug!(nick = %nick, uid = %ctx.uid, "Nick set");

        if ctx.session.can_register() {
            complete_registration(ctx).await?;
        }
        Ok(())
    }
}

/// Rename a registered user and echo the NICK change to every channel peer.
async fn rename(ctx: &mut Context<'_>, new_nick: &str) -> HandlerResult {
    let recipients = ctx.directory.rename_user(ctx.uid, new_nick).await?;

    let nick_msg = Message {
        prefix: Some(ctx.session.prefix()),
        command: Command::NICK(new_nick.to_string()),
    };
    ctx.session.nick = Some(new_nick.to_string());

    ctx.directory.send_to_many(&recipients, &nick_msg);
    info!(uid = %ctx.uid, nick = %new_nick, "Nick changed");
    Ok(())
}

/// Handler for USER: completes registration once a nick is set.
pub struct UserHandler;

#[async_trait]
impl Handler for UserHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::USER(username, _mode, realname) = &msg.command else {
            return Ok(());
        };

        if ctx.session.registered {
            return Err(HandlerError::AlreadyRegistered);
        }
        // Registration is strictly NICK before USER.
        if ctx.session.stage() == RegistrationStage::Unregistered {
            return Err(HandlerError::NotRegistered);
        }
        if username.is_empty() {
            return Err(HandlerError::NeedMoreParams("USER".to_string()));
        }

        ctx.session.user = Some(username.clone());
        ctx.session.realname = Some(realname.clone());
        debug!(user = %username, uid = %ctx.uid, "User set");

        if ctx.session.can_register() {
            complete_registration(ctx).await?;
        }
        Ok(())
    }
}

/// Create the Directory entry and send the welcome burst.
async fn complete_registration(ctx: &mut Context<'_>) -> HandlerResult {
    let nick = ctx.session.nick.clone().expect("checked by can_register");
    let user = ctx.session.user.clone().expect("checked by can_register");
    let realname = ctx.session.realname.clone().unwrap_or_default();
    let host = ctx.session.host.clone();

    if let Err(e) = ctx.directory.create_user(
        ctx.uid,
        &nick,
        &user,
        &realname,
        &host,
        ctx.session.password.clone(),
    ) {
        // The nick was claimed while this connection was mid-handshake.
        ctx.session.nick = None;
        return Err(e);
    }

    ctx.session.registered = true;
    info!(nick = %nick, user = %user, uid = %ctx.uid, "Client registered");

    let server_name = ctx.server_name().to_string();
    let info = &ctx.directory.server_info;

    // 001-005
    ctx.reply(server_reply(
        &server_name,
        Response::RPL_WELCOME,
        vec![
            nick.clone(),
            format!(
                "Welcome to the {} IRC Network {}!{}@{}",
                info.network, nick, user, host
            ),
        ],
    ))
    .await?;

    ctx.reply(server_reply(
        &server_name,
        Response::RPL_YOURHOST,
        vec![
            nick.clone(),
            format!(
                "Your host is {}, running version wrend-{}",
                server_name,
                env!("CARGO_PKG_VERSION")
            ),
        ],
    ))
    .await?;

    ctx.reply(server_reply(
        &server_name,
        Response::RPL_CREATED,
        vec![
            nick.clone(),
            format!("This server was created at {}", info.created),
        ],
    ))
    .await?;

    ctx.reply(server_reply(
        &server_name,
        Response::RPL_MYINFO,
        vec![
            nick.clone(),
            server_name.clone(),
            format!("wrend-{}", env!("CARGO_PKG_VERSION")),
            "iwo".to_string(),
            "biklmostv".to_string(),
        ],
    ))
    .await?;

    ctx.reply(server_reply(
        &server_name,
        Response::RPL_ISUPPORT,
        vec![
            nick.clone(),
            format!("NETWORK={}", info.network),
            "CASEMAPPING=rfc1459".to_string(),
            "NICKLEN=9".to_string(),
            "CHANNELLEN=50".to_string(),
            "PREFIX=(ov)@+".to_string(),
            "CHANMODES=b,k,l,imst".to_string(),
            "are supported by this server".to_string(),
        ],
    ))
    .await?;

    super::server_query::send_motd(ctx, &nick).await
}

/// Handler for PING: echo a PONG carrying the token back.
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Command::PING(token, _) = &msg.command else {
            return Ok(());
        };

        let server_name = ctx.server_name().to_string();
        let pong = Message::pong(server_name.clone(), token.clone())
            .with_prefix(wren_proto::Prefix::ServerName(server_name));
        ctx.reply(pong).await
    }
}

/// Handler for PONG.
///
/// The liveness probe is cleared by the connection loop on any inbound
/// traffic, so nothing is left to do here.
pub struct PongHandler;

#[async_trait]
impl Handler for PongHandler {
    async fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        Ok(())
    }
}

/// Handler for QUIT: hand the reason to the connection loop, which runs
/// the shared cleanup path.
pub struct QuitHandler;

#[async_trait]
impl Handler for QuitHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = match &msg.command {
            Command::QUIT(reason) => reason.clone(),
            _ => None,
        };

        info!(uid = %ctx.uid, nick = ?ctx.session.nick, reason = ?reason, "Client quit");
        Err(HandlerError::Quit(reason))
    }
}
