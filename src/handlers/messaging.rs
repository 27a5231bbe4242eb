//! Messaging handlers: PRIVMSG and NOTICE, for channels and users.

use async_trait::async_trait;
use tracing::debug;
use wren_proto::{ChannelExt, Command, Message};

use super::helpers::rpl_away;
use super::{Context, Handler};
use crate::error::HandlerResult;

/// Handler for PRIVMSG.
pub struct PrivmsgHandler;

#[async_trait]
impl Handler for PrivmsgHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::PRIVMSG(target, text) = &msg.command else {
            return Ok(());
        };
        relay(ctx, target, text, true).await
    }
}

/// Handler for NOTICE: like PRIVMSG, but never answers with errors or
/// away notices.
pub struct NoticeHandler;

#[async_trait]
impl Handler for NoticeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::NOTICE(target, text) = &msg.command else {
            return Ok(());
        };
        relay(ctx, target, text, false).await
    }
}

async fn relay(
    ctx: &mut Context<'_>,
    target: &str,
    text: &str,
    replies_allowed: bool,
) -> HandlerResult {
    let nick = ctx.session.nick_or_star().to_string();

    let command = if replies_allowed {
        Command::PRIVMSG(target.to_string(), text.to_string())
    } else {
        Command::NOTICE(target.to_string(), text.to_string())
    };
    let out = Message {
        prefix: Some(ctx.session.prefix()),
        command,
    };

    if target.is_channel_name() {
        match ctx.directory.channel_recipients(ctx.uid, target).await {
            Ok((canonical, recipients)) => {
                ctx.directory.send_to_many(&recipients, &out);
                debug!(from = %nick, to = %canonical, "Message relayed to channel");
            }
            Err(e) if replies_allowed => {
                if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, target) {
                    ctx.reply(reply).await?;
                }
            }
            Err(_) => {}
        }
        return Ok(());
    }

    // Direct message.
    let Some(target_uid) = ctx.directory.resolve_nick(target) else {
        if replies_allowed {
            let reply = crate::error::HandlerError::NoSuchNick(target.to_string())
                .to_irc_reply(ctx.server_name(), &nick)
                .expect("NoSuchNick renders a reply");
            ctx.reply(reply).await?;
        }
        return Ok(());
    };

    let away_text = match ctx.directory.user_ref(&target_uid) {
        Some(user_ref) => user_ref.read().await.away.clone(),
        None => None,
    };

    match away_text {
        // An away target is answered for, not forwarded to.
        Some(text) if replies_allowed => {
            ctx.reply(rpl_away(ctx.server_name(), &nick, target, &text))
                .await?;
        }
        Some(_) => {}
        None => {
            ctx.directory.send_to_user(&target_uid, out);
            debug!(from = %nick, to = %target, "Message relayed to user");
        }
    }
    Ok(())
}
