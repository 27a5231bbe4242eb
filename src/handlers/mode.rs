//! MODE handler: channel mode queries and changes, minimal user modes.

use async_trait::async_trait;
use tracing::info;
use wren_proto::mode::{ChannelMode, Mode};
use wren_proto::{format_modes, irc_eq, Command, Message, Response};

use super::{server_reply, Context, Handler};
use crate::error::HandlerResult;

/// Handler for MODE.
pub struct ModeHandler;

#[async_trait]
impl Handler for ModeHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        match &msg.command {
            Command::ChannelMODE(channel, modes) if modes.is_empty() => {
                query_channel_modes(ctx, channel).await
            }
            Command::ChannelMODE(channel, modes) if is_ban_query(modes) => {
                query_ban_list(ctx, channel).await
            }
            Command::ChannelMODE(channel, modes) => apply_channel_modes(ctx, channel, modes).await,
            Command::UserMODE(target, modes) => user_modes(ctx, target, modes.is_empty()).await,
            _ => Ok(()),
        }
    }
}

/// `MODE #chan +b` with no mask queries the ban list.
fn is_ban_query(modes: &[Mode<ChannelMode>]) -> bool {
    matches!(modes, [m] if *m.mode() == ChannelMode::Ban && m.arg().is_none())
}

async fn query_channel_modes(ctx: &mut Context<'_>, channel: &str) -> HandlerResult {
    let nick = ctx.session.nick_or_star().to_string();
    match ctx.directory.get_channel_modes(channel).await {
        Ok((canonical, mode_string, args)) => {
            let mut params = vec![nick, canonical, mode_string];
            params.extend(args);
            ctx.reply(server_reply(
                ctx.server_name(),
                Response::RPL_CHANNELMODEIS,
                params,
            ))
            .await
        }
        Err(e) => {
            if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, channel) {
                ctx.reply(reply).await?;
            }
            Ok(())
        }
    }
}

async fn query_ban_list(ctx: &mut Context<'_>, channel: &str) -> HandlerResult {
    let nick = ctx.session.nick_or_star().to_string();
    match ctx.directory.list_bans(channel).await {
        Ok((canonical, bans)) => {
            for entry in bans {
                ctx.reply(server_reply(
                    ctx.server_name(),
                    Response::RPL_BANLIST,
                    vec![
                        nick.clone(),
                        canonical.clone(),
                        entry.mask,
                        entry.set_by,
                        entry.set_at.to_string(),
                    ],
                ))
                .await?;
            }
            ctx.reply(server_reply(
                ctx.server_name(),
                Response::RPL_ENDOFBANLIST,
                vec![nick, canonical, "End of channel ban list".to_string()],
            ))
            .await
        }
        Err(e) => {
            if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, channel) {
                ctx.reply(reply).await?;
            }
            Ok(())
        }
    }
}

async fn apply_channel_modes(
    ctx: &mut Context<'_>,
    channel: &str,
    modes: &[Mode<ChannelMode>],
) -> HandlerResult {
    let nick = ctx.session.nick_or_star().to_string();
    let set_by = ctx.session.prefix().to_string();

    match ctx
        .directory
        .apply_channel_modes(ctx.uid, channel, modes, &set_by)
        .await
    {
        Ok(outcome) => {
            if outcome.applied.is_empty() {
                return Ok(());
            }
            let mode_msg = Message {
                prefix: Some(ctx.session.prefix()),
                command: Command::ChannelMODE(outcome.channel.clone(), outcome.applied.clone()),
            };
            ctx.directory.send_to_many(&outcome.members, &mode_msg);
            info!(
                nick = %nick,
                channel = %outcome.channel,
                modes = %format_modes(&outcome.applied).join(" "),
                "Channel modes changed"
            );
            Ok(())
        }
        Err(e) => {
            if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, channel) {
                ctx.reply(reply).await?;
            }
            Ok(())
        }
    }
}

/// User modes are not tracked: self-queries answer an empty mode string,
/// anything else is rejected.
async fn user_modes(ctx: &mut Context<'_>, target: &str, query: bool) -> HandlerResult {
    let nick = ctx.session.nick_or_star().to_string();

    if !irc_eq(target, &nick) {
        return ctx
            .reply(server_reply(
                ctx.server_name(),
                Response::ERR_USERSDONTMATCH,
                vec![nick, "Cannot change mode for other users".to_string()],
            ))
            .await;
    }

    if query {
        ctx.reply(server_reply(
            ctx.server_name(),
            Response::RPL_UMODEIS,
            vec![nick, "+".to_string()],
        ))
        .await
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::Harness;
    use wren_proto::{Command, Response};

    #[tokio::test]
    async fn mode_query_reports_flags_and_args() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        h.exec(&mut a, "JOIN #m").await.unwrap();
        h.exec(&mut a, "MODE #m +k sesame").await.unwrap();
        a.drain();

        h.exec(&mut a, "MODE #m").await.unwrap();
        let replies = a.drain();
        let reply = replies
            .iter()
            .find(|m| m.response() == Some(Response::RPL_CHANNELMODEIS))
            .expect("324 sent")
            .to_string();
        assert!(reply.contains("+k"));
        assert!(reply.contains("sesame"));
    }

    #[tokio::test]
    async fn mode_change_is_broadcast_to_members() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;
        h.exec(&mut a, "JOIN #m").await.unwrap();
        h.exec(&mut b, "JOIN #m").await.unwrap();
        a.drain();
        b.drain();

        h.exec(&mut a, "MODE #m +o bob").await.unwrap();
        assert!(b.drain().iter().any(|m| matches!(
            &m.command,
            Command::ChannelMODE(c, modes) if c == "#m" && !modes.is_empty()
        )));

        // The promoted member can now change modes too.
        h.exec(&mut b, "MODE #m +s").await.unwrap();
        assert!(b.drain_codes().is_empty());
    }

    #[tokio::test]
    async fn key_round_trip_gates_join() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #locked").await.unwrap();
        h.exec(&mut a, "MODE #locked +k opensesame").await.unwrap();
        a.drain();

        h.exec(&mut b, "JOIN #locked").await.unwrap();
        assert_eq!(b.drain_codes(), vec![475]);

        h.exec(&mut b, "JOIN #locked wrong").await.unwrap();
        assert_eq!(b.drain_codes(), vec![475]);

        h.exec(&mut b, "JOIN #locked opensesame").await.unwrap();
        let codes = b.drain_codes();
        assert!(codes.contains(&353));
    }

    #[tokio::test]
    async fn ban_list_query_reports_masks() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        h.exec(&mut a, "JOIN #b").await.unwrap();
        h.exec(&mut a, "MODE #b +b troll!*@*").await.unwrap();
        a.drain();

        h.exec(&mut a, "MODE #b +b").await.unwrap();
        let codes = a.drain_codes();
        assert_eq!(codes, vec![367, 368]);
    }

    #[tokio::test]
    async fn unknown_flag_is_472() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        h.exec(&mut a, "JOIN #u").await.unwrap();
        a.drain();

        h.exec(&mut a, "MODE #u +x").await.unwrap();
        assert_eq!(a.drain_codes(), vec![472]);
    }

    #[tokio::test]
    async fn user_mode_self_query_and_other_rejection() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        a.drain();

        h.exec(&mut a, "MODE alice").await.unwrap();
        assert_eq!(a.drain_codes(), vec![221]);

        h.exec(&mut a, "MODE bob").await.unwrap();
        assert_eq!(a.drain_codes(), vec![502]);
    }
}
