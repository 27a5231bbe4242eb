//! Channel command handlers: JOIN, PART, TOPIC, NAMES, LIST, INVITE, KICK.

use async_trait::async_trait;
use tracing::info;
use wren_proto::{Command, Message, Response};

use super::{server_reply, Context, Handler};
use crate::error::HandlerResult;

/// Handler for JOIN.
pub struct JoinHandler;

#[async_trait]
impl Handler for JoinHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::JOIN(channels, keys) = &msg.command else {
            return Ok(());
        };

        let keys: Vec<&str> = keys.as_deref().map(|k| k.split(',').collect()).unwrap_or_default();

        for (i, name) in channels.split(',').filter(|c| !c.is_empty()).enumerate() {
            let key = keys.get(i).copied().filter(|k| !k.is_empty());
            join_one(ctx, name, key).await?;
        }
        Ok(())
    }
}

async fn join_one(ctx: &mut Context<'_>, name: &str, key: Option<&str>) -> HandlerResult {
    let nick = ctx.session.nick_or_star().to_string();

    let outcome = match ctx.directory.join_channel(ctx.uid, name, key).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, name) {
                ctx.reply(reply).await?;
            }
            return Ok(());
        }
    };

    // Everyone in the channel, the joiner included, sees the JOIN.
    let join_msg = Message {
        prefix: Some(ctx.session.prefix()),
        command: Command::JOIN(outcome.channel.clone(), None),
    };
    ctx.directory.send_to_many(&outcome.members, &join_msg);

    info!(
        nick = %nick,
        channel = %outcome.channel,
        op = outcome.granted_op,
        "User joined channel"
    );

    // Topic and NAMES burst for the joiner.
    if let Some(topic) = &outcome.topic {
        ctx.reply(server_reply(
            ctx.server_name(),
            Response::RPL_TOPIC,
            vec![nick.clone(), outcome.channel.clone(), topic.text.clone()],
        ))
        .await?;
    }
    send_names(ctx, &nick, &outcome.channel).await
}

/// Send the 353/366 pair for one channel.
async fn send_names(ctx: &mut Context<'_>, nick: &str, channel: &str) -> HandlerResult {
    if let Some((canonical, names)) = ctx.directory.names_of(channel).await {
        ctx.reply(server_reply(
            ctx.server_name(),
            Response::RPL_NAMREPLY,
            vec![
                nick.to_string(),
                "=".to_string(),
                canonical.clone(),
                names.join(" "),
            ],
        ))
        .await?;
    }
    ctx.reply(server_reply(
        ctx.server_name(),
        Response::RPL_ENDOFNAMES,
        vec![
            nick.to_string(),
            channel.to_string(),
            "End of /NAMES list".to_string(),
        ],
    ))
    .await
}

/// Handler for PART.
pub struct PartHandler;

#[async_trait]
impl Handler for PartHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::PART(channels, reason) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();

        for name in channels.split(',').filter(|c| !c.is_empty()) {
            match ctx.directory.part_channel(ctx.uid, name).await {
                Ok(outcome) => {
                    // The leaver and every remaining member see the PART.
                    let part_msg = Message {
                        prefix: Some(ctx.session.prefix()),
                        command: Command::PART(outcome.channel.clone(), reason.clone()),
                    };
                    ctx.directory.send_to_many(&outcome.members, &part_msg);
                    info!(nick = %nick, channel = %outcome.channel, "User left channel");
                }
                Err(e) => {
                    if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, name) {
                        ctx.reply(reply).await?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Handler for TOPIC: query without an argument, set with one.
pub struct TopicHandler;

#[async_trait]
impl Handler for TopicHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::TOPIC(channel, new_topic) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();

        match new_topic {
            None => match ctx.directory.get_topic(channel).await {
                Ok((canonical, Some(topic))) => {
                    ctx.reply(server_reply(
                        ctx.server_name(),
                        Response::RPL_TOPIC,
                        vec![nick, canonical, topic.text],
                    ))
                    .await
                }
                Ok((canonical, None)) => {
                    ctx.reply(server_reply(
                        ctx.server_name(),
                        Response::RPL_NOTOPIC,
                        vec![nick, canonical, "No topic is set".to_string()],
                    ))
                    .await
                }
                Err(e) => {
                    if let Some(reply) = e.to_irc_reply(ctx.server_name(), &nick, channel) {
                        ctx.reply(reply).await?;
                    }
                    Ok(())
                }
            },
            Some(text) => {
                let set_by = ctx.session.prefix().to_string();
                match ctx
                    .directory
                    .set_topic(ctx.uid, channel, text, &set_by)
                    .await
                {
                    Ok(outcome) => {
                        let topic_msg = Message {
                            prefix: Some(ctx.session.prefix()),
                            command: Command::TOPIC(
                                outcome.channel.clone(),
                                Some(text.clone()),
                            ),
                        };
                        ctx.directory.send_to_many(&outcome.members, &topic_msg);
                        info!(nick = %nick, channel = %outcome.channel, "Topic changed");
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
        }
    }
}

/// Handler for NAMES.
pub struct NamesHandler;

#[async_trait]
impl Handler for NamesHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::NAMES(channel) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();

        match channel {
            Some(channel) => send_names(ctx, &nick, channel).await,
            // NAMES without a channel only gets the terminator.
            None => {
                ctx.reply(server_reply(
                    ctx.server_name(),
                    Response::RPL_ENDOFNAMES,
                    vec![nick, "*".to_string(), "End of /NAMES list".to_string()],
                ))
                .await
            }
        }
    }
}

/// Handler for LIST.
pub struct ListHandler;

#[async_trait]
impl Handler for ListHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        ctx.require_registered()?;
        let nick = ctx.session.nick_or_star().to_string();
        let server_name = ctx.server_name().to_string();

        ctx.reply(server_reply(
            &server_name,
            Response::RPL_LISTSTART,
            vec![nick.clone(), "Channel".to_string(), "Users  Name".to_string()],
        ))
        .await?;

        for (name, members, topic) in ctx.directory.list_channels().await {
            ctx.reply(server_reply(
                &server_name,
                Response::RPL_LIST,
                vec![nick.clone(), name, members.to_string(), topic],
            ))
            .await?;
        }

        ctx.reply(server_reply(
            &server_name,
            Response::RPL_LISTEND,
            vec![nick, "End of /LIST".to_string()],
        ))
        .await
    }
}

/// Handler for INVITE.
pub struct InviteHandler;

#[async_trait]
impl Handler for InviteHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::INVITE(target, channel) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();

        match ctx.directory.invite(ctx.uid, target, channel).await {
            Ok(outcome) => {
                ctx.reply(server_reply(
                    ctx.server_name(),
                    Response::RPL_INVITING,
                    vec![nick.clone(), target.clone(), outcome.channel.clone()],
                ))
                .await?;

                let invite_msg = Message {
                    prefix: Some(ctx.session.prefix()),
                    command: Command::INVITE(target.clone(), outcome.channel.clone()),
                };
                ctx.directory.send_to_user(&outcome.target_uid, invite_msg);
                info!(from = %nick, to = %target, channel = %outcome.channel, "Invite sent");
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
}

/// Handler for KICK.
pub struct KickHandler;

#[async_trait]
impl Handler for KickHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::KICK(channel, target, comment) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();

        match ctx.directory.kick_member(ctx.uid, channel, target).await {
            Ok(outcome) => {
                // Everyone, the target included, sees the KICK.
                let reason = comment.clone().unwrap_or_else(|| nick.clone());
                let kick_msg = Message {
                    prefix: Some(ctx.session.prefix()),
                    command: Command::KICK(
                        outcome.channel.clone(),
                        target.clone(),
                        Some(reason),
                    ),
                };
                ctx.directory.send_to_many(&outcome.members, &kick_msg);
                info!(
                    kicker = %nick,
                    target = %target,
                    channel = %outcome.channel,
                    "User kicked from channel"
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
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::Harness;
    use wren_proto::{Command, Response};

    #[tokio::test]
    async fn join_broadcasts_and_sends_names() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;
        a.drain();
        b.drain();

        h.exec(&mut a, "JOIN #test").await.unwrap();
        let alice_sees = a.drain();
        assert!(alice_sees.iter().any(|m| matches!(
            &m.command,
            Command::JOIN(c, _) if c == "#test"
        )));
        assert!(alice_sees
            .iter()
            .any(|m| m.response() == Some(Response::RPL_NAMREPLY)));

        h.exec(&mut b, "JOIN #test").await.unwrap();
        // The earlier member sees the newcomer's JOIN.
        let alice_sees = a.drain();
        assert!(alice_sees.iter().any(|m| {
            matches!(&m.command, Command::JOIN(c, _) if c == "#test")
                && m.source_nickname() == Some("bob")
        }));

        // The names list decorates the operator.
        let bob_sees = b.drain();
        let names = bob_sees
            .iter()
            .find(|m| m.response() == Some(Response::RPL_NAMREPLY))
            .expect("353 sent")
            .to_string();
        assert!(names.contains("@alice"));
        assert!(names.contains("bob"));
    }

    #[tokio::test]
    async fn join_requires_hash_prefix() {
        let h = Harness::new();
        let mut conn = h.connect();
        h.register(&mut conn, "alice").await;
        conn.drain();

        h.exec(&mut conn, "JOIN test").await.unwrap();
        assert_eq!(conn.drain_codes(), vec![403]);
    }

    #[tokio::test]
    async fn unregistered_join_is_rejected() {
        let h = Harness::new();
        let mut conn = h.connect();
        let err = h.exec(&mut conn, "JOIN #test").await.unwrap_err();
        assert!(matches!(err, crate::error::HandlerError::NotRegistered));
    }

    #[tokio::test]
    async fn part_not_a_member_is_444() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;
        a.drain();
        b.drain();

        h.exec(&mut a, "JOIN #test").await.unwrap();
        a.drain();

        h.exec(&mut b, "PART #test").await.unwrap();
        assert_eq!(b.drain_codes(), vec![444]);
    }

    #[tokio::test]
    async fn kick_notifies_kicker_and_target() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #test").await.unwrap();
        h.exec(&mut b, "JOIN #test").await.unwrap();
        a.drain();
        b.drain();

        h.exec(&mut a, "KICK #test bob :bye").await.unwrap();

        let is_kick = |m: &wren_proto::Message| {
            matches!(&m.command, Command::KICK(c, t, _) if c == "#test" && t == "bob")
        };
        assert!(a.drain().iter().any(is_kick));
        assert!(b.drain().iter().any(is_kick));

        // The target is no longer a member.
        h.exec(&mut b, "PART #test").await.unwrap();
        assert_eq!(b.drain_codes(), vec![444]);
    }

    #[tokio::test]
    async fn kick_without_op_is_482() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #test").await.unwrap();
        h.exec(&mut b, "JOIN #test").await.unwrap();
        a.drain();
        b.drain();

        h.exec(&mut b, "KICK #test alice").await.unwrap();
        assert_eq!(b.drain_codes(), vec![482]);
    }

    #[tokio::test]
    async fn topic_query_and_protected_set() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #test").await.unwrap();
        h.exec(&mut b, "JOIN #test").await.unwrap();
        a.drain();
        b.drain();

        h.exec(&mut a, "TOPIC #test").await.unwrap();
        assert_eq!(a.drain_codes(), vec![331]);

        h.exec(&mut a, "MODE #test +t").await.unwrap();
        h.exec(&mut a, "TOPIC #test :news of the day").await.unwrap();
        a.drain();

        // Channel members see the TOPIC echo.
        assert!(b.drain().iter().any(|m| matches!(
            &m.command,
            Command::TOPIC(c, Some(t)) if c == "#test" && t == "news of the day"
        )));

        // The query now returns the stored topic.
        h.exec(&mut b, "TOPIC #test").await.unwrap();
        let replies = b.drain();
        assert!(replies
            .iter()
            .any(|m| m.response() == Some(Response::RPL_TOPIC)));

        // A non-operator cannot set it while +t.
        h.exec(&mut b, "TOPIC #test :hijack").await.unwrap();
        assert_eq!(b.drain_codes(), vec![482]);
    }

    #[tokio::test]
    async fn invite_lets_a_user_through() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #club").await.unwrap();
        h.exec(&mut a, "MODE #club +i").await.unwrap();
        a.drain();

        h.exec(&mut b, "JOIN #club").await.unwrap();
        assert_eq!(b.drain_codes(), vec![473]);

        h.exec(&mut a, "INVITE bob #club").await.unwrap();
        assert_eq!(a.drain_codes(), vec![341]);
        assert!(b.drain().iter().any(|m| matches!(
            &m.command,
            Command::INVITE(n, c) if n == "bob" && c == "#club"
        )));

        h.exec(&mut b, "JOIN #club").await.unwrap();
        let codes = b.drain_codes();
        assert!(codes.contains(&353));
    }

    #[tokio::test]
    async fn list_shows_channel_with_member_count() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        h.exec(&mut a, "JOIN #one").await.unwrap();
        h.exec(&mut a, "TOPIC #one :hello").await.unwrap();
        a.drain();

        h.exec(&mut a, "LIST").await.unwrap();
        let replies = a.drain();
        let entry = replies
            .iter()
            .find(|m| m.response() == Some(Response::RPL_LIST))
            .expect("322 sent")
            .to_string();
        assert!(entry.contains("#one"));
        assert!(entry.contains('1'));
        assert!(entry.contains("hello"));
    }
}
