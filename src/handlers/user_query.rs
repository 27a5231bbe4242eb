//! User query handlers: WHO and WHOIS.

use async_trait::async_trait;
use wren_proto::{Command, Message, Response};

use super::helpers::rpl_away;
use super::{server_reply, Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::MemberModes;

/// Handler for WHO against a channel mask.
pub struct WhoHandler;

#[async_trait]
impl Handler for WhoHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::WHO(mask) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();
        let server_name = ctx.server_name().to_string();
        let mask = mask.clone().unwrap_or_else(|| "*".to_string());

        // Membership snapshot first, then per-user reads; no nested locks.
        let lower = wren_proto::irc_to_lower(&mask);
        let chan_ref = ctx.directory.channels.get(&lower).map(|e| e.value().clone());
        let members: Vec<(String, MemberModes)> = match chan_ref {
            Some(chan_ref) => {
                let chan = chan_ref.read().await;
                chan.members.iter().map(|(u, m)| (u.clone(), *m)).collect()
            }
            None => Vec::new(),
        };

        for (uid, _modes) in members {
            let Some(user_ref) = ctx.directory.user_ref(&uid) else {
                continue;
            };
            let (member_nick, username, host, realname, away) = {
                let user = user_ref.read().await;
                (
                    user.nick.clone(),
                    user.user.clone(),
                    user.host.clone(),
                    user.realname.clone(),
                    user.is_away(),
                )
            };
            let here = if away { "G" } else { "H" };
            ctx.reply(server_reply(
                &server_name,
                Response::RPL_WHOREPLY,
                vec![
                    nick.clone(),
                    mask.clone(),
                    format!("~{}", username),
                    host,
                    server_name.clone(),
                    member_nick,
                    here.to_string(),
                    format!("0 {}", realname),
                ],
            ))
            .await?;
        }

        ctx.reply(server_reply(
            &server_name,
            Response::RPL_ENDOFWHO,
            vec![nick, mask, "End of /WHO list".to_string()],
        ))
        .await
    }
}

/// Handler for WHOIS.
pub struct WhoisHandler;

#[async_trait]
impl Handler for WhoisHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::WHOIS(target) = &msg.command else {
            return Ok(());
        };
        if target.is_empty() {
            return Err(HandlerError::NoNicknameGiven);
        }

        let nick = ctx.session.nick_or_star().to_string();
        let server_name = ctx.server_name().to_string();

        let Some(target_uid) = ctx.directory.resolve_nick(target) else {
            return Err(HandlerError::NoSuchNick(target.clone()));
        };
        let Some(user_ref) = ctx.directory.user_ref(&target_uid) else {
            return Err(HandlerError::NoSuchNick(target.clone()));
        };

        let (target_nick, username, host, realname, away) = {
            let user = user_ref.read().await;
            (
                user.nick.clone(),
                user.user.clone(),
                user.host.clone(),
                user.realname.clone(),
                user.away.clone(),
            )
        };

        ctx.reply(server_reply(
            &server_name,
            Response::RPL_WHOISUSER,
            vec![
                nick.clone(),
                target_nick.clone(),
                username,
                host,
                "*".to_string(),
                realname,
            ],
        ))
        .await?;

        let channels = ctx.directory.channels_of_user(&target_uid).await;
        if !channels.is_empty() {
            ctx.reply(server_reply(
                &server_name,
                Response::RPL_WHOISCHANNELS,
                vec![nick.clone(), target_nick.clone(), channels.join(" ")],
            ))
            .await?;
        }

        ctx.reply(server_reply(
            &server_name,
            Response::RPL_WHOISSERVER,
            vec![
                nick.clone(),
                target_nick.clone(),
                server_name.clone(),
                ctx.directory.server_info.description.clone(),
            ],
        ))
        .await?;

        if let Some(text) = away {
            ctx.reply(rpl_away(&server_name, &nick, &target_nick, &text))
                .await?;
        }

        ctx.reply(server_reply(
            &server_name,
            Response::RPL_ENDOFWHOIS,
            vec![nick, target_nick, "End of /WHOIS list".to_string()],
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::Harness;
    use wren_proto::Response;

    #[tokio::test]
    async fn who_lists_channel_members() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #w").await.unwrap();
        h.exec(&mut b, "JOIN #w").await.unwrap();
        a.drain();
        b.drain();

        h.exec(&mut a, "WHO #w").await.unwrap();
        let codes = a.drain_codes();
        assert_eq!(codes, vec![352, 352, 315]);
    }

    #[tokio::test]
    async fn who_twice_yields_identical_content() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut a, "JOIN #w").await.unwrap();
        h.exec(&mut b, "JOIN #w").await.unwrap();
        a.drain();

        h.exec(&mut a, "WHO #w").await.unwrap();
        let mut first: Vec<String> = a.drain().iter().map(|m| m.to_string()).collect();
        h.exec(&mut a, "WHO #w").await.unwrap();
        let mut second: Vec<String> = a.drain().iter().map(|m| m.to_string()).collect();

        first.sort();
        second.sort();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn who_on_unknown_channel_still_terminates() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        a.drain();

        h.exec(&mut a, "WHO #nowhere").await.unwrap();
        assert_eq!(a.drain_codes(), vec![315]);
    }

    #[tokio::test]
    async fn whois_reports_user_channels_and_end() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;

        h.exec(&mut b, "JOIN #w").await.unwrap();
        a.drain();
        b.drain();

        h.exec(&mut a, "WHOIS bob").await.unwrap();
        let replies = a.drain();
        let codes: Vec<u16> = replies
            .iter()
            .filter_map(|m| m.response().map(|r| r.code()))
            .collect();
        assert_eq!(codes, vec![311, 319, 312, 318]);

        // Bob is operator of #w, so the channel list decorates it.
        let channels = replies
            .iter()
            .find(|m| m.response() == Some(Response::RPL_WHOISCHANNELS))
            .unwrap()
            .to_string();
        assert!(channels.contains("@#w"));
    }

    #[tokio::test]
    async fn whois_away_user_includes_301() {
        let h = Harness::new();
        let mut a = h.connect();
        let mut b = h.connect();
        h.register(&mut a, "alice").await;
        h.register(&mut b, "bob").await;
        h.exec(&mut b, "AWAY :afk").await.unwrap();
        a.drain();

        h.exec(&mut a, "WHOIS bob").await.unwrap();
        let codes = a.drain_codes();
        assert!(codes.contains(&301));
    }

    #[tokio::test]
    async fn whois_unknown_nick_is_an_error() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        a.drain();

        let err = h.exec(&mut a, "WHOIS ghost").await.unwrap_err();
        assert!(matches!(err, crate::error::HandlerError::NoSuchNick(_)));
    }
}
