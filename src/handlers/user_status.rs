//! User status handlers: AWAY.

use async_trait::async_trait;
use wren_proto::{Command, Message, Response};

use super::{server_reply, Context, Handler};
use crate::error::HandlerResult;

/// Handler for AWAY: set with a message, clear without one.
pub struct AwayHandler;

#[async_trait]
impl Handler for AwayHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        let Command::AWAY(text) = &msg.command else {
            return Ok(());
        };
        let nick = ctx.session.nick_or_star().to_string();

        let message = text.clone().filter(|t| !t.is_empty());
        let now_away = ctx
            .directory
            .set_away(ctx.uid, message)
            .await
            .unwrap_or(false);

        let reply = if now_away {
            server_reply(
                ctx.server_name(),
                Response::RPL_NOWAWAY,
                vec![nick, "You have been marked as being away".to_string()],
            )
        } else {
            server_reply(
                ctx.server_name(),
                Response::RPL_UNAWAY,
                vec![nick, "You are no longer marked as being away".to_string()],
            )
        };
        ctx.reply(reply).await
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::Harness;

    #[tokio::test]
    async fn away_set_and_clear() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        a.drain();

        h.exec(&mut a, "AWAY :back in five").await.unwrap();
        assert_eq!(a.drain_codes(), vec![306]);

        h.exec(&mut a, "AWAY").await.unwrap();
        assert_eq!(a.drain_codes(), vec![305]);
    }
}
