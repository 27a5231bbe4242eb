//! Server query handlers: MOTD.

use async_trait::async_trait;
use wren_proto::{Command, Message, Response};

use super::{server_reply, Context, Handler};
use crate::error::HandlerResult;

/// Send the 375/372/376 burst from the configured MOTD lines.
pub async fn send_motd(ctx: &mut Context<'_>, nick: &str) -> HandlerResult {
    let server_name = ctx.server_name().to_string();

    ctx.reply(server_reply(
        &server_name,
        Response::RPL_MOTDSTART,
        vec![
            nick.to_string(),
            format!("- {} Message of the Day -", server_name),
        ],
    ))
    .await?;

    for line in &ctx.directory.motd {
        ctx.reply(server_reply(
            &server_name,
            Response::RPL_MOTD,
            vec![nick.to_string(), line.clone()],
        ))
        .await?;
    }

    ctx.reply(server_reply(
        &server_name,
        Response::RPL_ENDOFMOTD,
        vec![nick.to_string(), "End of /MOTD command.".to_string()],
    ))
    .await
}

/// Handler for MOTD.
pub struct MotdHandler;

#[async_trait]
impl Handler for MotdHandler {
    async fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        ctx.require_registered()?;

        if !matches!(msg.command, Command::MOTD(_)) {
            return Ok(());
        }
        let nick = ctx.session.nick_or_star().to_string();
        send_motd(ctx, &nick).await
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::Harness;

    #[tokio::test]
    async fn motd_burst_is_framed_by_375_and_376() {
        let h = Harness::new();
        let mut a = h.connect();
        h.register(&mut a, "alice").await;
        a.drain();

        h.exec(&mut a, "MOTD").await.unwrap();
        let codes = a.drain_codes();
        assert_eq!(codes.first(), Some(&375));
        assert_eq!(codes.last(), Some(&376));
        assert!(codes.contains(&372));
    }
}
