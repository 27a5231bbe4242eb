//! Connection supervisor - owns one client connection end to end.
//!
//! Each supervisor runs in its own task with a writer task beside it:
//!
//! - the event loop reads framed lines, dispatches them in arrival order,
//!   and drives the liveness probe;
//! - the writer task drains the outbound queue into the socket, so
//!   handler replies and broadcasts from other connections share one
//!   ordered path and never block dispatch.
//!
//! Stream end, transport errors, over-long lines, QUIT, and liveness
//! timeouts all converge on the same cleanup: an implicit QUIT through
//! the Directory (broadcast only if the connection had registered).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};
use wren_proto::{LineCodec, Message, MessageParseError};

use crate::config::LivenessConfig;
use crate::error::HandlerError;
use crate::handlers::{Context, Registry, Session};
use crate::state::Directory;

/// Outbound queue depth per connection.
const OUTBOUND_QUEUE: usize = 256;

/// A client connection supervisor.
pub struct Connection {
    uid: String,
    addr: SocketAddr,
    directory: Arc<Directory>,
    registry: Arc<Registry>,
    liveness: LivenessConfig,
}

impl Connection {
    pub fn new(
        uid: String,
        addr: SocketAddr,
        directory: Arc<Directory>,
        registry: Arc<Registry>,
        liveness: LivenessConfig,
    ) -> Self {
        Self {
            uid,
            addr,
            directory,
            registry,
            liveness,
        }
    }

    /// Run the connection to completion over any byte-stream transport.
    #[instrument(skip(self, stream), fields(uid = %self.uid, addr = %self.addr), name = "connection")]
    pub async fn run<S>(self, stream: S) -> anyhow::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let framed = Framed::new(stream, LineCodec::new());
        let (mut sink, mut lines) = framed.split();

        let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
        self.directory.register_link(&self.uid, tx.clone());

        // Writer task: the only owner of the sink.
        let writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(msg.to_string()).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let mut session = Session::new(self.addr.ip().to_string());

        let ping_interval = Duration::from_secs(self.liveness.ping_interval_secs.max(1));
        let pong_grace = Duration::from_secs(self.liveness.pong_grace_secs.max(1));
        let mut probe = tokio::time::interval(ping_interval.min(pong_grace) / 2);
        probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_activity = Instant::now();
        let mut ping_deadline: Option<Instant> = None;
        let mut quit_reason: Option<String> = None;

        loop {
            tokio::select! {
                inbound = lines.next() => match inbound {
                    Some(Ok(line)) => {
                        // Any inbound traffic proves liveness.
                        last_activity = Instant::now();
                        ping_deadline = None;

                        if line.trim().is_empty() {
                            continue;
                        }
                        if !self.handle_line(&line, &mut session, &tx, &mut quit_reason).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                    None => {
                        info!("Client disconnected");
                        break;
                    }
                },

                _ = probe.tick() => {
                    let now = Instant::now();
                    if let Some(deadline) = ping_deadline {
                        if now >= deadline {
                            info!("Ping timeout, reaping connection");
                            quit_reason = Some("Ping timeout".to_string());
                            break;
                        }
                    } else if now.duration_since(last_activity) >= ping_interval {
                        let ping = Message::ping(self.directory.server_info.name.clone());
                        if tx.send(ping).await.is_err() {
                            break;
                        }
                        ping_deadline = Some(now + pong_grace);
                    }
                }
            }
        }

        // Implicit QUIT: release everything this connection held. A
        // pre-registration drop broadcasts nothing.
        let reason = quit_reason.unwrap_or_else(|| "Connection closed".to_string());
        if session.registered {
            self.directory.quit_user(&self.uid, &reason).await;
        } else {
            self.directory.unregister_link(&self.uid);
        }

        // Let the writer flush whatever is still queued.
        drop(tx);
        let _ = writer.await;

        info!("Connection closed");
        Ok(())
    }

    /// Parse and dispatch one line. Returns false when the connection
    /// should close.
    async fn handle_line(
        &self,
        line: &str,
        session: &mut Session,
        tx: &mpsc::Sender<Message>,
        quit_reason: &mut Option<String>,
    ) -> bool {
        let server_name = &self.directory.server_info.name;

        let msg = match line.parse::<Message>() {
            Ok(msg) => msg,
            Err(e) => {
                // A known command with missing parameters gets its 461;
                // anything else unparseable is dropped.
                if let Some(MessageParseError::MissingParams { command }) = e.parse_cause() {
                    let reply = HandlerError::NeedMoreParams(command.clone())
                        .to_irc_reply(server_name, session.nick_or_star());
                    if let Some(reply) = reply {
                        return tx.send(reply).await.is_ok();
                    }
                }
                debug!(error = %e, "Ignoring malformed line");
                return true;
            }
        };

        debug!(raw = %line, "Dispatching");

        let mut ctx = Context {
            uid: &self.uid,
            directory: &self.directory,
            sender: tx,
            session,
        };

        match self.registry.dispatch(&mut ctx, &msg).await {
            Ok(()) => true,
            Err(HandlerError::Quit(reason)) => {
                *quit_reason = Some(reason.unwrap_or_else(|| "Client Quit".to_string()));
                let _ = tx.send(Message::error("Closing Link")).await;
                false
            }
            Err(HandlerError::Send(_)) => false,
            Err(e) => {
                debug!(error = %e, "Handler error");
                match e.to_irc_reply(server_name, session.nick_or_star()) {
                    Some(reply) => tx.send(reply).await.is_ok(),
                    None => true,
                }
            }
        }
    }
}
