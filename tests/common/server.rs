//! Test server management: spawns and manages wrend instances.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

/// A wrend instance under test.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: PathBuf,
}

impl TestServer {
    /// Spawn a server on the given port with default liveness timers.
    #[allow(dead_code)]
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::spawn_with_liveness(port, 120, 30).await
    }

    /// Spawn a server with custom liveness timers (seconds).
    pub async fn spawn_with_liveness(
        port: u16,
        ping_interval: u64,
        pong_grace: u64,
    ) -> anyhow::Result<Self> {
        let data_dir = std::env::temp_dir().join(format!("wrend-test-{}", port));
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "irc.test.local"
network = "TestNet"
description = "Test IRC Server"

[motd]
lines = ["- Test server"]

[liveness]
ping_interval_secs = {}
pong_grace_secs = {}
"#,
            ping_interval, pong_grace
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_wrend"))
            .arg("--port")
            .arg(port.to_string())
            .arg("--config")
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    /// Wait until the server accepts connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server failed to start within 5 seconds")
    }

    /// The server's address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
