//! Gateway - the listener that accepts incoming connections.
//!
//! Binds one socket, plaintext or TLS depending on the startup flag, and
//! spawns a Connection supervisor task per accepted peer. On the TLS
//! variant the handshake (with client certificate verification against
//! the configured CA) runs inside the per-connection task, so a failed
//! handshake never disturbs the accept loop.

use std::io::{BufReader, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;

use rustls_pemfile::{certs, private_key};
use tokio::net::TcpListener;
use tokio_rustls::rustls::pki_types::CertificateDer;
use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

use crate::config::{LivenessConfig, TlsConfig};
use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Directory;

/// The Gateway accepts incoming connections and spawns supervisors.
pub struct Gateway {
    listener: TcpListener,
    tls_acceptor: Option<TlsAcceptor>,
    directory: Arc<Directory>,
    registry: Arc<Registry>,
    liveness: LivenessConfig,
}

impl Gateway {
    /// Bind the listener. With `tls_config` set, accepted connections go
    /// through the mutual-verification TLS handshake before any IRC
    /// traffic.
    pub async fn bind(
        addr: SocketAddr,
        tls_config: Option<&TlsConfig>,
        liveness: LivenessConfig,
        directory: Arc<Directory>,
        registry: Arc<Registry>,
    ) -> anyhow::Result<Self> {
        let tls_acceptor = match tls_config {
            Some(cfg) => Some(Self::load_tls(cfg)?),
            None => None,
        };

        let listener = TcpListener::bind(addr).await?;
        info!(
            addr = %listener.local_addr()?,
            tls = tls_acceptor.is_some(),
            "Listener bound"
        );

        Ok(Self {
            listener,
            tls_acceptor,
            directory,
            registry,
            liveness,
        })
    }

    /// The bound address, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Build a TlsAcceptor requiring client certificates signed by the
    /// configured CA.
    fn load_tls(config: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
        let cert_file = std::fs::read(&config.cert_path)?;
        let cert_reader = &mut BufReader::new(Cursor::new(cert_file));
        let certs_chain: Vec<CertificateDer<'static>> =
            certs(cert_reader).collect::<Result<Vec<_>, _>>()?;
        if certs_chain.is_empty() {
            anyhow::bail!("no certificates found in {}", config.cert_path);
        }

        let key_file = std::fs::read(&config.key_path)?;
        let key_reader = &mut BufReader::new(Cursor::new(key_file));
        let key = private_key(key_reader)?
            .ok_or_else(|| anyhow::anyhow!("no private key found in {}", config.key_path))?;

        let ca_file = std::fs::read(&config.ca_path)?;
        let ca_reader = &mut BufReader::new(Cursor::new(ca_file));
        let mut roots = RootCertStore::empty();
        for cert in certs(ca_reader) {
            roots.add(cert?)?;
        }
        if roots.is_empty() {
            anyhow::bail!("no CA certificates found in {}", config.ca_path);
        }

        let verifier = WebPkiClientVerifier::builder(Arc::new(roots)).build()?;
        let tls_config = ServerConfig::builder()
            .with_client_cert_verifier(verifier)
            .with_single_cert(certs_chain, key)?;

        Ok(TlsAcceptor::from(Arc::new(tls_config)))
    }

    /// Run the accept loop forever.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let uid = self.directory.uid_gen.next();
                    info!(%uid, %addr, "Connection accepted");

                    let connection = Connection::new(
                        uid.clone(),
                        addr,
                        Arc::clone(&self.directory),
                        Arc::clone(&self.registry),
                        self.liveness.clone(),
                    );

                    match &self.tls_acceptor {
                        Some(acceptor) => {
                            let acceptor = acceptor.clone();
                            tokio::spawn(async move {
                                match acceptor.accept(stream).await {
                                    Ok(tls_stream) => {
                                        if let Err(e) = connection.run(tls_stream).await {
                                            error!(%uid, %addr, error = %e, "Connection error");
                                        }
                                    }
                                    Err(e) => {
                                        warn!(%addr, error = %e, "TLS handshake failed");
                                    }
                                }
                            });
                        }
                        None => {
                            tokio::spawn(async move {
                                if let Err(e) = connection.run(stream).await {
                                    error!(%uid, %addr, error = %e, "Connection error");
                                }
                            });
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
