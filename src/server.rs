//! TLS listener.
//!
//! Accepts TCP connections, completes the TLS handshake with ALPN `h2`, and
//! runs one [`Connection`] per client on its own thread. A failing
//! connection is logged and dropped; the accept loop keeps going.

use std::fs::File;
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ServerConnection, StreamOwned};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::ServerError;

/// ALPN identifier for HTTP/2 over TLS.
pub const ALPN_H2: &[u8] = b"h2";

pub struct Server {
    listener: TcpListener,
    tls: Arc<rustls::ServerConfig>,
    config: ServerConfig,
}

impl Server {
    /// Load the certificate pair and bind the listening socket.
    pub fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let tls = load_tls_config(&config.cert_path, &config.key_path)?;
        let listener = TcpListener::bind(config.bind_addr)?;
        Ok(Self {
            listener,
            tls: Arc::new(tls),
            config,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    pub fn run(&self) {
        info!(addr = ?self.local_addr().ok(), "listening");
        loop {
            let (sock, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "accept failed");
                    continue;
                }
            };

            info!(%peer, "accepted connection");
            if let Err(e) = sock.set_read_timeout(Some(self.config.read_timeout)) {
                warn!(%peer, error = %e, "could not set read timeout");
                continue;
            }

            let tls = Arc::clone(&self.tls);
            let spawned = thread::Builder::new()
                .name(format!("h2-conn-{}", peer))
                .spawn(move || match handle_connection(tls, sock) {
                    Ok(()) => debug!(%peer, "connection finished"),
                    Err(e) => warn!(%peer, error = %e, "connection failed"),
                });
            if let Err(e) = spawned {
                error!(%peer, error = %e, "failed to spawn connection thread");
            }
        }
    }
}

fn handle_connection(tls: Arc<rustls::ServerConfig>, sock: TcpStream) -> Result<(), ServerError> {
    let conn = ServerConnection::new(tls)?;
    let mut stream = StreamOwned::new(conn, sock);

    while stream.conn.is_handshaking() {
        stream.conn.complete_io(&mut stream.sock)?;
    }

    let negotiated = stream.conn.alpn_protocol();
    if negotiated != Some(ALPN_H2) {
        let got = negotiated.map(|p| String::from_utf8_lossy(p).into_owned());
        let _ = stream.sock.shutdown(Shutdown::Both);
        return Err(ServerError::AlpnMismatch(got));
    }

    let result = {
        let mut connection = Connection::new(&mut stream);
        let result = connection.run();
        if let Some(fingerprint) = connection.fingerprint() {
            info!(%fingerprint, "served fingerprint");
        }
        result
    };

    stream.conn.send_close_notify();
    let _ = stream.flush();
    let _ = stream.sock.shutdown(Shutdown::Both);

    result.map_err(ServerError::from)
}

/// Build a rustls server config advertising `h2` from PEM files.
pub fn load_tls_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<rustls::ServerConfig, ServerError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![ALPN_H2.to_vec()];
    Ok(config)
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let file = File::open(path)
        .map_err(|e| ServerError::Certificate(format!("{}: {}", path.display(), e)))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Certificate(format!("{}: {}", path.display(), e)))?;
    if certs.is_empty() {
        return Err(ServerError::Certificate(format!(
            "{}: no certificates found",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServerError> {
    let file = File::open(path)
        .map_err(|e| ServerError::Certificate(format!("{}: {}", path.display(), e)))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| ServerError::Certificate(format!("{}: {}", path.display(), e)))?
        .ok_or_else(|| {
            ServerError::Certificate(format!("{}: no private key found", path.display()))
        })
}
