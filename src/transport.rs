//! Connection transports: plain TCP, TLS, and an in-memory pipe.
//!
//! Socket types stop here. The session and client only see `send_line`,
//! `next_line`, and `close`.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::DuplexStream;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls;
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::codec::LineCodec;
use crate::error::TransportError;

/// Options for establishing a connection.
#[derive(Clone, Debug, Default)]
pub struct TransportConfig {
    /// Connect with TLS.
    pub tls: bool,
    /// Skip TLS certificate verification (self-signed test servers).
    pub danger_accept_invalid_certs: bool,
}

/// A line-framed connection to a server.
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    Tcp {
        framed: Framed<TcpStream, LineCodec>,
    },
    Tls {
        framed: Framed<TlsStream<TcpStream>, LineCodec>,
    },
    /// In-memory stream, for tests and embedded servers.
    Pipe {
        framed: Framed<DuplexStream, LineCodec>,
    },
}

impl Transport {
    /// Open a TCP (or TLS, per `config.tls`) connection to `host:port`.
    pub async fn connect(
        host: &str,
        port: u16,
        config: &TransportConfig,
    ) -> Result<Transport, TransportError> {
        let tcp = TcpStream::connect((host, port)).await?;
        debug!(host, port, tls = config.tls, "transport connected");

        if !config.tls {
            return Ok(Transport::Tcp {
                framed: Framed::new(tcp, LineCodec),
            });
        }

        let tls_config = if config.danger_accept_invalid_certs {
            insecure_tls_config()
        } else {
            default_tls_config()
        };
        let connector = TlsConnector::from(Arc::new(tls_config));
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|_| TransportError::InvalidServerName(host.to_string()))?;
        let stream = connector.connect(server_name, tcp).await?;
        debug!(host, "tls handshake complete");
        Ok(Transport::Tls {
            framed: Framed::new(stream, LineCodec),
        })
    }

    /// Wrap one end of an in-memory duplex stream.
    pub fn pipe(stream: DuplexStream) -> Transport {
        Transport::Pipe {
            framed: Framed::new(stream, LineCodec),
        }
    }

    /// Write one line (CRLF appended) and flush it.
    pub async fn send_line(&mut self, line: String) -> Result<(), TransportError> {
        match self {
            Transport::Tcp { framed } => framed.send(line).await?,
            Transport::Tls { framed } => framed.send(line).await?,
            Transport::Pipe { framed } => framed.send(line).await?,
        }
        Ok(())
    }

    /// Next inbound line. `Ok(None)` means the peer closed the stream.
    pub async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        let item = match self {
            Transport::Tcp { framed } => framed.next().await,
            Transport::Tls { framed } => framed.next().await,
            Transport::Pipe { framed } => framed.next().await,
        };
        match item {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Flush and shut down the stream. Errors are ignored; closing a
    /// half-dead connection must not fail the disconnect path.
    pub async fn close(&mut self) {
        let _ = match self {
            Transport::Tcp { framed } => framed.close().await,
            Transport::Tls { framed } => framed.close().await,
            Transport::Pipe { framed } => framed.close().await,
        };
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Transport::Tcp { .. } => "Tcp",
            Transport::Tls { .. } => "Tls",
            Transport::Pipe { .. } => "Pipe",
        };
        f.debug_struct("Transport").field("kind", &kind).finish()
    }
}

fn default_tls_config() -> rustls::ClientConfig {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

fn insecure_tls_config() -> rustls::ClientConfig {
    rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InsecureVerifier))
        .with_no_client_auth()
}

#[derive(Debug)]
struct InsecureVerifier;

impl rustls::client::danger::ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::CryptoProvider::get_default()
            .map(|p| p.signature_verification_algorithms.supported_schemes())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pipe_round_trip() {
        let (near, far) = tokio::io::duplex(1024);
        let mut client_side = Transport::pipe(near);
        let mut server_side = Transport::pipe(far);

        client_side.send_line("NICK bob".to_string()).await.unwrap();
        assert_eq!(
            server_side.next_line().await.unwrap().as_deref(),
            Some("NICK bob")
        );

        server_side
            .send_line(":irc 001 bob :Welcome".to_string())
            .await
            .unwrap();
        assert_eq!(
            client_side.next_line().await.unwrap().as_deref(),
            Some(":irc 001 bob :Welcome")
        );
    }

    #[tokio::test]
    async fn close_then_read_yields_eof() {
        let (near, far) = tokio::io::duplex(1024);
        let mut client_side = Transport::pipe(near);
        let mut server_side = Transport::pipe(far);

        server_side.close().await;
        drop(server_side);
        assert!(client_side.next_line().await.unwrap().is_none());
    }
}
