//! TLS connector construction.
//!
//! `wss://` hosts get a rustls configuration that either verifies the
//! server against the webpki root set or, when verification is disabled,
//! accepts any certificate while still checking handshake signatures.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_tungstenite::Connector;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Builds the connector for `config`, or `None` for plain `ws://` hosts.
///
/// # Errors
///
/// Returns [`ClientError::Tls`] if the crypto provider rejects the
/// default protocol versions.
pub(crate) fn connector(config: &ClientConfig) -> Result<Option<Connector>, ClientError> {
    if !config.is_secure() {
        return Ok(None);
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let tls = if config.tls_verify {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        tracing::warn!(host = %config.host, "tls certificate verification disabled");
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier(provider)))
            .with_no_client_auth()
    };

    Ok(Some(Connector::Rustls(Arc::new(tls))))
}

/// Accepts any server certificate.
#[derive(Debug)]
struct NoVerifier(Arc<CryptoProvider>);

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_hosts_need_no_connector() {
        let config = ClientConfig::default().with_host("ws://127.0.0.1:8080");
        assert!(matches!(connector(&config), Ok(None)));
    }

    #[test]
    fn secure_hosts_get_rustls() {
        let config = ClientConfig::default();
        assert!(matches!(connector(&config), Ok(Some(Connector::Rustls(_)))));
    }

    #[test]
    fn verification_can_be_disabled() {
        let config = ClientConfig::default().with_tls_verify(false);
        assert!(matches!(connector(&config), Ok(Some(Connector::Rustls(_)))));
    }
}
