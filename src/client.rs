//! HTTP transport used by the executor.
//!
//! [`Transport`] is the seam between the retry state machine and the
//! network: one call is one POST of an already-serialized payload.
//! [`HyperTransport`] implements it on a connection-pooled hyper client
//! over rustls. Certificate verification can be switched off for test
//! endpoints with self-signed certificates.

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};

use crate::error::{NoteDispatchError, TransportError};

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Full<Bytes>>;

/// Status and body text of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

// async_trait keeps Transport object-safe: the executor holds Arc<dyn Transport>.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, body: Bytes) -> Result<RawResponse, TransportError>;
}

pub struct HyperTransport {
    client: HttpClient,
    uri: Uri,
    headers: HeaderMap,
}

impl HyperTransport {
    pub fn new(
        url: &str,
        token: Option<&str>,
        verify_tls: bool,
        pool_size: usize,
    ) -> Result<Self, NoteDispatchError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| NoteDispatchError::UriParse {
                source: Box::new(e),
            })?;
        Ok(Self {
            client: build_http_client(verify_tls, pool_size),
            uri,
            headers: request_headers(token)?,
        })
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn post(&self, body: Bytes) -> Result<RawResponse, TransportError> {
        let mut req_builder = hyper::Request::builder()
            .method(Method::POST)
            .uri(self.uri.clone());

        for (key, value) in &self.headers {
            req_builder = req_builder.header(key, value);
        }

        let req = req_builder
            .body(Full::new(body))
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| TransportError::Request(describe_client_error(&e)))?;

        let status = response.status().as_u16();
        let collected = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        })
    }
}

/// The legacy client error hides the interesting part in its source chain.
fn describe_client_error(error: &hyper_util::client::legacy::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub fn request_headers(token: Option<&str>) -> Result<HeaderMap, NoteDispatchError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

#[must_use]
pub fn build_http_client(verify_tls: bool, pool_size: usize) -> HttpClient {
    // Several rustls crypto providers may be compiled in; pin ring explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = if verify_tls {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build()
    } else {
        tracing::warn!("TLS certificate verification is disabled");
        let tls = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new()))
            .with_no_client_auth();
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build()
    };

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(pool_size)
        .build(https)
}

/// Verifier behind `--insecure`: accepts any server certificate but still
/// checks handshake signatures against the ring provider's algorithms.
#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCertificate {
    fn new() -> Self {
        Self {
            algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for AcceptAnyCertificate {
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
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_without_token() {
        let headers = request_headers(None).unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn empty_token_is_ignored() {
        let headers = request_headers(Some("")).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_token_is_sensitive() {
        let headers = request_headers(Some("abc123")).unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth, "Bearer abc123");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(request_headers(Some("abc\n123")).is_err());
    }

    #[tokio::test]
    async fn transport_rejects_unparseable_url() {
        assert!(HyperTransport::new("http://exa mple.com", None, true, 4).is_err());
    }

    #[tokio::test]
    async fn insecure_transport_builds() {
        assert!(HyperTransport::new("https://localhost:8443/notes", None, false, 4).is_ok());
    }
}
