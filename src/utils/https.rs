// The `https` module builds the shared hyper client used for upstream calls.

use std::sync::Arc;

use http_body_util::Full;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::Client, client::legacy::connect::HttpConnector, rt::TokioExecutor,
};
use rustls::crypto::{CryptoProvider, aws_lc_rs::default_provider};
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;
use tokio_util::bytes::Bytes;
use tracing::debug;

/// A type alias for the HTTPS connector.
pub type HttpsConnectorType = HttpsConnector<HttpConnector>;
/// A type alias for the Hyper client.
pub type HyperClient = Client<HttpsConnectorType, Full<Bytes>>;

/// Errors raised while preparing the HTTP client.
#[derive(Error, Debug)]
pub enum HttpsError {
    /// The platform certificate store could not be loaded.
    #[error("Failed to load native root certificates: {0}")]
    NativeRoots(#[from] std::io::Error),
    /// The TLS configuration was rejected.
    #[error("Invalid TLS configuration: {0}")]
    Tls(#[from] rustls::Error),
}

/// Creates a pooled HTTPS client trusting the platform's root certificates.
///
/// The client is cheap to clone and meant to be built once at start-up and
/// injected wherever upstream calls are made.
pub fn https_client() -> Result<HyperClient, HttpsError> {
    // Another component may already have installed a provider; either way one is in place.
    let _ = CryptoProvider::install_default(default_provider());

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build();

    debug!("HTTPS client ready (native roots)");
    Ok(Client::builder(TokioExecutor::new()).build(https))
}

/// Creates a client trusting exactly `roots`. Plain `http://` URLs are allowed
/// as well, which is what local fakes of the upstream use.
pub fn https_client_with_roots(roots: RootCertStore) -> Result<HyperClient, HttpsError> {
    let config = ClientConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

    let https = HttpsConnectorBuilder::new()
        .with_tls_config(config)
        .https_or_http()
        .enable_http1()
        .build();

    debug!("HTTPS client ready (explicit roots)");
    Ok(Client::builder(TokioExecutor::new()).build(https))
}
