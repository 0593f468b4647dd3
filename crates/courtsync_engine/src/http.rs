//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so different
//! implementations can sit underneath (reqwest, a loopback for tests).
//! The request shape is deliberately minimal: no custom headers, bodies
//! sent as `text/plain`. Nothing here triggers a CORS preflight, which
//! matters because the same wire format is shared with browser-based
//! devices talking to the same bucket.

use crate::clock::TimeSource;
use crate::config::SyncConfig;
use crate::transport::{BlobTransport, FetchOutcome, TransportError};
use std::sync::Arc;
use thiserror::Error;

/// Errors an [`HttpClient`] implementation reports.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The request exceeded the client's hard timeout.
    #[error("http request timed out")]
    Timeout,

    /// The request failed below the HTTP layer (DNS, TCP, TLS).
    #[error("http connection failed: {0}")]
    Connection(String),
}

/// A plain HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implement this to provide the actual HTTP layer. `is_online` is the
/// device's network-reachability signal: when it is false the transport
/// short-circuits without attempting a request.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for timeouts and connection failures; HTTP
    /// error statuses are returned as ordinary responses.
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;

    /// Sends a PUT request with the given body and content type.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for timeouts and connection failures.
    fn put(&self, url: &str, body: Vec<u8>, content_type: &str) -> Result<HttpResponse, HttpError>;

    /// The device's network-reachability signal.
    fn is_online(&self) -> bool;
}

/// HTTP-based blob transport against the remote key-value endpoint.
///
/// Resources are addressed as `base_url/bucket/key`. Reads append a
/// cache-busting query token so a response can never be served stale
/// from an intermediate cache; writes overwrite unconditionally.
pub struct HttpBlobTransport<C: HttpClient> {
    config: SyncConfig,
    client: C,
    clock: Arc<dyn TimeSource>,
}

impl<C: HttpClient> HttpBlobTransport<C> {
    /// Creates a transport for the endpoint described by `config`.
    pub fn new(config: SyncConfig, client: C, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            client,
            clock,
        }
    }

    fn map_error(e: HttpError) -> TransportError {
        match e {
            HttpError::Timeout => TransportError::Timeout,
            // Connection-level failures carry no status; they are still
            // worth retrying on the next tick.
            HttpError::Connection(_) => TransportError::Rejected { status: 0 },
        }
    }
}

impl<C: HttpClient> BlobTransport for HttpBlobTransport<C> {
    fn fetch(&self, key: &str) -> Result<FetchOutcome, TransportError> {
        if !self.client.is_online() {
            return Err(TransportError::Offline);
        }

        let url = format!(
            "{}?t={}",
            self.config.resource_url(key),
            self.clock.now_ms()
        );
        let response = self.client.get(&url).map_err(Self::map_error)?;

        match response.status {
            200..=299 => Ok(FetchOutcome::Present(response.body)),
            404 => Ok(FetchOutcome::Absent),
            status => Err(TransportError::Rejected { status }),
        }
    }

    fn store(&self, key: &str, body: Vec<u8>) -> Result<(), TransportError> {
        if !self.client.is_online() {
            return Err(TransportError::Offline);
        }

        let url = self.config.resource_url(key);
        let response = self
            .client
            .put(&url, body, "text/plain")
            .map_err(Self::map_error)?;

        match response.status {
            200..=299 => Ok(()),
            status => Err(TransportError::Rejected { status }),
        }
    }
}

/// Blocking reqwest-backed [`HttpClient`] with a hard timeout.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    reachability: Option<Box<dyn Fn() -> bool + Send + Sync>>,
}

impl ReqwestClient {
    /// Builds a client enforcing the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Connection`] if the underlying client cannot
    /// be constructed.
    pub fn new(config: &SyncConfig) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HttpError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            reachability: None,
        })
    }

    /// Installs a network-reachability probe.
    ///
    /// Without one the client assumes it is online and lets the request
    /// itself discover otherwise.
    pub fn with_reachability(
        mut self,
        probe: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.reachability = Some(Box::new(probe));
        self
    }

    fn map_reqwest_error(e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Connection(e.to_string())
        }
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(Self::map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(Self::map_reqwest_error)?
            .to_vec();
        Ok(HttpResponse { status, body })
    }

    fn put(&self, url: &str, body: Vec<u8>, content_type: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .map_err(Self::map_reqwest_error)?;
        let status = response.status().as_u16();
        Ok(HttpResponse {
            status,
            body: Vec::new(),
        })
    }

    fn is_online(&self) -> bool {
        self.reachability.as_ref().map_or(true, |probe| probe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct ScriptedClient {
        responses: Mutex<Vec<HttpResponse>>,
        requests: Mutex<Vec<(String, String, Option<String>)>>,
        offline: AtomicBool,
    }

    impl ScriptedClient {
        fn push_response(&self, status: u16, body: &[u8]) {
            self.responses.lock().push(HttpResponse {
                status,
                body: body.to_vec(),
            });
        }

        fn next_response(&self) -> Result<HttpResponse, HttpError> {
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                return Err(HttpError::Connection("no scripted response".into()));
            }
            Ok(responses.remove(0))
        }

        fn requests(&self) -> Vec<(String, String, Option<String>)> {
            self.requests.lock().clone()
        }
    }

    impl HttpClient for ScriptedClient {
        fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
            self.requests
                .lock()
                .push(("GET".into(), url.into(), None));
            self.next_response()
        }

        fn put(
            &self,
            url: &str,
            _body: Vec<u8>,
            content_type: &str,
        ) -> Result<HttpResponse, HttpError> {
            self.requests
                .lock()
                .push(("PUT".into(), url.into(), Some(content_type.into())));
            self.next_response()
        }

        fn is_online(&self) -> bool {
            !self.offline.load(Ordering::SeqCst)
        }
    }

    fn transport(client: ScriptedClient, now: i64) -> HttpBlobTransport<ScriptedClient> {
        HttpBlobTransport::new(
            SyncConfig::new("https://kvdb.io", "bucket1"),
            client,
            Arc::new(ManualClock::new(now)),
        )
    }

    #[test]
    fn fetch_appends_cache_buster() {
        let client = ScriptedClient::default();
        client.push_response(200, b"body");
        let transport = transport(client, 1234);

        let outcome = transport.fetch("club1").unwrap();
        assert_eq!(outcome, FetchOutcome::Present(b"body".to_vec()));

        let requests = transport.client.requests();
        assert_eq!(requests[0].1, "https://kvdb.io/bucket1/club1?t=1234");
    }

    #[test]
    fn not_found_is_absent() {
        let client = ScriptedClient::default();
        client.push_response(404, b"");
        let transport = transport(client, 0);
        assert_eq!(transport.fetch("club1").unwrap(), FetchOutcome::Absent);
    }

    #[test]
    fn other_statuses_are_rejections() {
        let client = ScriptedClient::default();
        client.push_response(429, b"slow down");
        let transport = transport(client, 0);
        assert_eq!(
            transport.fetch("club1"),
            Err(TransportError::Rejected { status: 429 })
        );
    }

    #[test]
    fn offline_short_circuits_without_request() {
        let client = ScriptedClient::default();
        client.offline.store(true, Ordering::SeqCst);
        let transport = transport(client, 0);

        assert_eq!(transport.fetch("club1"), Err(TransportError::Offline));
        assert_eq!(
            transport.store("club1", b"body".to_vec()),
            Err(TransportError::Offline)
        );
        assert!(transport.client.requests().is_empty());
    }

    #[test]
    fn store_uses_simple_content_type() {
        let client = ScriptedClient::default();
        client.push_response(200, b"");
        let transport = transport(client, 0);

        transport.store("club1", b"body".to_vec()).unwrap();

        let requests = transport.client.requests();
        assert_eq!(requests[0].0, "PUT");
        assert_eq!(requests[0].1, "https://kvdb.io/bucket1/club1");
        assert_eq!(requests[0].2.as_deref(), Some("text/plain"));
    }

    #[test]
    fn store_rejection_carries_status() {
        let client = ScriptedClient::default();
        client.push_response(503, b"");
        let transport = transport(client, 0);
        assert_eq!(
            transport.store("club1", b"body".to_vec()),
            Err(TransportError::Rejected { status: 503 })
        );
    }
}
