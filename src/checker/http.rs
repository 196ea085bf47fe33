// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Retries once when the request fails at the transport level
// - Follows redirects itself, hop by hop, and remembers the first
//   permanent (301) hop so stale links can be reported
// - Limits how many requests are on the wire at the same time
//
// Why follow redirects by hand?
// - reqwest's built-in policy follows and forgets: the final response does
//   not say which hops were permanent
// - Walking the chain here lets us watch every hop of one request
// =============================================================================

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::CheckerConfig;
use crate::error::{ConfigError, ProbeError};

/// The network result of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Final answer was 2xx and no permanent redirect was seen
    Ok,
    /// Final answer was 2xx, but the first permanent hop pointed here
    PermanentRedirect { target: String },
    /// Final answer was neither 2xx nor 3xx
    StatusError { code: u16 },
    /// No final status could be obtained
    TransportError { message: String },
}

/// The part of the configuration the probe needs.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub retries: u32,
    pub max_redirects: usize,
    pub max_in_flight: usize,
    pub ignore_301: bool,
    pub user_agent: String,
}

impl From<&CheckerConfig> for ProbeSettings {
    fn from(config: &CheckerConfig) -> Self {
        Self {
            timeout: config.timeout,
            retries: config.retries,
            max_redirects: config.max_redirects,
            max_in_flight: config.max_in_flight,
            ignore_301: config.ignore_301,
            user_agent: config.user_agent.clone(),
        }
    }
}

// A permanent hop seen while following one request
#[derive(Debug, Clone)]
struct RedirectHop {
    from: Url,
    to: Url,
}

/// Issues existence checks. Cheap to share by reference across tasks.
pub struct Prober {
    client: Client,
    permits: Semaphore,
    settings: ProbeSettings,
}

impl Prober {
    pub fn new(settings: ProbeSettings) -> Result<Self, ConfigError> {
        // Redirects are walked in probe(), the client must not follow them
        let client = Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            permits: Semaphore::new(settings.max_in_flight.max(1)),
            settings,
        })
    }

    // Checks a single URL and classifies the final answer
    //
    // HTTP status codes:
    // - 200-299: Success (or a permanent redirect warning)
    // - 300-399: Followed; only final if it could not be followed
    // - 400-599: Status error, severity is decided by the caller
    pub async fn probe(&self, url: &Url) -> ProbeOutcome {
        match self.follow(url).await {
            Ok((status, first_permanent)) => classify(url, status, first_permanent),
            Err(ProbeError::UnfollowedRedirect { status }) => {
                error!(%url, status, "final redirect status although redirects are followed");
                ProbeOutcome::TransportError {
                    message: ProbeError::UnfollowedRedirect { status }.to_string(),
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "probe failed");
                ProbeOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        }
    }

    // Walks the redirect chain of one request
    //
    // Returns the final status and the first 301 hop, if any.
    async fn follow(&self, start: &Url) -> Result<(StatusCode, Option<RedirectHop>), ProbeError> {
        let mut current = start.clone();
        let mut visited = HashSet::from([start.clone()]);
        let mut first_permanent: Option<RedirectHop> = None;

        for _ in 0..=self.settings.max_redirects {
            let response = self.head_with_retry(&current).await?;
            let status = response.status();

            if !status.is_redirection() {
                return Ok((status, first_permanent));
            }

            let Some(location) = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Err(ProbeError::UnfollowedRedirect {
                    status: status.as_u16(),
                });
            };

            let mut next = current
                .join(location)
                .map_err(|source| ProbeError::BadLocation {
                    location: location.to_string(),
                    source,
                })?;
            next.set_fragment(None);

            debug!(from = %current, to = %next, status = status.as_u16(), "redirect hop");

            if status == StatusCode::MOVED_PERMANENTLY
                && !self.settings.ignore_301
                && first_permanent.is_none()
            {
                first_permanent = Some(RedirectHop {
                    from: current.clone(),
                    to: next.clone(),
                });
            }

            if !visited.insert(next.clone()) {
                return Err(ProbeError::RedirectLoop(next.to_string()));
            }
            current = next;
        }

        Err(ProbeError::TooManyRedirects(self.settings.max_redirects))
    }

    // Sends one HEAD request, retrying transport failures
    async fn head_with_retry(&self, url: &Url) -> Result<reqwest::Response, ProbeError> {
        let _permit = self.permits.acquire().await?;

        let mut attempt = 0;
        loop {
            match self.client.head(url.clone()).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.settings.retries => {
                    attempt += 1;
                    debug!(%url, attempt, error = %e, "retrying after transport failure");
                }
                Err(e) => return Err(ProbeError::Transport(e)),
            }
        }
    }
}

fn classify(url: &Url, status: StatusCode, first_permanent: Option<RedirectHop>) -> ProbeOutcome {
    if status.is_success() {
        match first_permanent {
            Some(hop) => {
                debug!(%url, from = %hop.from, to = %hop.to, "permanent redirect");
                ProbeOutcome::PermanentRedirect {
                    target: hop.to.to_string(),
                }
            }
            None => ProbeOutcome::Ok,
        }
    } else {
        ProbeOutcome::StatusError {
            code: status.as_u16(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_secs(5),
            retries: 1,
            max_redirects: 10,
            max_in_flight: 8,
            ignore_301: false,
            user_agent: "link-sentinel-test".to_string(),
        }
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    async fn mount(server: &MockServer, p: &str, response: ResponseTemplate) {
        Mock::given(method("HEAD"))
            .and(path(p))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_ok() {
        let server = MockServer::start().await;
        mount(&server, "/ok", ResponseTemplate::new(200)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(prober.probe(&url(&server, "/ok")).await, ProbeOutcome::Ok);
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        mount(&server, "/gone", ResponseTemplate::new(404)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(
            prober.probe(&url(&server, "/gone")).await,
            ProbeOutcome::StatusError { code: 404 }
        );
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        mount(&server, "/boom", ResponseTemplate::new(503)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(
            prober.probe(&url(&server, "/boom")).await,
            ProbeOutcome::StatusError { code: 503 }
        );
    }

    #[tokio::test]
    async fn test_permanent_redirect_then_ok() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/old",
            ResponseTemplate::new(301).insert_header("Location", "/new"),
        )
        .await;
        mount(&server, "/new", ResponseTemplate::new(200)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(
            prober.probe(&url(&server, "/old")).await,
            ProbeOutcome::PermanentRedirect {
                target: url(&server, "/new").to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_first_permanent_hop_is_reported() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/a",
            ResponseTemplate::new(302).insert_header("Location", "/b"),
        )
        .await;
        mount(
            &server,
            "/b",
            ResponseTemplate::new(301).insert_header("Location", "/c"),
        )
        .await;
        mount(
            &server,
            "/c",
            ResponseTemplate::new(301).insert_header("Location", "/d"),
        )
        .await;
        mount(&server, "/d", ResponseTemplate::new(200)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(
            prober.probe(&url(&server, "/a")).await,
            ProbeOutcome::PermanentRedirect {
                target: url(&server, "/c").to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_temporary_redirect_is_transparent() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/tmp",
            ResponseTemplate::new(307).insert_header("Location", "/final"),
        )
        .await;
        mount(&server, "/final", ResponseTemplate::new(200)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(prober.probe(&url(&server, "/tmp")).await, ProbeOutcome::Ok);
    }

    #[tokio::test]
    async fn test_ignore_301() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/old",
            ResponseTemplate::new(301).insert_header("Location", "/new"),
        )
        .await;
        mount(&server, "/new", ResponseTemplate::new(200)).await;

        let prober = Prober::new(ProbeSettings {
            ignore_301: true,
            ..settings()
        })
        .unwrap();
        assert_eq!(prober.probe(&url(&server, "/old")).await, ProbeOutcome::Ok);
    }

    #[tokio::test]
    async fn test_redirect_to_broken_target() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/old",
            ResponseTemplate::new(301).insert_header("Location", "/missing"),
        )
        .await;
        mount(&server, "/missing", ResponseTemplate::new(404)).await;

        let prober = Prober::new(settings()).unwrap();
        assert_eq!(
            prober.probe(&url(&server, "/old")).await,
            ProbeOutcome::StatusError { code: 404 }
        );
    }

    #[tokio::test]
    async fn test_redirect_without_location_is_an_internal_error() {
        let server = MockServer::start().await;
        mount(&server, "/weird", ResponseTemplate::new(302)).await;

        let prober = Prober::new(settings()).unwrap();
        match prober.probe(&url(&server, "/weird")).await {
            ProbeOutcome::TransportError { message } => {
                assert!(message.contains("302"), "unexpected message: {message}")
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redirect_loop() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/ping",
            ResponseTemplate::new(302).insert_header("Location", "/pong"),
        )
        .await;
        mount(
            &server,
            "/pong",
            ResponseTemplate::new(302).insert_header("Location", "/ping"),
        )
        .await;

        let prober = Prober::new(settings()).unwrap();
        assert!(matches!(
            prober.probe(&url(&server, "/ping")).await,
            ProbeOutcome::TransportError { .. }
        ));
    }

    #[tokio::test]
    async fn test_too_many_redirects() {
        let server = MockServer::start().await;
        for i in 0..4 {
            mount(
                &server,
                &format!("/hop{i}"),
                ResponseTemplate::new(302).insert_header("Location", format!("/hop{}", i + 1)),
            )
            .await;
        }

        let prober = Prober::new(ProbeSettings {
            max_redirects: 2,
            ..settings()
        })
        .unwrap();
        match prober.probe(&url(&server, "/hop0")).await {
            ProbeOutcome::TransportError { message } => {
                assert!(message.contains("too many redirects"))
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried_then_reported() {
        // Grab a free port, then close the listener so nothing answers there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let dead = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();

        let prober = Prober::new(settings()).unwrap();
        assert!(matches!(
            prober.probe(&dead).await,
            ProbeOutcome::TransportError { .. }
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_error() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/slow",
            ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
        )
        .await;

        let prober = Prober::new(ProbeSettings {
            timeout: Duration::from_millis(50),
            ..settings()
        })
        .unwrap();
        assert!(matches!(
            prober.probe(&url(&server, "/slow")).await,
            ProbeOutcome::TransportError { .. }
        ));
        // One try plus one retry
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_closed_request_limiter_is_a_transport_error() {
        let server = MockServer::start().await;
        mount(&server, "/ok", ResponseTemplate::new(200)).await;

        let prober = Prober::new(settings()).unwrap();
        prober.permits.close();
        assert!(matches!(
            prober.probe(&url(&server, "/ok")).await,
            ProbeOutcome::TransportError { .. }
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prober_is_shareable() {
        let server = MockServer::start().await;
        mount(&server, "/ok", ResponseTemplate::new(200)).await;

        let prober = Arc::new(Prober::new(settings()).unwrap());
        let target = url(&server, "/ok");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let prober = Arc::clone(&prober);
                let target = target.clone();
                tokio::spawn(async move { prober.probe(&target).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), ProbeOutcome::Ok);
        }
    }
}
