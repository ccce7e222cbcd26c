//! Provider media download with one optional unauthenticated fallback.

use bytes::Bytes;
use futures_util::Stream;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

/// How to authenticate a media GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No auth header.
    None,
    /// Provider API key, sent as `Authorization: App <key>` (Infobip).
    ApiKey(String),
    /// HTTP Basic credentials (Twilio account SID and auth token).
    Basic { username: String, password: String },
}

/// Credentials plus the provider's fallback policy.
#[derive(Debug, Clone)]
pub struct MediaAuth {
    pub credentials: Credentials,
    /// When true, a failed authenticated attempt is retried once without credentials
    /// (some providers hand out short-lived public media links).
    pub fallback_unauthenticated: bool,
}

impl MediaAuth {
    pub fn new(credentials: Credentials, fallback_unauthenticated: bool) -> Self {
        Self {
            credentials,
            fallback_unauthenticated,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("media download returned status {status}")]
    Status { status: u16, body: String },
    #[error("media download failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// HTTP status of the final attempt, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// A successful media response whose body has not been read yet.
#[derive(Debug)]
pub struct FetchedMedia {
    content_type: Option<String>,
    response: reqwest::Response,
}

impl FetchedMedia {
    /// Content-Type header of the response, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Body as a chunked stream; nothing is buffered beyond the current chunk.
    pub fn into_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> {
        self.response.bytes_stream()
    }
}

/// Downloads provider media URLs.
#[derive(Clone, Default)]
pub struct MediaFetcher {
    client: reqwest::Client,
}

impl MediaFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` with the configured credentials. If that attempt fails and the policy allows it,
    /// try exactly once more without credentials. The error always describes the last attempt.
    pub async fn fetch(&self, url: &str, auth: &MediaAuth) -> Result<FetchedMedia, FetchError> {
        log::info!("fetching media from {}", url);
        let err = match self.attempt(url, &auth.credentials).await {
            Ok(media) => return Ok(media),
            Err(e) => e,
        };
        if !auth.fallback_unauthenticated || auth.credentials == Credentials::None {
            log::warn!("media fetch failed for {}: {}", url, err);
            return Err(err);
        }
        log::warn!(
            "authenticated media fetch failed ({}), retrying without credentials",
            err
        );
        let result = self.attempt(url, &Credentials::None).await;
        if let Err(ref e) = result {
            log::warn!("unauthenticated media fetch failed for {}: {}", url, e);
        }
        result
    }

    async fn attempt(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<FetchedMedia, FetchError> {
        let req = self.client.get(url);
        let req = match credentials {
            Credentials::None => req,
            Credentials::ApiKey(key) => req
                .header(AUTHORIZATION, format!("App {}", key))
                .header(ACCEPT, "application/json"),
            Credentials::Basic { username, password } => req.basic_auth(username, Some(password)),
        };
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            log::debug!("media fetch status {} body: {}", status, body);
            return Err(FetchError::Status { status, body });
        }
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        Ok(FetchedMedia {
            content_type,
            response: res,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collect(media: FetchedMedia) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stream = Box::pin(media.into_stream());
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    fn api_key_auth(fallback: bool) -> MediaAuth {
        MediaAuth::new(Credentials::ApiKey("key-1".to_string()), fallback)
    }

    #[tokio::test]
    async fn authenticated_success_needs_no_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/1"))
            .and(header("authorization", "App key-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = MediaFetcher::default();
        let media = fetcher
            .fetch(&format!("{}/media/1", server.uri()), &api_key_auth(true))
            .await
            .unwrap();
        assert_eq!(media.content_type(), Some("application/pdf"));
        assert_eq!(collect(media).await, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn auth_failure_falls_back_once_without_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/1"))
            .and(header("authorization", "App key-1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"public".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = MediaFetcher::default();
        let media = fetcher
            .fetch(&format!("{}/media/1", server.uri()), &api_key_auth(true))
            .await
            .unwrap();
        assert_eq!(collect(media).await, b"public");
    }

    #[tokio::test]
    async fn both_attempts_failing_reports_fallback_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/1"))
            .and(header("authorization", "App key-1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = MediaFetcher::default();
        let err = fetcher
            .fetch(&format!("{}/media/1", server.uri()), &api_key_auth(true))
            .await
            .unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "gone");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_fallback_when_policy_disables_it() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/2"))
            .and(header("authorization", "Basic QUMxMjM6c2VjcmV0"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let auth = MediaAuth::new(
            Credentials::Basic {
                username: "AC123".to_string(),
                password: "secret".to_string(),
            },
            false,
        );
        let err = MediaFetcher::default()
            .fetch(&format!("{}/media/2", server.uri()), &auth)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn unreachable_url_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = MediaFetcher::default()
            .fetch(
                &format!("http://127.0.0.1:{}/media", port),
                &api_key_auth(true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(err.status(), None);
    }
}
