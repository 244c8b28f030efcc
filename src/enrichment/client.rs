//! Lyrics/cover lookup HTTP client
//!
//! Two endpoints, both plain GET with the track fields in the query string:
//! - `{base}/lyrics?title=..&artist=..&album=..` answers with LRC text
//! - `{base}/cover?title=..&artist=..&album=..` answers with image bytes
//!
//! Default service: https://api.lrc.cx

use std::time::Duration;

use reqwest::StatusCode;

use crate::enrichment::domain::{EnrichmentError, FetchedCover, TrackQuery};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Lookup service client
#[derive(Debug, Clone)]
pub struct LyricsApiClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl LyricsApiClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("melody-keeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Fetch LRC lyrics for a track.
    pub async fn fetch_lyrics(&self, query: &TrackQuery) -> Result<String, EnrichmentError> {
        let response = self.get("lyrics", query).await?;
        let text = response
            .text()
            .await
            .map_err(|e| EnrichmentError::from_reqwest(&e, self.timeout))?;

        if text.is_empty() {
            return Err(EnrichmentError::EmptyBody);
        }
        Ok(text)
    }

    /// Fetch cover art for a track.
    pub async fn fetch_cover(&self, query: &TrackQuery) -> Result<FetchedCover, EnrichmentError> {
        let response = self.get("cover", query).await?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| EnrichmentError::from_reqwest(&e, self.timeout))?
            .to_vec();

        if data.is_empty() {
            return Err(EnrichmentError::EmptyBody);
        }
        Ok(FetchedCover { data, mime_type })
    }

    async fn get(
        &self,
        endpoint: &str,
        query: &TrackQuery,
    ) -> Result<reqwest::Response, EnrichmentError> {
        let url = format!("{}/{}?{}", self.base_url, endpoint, build_query(query));
        tracing::debug!(target: "enrichment", %url, "Lookup request");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichmentError::from_reqwest(&e, self.timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(EnrichmentError::Status(status.as_u16()));
        }

        Ok(response)
    }
}

/// URL-encoded query string. `title` is always present; `artist` and
/// `album` only when non-empty.
pub fn build_query(query: &TrackQuery) -> String {
    let mut params = vec![format!("title={}", urlencoding::encode(&query.title))];
    if !query.artist.is_empty() {
        params.push(format!("artist={}", urlencoding::encode(&query.artist)));
    }
    if !query.album.is_empty() {
        params.push(format!("album={}", urlencoding::encode(&query.album)));
    }
    params.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> LyricsApiClient {
        LyricsApiClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    /// Query string of the only request the server saw.
    async fn only_query(server: &MockServer) -> String {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        requests[0].url.query().unwrap_or_default().to_string()
    }

    #[test]
    fn test_query_encoding() {
        let q = TrackQuery::new("Hello World", "AC/DC", "");
        assert_eq!(build_query(&q), "title=Hello%20World&artist=AC%2FDC");

        let q = TrackQuery::new("Só", "", "Álbum & Co");
        assert_eq!(build_query(&q), "title=S%C3%B3&album=%C3%81lbum%20%26%20Co");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(client("http://localhost:1/").base_url, "http://localhost:1");
    }

    #[tokio::test]
    async fn test_fetch_lyrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lyrics"))
            .and(query_param("title", "A"))
            .and(query_param("artist", "B"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[00:01.00]La la"))
            .expect(1)
            .mount(&server)
            .await;

        let lyrics = client(&server.uri())
            .fetch_lyrics(&TrackQuery::new("A", "B", ""))
            .await
            .unwrap();

        assert_eq!(lyrics, "[00:01.00]La la");
        assert_eq!(only_query(&server).await, "title=A&artist=B");
    }

    #[tokio::test]
    async fn test_fetch_cover_keeps_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cover"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
            )
            .mount(&server)
            .await;

        let cover = client(&server.uri())
            .fetch_cover(&TrackQuery::new("A", "", "C"))
            .await
            .unwrap();

        assert_eq!(cover.mime_type, "image/png");
        assert_eq!(cover.data, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(only_query(&server).await, "title=A&album=C");
    }

    #[tokio::test]
    async fn test_non_200_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .fetch_lyrics(&TrackQuery::new("A", "B", ""))
            .await
            .unwrap_err();
        assert_eq!(err, EnrichmentError::Status(404));
    }

    #[tokio::test]
    async fn test_empty_body_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let client = client(&server.uri());
        let query = TrackQuery::new("A", "B", "");

        assert_eq!(
            client.fetch_lyrics(&query).await.unwrap_err(),
            EnrichmentError::EmptyBody
        );
        assert_eq!(
            client.fetch_cover(&query).await.unwrap_err(),
            EnrichmentError::EmptyBody
        );
    }

    #[tokio::test]
    async fn test_whitespace_lyrics_are_a_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lyrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\n"))
            .mount(&server)
            .await;

        let lyrics = client(&server.uri())
            .fetch_lyrics(&TrackQuery::new("A", "", ""))
            .await
            .unwrap();
        assert_eq!(lyrics, "\n");
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        let client = LyricsApiClient::new(server.uri(), Duration::from_millis(300)).unwrap();

        let err = client
            .fetch_lyrics(&TrackQuery::new("A", "", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .fetch_cover(&TrackQuery::new("A", "", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichmentError::Network(_)));
    }
}
