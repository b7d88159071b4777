//! HTTP-backed context index.
//!
//! Delegates search to an external vector/keyword service:
//! `POST {base_url}/search` with `{"query": ..., "k": ...}`, answered by
//! `[{"text": ..., "score": ..., "source": ...}]`.

use async_trait::async_trait;
use serde::Serialize;

use super::{ContextIndex, ScoredChunk};
use crate::constants::REMOTE_SEARCH_PATH;
use crate::{IndexError, ServiceError, ServiceResult};

#[derive(Serialize)]
struct SearchReq<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Clone, Debug)]
pub struct RemoteIndex {
    client: reqwest::Client,
    search_url: reqwest::Url,
}

impl RemoteIndex {
    /// Creates a client for the index at `base_url`.
    ///
    /// No request is made here; reachability is only discovered on search.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> ServiceResult<Self> {
        let mut base = reqwest::Url::parse(base_url)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid index URL '{base_url}': {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ServiceError::InvalidInput(format!(
                "index URL must use http or https, got '{}'",
                base.scheme()
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url = base
            .join(REMOTE_SEARCH_PATH)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid index URL '{base_url}': {e}")))?;

        Ok(Self {
            client: reqwest::Client::new(),
            search_url,
        })
    }

    pub fn search_url(&self) -> &str {
        self.search_url.as_str()
    }
}

#[async_trait]
impl ContextIndex for RemoteIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let response = self
            .client
            .post(self.search_url.clone())
            .json(&SearchReq { query, k })
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::Unavailable(format!(
                "{} answered {}",
                self.search_url, status
            )));
        }

        response
            .json::<Vec<ScoredChunk>>()
            .await
            .map_err(|e| IndexError::InvalidResponse(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn search_url_is_joined_onto_base_path() {
        let index = RemoteIndex::new("http://localhost:6333/kb").unwrap();
        assert_eq!(index.search_url(), "http://localhost:6333/kb/search");
        let index = RemoteIndex::new("http://localhost:6333/").unwrap();
        assert_eq!(index.search_url(), "http://localhost:6333/search");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            RemoteIndex::new("ftp://example.com"),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            RemoteIndex::new("not a url"),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn posts_query_and_decodes_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({"query": "dose de botox", "k": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"text": "Dose glabelar: 20U", "score": 0.91, "source": "bula.md"},
                {"text": "Intervalo mínimo de 90 dias", "score": 0.42}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let index = RemoteIndex::new(&server.uri()).unwrap();
        let hits = index.search("dose de botox", 3).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source.as_deref(), Some("bula.md"));
        assert_eq!(hits[1].source, None);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let index = RemoteIndex::new(&server.uri()).unwrap();
        let err = index.search("q", 5).await.unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let index = RemoteIndex::new(&server.uri()).unwrap();
        let err = index.search("q", 5).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let index = RemoteIndex::new(&uri).unwrap();
        let err = index.search("q", 5).await.unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }
}
