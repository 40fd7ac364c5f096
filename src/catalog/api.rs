use crate::catalog::models::{QueryKey, SongPage};
use crate::error::CatalogError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
}

/// HTTP client for the song catalog service.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    inner: Arc<Inner>,
}

impl CatalogClient {
    const USER_AGENT: &'static str = concat!("cadenza/", env!("CARGO_PKG_VERSION"));

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(Self::USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// `GET songs?lang&seed&likeScore&page&perPage`
    pub async fn fetch_page(
        &self,
        key: &QueryKey,
        page: u32,
        per_page: u32,
    ) -> Result<SongPage, CatalogError> {
        let url = songs_url(&self.inner.base_url, key, page, per_page);
        tracing::debug!(%url, "fetch page");

        let response = self.inner.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }
        let page: SongPage = response.json().await?;
        Ok(page)
    }

    /// `GET songs/preview/{escapedCoverSeed}`, returning the raw audio payload.
    pub async fn fetch_preview(&self, cover_seed: &str) -> Result<Vec<u8>, CatalogError> {
        let url = preview_url(&self.inner.base_url, cover_seed);
        tracing::debug!(%url, "fetch preview");

        let response = self.inner.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn songs_url(base: &str, key: &QueryKey, page: u32, per_page: u32) -> String {
    format!(
        "{}/songs?lang={}&seed={}&likeScore={:.1}&page={}&perPage={}",
        base,
        urlencoding::encode(&key.lang),
        urlencoding::encode(&key.seed),
        key.like_score,
        page,
        per_page
    )
}

fn preview_url(base: &str, cover_seed: &str) -> String {
    format!(
        "{}/songs/preview/{}",
        base,
        urlencoding::encode(&escape_cover_seed(cover_seed))
    )
}

/// The catalog service reads `-` back as `:` in preview keys.
pub fn escape_cover_seed(cover_seed: &str) -> String {
    cover_seed.replace(':', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_cover_seed() {
        assert_eq!(escape_cover_seed("1234:56"), "1234-56");
        assert_eq!(escape_cover_seed("a:b:c"), "a-b-c");
        assert_eq!(escape_cover_seed("plain"), "plain");
    }

    #[test]
    fn test_preview_url_escapes_colons() {
        let url = preview_url("http://host/api", "99:3");
        assert_eq!(url, "http://host/api/songs/preview/99-3");
    }

    #[test]
    fn test_songs_url_carries_query_key() {
        let key = QueryKey::new("de", "my seed", 2.5);
        let url = songs_url("http://host/api", &key, 3, 20);
        assert_eq!(
            url,
            "http://host/api/songs?lang=de&seed=my%20seed&likeScore=2.5&page=3&perPage=20"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = CatalogClient::new("http://host/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.inner.base_url, "http://host/api");
    }
}
