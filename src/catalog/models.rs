use serde::{Deserialize, Serialize};

/// Stable identifier of a song within one query.
pub type SongId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(alias = "index")]
    pub id: SongId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(alias = "likes", default)]
    pub like_score: f64,
    pub cover_seed: String,
    #[serde(alias = "lyrics", default)]
    pub lyrics_raw: String,
    #[serde(default)]
    pub review: Option<String>,
}

/// One page of the `songs` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPage {
    pub songs: Vec<Song>,
    #[serde(default)]
    pub total_pages: u32,
}

pub const LANGUAGES: [&str; 2] = ["en", "de"];
pub const MAX_LIKE_SCORE: f64 = 10.0;

/// Language, seed and like-score filter: the tuple that defines one result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryKey {
    pub lang: String,
    pub seed: String,
    pub like_score: f64,
}

impl QueryKey {
    pub fn new(lang: impl Into<String>, seed: impl Into<String>, like_score: f64) -> Self {
        Self {
            lang: lang.into(),
            seed: seed.into(),
            like_score: clamp_like_score(like_score),
        }
    }

    /// Next language in the toolbar cycle.
    pub fn with_next_lang(&self) -> Self {
        let idx = LANGUAGES.iter().position(|l| *l == self.lang);
        let lang = match idx {
            Some(i) => LANGUAGES[(i + 1) % LANGUAGES.len()],
            None => LANGUAGES[0],
        };
        Self {
            lang: lang.to_string(),
            ..self.clone()
        }
    }

    pub fn with_seed(&self, seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..self.clone()
        }
    }

    /// Step the like-score filter by `delta`, staying on the 0.1 grid.
    pub fn with_like_delta(&self, delta: f64) -> Self {
        Self {
            like_score: clamp_like_score(self.like_score + delta),
            ..self.clone()
        }
    }

    pub fn label(&self) -> String {
        format!("lang={} seed={} likes={:.1}", self.lang, self.seed, self.like_score)
    }
}

impl Default for QueryKey {
    fn default() -> Self {
        Self::new("en", "0", 1.0)
    }
}

fn clamp_like_score(v: f64) -> f64 {
    ((v * 10.0).round() / 10.0).clamp(0.0, MAX_LIKE_SCORE)
}

/// A seed like the toolbar's "random" button produces.
pub fn random_seed() -> String {
    rand::random_range(0..1_000_000_000_000u64).to_string()
}
