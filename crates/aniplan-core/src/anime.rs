//! Anime catalog + statistics model, independent of any wire format.

use std::collections::HashSet;

use crate::domain::Username;

/// Title variants as reported by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl MediaTitle {
    /// Preferred display form: romaji, then english, then native.
    pub fn preferred(&self) -> Option<&str> {
        [&self.romaji, &self.english, &self.native]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// One catalog item on a user's planning list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanningEntry {
    pub id: u64,
    pub title: MediaTitle,
    pub genres: Vec<String>,
    pub cover_image: Option<String>,
    /// Catalog average score (0-100). `None` until the catalog has rated it.
    pub average_score: Option<u32>,
}

impl PlanningEntry {
    pub fn display_title(&self) -> String {
        self.title
            .preferred()
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// A user's "planning to watch" list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPlanningList {
    pub username: Username,
    pub entries: Vec<PlanningEntry>,
}

impl UserPlanningList {
    pub fn new(username: Username, entries: Vec<PlanningEntry>) -> Self {
        Self { username, entries }
    }

    pub fn ids(&self) -> HashSet<u64> {
        self.entries.iter().map(|e| e.id).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenreStat {
    pub genre: String,
    pub count: u32,
    pub mean_score: Option<f64>,
}

/// Aggregate anime statistics for one user.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimeStatistics {
    pub mean_score: Option<f64>,
    pub count: u32,
    pub episodes_watched: u32,
    pub minutes_watched: u64,
    pub genres: Vec<GenreStat>,
}
