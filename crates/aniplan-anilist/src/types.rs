use serde::Deserialize;

use aniplan_core::{
    anime::{AnimeStatistics, GenreStat, MediaTitle, PlanningEntry, UserPlanningList},
    domain::Username,
};

// ── GraphQL envelope ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    pub status: Option<u16>,
}

// ── Planning list query ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlanningData {
    #[serde(rename = "MediaListCollection")]
    pub media_list_collection: Option<MediaListCollection>,
}

#[derive(Debug, Deserialize)]
pub struct MediaListCollection {
    #[serde(default)]
    pub lists: Vec<MediaListGroup>,
}

#[derive(Debug, Deserialize)]
pub struct MediaListGroup {
    #[serde(default)]
    pub entries: Vec<MediaListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MediaListEntry {
    pub media: AniListMedia,
}

#[derive(Debug, Deserialize)]
pub struct AniListMedia {
    pub id: u64,
    pub title: Option<AniListTitle>,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<CoverImage>,
    pub genres: Option<Vec<Option<String>>>,
    #[serde(rename = "averageScore")]
    pub average_score: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AniListTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoverImage {
    pub large: Option<String>,
}

impl AniListMedia {
    pub fn into_planning_entry(self) -> PlanningEntry {
        let title = self
            .title
            .map(|t| MediaTitle {
                romaji: t.romaji,
                english: t.english,
                native: t.native,
            })
            .unwrap_or_default();
        PlanningEntry {
            id: self.id,
            title,
            genres: self
                .genres
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect(),
            cover_image: self
                .cover_image
                .and_then(|c| c.large)
                .filter(|u| !u.trim().is_empty()),
            average_score: self.average_score,
        }
    }
}

impl MediaListCollection {
    /// Only the first list is read; no lists at all means "no planning list".
    pub fn into_planning_list(self, username: &Username) -> Option<UserPlanningList> {
        let first = self.lists.into_iter().next()?;
        Some(UserPlanningList::new(
            username.clone(),
            first
                .entries
                .into_iter()
                .map(|e| e.media.into_planning_entry())
                .collect(),
        ))
    }
}

// ── Statistics query ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatsData {
    #[serde(rename = "User")]
    pub user: Option<StatsUser>,
}

#[derive(Debug, Deserialize)]
pub struct StatsUser {
    pub statistics: Option<UserStatisticTypes>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatisticTypes {
    pub anime: Option<UserStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub mean_score: Option<f64>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub episodes_watched: u32,
    #[serde(default)]
    pub minutes_watched: u64,
    #[serde(default)]
    pub genres: Vec<GenreStatistic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreStatistic {
    pub genre: Option<String>,
    #[serde(default)]
    pub count: u32,
    pub mean_score: Option<f64>,
}

impl UserStatistics {
    pub fn into_statistics(self) -> AnimeStatistics {
        AnimeStatistics {
            mean_score: self.mean_score,
            count: self.count,
            episodes_watched: self.episodes_watched,
            minutes_watched: self.minutes_watched,
            genres: self
                .genres
                .into_iter()
                .filter_map(|g| {
                    Some(GenreStat {
                        genre: g.genre?,
                        count: g.count,
                        mean_score: g.mean_score,
                    })
                })
                .collect(),
        }
    }
}
