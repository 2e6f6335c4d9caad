//! Display model for a user's anime statistics.

use crate::anime::{AnimeStatistics, GenreStat};

pub const TOP_GENRES: usize = 10;

/// Marker shown instead of a missing mean score.
pub const NOT_AVAILABLE: &str = "N/A";

const MINUTES_PER_DAY: u64 = 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchTime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl WatchTime {
    pub fn from_minutes(total: u64) -> Self {
        Self {
            days: total / MINUTES_PER_DAY,
            hours: (total % MINUTES_PER_DAY) / 60,
            minutes: total % 60,
        }
    }
}

impl std::fmt::Display for WatchTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatsView {
    pub mean_score: String,
    pub count: u32,
    pub episodes_watched: u32,
    pub watch_time: WatchTime,
    pub top_genres: Vec<GenreLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenreLine {
    pub genre: String,
    pub count: u32,
    pub mean_score: String,
}

impl StatsView {
    pub fn from_statistics(stats: &AnimeStatistics) -> Self {
        Self {
            mean_score: format_score(stats.mean_score),
            count: stats.count,
            episodes_watched: stats.episodes_watched,
            watch_time: WatchTime::from_minutes(stats.minutes_watched),
            top_genres: top_genres(&stats.genres, TOP_GENRES)
                .into_iter()
                .map(|g| GenreLine {
                    genre: g.genre.clone(),
                    count: g.count,
                    mean_score: format_score(g.mean_score),
                })
                .collect(),
        }
    }
}

/// Highest `n` genres by count. Ties keep their input order.
pub fn top_genres(genres: &[GenreStat], n: usize) -> Vec<&GenreStat> {
    let mut sorted: Vec<&GenreStat> = genres.iter().collect();
    // `sort_by` is stable.
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.truncate(n);
    sorted
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) if s.is_finite() => format!("{}", (s * 100.0).round() / 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(name: &str, count: u32) -> GenreStat {
        GenreStat {
            genre: name.to_string(),
            count,
            mean_score: Some(70.0),
        }
    }

    fn stats(minutes: u64, mean: Option<f64>, genres: Vec<GenreStat>) -> AnimeStatistics {
        AnimeStatistics {
            mean_score: mean,
            count: 12,
            episodes_watched: 240,
            minutes_watched: minutes,
            genres,
        }
    }

    #[test]
    fn watch_time_splits_minutes() {
        assert_eq!(
            WatchTime::from_minutes(1505),
            WatchTime {
                days: 1,
                hours: 1,
                minutes: 5
            }
        );
        assert_eq!(WatchTime::from_minutes(1505).to_string(), "1d 1h 5m");
        assert_eq!(WatchTime::from_minutes(0).to_string(), "0d 0h 0m");
        assert_eq!(WatchTime::from_minutes(1439).to_string(), "0d 23h 59m");
    }

    #[test]
    fn top_ten_of_twelve_by_count_desc() {
        let genres: Vec<GenreStat> = (1..=12)
            .map(|i| genre(&format!("g{i}"), i * 3))
            .collect();
        let top = top_genres(&genres, TOP_GENRES);
        let names: Vec<&str> = top.iter().map(|g| g.genre.as_str()).collect();
        assert_eq!(
            names,
            vec!["g12", "g11", "g10", "g9", "g8", "g7", "g6", "g5", "g4", "g3"]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let genres = vec![
            genre("Comedy", 5),
            genre("Action", 9),
            genre("Drama", 5),
            genre("Romance", 5),
        ];
        let names: Vec<&str> = top_genres(&genres, TOP_GENRES)
            .iter()
            .map(|g| g.genre.as_str())
            .collect();
        assert_eq!(names, vec!["Action", "Comedy", "Drama", "Romance"]);
    }

    #[test]
    fn missing_mean_score_is_not_zero() {
        let mut g = genre("Action", 1);
        g.mean_score = None;
        let view = StatsView::from_statistics(&stats(60, None, vec![g]));
        assert_eq!(view.mean_score, NOT_AVAILABLE);
        assert_eq!(view.top_genres[0].mean_score, NOT_AVAILABLE);
    }

    #[test]
    fn view_carries_totals() {
        let view = StatsView::from_statistics(&stats(1505, Some(78.456), vec![]));
        assert_eq!(view.mean_score, "78.46");
        assert_eq!(view.count, 12);
        assert_eq!(view.episodes_watched, 240);
        assert_eq!(view.watch_time.to_string(), "1d 1h 5m");
        assert!(view.top_genres.is_empty());
    }

    #[test]
    fn whole_scores_print_without_decimals() {
        assert_eq!(format_score(Some(80.0)), "80");
        assert_eq!(format_score(Some(0.0)), "0");
    }
}
