//! Intersection of planning lists.

use std::collections::{HashMap, HashSet};

use crate::anime::{PlanningEntry, UserPlanningList};

/// Number of genres shown per common item.
pub const DISPLAY_GENRES: usize = 3;

/// Catalog items present on every contributing list.
///
/// Items keep the order of the first contributing list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommonSet {
    pub items: Vec<PlanningEntry>,
}

impl CommonSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.items.iter().map(|e| e.id).collect()
    }

    /// Cover of the first listed item, if it has one.
    pub fn cover_image(&self) -> Option<&str> {
        self.items.first().and_then(|e| e.cover_image.as_deref())
    }
}

/// Intersect the id-sets of `lists`.
///
/// One list yields that list's items; no lists yield an empty set. Metadata
/// for an id comes from the last list that contains it.
pub fn compute_common(lists: &[UserPlanningList]) -> CommonSet {
    let Some((first, rest)) = lists.split_first() else {
        return CommonSet::default();
    };

    let mut common = first.ids();
    for list in rest {
        let ids = list.ids();
        common.retain(|id| ids.contains(id));
    }

    let mut details: HashMap<u64, &PlanningEntry> = HashMap::new();
    for entry in lists.iter().flat_map(|l| l.entries.iter()) {
        details.insert(entry.id, entry);
    }

    let mut seen = HashSet::new();
    let items = first
        .entries
        .iter()
        .filter(|e| common.contains(&e.id) && seen.insert(e.id))
        .filter_map(|e| details.get(&e.id).map(|d| (*d).clone()))
        .collect();

    CommonSet { items }
}

/// Up to [`DISPLAY_GENRES`] genres, comma-separated.
pub fn display_genres(entry: &PlanningEntry) -> String {
    entry
        .genres
        .iter()
        .take(DISPLAY_GENRES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Average score, or `N/A` when the catalog has none.
pub fn display_score(entry: &PlanningEntry) -> String {
    entry
        .average_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
