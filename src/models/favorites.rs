use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Favorited titles grouped by the movie they were recommended for
///
/// Each source title owns an ordered, duplicate-free list of favorites. The
/// list order is display order. Sources are kept sorted so that scanning
/// across them is deterministic. A source may map to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct FavoritesMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl FavoritesMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of source titles with an entry (including empty ones)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Favorites recorded for `source`, if it has an entry
    pub fn get(&self, source: &str) -> Option<&[String]> {
        self.entries.get(source).map(Vec::as_slice)
    }

    pub fn contains(&self, source: &str, title: &str) -> bool {
        self.entries
            .get(source)
            .is_some_and(|titles| titles.iter().any(|t| t == title))
    }

    /// Adds every title not already favorited under `source`
    ///
    /// The source entry is created even when `titles` is empty. Returns how
    /// many titles were actually inserted.
    pub fn add_favorites<I, S>(&mut self, source: &str, titles: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.entries.entry(source.to_string()).or_default();
        let mut added = 0;

        for title in titles {
            let title = title.into();
            if !entry.contains(&title) {
                entry.push(title);
                added += 1;
            }
        }

        added
    }

    /// Removes the first occurrence of `title`, scanning sources in order
    ///
    /// Returns the source it was removed from, or `None` when the title was
    /// not favorited anywhere. The source entry is kept even if it becomes
    /// empty.
    pub fn remove_favorite(&mut self, title: &str) -> Option<String> {
        for (source, titles) in self.entries.iter_mut() {
            if let Some(pos) = titles.iter().position(|t| t == title) {
                titles.remove(pos);
                return Some(source.clone());
            }
        }
        None
    }

    /// Iterates `(source, favorites)` in source order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }

    /// Flattens the map into `(source, favorite)` pairs in display order
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(source, titles)| {
                titles
                    .iter()
                    .map(move |title| (source.clone(), title.clone()))
            })
            .collect()
    }

    /// True when at least one source holds a favorite
    pub fn has_any_favorite(&self) -> bool {
        self.entries.values().any(|titles| !titles.is_empty())
    }
}

impl From<BTreeMap<String, Vec<String>>> for FavoritesMap {
    fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
        // Files written by hand may carry duplicates; keep first occurrences.
        let mut map = FavoritesMap::new();
        for (source, titles) in raw {
            map.add_favorites(&source, titles);
        }
        map
    }
}

impl From<FavoritesMap> for BTreeMap<String, Vec<String>> {
    fn from(map: FavoritesMap) -> Self {
        map.entries
    }
}
