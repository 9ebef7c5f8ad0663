//! Searchable playlist over the library catalog.
//!
//! The playlist holds indices into the catalog's flat track list. With an
//! empty query every track is shown in catalog order; otherwise tracks are
//! fuzzy-matched on their library path and ordered by score.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use shadow_studio::catalog::Catalog;

pub struct Playlist {
    pub visible: Vec<usize>,
    pub selected: usize,
    pub query: String,
    pub searching: bool,
    matcher: SkimMatcherV2,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            visible: Vec::new(),
            selected: 0,
            query: String::new(),
            searching: false,
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Recompute the visible rows after the catalog or the query changed.
    pub fn refresh(&mut self, catalog: &Catalog) {
        if self.query.is_empty() {
            self.visible = (0..catalog.len()).collect();
        } else {
            let mut scored: Vec<(usize, i64)> = catalog
                .tracks()
                .iter()
                .enumerate()
                .filter_map(|(i, track)| {
                    self.matcher
                        .fuzzy_match(&track.path, &self.query)
                        .map(|score| (i, score))
                })
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            self.visible = scored.into_iter().map(|(i, _)| i).collect();
        }

        if self.selected >= self.visible.len() {
            self.selected = 0;
        }
    }

    pub fn push_char(&mut self, c: char, catalog: &Catalog) {
        self.query.push(c);
        self.refresh(catalog);
    }

    pub fn pop_char(&mut self, catalog: &Catalog) {
        self.query.pop();
        self.refresh(catalog);
    }

    pub fn clear_search(&mut self, catalog: &Catalog) {
        self.query.clear();
        self.searching = false;
        self.refresh(catalog);
    }

    pub fn select_next(&mut self) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + 1) % self.visible.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.visible.is_empty() {
            if self.selected == 0 {
                self.selected = self.visible.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    /// Catalog index of the highlighted row.
    pub fn selected_index(&self) -> Option<usize> {
        self.visible.get(self.selected).copied()
    }

    /// Move the highlight onto catalog index `index` if it is visible.
    pub fn follow(&mut self, index: usize) {
        if let Some(row) = self.visible.iter().position(|&i| i == index) {
            self.selected = row;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_studio::catalog::{Track, build_catalog};

    fn catalog() -> Catalog {
        build_catalog(vec![
            Track::new("course/lesson10.mp3", 1, 1, None),
            Track::new("course/lesson2.mp3", 1, 1, None),
            Track::new("podcast/episode1.mp3", 1, 1, None),
        ])
    }

    #[test]
    fn test_empty_query_shows_catalog_order() {
        let catalog = catalog();
        let mut playlist = Playlist::new();
        playlist.refresh(&catalog);
        assert_eq!(playlist.visible, vec![0, 1, 2]);
        assert_eq!(catalog.get(0).unwrap().path, "course/lesson2.mp3");
    }

    #[test]
    fn test_search_filters() {
        let catalog = catalog();
        let mut playlist = Playlist::new();
        for c in "epi".chars() {
            playlist.push_char(c, &catalog);
        }
        assert_eq!(playlist.visible, vec![2]);
        assert_eq!(playlist.selected_index(), Some(2));

        playlist.clear_search(&catalog);
        assert_eq!(playlist.visible.len(), 3);
    }

    #[test]
    fn test_navigation_wraps() {
        let catalog = catalog();
        let mut playlist = Playlist::new();
        playlist.refresh(&catalog);

        playlist.select_previous();
        assert_eq!(playlist.selected, 2);
        playlist.select_next();
        assert_eq!(playlist.selected, 0);

        playlist.follow(1);
        assert_eq!(playlist.selected_index(), Some(1));
    }
}
