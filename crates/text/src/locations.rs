//! Location registry
//!
//! Immutable table of Vietnamese administrative areas, populated at
//! start-up from the built-in rows plus any configured extensions.
//! Resolution is case- and diacritic-insensitive longest-match over
//! surface forms.

use voucher_search_config::LocationEntry;

use crate::normalizer::fold_tokens;

/// One registry row
#[derive(Debug, Clone)]
pub struct LocationRow {
    /// Canonical spelling, diacritics included
    pub canonical: String,
    /// Folded surface forms used for matching
    pub surface_forms: Vec<String>,
    /// Region tag ("north", "central", "south")
    pub region: String,
    /// Canonical names of neighboring areas
    pub neighbors: Vec<String>,
}

/// A surface form located inside a larger text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationMatch {
    /// Canonical name of the matched area
    pub canonical: String,
    /// Surface form that matched (folded)
    pub surface: String,
    /// Token offset of the match in the folded text
    pub start: usize,
}

/// Registry of recognized areas
pub struct LocationRegistry {
    rows: Vec<LocationRow>,
}

impl LocationRegistry {
    /// Registry holding only the built-in reference areas
    pub fn with_defaults() -> Self {
        let mut registry = Self { rows: Vec::new() };
        for row in default_rows() {
            registry.register(row);
        }
        registry
    }

    /// Built-ins plus configured extension rows
    pub fn from_settings(extra: &[LocationEntry]) -> Self {
        let mut registry = Self::with_defaults();
        for entry in extra {
            registry.register(LocationRow {
                canonical: entry.canonical.clone(),
                surface_forms: entry.surface_forms.clone(),
                region: entry.region.clone(),
                neighbors: entry.neighbors.clone(),
            });
        }
        registry
    }

    /// Add one row; the canonical spelling itself always matches
    fn register(&mut self, row: LocationRow) {
        let mut surfaces: Vec<String> = Vec::with_capacity(row.surface_forms.len() + 1);
        surfaces.push(fold_tokens(&row.canonical).join(" "));
        for form in &row.surface_forms {
            let folded = fold_tokens(form).join(" ");
            if !surfaces.contains(&folded) {
                surfaces.push(folded);
            }
        }
        self.rows.push(LocationRow {
            canonical: row.canonical,
            surface_forms: surfaces,
            region: row.region,
            neighbors: row.neighbors,
        });
    }

    /// Resolve free text to a canonical name
    ///
    /// Longest surface form contained in the text wins; ties fall to
    /// registration order.
    pub fn resolve(&self, text: &str) -> Option<String> {
        let token_strings = fold_tokens(text);
        let tokens: Vec<&str> = token_strings.iter().map(|t| t.as_str()).collect();

        let mut best: Option<(usize, &str)> = None; // (surface len, canonical)
        for row in &self.rows {
            for surface in &row.surface_forms {
                if contains_phrase(&tokens, surface) {
                    let len = surface.chars().count();
                    if best.map_or(true, |(best_len, _)| len > best_len) {
                        best = Some((len, row.canonical.as_str()));
                    }
                }
            }
        }
        best.map(|(_, canonical)| canonical.to_string())
    }

    /// Earliest surface form occurring in the text
    ///
    /// On equal positions the longer surface form wins.
    pub fn find_in(&self, text: &str) -> Option<LocationMatch> {
        let token_strings = fold_tokens(text);
        let tokens: Vec<&str> = token_strings.iter().map(|t| t.as_str()).collect();

        let mut best: Option<LocationMatch> = None;
        let mut best_len = 0usize;
        for row in &self.rows {
            for surface in &row.surface_forms {
                if let Some(start) = find_phrase(&tokens, surface) {
                    let len = surface.chars().count();
                    let better = match &best {
                        None => true,
                        Some(b) => start < b.start || (start == b.start && len > best_len),
                    };
                    if better {
                        best_len = len;
                        best = Some(LocationMatch {
                            canonical: row.canonical.clone(),
                            surface: surface.clone(),
                            start,
                        });
                    }
                }
            }
        }
        best
    }

    /// Region tag of a canonical name
    pub fn region_of(&self, canonical: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.canonical == canonical)
            .map(|r| r.region.as_str())
    }

    /// Neighboring canonical names
    pub fn neighbors_of(&self, canonical: &str) -> &[String] {
        self.rows
            .iter()
            .find(|r| r.canonical == canonical)
            .map(|r| r.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// All canonical names, registration order
    pub fn canonical_names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.canonical.as_str()).collect()
    }

    /// Folded surface forms of a canonical name
    pub fn surfaces_of(&self, canonical: &str) -> &[String] {
        self.rows
            .iter()
            .find(|r| r.canonical == canonical)
            .map(|r| r.surface_forms.as_slice())
            .unwrap_or(&[])
    }
}

/// Whether `phrase` occurs as a consecutive token run in `tokens`
fn contains_phrase(tokens: &[&str], phrase: &str) -> bool {
    find_phrase(tokens, phrase).is_some()
}

/// Token offset of the first aligned occurrence of `phrase`
fn find_phrase(tokens: &[&str], phrase: &str) -> Option<usize> {
    let phrase_tokens: Vec<&str> = phrase.split(' ').collect();
    if phrase_tokens.is_empty() || phrase_tokens.len() > tokens.len() {
        return None;
    }
    (0..=tokens.len() - phrase_tokens.len())
        .find(|&i| tokens[i..i + phrase_tokens.len()] == phrase_tokens[..])
}

fn default_rows() -> Vec<LocationRow> {
    vec![
        LocationRow {
            canonical: "Hà Nội".to_string(),
            surface_forms: vec![
                "hanoi".to_string(),
                "thu do".to_string(),
                "thủ đô".to_string(),
            ],
            region: "north".to_string(),
            neighbors: vec!["Hải Phòng".to_string()],
        },
        LocationRow {
            canonical: "Hải Phòng".to_string(),
            surface_forms: vec!["haiphong".to_string(), "hp".to_string()],
            region: "north".to_string(),
            neighbors: vec!["Hà Nội".to_string()],
        },
        LocationRow {
            canonical: "Đà Nẵng".to_string(),
            surface_forms: vec!["danang".to_string()],
            region: "central".to_string(),
            neighbors: vec![],
        },
        LocationRow {
            canonical: "Hồ Chí Minh".to_string(),
            surface_forms: vec![
                "tp hcm".to_string(),
                "tphcm".to_string(),
                "hcm".to_string(),
                "sai gon".to_string(),
                "sài gòn".to_string(),
                "saigon".to_string(),
                "thanh pho ho chi minh".to_string(),
            ],
            region: "south".to_string(),
            neighbors: vec!["Cần Thơ".to_string()],
        },
        LocationRow {
            canonical: "Cần Thơ".to_string(),
            surface_forms: vec!["cantho".to_string()],
            region: "south".to_string(),
            neighbors: vec!["Hồ Chí Minh".to_string()],
        },
    ]
}
