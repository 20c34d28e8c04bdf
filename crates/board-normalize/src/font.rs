//! Font service: collects every rendered string and produces the glyph set
//! the viewer needs to draw them.

use crate::error::ExtractError;
use crate::types::{FontData, GlyphData};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub trait FontService {
    /// Register a string that will be drawn.
    fn add_string(&mut self, text: &str);

    /// Glyphs for everything registered so far.
    fn font_data(&self) -> FontData;
}

/// Records used characters and serves their glyphs from a preloaded table.
#[derive(Debug, Clone, Default)]
pub struct GlyphRecorder {
    used: BTreeSet<char>,
    table: BTreeMap<String, GlyphData>,
}

impl GlyphRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: BTreeMap<String, GlyphData>) -> Self {
        Self {
            used: BTreeSet::new(),
            table,
        }
    }

    /// Load a glyph table from a JSON object of `{"char": {"w": .., "l": [..]}}`.
    pub fn load_table(path: &Path) -> Result<Self, ExtractError> {
        let data = std::fs::read(path)?;
        let table: BTreeMap<String, GlyphData> = serde_json::from_slice(&data)?;
        debug!("loaded {} glyphs from {}", table.len(), path.display());
        Ok(Self::with_table(table))
    }

    pub fn used_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.used.iter().copied()
    }
}

impl FontService for GlyphRecorder {
    fn add_string(&mut self, text: &str) {
        self.used.extend(text.chars().filter(|c| !c.is_control()));
    }

    fn font_data(&self) -> FontData {
        let mut data = FontData::new();
        for c in &self.used {
            let key = c.to_string();
            match self.table.get(&key) {
                Some(glyph) => {
                    data.insert(key, glyph.clone());
                }
                None => debug!("no glyph for {c:?}"),
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(w: f64) -> GlyphData {
        GlyphData {
            w,
            l: vec![vec![[0.0, 0.0], [w, 1.0]]],
        }
    }

    #[test]
    fn test_records_distinct_chars() {
        let mut fonts = GlyphRecorder::new();
        fonts.add_string("R10");
        fonts.add_string("R1\n");
        let used: String = fonts.used_chars().collect();
        assert_eq!(used, "01R");
    }

    #[test]
    fn test_font_data_from_table() {
        let table = BTreeMap::from([
            ("A".to_string(), glyph(0.6)),
            ("B".to_string(), glyph(0.7)),
            ("C".to_string(), glyph(0.8)),
        ]);
        let mut fonts = GlyphRecorder::with_table(table);
        fonts.add_string("AB?");
        let data = fonts.font_data();
        assert_eq!(data.len(), 2);
        assert_eq!(data["A"], glyph(0.6));
        assert!(!data.contains_key("C"));
        assert!(!data.contains_key("?"));
    }
}
