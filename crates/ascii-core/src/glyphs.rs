// ABOUTME: Ordered glyph sets used to build atlases and pick glyphs by brightness.
// ABOUTME: Glyphs run from sparse/light to dense/dark; order is significant.

use std::fmt;

/// Number of glyph cells per atlas row and column.
pub const ATLAS_GRID: u32 = 16;

/// Number of glyphs a single atlas can hold.
pub const ATLAS_CAPACITY: usize = (ATLAS_GRID * ATLAS_GRID) as usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlyphSetError {
    #[error("Glyph set is empty")]
    Empty,
}

/// A non-empty, ordered list of characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphSet {
    glyphs: Vec<char>,
}

impl GlyphSet {
    pub fn new(characters: &str) -> Result<Self, GlyphSetError> {
        let glyphs: Vec<char> = characters.chars().collect();
        if glyphs.is_empty() {
            return Err(GlyphSetError::Empty);
        }
        Ok(Self { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.glyphs.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.iter().copied()
    }

    /// True when some glyphs land past the last atlas cell.
    ///
    /// Those glyphs are never drawn and shader lookups for them wrap back to
    /// the first atlas row. Nothing rejects such sets today.
    pub fn overflows_atlas(&self) -> bool {
        self.glyphs.len() > ATLAS_CAPACITY
    }
}

impl fmt::Display for GlyphSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.glyphs {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for GlyphSet {
    type Err = GlyphSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let set = GlyphSet::new(" .#").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0), Some(' '));
        assert_eq!(set.get(2), Some('#'));
        assert_eq!(set.to_string(), " .#");
    }

    #[test]
    fn counts_chars_not_bytes() {
        let set = GlyphSet::new("░▒▓█").unwrap();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(GlyphSet::new(""), Err(GlyphSetError::Empty));
    }

    #[test]
    fn overflow_past_capacity() {
        let fits: String = std::iter::repeat('x').take(ATLAS_CAPACITY).collect();
        let spills: String = std::iter::repeat('x').take(ATLAS_CAPACITY + 1).collect();
        assert!(!GlyphSet::new(&fits).unwrap().overflows_atlas());
        assert!(GlyphSet::new(&spills).unwrap().overflows_atlas());
    }
}
