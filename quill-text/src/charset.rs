//! Character sets to render into the atlas.
//!
//! A set is an ordered sequence of Unicode scalars. Order matters: the
//! atlas packer places glyphs in iteration order, so the same set always
//! produces the same atlas.

use std::collections::HashSet;

/// Typographic punctuation and Latin Extended-A letters rendered in
/// addition to printable ASCII and Latin-1.
const EXTRA_CHARACTERS: &str = "–—‘’‚“”„†‡•…‰‹›€™\
    ŒœŠšŸŽžŁłıƒˆ˜ĞğİŞşČčĆćŘřĚěŐőŰűŃńŚśŹźŻżĄąĘę";

/// Soft hyphen has no visible glyph in most fonts.
const SOFT_HYPHEN: u32 = 0xAD;

/// Ordered, duplicate-free set of characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<char>,
}

impl CharacterSet {
    /// Build a set from any sequence. Repeats are dropped; the first
    /// occurrence keeps its position.
    pub fn new<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let mut seen = HashSet::new();
        let chars = chars.into_iter().filter(|c| seen.insert(*c)).collect();
        Self { chars }
    }

    /// Printable ASCII only (32–126).
    pub fn ascii() -> Self {
        Self::new((32u8..=126).map(char::from))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }
}

impl Default for CharacterSet {
    /// Printable ASCII, then Latin-1 punctuation and letters, then the
    /// extra typographic table.
    fn default() -> Self {
        let ascii = (32u8..=126).map(char::from);
        let latin1 = (0xA1u32..=0xFF)
            .filter(|&cp| cp != SOFT_HYPHEN)
            .filter_map(char::from_u32);
        Self::new(ascii.chain(latin1).chain(EXTRA_CHARACTERS.chars()))
    }
}

impl From<&str> for CharacterSet {
    fn from(s: &str) -> Self {
        Self::new(s.chars())
    }
}

impl FromIterator<char> for CharacterSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self::new(iter)
    }
}

// ===================================================================
// Tests
// ===================================================================
