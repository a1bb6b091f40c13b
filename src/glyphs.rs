// Copyright (c) 2026 rezky_nightky

use std::char;

/// Bit set of glyph families used by the noise layer, ghost keystrokes and
/// render-time text corruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphSet(u32);

impl GlyphSet {
    pub const LATIN: GlyphSet = GlyphSet(0x1);
    pub const DIGITS: GlyphSet = GlyphSet(0x2);
    pub const PUNCTUATION: GlyphSet = GlyphSet(0x4);
    pub const KATAKANA: GlyphSet = GlyphSet(0x8);
    pub const CYRILLIC: GlyphSet = GlyphSet(0x20);
    pub const SYMBOLS: GlyphSet = GlyphSet(0x2000);
    pub const BLOCKS: GlyphSet = GlyphSet(0x8000);
    pub const BOXDRAW: GlyphSet = GlyphSet(0x10000);

    /// Phantom keystrokes: things a keyboard could plausibly produce.
    pub const GHOST: GlyphSet = GlyphSet(0x1 | 0x2 | 0x20);
    /// Static on the noise layer.
    pub const NOISE: GlyphSet = GlyphSet(0x8 | 0x2000 | 0x8000);
    /// Replacement glyphs for corrupted text.
    pub const GLITCH: GlyphSet = GlyphSet(0x4 | 0x2000 | 0x8000 | 0x10000);

    pub const fn union(self, other: GlyphSet) -> GlyphSet {
        GlyphSet(self.0 | other.0)
    }

    pub fn contains(self, other: GlyphSet) -> bool {
        (self.0 & other.0) != 0
    }

    /// Drops the families that need a UTF-8 locale to display.
    pub fn ascii_only(self) -> GlyphSet {
        GlyphSet(self.0 & (Self::LATIN.0 | Self::DIGITS.0 | Self::PUNCTUATION.0))
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

pub fn build_glyphs(set: GlyphSet, ascii: bool) -> Vec<char> {
    let set = if ascii { set.ascii_only() } else { set };
    let mut out: Vec<char> = Vec::new();

    if set.contains(GlyphSet::LATIN) {
        push_range(&mut out, 0x61, 0x7A);
    }
    if set.contains(GlyphSet::DIGITS) {
        push_range(&mut out, 0x30, 0x39);
    }
    if set.contains(GlyphSet::PUNCTUATION) {
        out.extend("#$%&*+/<=>?@\\^_|~".chars());
    }
    if set.contains(GlyphSet::KATAKANA) {
        push_range(&mut out, 0xFF66, 0xFF9D);
    }
    if set.contains(GlyphSet::CYRILLIC) {
        push_range(&mut out, 0x0430, 0x044F);
    }
    if set.contains(GlyphSet::SYMBOLS) {
        out.extend("∞∑∫√π∆Ωµλ≈≠≤≥×÷±∂∇∈∉∩∪⊕⊗".chars());
    }
    if set.contains(GlyphSet::BLOCKS) {
        push_range(&mut out, 0x2580, 0x259F);
    }
    if set.contains(GlyphSet::BOXDRAW) {
        push_range(&mut out, 0x2500, 0x254B);
    }

    if out.is_empty() {
        out.extend("#%&@".chars());
    }
    out
}
