// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

/// Semantic colour of a buffer line. The theme maps tokens to real colours
/// for the active `ColorMode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorToken {
    /// Regular phosphor-green output.
    Normal,
    /// Echoed commands and headings.
    White,
    Dim,
    Red,
    Yellow,
    Cyan,
    Magenta,
}
