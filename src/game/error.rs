//! Match creation errors.
//!
//! Only configuration problems are errors. Rejected intents (illegal moves,
//! double placement) are expected traffic and are never reported here.

/// Map text could not be decoded into an arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// Input was empty.
    #[error("map text is empty")]
    Empty,

    /// Input contained only blank lines.
    #[error("map text has no non-blank rows")]
    NoRows,

    /// A cell held a glyph outside the tile set.
    #[error("invalid glyph {glyph:?} at row {row}, column {column}")]
    InvalidGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row (among non-blank rows).
        row: usize,
        /// Zero-based column.
        column: usize,
    },
}

/// A match could not be created.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Map text was rejected.
    #[error("invalid map: {0}")]
    Map(#[from] MapError),

    /// A setting was outside its permitted range.
    #[error("setting `{field}` = {value} is outside {min}..={max}")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A match needs at least one actor.
    #[error("match has no actors")]
    NoActors,
}
