//! # Severity levels.
//!
//! The index → name table is part of the public contract: formatting code
//! downstream of the engine keys colors and letters off it.
//!
//! | raw | level   |
//! |-----|---------|
//! | 0   | Unknown |
//! | 1   | Default |
//! | 2   | Verbose |
//! | 3   | Debug   |
//! | 4   | Info    |
//! | 5   | Warning |
//! | 6   | Error   |
//! | 7   | Fatal   |
//! | 8   | Silent  |
//!
//! Any other raw byte displays as [`Level::Unknown`]. The raw byte itself is
//! kept untouched inside the [`Record`](crate::Record).

use std::fmt;

/// Severity of a captured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Unknown = 0,
    Default = 1,
    Verbose = 2,
    Debug = 3,
    Info = 4,
    Warning = 5,
    Error = 6,
    Fatal = 7,
    Silent = 8,
}

impl Level {
    /// All levels in index order.
    pub const ALL: [Level; 9] = [
        Level::Unknown,
        Level::Default,
        Level::Verbose,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
        Level::Silent,
    ];

    /// Maps a raw severity byte to its display level.
    ///
    /// Out-of-range values fall back to [`Level::Unknown`].
    #[inline]
    pub fn from_raw(raw: u8) -> Self {
        Self::ALL
            .get(usize::from(raw))
            .copied()
            .unwrap_or(Level::Unknown)
    }

    /// Index of this level in the table.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Stable human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Level::Unknown => "Unknown",
            Level::Default => "Default",
            Level::Verbose => "Verbose",
            Level::Debug => "Debug",
            Level::Info => "Info",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Fatal => "Fatal",
            Level::Silent => "Silent",
        }
    }

    /// Single-letter tag used by compact printers.
    pub fn letter(self) -> char {
        match self {
            Level::Unknown => '?',
            Level::Default => '-',
            Level::Verbose => 'V',
            Level::Debug => 'D',
            Level::Info => 'I',
            Level::Warning => 'W',
            Level::Error => 'E',
            Level::Fatal => 'F',
            Level::Silent => 'S',
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
