//! Configuration constants for the quiz session system
//!
//! This module contains the limits and fixed identifiers used throughout
//! the relay and the lecturer/student views so every context agrees on
//! the same boundaries.

/// Relay transport identifiers
pub mod relay {
    /// Name of the broadcast channel every context joins
    pub const CHANNEL_NAME: &str = "mvp-session";
    /// Key in the shared store that carries serialized events
    pub const STORAGE_KEY: &str = "__mvp_bus__";
}

/// Session code constants
pub mod session_code {
    /// Characters a generated code is drawn from (no `I`, `O`, `0`, `1`)
    pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    /// Length of a generated code
    pub const LENGTH: usize = 4;
    /// Shortest code a student may type in to join
    pub const MIN_JOIN_LENGTH: usize = 3;
    /// Longest code accepted when parsing
    pub const MAX_LENGTH: usize = 16;
}

/// Question configuration constants
pub mod question {
    /// Minimum number of options for a multiple choice question
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of options for a multiple choice question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of question text in characters
    pub const MAX_TEXT_LENGTH: usize = 200;
    /// Maximum length of option text in characters
    pub const MAX_OPTION_TEXT_LENGTH: usize = 200;
}

/// Leaderboard constants
pub mod leaderboard {
    /// Number of entries carried by a leaderboard update
    pub const TOP_LIMIT: usize = 10;
    /// Points awarded for a correct answer
    pub const POINTS_PER_CORRECT: u64 = 10;
}

/// Nickname constants
pub mod nickname {
    /// Minimum nickname length after trimming
    pub const MIN_LENGTH: usize = 2;
    /// Maximum nickname length
    pub const MAX_LENGTH: usize = 30;
    /// Name used when a tab has no stored nickname
    pub const FALLBACK: &str = "Anon";
}

/// Per-tab session storage keys
pub mod tab_storage {
    /// Key holding the joined session code
    pub const CODE_KEY: &str = "mvp_code";
    /// Key holding the nickname
    pub const NAME_KEY: &str = "mvp_name";
}
