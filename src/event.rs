//! Events exchanged between lecturer and student views
//!
//! Every event names the session it belongs to. The JSON form uses an
//! internal `type` tag and is what the storage fallback writes, so any
//! other consumer of the relay has to speak exactly these four shapes.

use serde::{Deserialize, Serialize};

use crate::{question::PublicQuestion, session_code::SessionCode};

/// One row of a leaderboard update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Student nickname
    pub name: String,
    /// Total points
    pub score: u64,
}

/// A message carried by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The lecturer approved a question and students may answer it
    #[serde(rename = "mcq_published")]
    QuestionPublished {
        /// Session the question belongs to
        code: SessionCode,
        /// The question without its answer
        #[serde(rename = "mcq")]
        question: PublicQuestion,
    },
    /// The current top of the leaderboard
    #[serde(rename = "leaderboard_update")]
    LeaderboardUpdate {
        /// Session the leaderboard belongs to
        code: SessionCode,
        /// At most ten entries, highest score first
        top: Vec<LeaderboardEntry>,
    },
    /// A student answered a question
    #[serde(rename = "answer_submitted")]
    AnswerSubmitted {
        /// Session the answer belongs to
        code: SessionCode,
        /// Nickname of the student
        student: String,
        /// The question that was answered
        #[serde(rename = "mcqId")]
        question_id: String,
        /// Whether the answer was graded correct
        correct: bool,
    },
    /// The lecturer ended the session
    #[serde(rename = "session_ended")]
    SessionEnded {
        /// Session that ended
        code: SessionCode,
    },
}

/// The variant of an [`Event`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EventKind {
    /// [`Event::QuestionPublished`]
    #[display("mcq_published")]
    QuestionPublished,
    /// [`Event::LeaderboardUpdate`]
    #[display("leaderboard_update")]
    LeaderboardUpdate,
    /// [`Event::AnswerSubmitted`]
    #[display("answer_submitted")]
    AnswerSubmitted,
    /// [`Event::SessionEnded`]
    #[display("session_ended")]
    SessionEnded,
}

impl Event {
    /// Returns the session this event belongs to
    pub fn code(&self) -> &SessionCode {
        match self {
            Self::QuestionPublished { code, .. }
            | Self::LeaderboardUpdate { code, .. }
            | Self::AnswerSubmitted { code, .. }
            | Self::SessionEnded { code } => code,
        }
    }

    /// Returns whether this event belongs to `code`
    pub fn is_for(&self, code: &SessionCode) -> bool {
        self.code() == code
    }

    /// Returns the kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::QuestionPublished { .. } => EventKind::QuestionPublished,
            Self::LeaderboardUpdate { .. } => EventKind::LeaderboardUpdate,
            Self::AnswerSubmitted { .. } => EventKind::AnswerSubmitted,
            Self::SessionEnded { .. } => EventKind::SessionEnded,
        }
    }

    /// Converts the event to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }

    /// Parses an event from its JSON form
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the text is not a well-formed event.
    pub fn from_message(message: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(message)
    }
}
