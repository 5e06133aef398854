//! Multiple choice questions and grading
//!
//! A [`Question`] is what the lecturer approves; it knows the correct
//! option. Students only ever see its [`PublicQuestion`] projection, which
//! has no field that could carry the answer. Deciding whether an answer is
//! correct goes through the [`Grader`] trait so the component holding the
//! answers can be swapped out.

use std::collections::{HashMap, HashSet};

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::question::{
    MAX_OPTION_COUNT, MAX_OPTION_TEXT_LENGTH, MAX_TEXT_LENGTH, MIN_OPTION_COUNT,
};

type ValidationResult = garde::Result;

/// One selectable option of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnswerOption {
    /// Identifier of the option, unique within its question
    #[garde(length(min = 1))]
    pub id: String,
    /// Text shown for the option
    #[garde(length(chars, max = MAX_OPTION_TEXT_LENGTH))]
    pub text: String,
}

impl AnswerOption {
    /// Creates an option from its identifier and text
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Checks that option ids are unique
fn validate_unique_ids(options: &[AnswerOption]) -> ValidationResult {
    let mut seen = HashSet::new();
    if options.iter().all(|o| seen.insert(o.id.as_str())) {
        Ok(())
    } else {
        Err(garde::Error::new("option ids must be unique"))
    }
}

/// Errors that make a question unusable
#[derive(Error, Debug)]
pub enum Error {
    /// A field is outside its bounds
    #[error("invalid question: {0}")]
    Invalid(#[from] garde::Report),
    /// The correct option id does not name one of the options
    #[error("correct option `{0}` is not one of the options")]
    UnknownCorrectOption(String),
}

/// A multiple choice question including its answer
///
/// This type never leaves the lecturer's context; publish
/// [`Question::to_public`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier of the question
    #[garde(length(min = 1))]
    #[serde(rename = "mcqId")]
    pub id: String,
    /// The question text
    #[garde(length(chars, min = 1, max = MAX_TEXT_LENGTH))]
    #[serde(rename = "question")]
    pub text: String,
    /// Options in display order
    #[garde(
        length(min = MIN_OPTION_COUNT, max = MAX_OPTION_COUNT),
        custom(|v, _| validate_unique_ids(v)),
        dive
    )]
    pub options: Vec<AnswerOption>,
    /// Identifier of the correct option
    #[garde(length(min = 1))]
    pub correct_option_id: String,
}

impl Question {
    /// Validates every field and checks that the correct option is one of
    /// the options
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] if a field is out of bounds and
    /// [`Error::UnknownCorrectOption`] if the answer names no option.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()?;
        if !self.has_option(&self.correct_option_id) {
            return Err(Error::UnknownCorrectOption(self.correct_option_id.clone()));
        }
        Ok(())
    }

    /// Returns the projection of this question that is safe to publish
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            text: self.text.clone(),
            options: self.options.clone(),
        }
    }

    /// Returns whether `option_id` is one of this question's options
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    /// Returns whether `option_id` is the correct answer
    pub fn is_correct(&self, option_id: &str) -> bool {
        self.correct_option_id == option_id
    }
}

/// The student-facing form of a question
///
/// It deliberately has no answer field, so an event carrying it cannot
/// leak the correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicQuestion {
    /// Identifier of the question
    #[serde(rename = "mcqId")]
    pub id: String,
    /// The question text
    #[serde(rename = "question")]
    pub text: String,
    /// Options in display order
    pub options: Vec<AnswerOption>,
}

impl PublicQuestion {
    /// Returns whether `option_id` is one of this question's options
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

/// Decides whether a submitted option is correct
pub trait Grader {
    /// Grades `submitted_option_id` against `question`
    ///
    /// Unknown questions and unknown options grade as incorrect.
    fn grade(&self, submitted_option_id: &str, question: &PublicQuestion) -> bool;
}

/// A [`Grader`] backed by the correct option of each known question
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
    correct: HashMap<String, String>,
}

impl AnswerKey {
    /// Builds an answer key from full questions
    pub fn from_questions<'a, I: IntoIterator<Item = &'a Question>>(questions: I) -> Self {
        Self {
            correct: questions
                .into_iter()
                .map(|q| (q.id.clone(), q.correct_option_id.clone()))
                .collect(),
        }
    }

    /// Adds or replaces the answer for one question
    pub fn insert(&mut self, question: &Question) {
        self.correct
            .insert(question.id.clone(), question.correct_option_id.clone());
    }

    /// Number of questions the key knows
    pub fn len(&self) -> usize {
        self.correct.len()
    }

    /// Whether the key knows no questions
    pub fn is_empty(&self) -> bool {
        self.correct.is_empty()
    }
}

impl Grader for AnswerKey {
    fn grade(&self, submitted_option_id: &str, question: &PublicQuestion) -> bool {
        question.has_option(submitted_option_id)
            && self
                .correct
                .get(&question.id)
                .is_some_and(|correct| correct == submitted_option_id)
    }
}

/// The canned draft questions a lecturer starts with
pub fn sample_drafts() -> Vec<Question> {
    vec![
        Question {
            id: "m1".to_owned(),
            text: "Which GCP service runs containers without managing servers?".to_owned(),
            options: vec![
                AnswerOption::new("a", "Cloud Run"),
                AnswerOption::new("b", "Compute Engine"),
                AnswerOption::new("c", "Bare metal"),
                AnswerOption::new("d", "Filestore"),
            ],
            correct_option_id: "a".to_owned(),
        },
        Question {
            id: "m2".to_owned(),
            text: "Where should ephemeral session state live in our MVP?".to_owned(),
            options: vec![
                AnswerOption::new("a", "Memorystore (Redis)"),
                AnswerOption::new("b", "Long-term SQL"),
                AnswerOption::new("c", "Student phones"),
                AnswerOption::new("d", "CSV files"),
            ],
            correct_option_id: "a".to_owned(),
        },
    ]
}
