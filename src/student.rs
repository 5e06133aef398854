//! The student's side of a session
//!
//! Joining validates a code and nickname and stores them in the tab's
//! session storage. Playing reads them back, follows the questions the
//! lecturer publishes for that code and submits graded answers.

use std::{cell::RefCell, rc::Rc, str::FromStr};

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use crate::{
    constants::{
        nickname::{FALLBACK, MAX_LENGTH, MIN_LENGTH},
        tab_storage::{CODE_KEY, NAME_KEY},
    },
    environment::TabStorage,
    event::{Event, LeaderboardEntry},
    question::{Grader, PublicQuestion},
    relay::{Relay, Subscription},
    session_code::{self, SessionCode},
};

/// Errors that can occur when joining a session
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// The session code is not acceptable
    #[error("invalid session code: {0}")]
    Code(#[from] session_code::Error),
    /// The nickname is too short after trimming
    #[error("nickname is too short")]
    NameTooShort,
    /// The nickname exceeds the maximum length
    #[error("nickname is too long")]
    NameTooLong,
    /// The nickname contains inappropriate content
    #[error("nickname is inappropriate")]
    NameSinful,
}

/// What a student typed into the join form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRequest {
    /// The session code as typed
    pub code: String,
    /// The nickname as typed
    pub nickname: String,
}

impl JoinRequest {
    /// Creates a request from the two form fields
    pub fn new(code: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            nickname: nickname.into(),
        }
    }

    /// Validates the request and stores it in `storage`
    ///
    /// The code is trimmed and uppercased, the nickname trimmed.
    ///
    /// # Errors
    ///
    /// Returns a [`JoinError`] describing the first field that failed;
    /// nothing is stored in that case.
    pub fn submit(&self, storage: &TabStorage) -> Result<(SessionCode, String), JoinError> {
        let code = SessionCode::from_str(&self.code)?;
        let nickname = validate_nickname(&self.nickname)?;

        storage.set_item(CODE_KEY, code.as_str());
        storage.set_item(NAME_KEY, &nickname);

        tracing::debug!(%code, nickname, "joined session");

        Ok((code, nickname))
    }
}

/// Trims and checks a nickname
fn validate_nickname(nickname: &str) -> Result<String, JoinError> {
    let nickname = rustrict::trim_whitespace(nickname);
    if nickname.chars().count() < MIN_LENGTH {
        return Err(JoinError::NameTooShort);
    }
    if nickname.chars().count() > MAX_LENGTH {
        return Err(JoinError::NameTooLong);
    }
    if nickname.is_inappropriate() {
        return Err(JoinError::NameSinful);
    }
    Ok(nickname.to_owned())
}

/// How a submitted answer was graded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The answer was correct
    Correct,
    /// The answer was wrong
    Wrong,
}

impl From<bool> for Outcome {
    fn from(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Wrong }
    }
}

/// What the student's screen currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// No question has been published yet
    #[default]
    Waiting,
    /// A question is on screen
    Answering {
        /// The question being shown
        question: PublicQuestion,
        /// The option the student picked, once they have
        picked: Option<String>,
        /// The grading of the pick, once there is one
        result: Option<Outcome>,
    },
    /// The lecturer ended the session; nothing changes after this
    Ended,
}

/// Errors a student session can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The tab has no joined session code
    #[error("no session code, join first")]
    MissingCode,
    /// There is no question to answer
    #[error("no active question")]
    NoActiveQuestion,
    /// The student already answered the current question
    #[error("question already answered")]
    AlreadyAnswered,
    /// The option is not part of the current question
    #[error("unknown option `{0}`")]
    UnknownOption(String),
}

/// The student view of a joined session
///
/// Dropping it stops following the session, like [`StudentSession::leave`].
pub struct StudentSession {
    code: SessionCode,
    nickname: String,
    relay: Rc<Relay>,
    grader: Box<dyn Grader>,
    view: Rc<RefCell<View>>,
    leaderboard: Rc<RefCell<Vec<LeaderboardEntry>>>,
    subscription: Subscription,
}

impl std::fmt::Debug for StudentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentSession")
            .field("code", &self.code)
            .field("nickname", &self.nickname)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl StudentSession {
    /// Resumes the session stored in `storage`
    ///
    /// A missing nickname falls back to `Anon`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCode`] if the tab has not joined a session;
    /// no listener is registered in that case.
    pub fn resume(
        relay: Rc<Relay>,
        storage: &TabStorage,
        grader: Box<dyn Grader>,
    ) -> Result<Self, Error> {
        let code = storage
            .get_item(CODE_KEY)
            .and_then(|c| SessionCode::from_str(&c).ok())
            .ok_or(Error::MissingCode)?;
        let nickname = storage
            .get_item(NAME_KEY)
            .unwrap_or_else(|| FALLBACK.to_owned());

        let view: Rc<RefCell<View>> = Rc::default();
        let leaderboard: Rc<RefCell<Vec<LeaderboardEntry>>> = Rc::default();
        let subscription = relay.subscribe(Self::session_listener(
            code.clone(),
            Rc::clone(&view),
            Rc::clone(&leaderboard),
        ));

        Ok(Self {
            code,
            nickname,
            relay,
            grader,
            view,
            leaderboard,
            subscription,
        })
    }

    /// Builds the listener that follows the lecturer's events for `code`
    fn session_listener(
        code: SessionCode,
        view: Rc<RefCell<View>>,
        leaderboard: Rc<RefCell<Vec<LeaderboardEntry>>>,
    ) -> impl Fn(&Event) + 'static {
        move |event| {
            if !event.is_for(&code) {
                return;
            }
            let mut view = view.borrow_mut();
            if *view == View::Ended {
                return;
            }
            match event {
                Event::QuestionPublished { question, .. } => {
                    *view = View::Answering {
                        question: question.clone(),
                        picked: None,
                        result: None,
                    };
                }
                Event::LeaderboardUpdate { top, .. } => {
                    leaderboard.borrow_mut().clone_from(top);
                }
                Event::SessionEnded { .. } => {
                    *view = View::Ended;
                }
                Event::AnswerSubmitted { .. } => {}
            }
        }
    }

    /// The joined session code
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// The nickname answers are submitted under
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// What the screen currently shows
    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    /// The most recent leaderboard the lecturer announced
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.leaderboard.borrow().clone()
    }

    /// Answers the current question with `option_id`
    ///
    /// The answer is graded and announced to the lecturer.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no active question, the question was
    /// already answered, or the option does not belong to it.
    pub fn submit(&self, option_id: &str) -> Result<Outcome, Error> {
        let (question_id, outcome) = {
            let mut view = self.view.borrow_mut();
            let View::Answering {
                question,
                picked,
                result,
            } = &mut *view
            else {
                return Err(Error::NoActiveQuestion);
            };
            if picked.is_some() {
                return Err(Error::AlreadyAnswered);
            }
            if !question.has_option(option_id) {
                return Err(Error::UnknownOption(option_id.to_owned()));
            }

            let outcome = Outcome::from(self.grader.grade(option_id, question));
            *picked = Some(option_id.to_owned());
            *result = Some(outcome);
            (question.id.clone(), outcome)
        };

        self.relay.publish(&Event::AnswerSubmitted {
            code: self.code.clone(),
            student: self.nickname.clone(),
            question_id,
            correct: outcome == Outcome::Correct,
        });

        Ok(outcome)
    }

    /// Stops following the session
    pub fn leave(&self) {
        self.subscription.unsubscribe();
    }
}

impl Drop for StudentSession {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
