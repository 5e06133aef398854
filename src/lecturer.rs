//! The lecturer's side of a session
//!
//! A lecturer owns the session code, approves draft questions for
//! publication, keeps the leaderboard from the answers students submit
//! and eventually ends the session.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::leaderboard::POINTS_PER_CORRECT,
    event::{Event, LeaderboardEntry},
    leaderboard::Leaderboard,
    question::{self, AnswerKey, Question, sample_drafts},
    relay::{Relay, Subscription},
    session_code::{self, SessionCode},
};

/// Options for a lecturer session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Points awarded for each correct answer
    pub points_per_correct: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            points_per_correct: POINTS_PER_CORRECT,
        }
    }
}

/// Errors a lecturer session can report
#[derive(Error, Debug)]
pub enum Error {
    /// No session code was supplied
    #[error("missing session code")]
    MissingCode,
    /// The supplied session code is not valid
    #[error("invalid session code: {0}")]
    InvalidCode(#[from] session_code::Error),
    /// A draft question failed validation
    #[error(transparent)]
    InvalidQuestion(#[from] question::Error),
    /// No draft has the given question id
    #[error("no draft question with id `{0}`")]
    UnknownDraft(String),
    /// The session has already been ended
    #[error("session has ended")]
    Ended,
}

/// The lecturer view of a running session
///
/// Dropping the session stops scoring answers, as [`LecturerSession::end`]
/// does, but announces nothing.
#[derive(Debug)]
pub struct LecturerSession {
    code: SessionCode,
    relay: Rc<Relay>,
    drafts: Vec<Question>,
    /// Published questions, newest first
    published: Vec<Question>,
    leaderboard: Rc<RefCell<Leaderboard>>,
    subscription: Subscription,
    ended: bool,
}

impl LecturerSession {
    /// Starts a session with a freshly generated code
    pub fn create(relay: Rc<Relay>, options: Options) -> Self {
        Self::with_code(relay, SessionCode::generate(), options)
    }

    /// Starts a session for a code that arrived from outside, such as a
    /// query string
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCode`] for a blank code and
    /// [`Error::InvalidCode`] for one that does not parse. No listener is
    /// registered in either case.
    pub fn start(relay: Rc<Relay>, code: &str, options: Options) -> Result<Self, Error> {
        if code.trim().is_empty() {
            return Err(Error::MissingCode);
        }
        let code = SessionCode::from_str(code)?;
        Ok(Self::with_code(relay, code, options))
    }

    fn with_code(relay: Rc<Relay>, code: SessionCode, options: Options) -> Self {
        let leaderboard = Rc::new(RefCell::new(Leaderboard::new(options.points_per_correct)));
        let subscription = relay.subscribe(Self::answer_listener(
            code.clone(),
            Rc::downgrade(&relay),
            Rc::clone(&leaderboard),
        ));

        tracing::debug!(%code, "lecturer session started");

        Self {
            code,
            relay,
            drafts: sample_drafts(),
            published: Vec::new(),
            leaderboard,
            subscription,
            ended: false,
        }
    }

    /// Builds the listener that scores answers for `code` and announces
    /// the new standings
    fn answer_listener(
        code: SessionCode,
        relay: Weak<Relay>,
        leaderboard: Rc<RefCell<Leaderboard>>,
    ) -> impl Fn(&Event) + 'static {
        move |event| {
            let Event::AnswerSubmitted {
                code: answer_code,
                student,
                correct,
                ..
            } = event
            else {
                return;
            };
            if *answer_code != code {
                return;
            }

            let top = {
                let mut leaderboard = leaderboard.borrow_mut();
                leaderboard.record_answer(student, *correct);
                leaderboard.top()
            };

            if let Some(relay) = relay.upgrade() {
                relay.publish(&Event::LeaderboardUpdate {
                    code: code.clone(),
                    top,
                });
            }
        }
    }

    /// The session code to share with the class
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// Draft questions not yet approved
    pub fn drafts(&self) -> &[Question] {
        &self.drafts
    }

    /// Published questions, newest first
    pub fn published(&self) -> &[Question] {
        &self.published
    }

    /// The current top of the leaderboard
    pub fn top(&self) -> Vec<LeaderboardEntry> {
        self.leaderboard.borrow().top()
    }

    /// Whether the session has been ended
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// A grader that knows every question of this session
    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey::from_questions(self.drafts.iter().chain(&self.published))
    }

    /// Adds a question to the drafts
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ended`] once the session has ended and
    /// [`Error::InvalidQuestion`] if the question does not pass
    /// [`Question::check`].
    pub fn add_draft(&mut self, question: Question) -> Result<(), Error> {
        if self.ended {
            return Err(Error::Ended);
        }
        question.check()?;
        self.drafts.push(question);
        Ok(())
    }

    /// Approves the draft `question_id` and publishes it to students
    ///
    /// Students receive the question without its correct option.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDraft`] if no draft has that id and
    /// [`Error::Ended`] once the session has ended.
    pub fn approve(&mut self, question_id: &str) -> Result<&Question, Error> {
        if self.ended {
            return Err(Error::Ended);
        }
        let index = self
            .drafts
            .iter()
            .position(|q| q.id == question_id)
            .ok_or_else(|| Error::UnknownDraft(question_id.to_owned()))?;
        let question = self.drafts.remove(index);

        self.relay.publish(&Event::QuestionPublished {
            code: self.code.clone(),
            question: question.to_public(),
        });

        self.published.insert(0, question);
        Ok(&self.published[0])
    }

    /// Ends the session for everyone
    ///
    /// Answers arriving afterwards are ignored. Ending twice publishes
    /// nothing the second time.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.subscription.unsubscribe();
        self.relay.publish(&Event::SessionEnded {
            code: self.code.clone(),
        });

        tracing::debug!(code = %self.code, "lecturer session ended");
    }
}

impl Drop for LecturerSession {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
