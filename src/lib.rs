//! # Quizcast
//!
//! This library provides the core of a classroom live-quiz session: a
//! lecturer publishes multiple choice questions, students answer them and
//! a leaderboard follows the answers. All views talk through an event
//! [`relay::Relay`] that delivers typed [`event::Event`]s to listeners in
//! its own execution context and mirrors them to the other contexts of
//! the same host over a broadcast channel or a shared store.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod constants;
pub mod environment;
pub mod event;
pub mod leaderboard;
pub mod lecturer;
pub mod question;
pub mod relay;
pub mod session_code;
pub mod student;
pub mod transport;

pub use environment::{Environment, Tab};
pub use event::Event;
pub use relay::{Relay, Subscription};
pub use session_code::SessionCode;
