//! `posterquiz` - Trivia session engine for AR marker poster games
//!
//! A poster carries an image marker; when a camera sees it, a short
//! multiple-choice quiz plays over it. This library provides the session
//! state machine, marker debouncing, timed UI choreography and analytics
//! records, decoupled from any rendering or tracking technology.

pub mod bank;
pub mod choreo;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod marker;
pub mod observability;
pub mod script;
pub mod session;
pub mod session_id;
pub mod ui;
