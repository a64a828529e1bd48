//! Game session state machine
//!
//! Coordinates marker presence, question sequencing and timed UI
//! choreography for one trivia session.
//!
//! # Architecture
//!
//! - [`SessionState`]: phase, question cursor, committed score, session id
//! - [`GameStateMachine`]: consumes lifecycle signals, answers and timer
//!   firings; produces [`UiIntent`](crate::ui::UiIntent)s and analytics records

pub mod machine;
pub mod state;

pub use machine::GameStateMachine;
pub use state::{Phase, SessionState};
