//! Engine — the session state machine that drives rounds end to end.

pub mod session;
