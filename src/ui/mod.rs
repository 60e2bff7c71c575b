//! Terminal presentation layer
//!
//! A line-oriented chat REPL: plain input is sent as a query to the active
//! session, slash commands manage sessions.

pub mod commands;
pub mod render;
pub mod repl;
