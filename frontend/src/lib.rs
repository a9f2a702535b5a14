//! Validation and submission core of the Foodopia ordering front end.
//!
//! The hosting UI feeds field edits and rating choices into the coordinators
//! in [`domain`] and renders the verdicts and states they publish.

pub mod config;
pub mod domain;
