//! Validation and execution of player actions on crops.
//!
//! # Submodules
//!
//! - [`validation`] -- Preconditions shared by every action and the harvest gate.
//! - [`handlers`] -- Execution logic for water, fertilize, treat and harvest marking.

pub mod handlers;
pub mod validation;
