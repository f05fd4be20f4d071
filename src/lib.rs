//! Assigns students to events under capacity, conflict-block and rule
//! constraints with a most-constrained-first backtracking search.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod schedule;
pub mod web;
