//! Omok board model and win evaluation.
//!
//! This module provides:
//! - Board, Color and Coord entities
//! - The exact-five win detector (overlines do not win)
//! - Default board and turn constants

pub mod constants;
pub mod entities;
pub mod functional;

pub use entities::{Board, Color, Coord};
pub use functional::is_winning_move;
