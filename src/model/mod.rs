//! # Entity Model
//!
//! Plain data shared by every layer: entity records, the vector codec and
//! equations over abbreviations. No I/O here.

pub mod entity;
pub mod codec;
pub mod equation;

pub use entity::{by_priority, EntityRecord, Rank};
pub use codec::ZeroComponent;
pub use equation::{coefficient, Equation, Term};
