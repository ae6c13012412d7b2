//! Domain model for BOM reconciliation.
//!
//! Line items, version groups, observations and action items are plain data;
//! the [`wire`] module holds the serialization-boundary records that decode
//! upstream JSON into these types.

mod action;
mod bom;
mod observation;
pub mod wire;

pub use action::*;
pub use bom::*;
pub use observation::*;
pub use wire::{Nullable, parse_line_items, parse_observation};
