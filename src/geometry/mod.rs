//! Plane frames and wire geometry adapters.

pub mod plane;
pub mod wire;

pub use plane::Plane;
pub use wire::{wire_line, wire_plane, GridView, LineGrid, WireGeometry, WireId};
