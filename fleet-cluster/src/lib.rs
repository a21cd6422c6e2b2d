#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Hierarchical point clustering for map rendering.
//!
//! Points are projected to spherical mercator and clustered once per zoom level, after
//! which viewport queries, child lookups and expansion zooms are cheap tree lookups.

pub mod error;
mod kdbush;
pub mod projection;
mod supercluster;

pub use error::*;
pub use kdbush::KdBush;
pub use supercluster::*;
