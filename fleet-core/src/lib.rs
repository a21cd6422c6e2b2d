#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Domain model shared by every crate in the fleet workspace: vessel identity, the
//! reconciled [Vessel] record, its forecast and encounter sub-records and the typed update
//! batches produced by the event decoder.

mod domain;
mod error;

pub use domain::*;
pub use error::*;
