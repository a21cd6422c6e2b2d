#![deny(warnings)]
#![deny(rust_2018_idioms)]

mod clusters;
pub mod error;
mod filter;
mod fleet_view;
mod store;
mod view;

pub use clusters::*;
pub use error::*;
pub use filter::*;
pub use fleet_view::*;
pub use store::*;
pub use view::*;
