mod batch;
mod bounds;
mod encounter;
mod mmsi;
mod range;
mod vessel;

pub use batch::*;
pub use bounds::*;
pub use encounter::*;
pub use mmsi::*;
pub use range::*;
pub use vessel::*;
