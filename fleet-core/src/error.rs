use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum RangeError {
    #[snafu(display("Invalid range '{val}'"))]
    Invalid {
        #[snafu(implicit)]
        location: Location,
        val: String,
    },
    #[snafu(display("Failed to parse a bound of range '{val}'"))]
    ParseBound {
        #[snafu(implicit)]
        location: Location,
        val: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum MmsiError {
    #[snafu(display("Empty mmsi"))]
    Empty {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid mmsi '{val}'"))]
    Invalid {
        #[snafu(implicit)]
        location: Location,
        val: String,
    },
}
