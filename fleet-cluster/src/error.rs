use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid cluster options: {reason}"))]
    InvalidOptions {
        #[snafu(implicit)]
        location: Location,
        reason: String,
    },
    #[snafu(display("No cluster with id '{id}'"))]
    UnknownCluster {
        #[snafu(implicit)]
        location: Location,
        id: usize,
    },
}
