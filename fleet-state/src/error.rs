use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Cluster index failure"))]
    Cluster {
        #[snafu(implicit)]
        location: Location,
        source: fleet_cluster::Error,
    },
    #[snafu(display("No cluster index has been built yet"))]
    NoClusterIndex {
        #[snafu(implicit)]
        location: Location,
    },
}
