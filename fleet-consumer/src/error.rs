use fleet_core::UpdateMessage;
use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Unknown event kind '{name}'"))]
    UnknownEvent {
        #[snafu(implicit)]
        location: Location,
        name: String,
        #[snafu(source)]
        error: strum::ParseError,
    },
    #[snafu(display("Failed to parse event payload"))]
    Json {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: serde_json::Error,
    },
    #[snafu(display("Event payload is not a JSON array, found {found}"))]
    NotAnArray {
        #[snafu(implicit)]
        location: Location,
        found: &'static str,
    },
    #[snafu(display("Event stream closed unexpectedly"))]
    StreamClosed {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Update channel closed"))]
    Send {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: async_channel::SendError<UpdateMessage>,
    },
    #[snafu(display("Store task failed"))]
    Join {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: tokio::task::JoinError,
    },
    #[snafu(display("Fleet state error"))]
    State {
        #[snafu(implicit)]
        location: Location,
        source: fleet_state::Error,
    },
    #[snafu(display("APP_ENVIRONMENT is not set"))]
    MissingEnvironment {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: std::env::VarError,
    },
    #[snafu(display("Invalid APP_ENVIRONMENT '{value}'"))]
    InvalidEnvironment {
        #[snafu(implicit)]
        location: Location,
        value: String,
        #[snafu(source)]
        error: strum::ParseError,
    },
    #[snafu(display("Configuration error"))]
    Config {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: config::ConfigError,
    },
    #[snafu(display("Failed to install the tracing subscriber"))]
    Tracing {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: tracing::subscriber::SetGlobalDefaultError,
    },
}
