use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    MmsiError,
    mmsi_error::{EmptySnafu, InvalidSnafu},
};

/// Maritime Mobile Service Identity, the stable identity of a vessel.
///
/// Upstream sends the identity either as a JSON number or as a string depending on the
/// producer version, both normalize to the same trimmed decimal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mmsi(String);

impl Mmsi {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for Mmsi {
    type Err = MmsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return EmptySnafu.fail();
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return InvalidSnafu { val: s }.fail();
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for Mmsi {
    type Error = MmsiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<u64> for Mmsi {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<Mmsi> for String {
    fn from(value: Mmsi) -> Self {
        value.0
    }
}

impl AsRef<str> for Mmsi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Mmsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
