use std::{fmt::Display, ops::Bound, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use snafu::ResultExt;

use crate::{
    RangeError,
    range_error::{InvalidSnafu, ParseBoundSnafu},
};

/// A range over `T` where each end is included, excluded or unbounded.
///
/// The textual form uses interval notation, `[0,30]`, `(0.5,1]`, `[5,)`, an empty bound
/// meaning unbounded on that side.
#[derive(Clone, Debug, PartialEq)]
pub struct Range<T> {
    pub start: Bound<T>,
    pub end: Bound<T>,
}

impl<T> Range<T> {
    pub fn closed(start: T, end: T) -> Self {
        Self {
            start: Bound::Included(start),
            end: Bound::Included(end),
        }
    }

    pub fn at_least(start: T) -> Self {
        Self {
            start: Bound::Included(start),
            end: Bound::Unbounded,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }
}

impl<T: PartialOrd> Range<T> {
    pub fn contains(&self, value: &T) -> bool {
        let above_start = match &self.start {
            Bound::Included(s) => value >= s,
            Bound::Excluded(s) => value > s,
            Bound::Unbounded => true,
        };
        let below_end = match &self.end {
            Bound::Included(e) => value <= e,
            Bound::Excluded(e) => value < e,
            Bound::Unbounded => true,
        };
        above_start && below_end
    }
}

impl<T> Default for Range<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Parses one side of the interval, `inclusive` marks whether its bracket was `[` or `]`.
fn parse_bound<T: FromStr>(
    text: &str,
    inclusive: bool,
    source: &str,
) -> Result<Bound<T>, RangeError>
where
    T::Err: Send + Sync + std::error::Error + 'static,
{
    let text = text.trim();
    if text.is_empty() {
        return Ok(Bound::Unbounded);
    }

    let value = text
        .parse::<T>()
        .boxed()
        .context(ParseBoundSnafu { val: source })?;

    Ok(if inclusive {
        Bound::Included(value)
    } else {
        Bound::Excluded(value)
    })
}

impl<T: FromStr> FromStr for Range<T>
where
    T::Err: Send + Sync + std::error::Error + 'static,
{
    type Err = RangeError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        let trimmed = v.trim();
        let mut chars = trimmed.chars();
        let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
            return InvalidSnafu { val: v }.fail();
        };
        let Some((lower, upper)) = chars.as_str().split_once(',') else {
            return InvalidSnafu { val: v }.fail();
        };

        let start_inclusive = match open {
            '[' => true,
            '(' => false,
            _ => return InvalidSnafu { val: v }.fail(),
        };
        let end_inclusive = match close {
            ']' => true,
            ')' => false,
            _ => return InvalidSnafu { val: v }.fail(),
        };

        Ok(Range {
            start: parse_bound(lower, start_inclusive, v)?,
            end: parse_bound(upper, end_inclusive, v)?,
        })
    }
}

impl<T: FromStr> TryFrom<String> for Range<T>
where
    T::Err: Send + Sync + std::error::Error + 'static,
{
    type Error = RangeError;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        v.parse()
    }
}

impl<T: Display> Display for Range<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.start {
            Bound::Included(v) => write!(f, "[{v},")?,
            Bound::Excluded(v) => write!(f, "({v},")?,
            Bound::Unbounded => f.write_str("(,")?,
        }
        match &self.end {
            Bound::Included(v) => write!(f, "{v}]"),
            Bound::Excluded(v) => write!(f, "{v})"),
            Bound::Unbounded => f.write_str(")"),
        }
    }
}

impl<T: Display> Serialize for Range<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Range<T>
where
    T::Err: Send + Sync + std::error::Error + 'static,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
