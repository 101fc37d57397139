//! Unit conversions at the facade boundary.
//!
//! The control servers report temperatures as integer millidegrees and
//! transport the network delay parameters as decimal strings. Callers of
//! this crate only ever see degrees Celsius and `i64` nanoseconds; the
//! conversions live here so every call site scales the same way.

use crate::error::{Error, Result};

/// Scale between facade degrees and protocol millidegrees.
pub(crate) const MILLIDEGREES_PER_DEGREE: f64 = 1000.0;

/// Convert a raw ADC temperature reading to degrees Celsius.
#[inline]
pub(crate) fn millidegrees_to_degrees(raw: i32) -> f64 {
    f64::from(raw) / MILLIDEGREES_PER_DEGREE
}

/// Parse a delay value reported as a decimal string into nanoseconds.
///
/// The servers occasionally answer with padding around the digits, so
/// surrounding whitespace is accepted. Anything else is a conversion
/// failure, not a panic.
pub(crate) fn parse_delay_ns(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| Error::Conversion {
        value: raw.to_string(),
    })
}

/// Split a `'+'`-joined hostname list as reported by the group.
///
/// The servers terminate the list with a trailing separator
/// (`"beb059+beb048+"`); an empty report means no modules configured.
pub(crate) fn split_hostnames(joined: &str) -> Vec<String> {
    joined
        .split('+')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
