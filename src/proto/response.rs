use super::{ProtoError, Result};

/// Marker the thermometer sends in place of a value when no probe is
/// plugged into the requested channel.
const NO_PROBE: &str = "NoProbe";

/// Text the device answered with, whitespace trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response(String);

impl Response {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_string())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn into_text(self) -> String {
        self.0
    }

    /// Interpret the response to a channel measurement.
    ///
    /// Replies are comma separated and the second field holds either the
    /// measured value or [`NO_PROBE`]. The value is returned as sent,
    /// converting it to a number is left to the caller.
    pub fn reading(&self) -> Result<Reading> {
        match self.0.split(',').nth(1).map(str::trim) {
            Some(NO_PROBE) => Ok(Reading::NoProbe),
            Some(value) => Ok(Reading::Value(value.to_string())),
            None => Err(ProtoError::Malformed(self.0.clone())),
        }
    }
}

/// Outcome of a channel measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading {
    Value(String),
    NoProbe,
}

impl Reading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Value(value) => value.parse().ok(),
            Reading::NoProbe => None,
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Value(value) => write!(f, "{}", value),
            Reading::NoProbe => write!(f, "no probe"),
        }
    }
}
