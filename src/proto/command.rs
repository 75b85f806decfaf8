use std::{fmt, str::FromStr, time::Duration};

use super::ProtoError;
use crate::Timing;

/// Input channel of the thermometer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Channel number used on the wire.
    pub fn index(&self) -> u8 {
        match self {
            Channel::A => 1,
            Channel::B => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "A"),
            Channel::B => write!(f, "B"),
        }
    }
}

impl TryFrom<char> for Channel {
    type Error = ProtoError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            'A' => Ok(Channel::A),
            'B' => Ok(Channel::B),
            _ => Err(ProtoError::InvalidChannel(value.to_string())),
        }
    }
}

impl FromStr for Channel {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Channel::try_from(c),
            _ => Err(ProtoError::InvalidChannel(s.to_string())),
        }
    }
}

impl TryFrom<&str> for Channel {
    type Error = ProtoError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Id,
    // Configuration
    SetUnitCelsius,
    SetRemote,
    SetLocal,
    // Readings
    MeasureChannel(Channel),
    // Anything else the firmware understands
    Raw(String),
}

impl Command {
    /// Time the device needs after this command before its reply can be read.
    pub fn settle(&self, timing: &Timing) -> Duration {
        match self {
            Command::Id => timing.ident_settle,
            _ => timing.settle,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Id => write!(f, "*IDN?"),
            Command::SetUnitCelsius => write!(f, "UNIT:TEMP? CEL"),
            Command::SetRemote => write!(f, "SYSTEM:REMOTE"),
            Command::SetLocal => write!(f, "SYSTEM:LOCAL"),
            Command::MeasureChannel(ch) => write!(f, "MEASURE:CHANNEL? {}", ch.index()),
            Command::Raw(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mapping() {
        assert_eq!(
            Command::MeasureChannel(Channel::A).to_string(),
            "MEASURE:CHANNEL? 1"
        );
        assert_eq!(
            Command::MeasureChannel(Channel::B).to_string(),
            "MEASURE:CHANNEL? 2"
        );
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(Channel::try_from('a').ok(), Some(Channel::A));
        assert_eq!("B".parse::<Channel>().ok(), Some(Channel::B));
        assert!(matches!(
            Channel::try_from('C'),
            Err(ProtoError::InvalidChannel(_))
        ));
        assert!("AB".parse::<Channel>().is_err());
        assert!("".parse::<Channel>().is_err());
    }

    #[test]
    fn test_settle() {
        let timing = Timing::default();
        assert_eq!(Command::Id.settle(&timing), Duration::from_millis(1000));
        assert_eq!(Command::SetRemote.settle(&timing), Duration::from_millis(666));
        assert_eq!(
            Command::MeasureChannel(Channel::B).settle(&timing),
            Duration::from_millis(666)
        );
    }
}
