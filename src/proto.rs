use std::convert::Infallible;

pub mod codec;
pub mod command;
pub mod link;
pub mod response;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("Port is not open")]
    NotOpen,
    #[error("Timeout while reading device response")]
    Timeout,
    #[error("Invalid channel: {:?}", _0)]
    InvalidChannel(String),
    #[error("Malformed response: {:?}", _0)]
    Malformed(String),
}

impl From<Infallible> for ProtoError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

pub type Result<T> = std::result::Result<T, ProtoError>;
