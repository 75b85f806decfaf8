use bytes::BytesMut;
use std::{
    fmt::Write,
    io::{self},
    str,
};
use tokio_util::codec::{Decoder, Encoder};

use super::response::Response;
use crate::proto::command::Command;

/// Frames commands for the thermometer and turns the bytes read back
/// after the settle window into a [`Response`].
///
/// The device does not terminate its replies, so the decoder treats
/// everything in the buffer as one reply.
#[derive(Default)]
pub struct ProtocolCodec;

impl Decoder for ProtocolCodec {
    type Item = Response;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let payload = src.split();
        let text = str::from_utf8(&payload)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        Ok(Some(Response::new(text)))
    }
}

impl Encoder<Command> for ProtocolCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let text = item.to_string();
        if !text.is_ascii() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Command is not ASCII: {:?}", text),
            ));
        }
        write!(dst, "{}\r", text).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
