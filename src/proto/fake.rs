use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

use super::link::{Connector, Link};
use super::{ProtoError, Result};

/// Everything that happened on the fake wire, shared between the test and
/// the link owned by the session.
#[derive(Default)]
pub(crate) struct Wire {
    /// Bytes written by the session and the time they were written.
    pub(crate) written: Vec<(u8, Instant)>,
    /// Bytes waiting to be read by the session.
    pub(crate) inbound: Vec<u8>,
    /// Replies released into `inbound` each time a carriage return is written.
    pub(crate) replies: VecDeque<Vec<u8>>,
    /// Bytes reported as pending that never arrive.
    pub(crate) stalled: usize,
    pub(crate) discards: usize,
    pub(crate) opens: usize,
    pub(crate) shutdowns: usize,
    pub(crate) drops: usize,
    pub(crate) fail_open: bool,
    pub(crate) fail_write: bool,
}

impl Wire {
    /// Written bytes split into commands, without the trailing CR.
    pub(crate) fn commands(&self) -> Vec<String> {
        let bytes: Vec<u8> = self.written.iter().map(|(b, _)| *b).collect();
        bytes
            .split(|b| *b == b'\r')
            .filter(|cmd| !cmd.is_empty())
            .map(|cmd| String::from_utf8_lossy(cmd).to_string())
            .collect()
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    wire: Arc<Mutex<Wire>>,
}

impl FakeConnector {
    pub(crate) fn new(replies: &[&str]) -> Self {
        let connector = Self::default();
        connector.wire().replies = replies.iter().map(|r| r.as_bytes().to_vec()).collect();
        connector
    }

    pub(crate) fn wire(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().expect("fake wire poisoned")
    }
}

impl Connector for FakeConnector {
    fn open(&self) -> Result<Box<dyn Link>> {
        let mut wire = self.wire();
        if wire.fail_open {
            return Err(ProtoError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such device",
            )));
        }
        wire.opens += 1;
        Ok(Box::new(FakeLink {
            wire: Arc::clone(&self.wire),
        }))
    }

    fn name(&self) -> String {
        "fake".to_string()
    }
}

pub(crate) struct FakeLink {
    wire: Arc<Mutex<Wire>>,
}

impl FakeLink {
    fn wire(&self) -> MutexGuard<'_, Wire> {
        self.wire.lock().expect("fake wire poisoned")
    }
}

impl Link for FakeLink {
    fn discard_input(&mut self) -> Result<()> {
        let mut wire = self.wire();
        wire.inbound.clear();
        wire.discards += 1;
        Ok(())
    }

    fn pending(&self) -> Result<usize> {
        let wire = self.wire();
        Ok(wire.inbound.len() + wire.stalled)
    }
}

impl Drop for FakeLink {
    fn drop(&mut self) {
        if let Ok(mut wire) = self.wire.lock() {
            wire.drops += 1;
        }
    }
}

impl tokio::io::AsyncRead for FakeLink {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let mut wire = self.wire();
        if !wire.inbound.is_empty() {
            let c = buf.remaining().min(wire.inbound.len());
            buf.put_slice(&wire.inbound[0..c]);
            wire.inbound.drain(0..c);
        } else if wire.stalled > 0 {
            return std::task::Poll::Pending;
        }
        std::task::Poll::Ready(Ok(()))
    }
}

impl tokio::io::AsyncWrite for FakeLink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::result::Result<usize, std::io::Error>> {
        let mut wire = self.wire();
        if wire.fail_write {
            return std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            )));
        }
        let now = Instant::now();
        for b in buf {
            wire.written.push((*b, now));
            if *b == b'\r' {
                if let Some(reply) = wire.replies.pop_front() {
                    wire.inbound.extend(reply);
                }
            }
        }
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        self.wire().shutdowns += 1;
        std::task::Poll::Ready(Ok(()))
    }
}
