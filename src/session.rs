use bytes::BytesMut;
use log::{debug, error, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{sleep, timeout};
use tokio_util::codec::{Decoder, Encoder};

use crate::proto::{
    codec::ProtocolCodec,
    command::{Channel, Command},
    link::{Connector, Link, SerialConnector},
    response::{Reading, Response},
    ProtoError, Result,
};
use crate::Timing;

/// Connection to a single thermometer.
///
/// The session starts closed. [`connect`](Self::connect) opens the port and
/// puts the device into remote mode, which locks its keypad until
/// [`disconnect`](Self::disconnect) hands control back.
///
/// Every exchange blocks the calling task for the byte pacing plus the
/// settle time of the command, so a reading takes a bit under a second.
pub struct ProbeSession {
    connector: Box<dyn Connector>,
    link: Option<Box<dyn Link>>,
    codec: ProtocolCodec,
    timing: Timing,
}

impl ProbeSession {
    /// Session for the serial port at `path`, not opened yet.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self::with_timing(path, Timing::default())
    }

    /// Like [`new`](Self::new), with custom delays. The port's own read
    /// timeout is taken from `timing` as well.
    pub fn with_timing(path: impl AsRef<str>, timing: Timing) -> Self {
        Self::with_connector(SerialConnector::with_timing(path, &timing), timing)
    }

    pub fn with_connector(connector: impl Connector + 'static, timing: Timing) -> Self {
        Self {
            connector: Box::new(connector),
            link: None,
            codec: ProtocolCodec,
            timing,
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Open the port and switch the device to remote mode.
    ///
    /// Calling this on an open session does nothing. If the remote mode
    /// command cannot be written the port is closed again.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_open() {
            debug!("{}: already connected", self.connector.name());
            return Ok(());
        }

        let link = self.connector.open().map_err(|err| {
            error!("{}: unable to open port: {}", self.connector.name(), err);
            err
        })?;
        self.link = Some(link);
        info!("{}: port opened", self.connector.name());

        if let Err(err) = self.set_remote_mode(true).await {
            self.link = None;
            return Err(err);
        }
        Ok(())
    }

    /// Give the keypad back to the user and close the port.
    ///
    /// Never fails: problems are logged and the session ends up closed
    /// either way.
    pub async fn disconnect(&mut self) {
        if !self.is_open() {
            debug!("{}: not connected", self.connector.name());
            return;
        }

        if let Err(err) = self.set_remote_mode(false).await {
            warn!(
                "{}: unable to switch device to local mode: {}",
                self.connector.name(),
                err
            );
        }

        if let Some(mut link) = self.link.take() {
            if let Err(err) = link.shutdown().await {
                warn!("{}: error while closing port: {}", self.connector.name(), err);
            }
        }
        info!("{}: port closed", self.connector.name());
    }

    /// Device name and serial number, as sent by the device.
    pub async fn identify(&mut self) -> Result<String> {
        Ok(self.exchange(Command::Id).await?.into_text())
    }

    pub async fn set_unit_celsius(&mut self) -> Result<()> {
        self.exchange(Command::SetUnitCelsius).await.map(|_| ())
    }

    /// Lock (`true`) or unlock (`false`) the keypad of the device.
    pub async fn set_remote_mode(&mut self, enable: bool) -> Result<()> {
        let command = if enable {
            Command::SetRemote
        } else {
            Command::SetLocal
        };
        self.exchange(command).await.map(|_| ())
    }

    /// Read the current value of a channel.
    ///
    /// Accepts a [`Channel`] or its letter, e.g. `'A'` or `"b"`. Anything
    /// that is not a known channel fails before a command is sent.
    pub async fn measure_channel<C>(&mut self, channel: C) -> Result<Reading>
    where
        C: TryInto<Channel>,
        ProtoError: From<C::Error>,
    {
        let channel = channel.try_into().map_err(|err| {
            let err = ProtoError::from(err);
            error!("{}: {}", self.connector.name(), err);
            err
        })?;

        self.exchange(Command::MeasureChannel(channel))
            .await?
            .reading()
            .map_err(|err| {
                error!("{}: channel {}: {}", self.connector.name(), channel, err);
                err
            })
    }

    /// Read `channel` every `interval` and hand each reading to `on_reading`.
    ///
    /// Stops after `count` readings, or as soon as `stop` resolves, even in
    /// the middle of an exchange, so the caller can still disconnect
    /// cleanly. Returns the number of readings taken.
    pub async fn poll_channel(
        &mut self,
        channel: Channel,
        interval: Duration,
        count: Option<u64>,
        stop: impl Future,
        mut on_reading: impl FnMut(Reading),
    ) -> Result<u64> {
        tokio::pin!(stop);

        let mut n = 0;
        while count.map_or(true, |c| n < c) {
            let reading = tokio::select! {
                reading = self.measure_channel(channel) => reading?,
                _ = &mut stop => break,
            };
            on_reading(reading);
            n += 1;

            if count.map_or(false, |c| n >= c) {
                break;
            }
            tokio::select! {
                _ = sleep(interval) => {}
                _ = &mut stop => break,
            }
        }
        Ok(n)
    }

    /// Send arbitrary command text and return the trimmed reply.
    ///
    /// `settle` is how long to wait for the device before reading.
    pub async fn send_command(&mut self, text: impl AsRef<str>, settle: Duration) -> Result<String> {
        let response = self
            .transact(Command::Raw(text.as_ref().to_string()), settle)
            .await?;
        Ok(response.into_text())
    }

    async fn exchange(&mut self, command: Command) -> Result<Response> {
        let settle = command.settle(&self.timing);
        self.transact(command, settle).await
    }

    async fn transact(&mut self, command: Command, settle: Duration) -> Result<Response> {
        let text = command.to_string();
        match self.write_and_read(command, settle).await {
            Ok(response) => {
                debug!("{}: {:?} -> {:?}", self.connector.name(), text, response.text());
                Ok(response)
            }
            Err(err) => {
                error!("{}: {:?} failed: {}", self.connector.name(), text, err);
                Err(err)
            }
        }
    }

    async fn write_and_read(&mut self, command: Command, settle: Duration) -> Result<Response> {
        let link = self.link.as_mut().ok_or(ProtoError::NotOpen)?;

        // A reply nobody read would otherwise prefix the next one.
        link.discard_input()?;

        let mut frame = BytesMut::new();
        self.codec.encode(command, &mut frame)?;

        // The firmware loses bytes that arrive back to back.
        for byte in frame.iter() {
            link.write_all(&[*byte]).await?;
            link.flush().await?;
            sleep(self.timing.byte_delay).await;
        }

        // No ready signal from the device, the wait is the handshake.
        sleep(settle).await;

        let mut buf = BytesMut::zeroed(link.pending()?);
        if !buf.is_empty() {
            timeout(self.timing.read_timeout, link.read_exact(&mut buf[..]))
                .await
                .map_err(|_| ProtoError::Timeout)??;
        }
        Ok(self.codec.decode(&mut buf)?.unwrap_or_default())
    }
}

impl Drop for ProbeSession {
    fn drop(&mut self) {
        if self.link.take().is_some() {
            warn!(
                "{}: session dropped while connected, device stays in remote mode",
                self.connector.name()
            );
        }
    }
}
