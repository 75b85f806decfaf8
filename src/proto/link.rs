//! Transport between the session and the thermometer.
//!
//! A [`Connector`] knows how to open the channel, the [`Link`] it returns
//! is the open channel. Dropping the link closes it.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};

use super::Result;
use crate::{Timing, DEFAULT_BAUDRATE, READ_TIMEOUT};

/// An open byte channel to the device.
pub trait Link: AsyncRead + AsyncWrite + Unpin + Send {
    /// Drop everything received but not read yet.
    fn discard_input(&mut self) -> Result<()>;

    /// Number of received bytes that can be read without waiting.
    fn pending(&self) -> Result<usize>;
}

/// Opens a [`Link`].
pub trait Connector: Send {
    fn open(&self) -> Result<Box<dyn Link>>;

    /// Human readable name of the channel, used for logging.
    fn name(&self) -> String;
}

impl Link for SerialStream {
    fn discard_input(&mut self) -> Result<()> {
        <SerialStream as SerialPort>::clear(self, ClearBuffer::Input)?;
        Ok(())
    }

    fn pending(&self) -> Result<usize> {
        Ok(<SerialStream as SerialPort>::bytes_to_read(self)? as usize)
    }
}

/// RS-232 connection with the line settings the thermometer expects:
/// 8 data bits, no parity, one stop bit and no flow control.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    path: String,
    baudrate: u32,
    timeout: Duration,
}

impl SerialConnector {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: path.as_ref().to_string(),
            baudrate: DEFAULT_BAUDRATE,
            timeout: READ_TIMEOUT,
        }
    }

    /// Connector whose port read timeout matches `timing`.
    pub fn with_timing(path: impl AsRef<str>, timing: &Timing) -> Self {
        Self::new(path).timeout(timing.read_timeout)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn read_timeout(&self) -> Duration {
        self.timeout
    }
}

impl Connector for SerialConnector {
    fn open(&self) -> Result<Box<dyn Link>> {
        let port = tokio_serial::new(self.path.as_str(), self.baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open_native_async()?;

        #[cfg(unix)]
        let port = {
            let mut port = port;
            port.set_exclusive(false)?;
            port
        };

        Ok(Box::new(port))
    }

    fn name(&self) -> String {
        self.path.clone()
    }
}
