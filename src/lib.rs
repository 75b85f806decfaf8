//!
//! This library provides communication with a WIKA precision thermometer
//! (CTR3000 family) over its RS-232 interface.
//!
//! <br>
//!
//! # Details
//!
//! - The thermometer is driven with SCPI-like ASCII commands. The firmware
//!   cannot keep up with a burst of bytes, so every command is written one
//!   byte at a time with [`BYTE_DELAY`] between bytes.
//!
//! - There is no "reply ready" signal. After a command the session waits
//!   a fixed settle time and then reads whatever the device sent.
//!
//! - Basic setup and connection
//!
//!   ```no_run
//!   use wikactrl::{proto::command::Channel, ProbeSession};
//!   #[tokio::main]
//!   async fn main() -> wikactrl::Result<()> {
//!       let mut probe = ProbeSession::new("/dev/ttyUSB0");
//!       probe.connect().await?;
//!       eprintln!("Connected to: {}\n", probe.identify().await?);
//!       println!("Channel A: {}", probe.measure_channel(Channel::A).await?);
//!       probe.disconnect().await;
//!       Ok(())
//!   }
//!   ```
//!

use std::time::Duration;

pub mod proto;
pub mod session;

pub use proto::Result;
pub use session::ProbeSession;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Fixed baudrate of the thermometer's serial interface.
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Pause after each byte written to the device.
pub const BYTE_DELAY: Duration = Duration::from_millis(25);

/// Wait between sending a command and reading its reply.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(666);

/// The identification query needs longer than other commands.
pub const IDENT_SETTLE: Duration = Duration::from_millis(1000);

/// Upper bound for reading a reply once the settle time is over.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Delays used while talking to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub byte_delay: Duration,
    pub settle: Duration,
    pub ident_settle: Duration,
    pub read_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            byte_delay: BYTE_DELAY,
            settle: DEFAULT_SETTLE,
            ident_settle: IDENT_SETTLE,
            read_timeout: READ_TIMEOUT,
        }
    }
}
