#![deny(clippy::unwrap_used)]

use chrono::Local;
use clap::{arg, command, value_parser};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::io::ErrorKind;
use std::process::exit;
use std::{path::PathBuf, time::Duration};

use wikactrl::proto::command::Channel;
use wikactrl::proto::{self, Result};
use wikactrl::{ProbeSession, DEFAULT_SETTLE, DEFAULT_TTY};

#[tokio::main]
async fn main() {
    let matches = command!() // requires `cargo` feature
        .arg(
            arg!(
                -p --device <PORT> "Serial port of the thermometer"
            )
            .default_value(DEFAULT_TTY)
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(
            -d --debug ... "Turn debugging information on"
        ))
        .subcommand(clap::Command::new("ident").about("Device identification"))
        .subcommand(
            clap::Command::new("measure")
                .about("Read temperature")
                .arg(arg!([channel] "Channel to read, both if omitted").value_parser(["A", "B"])),
        )
        .subcommand(clap::Command::new("unit-celsius").about("Set temperature unit to Celsius"))
        .subcommand(
            clap::Command::new("query")
                .about("Send a raw command and print the reply")
                .arg(arg!(<COMMAND> "Command text, e.g. \"*IDN?\""))
                .arg(
                    arg!(--settle <MS> "Wait time before reading the reply")
                        .default_value(DEFAULT_SETTLE.as_millis().to_string())
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            clap::Command::new("poll")
                .about("Read a channel repeatedly")
                .arg(arg!(<channel> "Channel to read").value_parser(["A", "B"]))
                .arg(
                    arg!(-i --interval <SECS> "Seconds between readings")
                        .default_value("1")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(-n --count <N> "Stop after N readings")
                        .required(false)
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand_required(true)
        .get_matches();

    let level = match matches.get_count("debug") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Unable to initialize logging: {}", e);
    }

    let port = matches
        .get_one::<PathBuf>("device")
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_TTY.to_string());

    let mut probe = ProbeSession::new(&port);

    let result = match probe.connect().await {
        Ok(()) => {
            eprintln!("Connected to: {}\n", port);
            let result = handle_args(&matches, &mut probe).await;
            probe.disconnect().await;
            result
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        match e {
            proto::ProtoError::Serial(err) => {
                if err.kind() == tokio_serial::ErrorKind::NoDevice
                    || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
                {
                    eprintln!("{}: File not found", port);
                } else {
                    eprintln!("I/O Error: {} [device: {}]", err, port);
                }
            }
            proto::ProtoError::Io(err) => {
                if err.kind() == ErrorKind::NotFound {
                    eprintln!("{}: File not found", port);
                } else {
                    eprintln!("I/O Error: {} [device: {}]", err, port);
                }
            }
            proto::ProtoError::NotOpen => {
                eprintln!("Port is not open, aborting!");
            }
            proto::ProtoError::Timeout => {
                eprintln!("Device did not answer in time, aborting!");
            }
            proto::ProtoError::InvalidChannel(ch) => {
                eprintln!("Invalid channel: {}", ch);
            }
            proto::ProtoError::Malformed(reply) => {
                eprintln!("Received an unexpected response from device: {:?}", reply);
            }
        }
        exit(-1);
    }
}

async fn handle_args(matches: &clap::ArgMatches, probe: &mut ProbeSession) -> Result<()> {
    match matches.subcommand() {
        // Device ID
        Some(("ident", _args)) => {
            println!("{}", probe.identify().await?);
        }
        // Single reading
        Some(("measure", args)) => {
            let channels = match args.get_one::<String>("channel") {
                Some(ch) => vec![ch.parse::<Channel>()?],
                None => vec![Channel::A, Channel::B],
            };
            for ch in channels {
                println!("Channel {}: {}", ch, probe.measure_channel(ch).await?);
            }
        }
        // Unit
        Some(("unit-celsius", _args)) => {
            probe.set_unit_celsius().await?;
            println!("OK");
        }
        // Raw command
        Some(("query", args)) => {
            if let Some(command) = args.get_one::<String>("COMMAND") {
                let settle = args
                    .get_one::<u64>("settle")
                    .map(|ms| Duration::from_millis(*ms))
                    .unwrap_or(DEFAULT_SETTLE);
                println!("{}", probe.send_command(command, settle).await?);
            }
        }
        // Continuous readings
        Some(("poll", args)) => {
            let ch = match args.get_one::<String>("channel") {
                Some(ch) => ch.parse::<Channel>()?,
                None => Channel::A,
            };
            let interval = Duration::from_secs(*args.get_one::<u64>("interval").unwrap_or(&1));
            let count = args.get_one::<u64>("count").copied();

            // Ctrl-C ends polling but still lets main() put the device back
            // into local mode.
            probe
                .poll_channel(ch, interval, count, tokio::signal::ctrl_c(), |reading| {
                    println!("{}  {}", Local::now().format("%Y-%m-%d %H:%M:%S"), reading);
                })
                .await?;
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
