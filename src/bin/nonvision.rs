//! Command line front end: list ports, detect devices, monitor, record, replay and send commands

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nonvision::handshake::{Handshake, SystemPorts};
use nonvision::provider::Provider;
use nonvision::providers::DeviceProvider;
use nonvision::transport::{MemoryTransport, SerialSettings, SerialTransport, Transport};
use nonvision::{
    BedBox, Command, DeviceFamily, LinkStats, Nonvision, Rotation, Session, SessionConfig,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists connected serial ports
    List,
    /// Scan ports for a device family, swapping roles if needed
    Detect(DeviceArgs),
    /// Stream decoded telemetry until interrupted
    Monitor(MonitorArgs),
    /// Record the raw byte stream of a port to a file
    Record(RecordArgs),
    /// Decode a recorded capture
    Replay(ReplayArgs),
    /// Send one command to a device
    Send(SendArgs),
}

#[derive(Args)]
struct DeviceArgs {
    /// Device family: tof or thermal
    #[clap(long, short)]
    family: Option<DeviceFamily>,

    /// Serial port; scans all ports when omitted
    #[clap(long, short)]
    port: Option<String>,

    /// Override the family baud rate
    #[clap(long)]
    baud: Option<u32>,

    /// YAML session configuration
    #[clap(long, short)]
    config: Option<PathBuf>,
}

impl DeviceArgs {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(family) = self.family {
            config.family = family;
        }
        if self.port.is_some() {
            config.port = self.port.clone();
        }
        if self.baud.is_some() {
            config.baud_rate = self.baud;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
struct MonitorArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    /// Drain period in milliseconds
    #[clap(long, default_value = "100")]
    period_ms: u64,

    /// Display rotation in degrees (0, 90, 180, 270)
    #[clap(long)]
    rotate: Option<u16>,

    /// Mirror the display horizontally
    #[clap(long)]
    mirror: bool,
}

#[derive(Args)]
struct RecordArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    /// Output capture file
    #[clap(long, short)]
    output: PathBuf,

    /// Stop after this many seconds
    #[clap(long)]
    seconds: Option<u64>,
}

#[derive(Args)]
struct ReplayArgs {
    /// Capture file recorded with `record`
    path: PathBuf,

    /// Device family the capture was recorded from
    #[clap(long, short, default_value = "tof")]
    family: DeviceFamily,
}

#[derive(Args)]
struct SendArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    #[clap(subcommand)]
    command: SendCommands,
}

#[derive(Subcommand)]
enum SendCommands {
    /// Restart background calibration
    Recalibrate,
    /// ToF background distance view
    Background {
        /// on or off
        #[clap(value_parser = parse_switch, action = clap::ArgAction::Set)]
        state: bool,
    },
    /// Thermal bed tracking
    BedTracking,
    /// Thermal bed region in device coordinates
    BedBox { x1: u8, x2: u8, y1: u8, y2: u8 },
    /// Ask the device to switch role
    SwapRole,
    /// Arbitrary packet type and payload bytes
    Raw {
        #[clap(value_parser = parse_byte)]
        packet_type: u8,
        #[clap(value_parser = parse_byte)]
        payload: Vec<u8>,
    },
}

impl SendCommands {
    fn to_command(&self) -> Command {
        match self {
            SendCommands::Recalibrate => Command::Recalibrate,
            SendCommands::Background { state } => Command::ViewBackground(*state),
            SendCommands::BedTracking => Command::EnableBedTracking,
            SendCommands::BedBox { x1, x2, y1, y2 } => {
                Command::SetBedBox(BedBox { x1: *x1, x2: *x2, y1: *y1, y2: *y2 })
            }
            SendCommands::SwapRole => Command::SwapRole,
            SendCommands::Raw { packet_type, payload } => {
                Command::Raw { packet_type: *packet_type, payload: payload.clone() }
            }
        }
    }
}

fn parse_switch(s: &str) -> Result<bool, String> {
    match s {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte '{s}': {e}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List => list_ports(),
        Commands::Detect(args) => detect(&args).await,
        Commands::Monitor(args) => monitor(&args).await,
        Commands::Record(args) => record(args).await,
        Commands::Replay(args) => replay(&args),
        Commands::Send(args) => send(&args).await,
    }
}

fn list_ports() -> Result<()> {
    let ports = SerialTransport::available_ports()?;
    if ports.is_empty() {
        println!("No connected serial ports found.");
    } else {
        println!("Connected serial ports:");
        ports.iter().for_each(|p| println!("{p}"));
    }
    Ok(())
}

async fn resolve_port(config: &SessionConfig) -> Result<String> {
    if let Some(port) = &config.port {
        return Ok(port.clone());
    }
    let handshake = Handshake::from_config(config);
    let (family, baud_rate) = (config.family, config.baud_rate());
    let port = tokio::task::spawn_blocking(move || handshake.detect_port(&SystemPorts, family, baud_rate))
        .await
        .context("Handshake task failed")??;
    Ok(port)
}

async fn detect(args: &DeviceArgs) -> Result<()> {
    let config = args.session_config()?;
    let port = resolve_port(&config).await?;
    println!("{} device on {port}", config.family);
    Ok(())
}

async fn monitor(args: &MonitorArgs) -> Result<()> {
    let mut config = args.device.session_config()?;
    if let Some(degrees) = args.rotate {
        config.orientation.rotation = Rotation::try_from(degrees)?;
    }
    if args.mirror {
        config.orientation.mirror = true;
    }
    let join_timeout = config.join_timeout();

    let session = Nonvision::connect(config).await.context("Failed to start session")?;
    info!(port = session.port(), family = %session.family(), "Monitoring, press Ctrl-C to stop");

    let interrupted =
        print_until(&session, Duration::from_millis(args.period_ms), tokio::signal::ctrl_c()).await;

    let stats = session.stats();
    let last_error = session.last_error();
    if let Some(error) = &last_error {
        warn!(%error, "Last link error");
    }
    session.shutdown(join_timeout)?;
    println!(
        "frames={} records={} resyncs={} checksum_failures={} evicted={} transport_errors={}",
        stats.frames, stats.records, stats.resyncs, stats.checksum_failures, stats.evicted, stats.transport_errors
    );

    match last_error {
        Some(error) if !interrupted => bail!("Session closed: {error}"),
        _ => Ok(()),
    }
}

/// Print each changed status message until `interrupt` resolves or the
/// snapshot stream ends. Returns whether `interrupt` fired.
async fn print_until<F: Future>(session: &Session, period: Duration, interrupt: F) -> bool {
    let mut snapshots = session.snapshots(period);
    let mut last_message = String::new();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => return true,
            next = snapshots.next() => {
                let Some(snapshot) = next else { return false };
                let message = session.view(&snapshot).message();
                if message != last_message {
                    println!("{message}\n");
                    last_message = message;
                }
            }
        }
    }
}

async fn record(args: RecordArgs) -> Result<()> {
    let config = args.device.session_config()?;
    let port = resolve_port(&config).await?;
    let settings = SerialSettings { baud_rate: config.baud_rate(), read_timeout: config.read_timeout() };
    let mut transport = SerialTransport::open(&port, &settings)?;
    let mut file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let cancel = CancellationToken::new();
    let reader_cancel = cancel.clone();
    let limit = args.seconds.map(Duration::from_secs);

    info!(port = %port, output = %args.output.display(), "Recording, press Ctrl-C to stop");
    let mut task = tokio::task::spawn_blocking(move || -> Result<u64> {
        let started = Instant::now();
        let mut buf = [0u8; 4096];
        let mut total = 0u64;
        while !reader_cancel.is_cancelled() && limit.is_none_or(|l| started.elapsed() < l) {
            let n = transport.read(&mut buf)?;
            file.write_all(&buf[..n])?;
            total += n as u64;
        }
        file.flush()?;
        Ok(total)
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let finished = tokio::select! {
        _ = &mut ctrl_c => {
            cancel.cancel();
            (&mut task).await
        }
        result = &mut task => result,
    };
    let bytes = finished.context("Recording task failed")??;
    println!("Recorded {bytes} bytes to {}", args.output.display());
    Ok(())
}

fn replay(args: &ReplayArgs) -> Result<()> {
    let transport = MemoryTransport::open_capture(&args.path)?;
    let stats = Arc::new(LinkStats::new());
    let mut provider = DeviceProvider::new(Box::new(transport), args.family, Arc::clone(&stats));

    let mut records = 0usize;
    while let Some(batch) = provider.next_records()? {
        records += batch.len();
        for record in batch {
            println!("{record:?}");
        }
    }

    let stats = stats.snapshot();
    println!(
        "frames={} records={records} resyncs={} checksum_failures={} decode_failures={}",
        stats.frames, stats.resyncs, stats.checksum_failures, stats.decode_failures
    );
    Ok(())
}

async fn send(args: &SendArgs) -> Result<()> {
    let config = args.device.session_config()?;
    let command = args.command.to_command();
    if matches!(command, Command::ViewBackground(_)) && config.family != DeviceFamily::Tof {
        bail!("Background view is a ToF command");
    }

    let port = resolve_port(&config).await?;
    let settings = SerialSettings { baud_rate: config.baud_rate(), read_timeout: config.read_timeout() };
    let mut transport = SerialTransport::open(&port, &settings)?;
    let frame = command.encode(config.family)?;
    transport.write_all(&frame)?;
    println!("Sent {command:?} to {port} ({} bytes)", frame.len());
    Ok(())
}
