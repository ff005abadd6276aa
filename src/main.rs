use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use modbus_rtu_slave::logging::init_logger_with_default;
use modbus_rtu_slave::util::hex::{decode_hex, format_hex_compact};
use modbus_rtu_slave::{
    calculate_crc, decode_request, log_info, start, RegisterBank, SlaveConfig,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "modbus-slave")]
#[command(about = "Modbus RTU slave")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve an in-memory register bank on a serial port
    Serve {
        /// Serial device, e.g. /dev/ttyUSB0
        port: Option<String>,
        #[arg(short, long)]
        slave: Option<u8>,
        #[arg(short, long)]
        baud: Option<u32>,
        /// Data bits, parity, stop bits, e.g. 8n2
        #[arg(short, long)]
        fmt: Option<String>,
        /// JSON config file; other arguments override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Lowest address served by the register bank
        #[arg(long, default_value = "0")]
        min_address: u16,
        /// Highest address served by the register bank
        #[arg(long, default_value = "10")]
        max_address: u16,
    },
    /// Print a frame with its CRC-16/MODBUS appended
    Crc { hex: String },
    /// Decode a raw request frame as the given slave would
    Decode {
        hex: String,
        #[arg(short, long, default_value = "1")]
        slave: u8,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger_with_default("info");

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            slave,
            baud,
            fmt,
            config,
            min_address,
            max_address,
        } => {
            let config = resolve_config(port, slave, baud, fmt, config)?;
            let bank = Arc::new(Mutex::new(RegisterBank::with_demo_values(
                min_address,
                max_address,
            )));
            let caps = RegisterBank::into_capabilities(bank);

            let mut server = start(&config, caps)
                .await
                .with_context(|| format!("failed to start slave on {}", config.device))?;

            tokio::select! {
                _ = server.run() => {}
                result = tokio::signal::ctrl_c() => {
                    result.context("failed to listen for ctrl-c")?;
                    log_info("Shutting down");
                }
            }

            println!("{}", server.stats().to_json()?);
        }
        Commands::Crc { hex } => {
            let data = decode_hex(&hex).context("invalid hex")?;
            let crc = calculate_crc(&data);
            let mut frame = data;
            frame.extend_from_slice(&crc.to_le_bytes());
            println!("{}", format_hex_compact(&frame));
        }
        Commands::Decode { hex, slave } => {
            let data = decode_hex(&hex).context("invalid hex")?;
            match decode_request(&data, slave) {
                Ok(request) => println!("{request}"),
                Err(rejection) => println!("dropped: {rejection}"),
            }
        }
    }

    Ok(())
}

fn resolve_config(
    port: Option<String>,
    slave: Option<u8>,
    baud: Option<u32>,
    fmt: Option<String>,
    path: Option<PathBuf>,
) -> anyhow::Result<SlaveConfig> {
    let mut config = match (path, port.as_deref()) {
        (Some(path), _) => SlaveConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        (None, Some(device)) => SlaveConfig::new(device, 1),
        (None, None) => bail!("a serial port or --config is required"),
    };

    if let Some(device) = port {
        config.device = device;
    }
    if let Some(slave) = slave {
        config.slave = slave;
    }
    if let Some(baud) = baud {
        config.serial.baud = baud;
    }
    if let Some(fmt) = fmt {
        config.serial.fmt = fmt;
    }
    config.validate()?;
    Ok(config)
}
