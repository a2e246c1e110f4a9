use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kinco_motor_serial::config::DriveConfig;
use kinco_motor_serial::motor::{CommandSequence, Drive, MotorDriver, NodeId};

#[derive(Parser)]
#[command(
    name = "kinco-motor-serial",
    about = "Send speed commands to a Kinco servo drive over a serial line"
)]
struct Cli {
    /// Serial port the drive is wired to
    #[arg(short, long)]
    port: Option<String>,

    /// Drive address on the bus
    #[arg(short, long)]
    node: Option<u16>,

    /// Encoder counts per motor revolution
    #[arg(short = 'r', long)]
    resolution: Option<u32>,

    /// JSON config file (port/baudrate/node_id/encoder_resolution)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prompt for target speeds in a loop and send each one
    Run,
    /// Send a single speed command and exit
    SetSpeed {
        /// Target speed in rpm (negative reverses direction)
        rpm: i32,
    },
    /// Ramp the motor to zero and disable operation
    Stop,
    /// Print the frames a speed command would produce, without a serial port
    Dump {
        /// Target speed in rpm
        rpm: i32,
    },
}

fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => DriveConfig::default(),
    };
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if let Some(resolution) = cli.resolution {
        cfg.encoder_resolution = resolution;
    }
    let node = NodeId::new(cli.node.unwrap_or(cfg.node_id as u16))?;

    match cli.command {
        Command::Dump { rpm } => {
            let drive = Drive::with_resolution(node, cfg.encoder_resolution);
            print_sequence(&drive.set_speed(rpm)?);
            Ok(())
        }
        Command::SetSpeed { rpm } => {
            let mut driver =
                MotorDriver::with_options(&cfg.port, cfg.baudrate, node, cfg.encoder_resolution)?;
            driver.set_speed(rpm)?;
            Ok(())
        }
        Command::Stop => {
            let mut driver =
                MotorDriver::with_options(&cfg.port, cfg.baudrate, node, cfg.encoder_resolution)?;
            driver.stop()?;
            Ok(())
        }
        Command::Run => {
            let mut driver =
                MotorDriver::with_options(&cfg.port, cfg.baudrate, node, cfg.encoder_resolution)?;
            interactive(&mut driver)
        }
    }
}

/// The original operator workflow: type a speed, the drive follows
fn interactive(driver: &mut MotorDriver) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Drive node {}. Enter a target speed in rpm ('stop' to halt, 'q' to quit):",
        driver.node().get()
    );

    let mut line = String::new();
    loop {
        print!("rpm> ");
        io::stdout().flush()?;

        line.clear();
        if io::stdin().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let input = line.trim();
        let result = match input {
            "" | "q" | "quit" => break,
            "stop" => driver.stop(),
            _ => match input.parse::<i32>() {
                Ok(rpm) => driver.set_speed(rpm),
                Err(_) => {
                    println!("Not a number: {input}");
                    continue;
                }
            },
        };

        // A failed command is reported and the whole command re-entered by
        // the operator; there is no partial retry.
        if let Err(e) = result {
            eprintln!("Command failed: {e}");
        }
    }
    Ok(())
}

fn print_sequence(sequence: &CommandSequence) {
    for frame in sequence {
        let hex: Vec<String> = frame
            .to_bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        println!("{}", hex.join(" "));
    }
}
