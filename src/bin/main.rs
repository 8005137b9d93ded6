//! m8-joypad: expose an M8's keypad as a Linux virtual joystick.
//!
//! ```text
//! m8-joypad                     Run with m8-joypad.toml or defaults
//! m8-joypad --device <port>     Prefer a specific serial port
//! m8-joypad --list              List connected M8 serial ports
//! m8-joypad --gen-config        Write default config to stdout
//! m8-joypad --once              Exit when the M8 goes away
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use log::info;
use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};

use m8_joypad::config::DEFAULT_CONFIG_PATH;
use m8_joypad::{input, AppError, Config, DeviceConnector, Supervisor};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "m8-joypad", version, about = "M8 tracker to Linux virtual joystick bridge")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Serial port to prefer when several M8s are connected.
    #[arg(short, long)]
    device: Option<String>,

    /// List connected M8 serial ports and exit.
    #[arg(long)]
    list: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Exit when the link is lost instead of reconnecting.
    #[arg(long)]
    once: bool,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

// ── Main ─────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("m8-joypad: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    if cli.gen_config {
        println!("{}", Config::default().to_toml()?);
        return Ok(());
    }

    let mut config = Config::load(&cli.config)?;
    if cli.device.is_some() {
        config.serial.device = cli.device;
    }
    if cli.once {
        config.link.reconnect = false;
    }
    if cli.verbose {
        config.logging.level = "debug".into();
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if cli.list {
        for name in input::list_m8(&config.serial)? {
            println!("{}", name);
        }
        return Ok(());
    }

    info!("m8-joypad v{}", env!("CARGO_PKG_VERSION"));

    let stop = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM, SIGQUIT] {
        signal_hook::flag::register(signal, Arc::clone(&stop))?;
    }

    let mut supervisor = Supervisor::new(DeviceConnector::new(&config), config.link.clone());
    supervisor.run(&stop)
}
