pub mod descriptors;
pub mod simulate;

use std::error::Error;

use clap::{Parser, Subcommand};
use descriptors::handle_descriptors;
use simulate::{handle_enumerate, handle_simulate};

use xinput_gadget::config::XInputConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a device configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the descriptors sent to the host during enumeration
    Descriptors,
    /// Open the XInput interface on a loopback stack and show its endpoints
    Enumerate {
        /// Bytes available to the interface (defaults to the full descriptor)
        #[arg(long)]
        max_len: Option<u16>,
    },
    /// Stream simulated controller reports through a loopback stack
    Simulate {
        /// Number of input reports to send
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error>> {
    let config = XInputConfig::load(args.config)?;

    match args.cmd {
        Commands::Descriptors => handle_descriptors(&config)?,
        Commands::Enumerate { max_len } => handle_enumerate(&config, max_len)?,
        Commands::Simulate { count } => handle_simulate(&config, count).await?,
    }

    Ok(())
}

/// Format the given bytes as space separated hex
pub fn to_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<String>>()
        .join(" ")
}
