use clap::Parser;
use tracing_subscriber::EnvFilter;

use sorter_serial_runtime::config::{HOST_BAUD, HOST_PORT};
use sorter_serial_runtime::runtime::{self, RuntimeOptions};

/// Motion runtime for the serial-commanded waste sorter.
#[derive(Debug, Parser)]
#[command(name = "sorter-serial-runtime")]
struct Args {
    /// Serial port connected to the classifier host
    #[arg(long, default_value = HOST_PORT)]
    port: String,

    /// Baud rate of the host link
    #[arg(long, default_value_t = HOST_BAUD)]
    baud: u32,

    /// JSON tuning file overriding the built-in defaults
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let options = RuntimeOptions {
        port: args.port,
        baud: args.baud,
        config: args.config,
    };

    if let Err(e) = runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
