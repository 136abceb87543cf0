use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use adforge::cli::{handle_config_action, run_commercial, Args, Command, Menu};
use adforge::config::Settings;

/// Load .env file and initialize logging.
///
/// Existing environment variables win over the .env file. `log` records are
/// forwarded to the tracing subscriber; RUST_LOG sets the filter and the
/// default is warnings only.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    // Load .env file before anything else
    load_env();

    let args = Args::parse();

    let settings = match Settings::load_with_env(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Command::Menu) {
        Command::Config { action } => {
            handle_config_action(action, &settings, args.config.as_deref());
        }
        Command::Commercial { brief, name } => {
            runtime().block_on(run_commercial(&settings, &brief, &name));
        }
        Command::Menu => {
            let mut menu = Menu::new(&settings, io::stdin().lock(), io::stdout());
            if let Err(e) = runtime().block_on(menu.run()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    }
}
