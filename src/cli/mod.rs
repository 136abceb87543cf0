//! Command-line interface definitions and helpers.
//!
//! This module contains CLI argument parsing, the interactive menu, and
//! subcommand handlers.

mod args;
mod commands;
mod menu;

pub use args::{Args, Command, ConfigAction};
pub use commands::{handle_config_action, init_config, run_commercial, show_config};
pub use menu::Menu;
