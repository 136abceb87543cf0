//! Subcommand handlers for config actions and script mode.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;

use super::args::ConfigAction;
use crate::artifacts::ArtifactLayout;
use crate::commercial::{prompt_to_commercial_ad, CommercialAd};
use crate::config::{default_path as get_config_path, Settings, DEFAULT_CONFIG_TEMPLATE};
use crate::gemini::GeminiClient;
use crate::media::Ffmpeg;
use crate::sound::SoundClient;

/// Print the effective settings with secrets masked.
pub fn show_config<W: Write>(
    settings: &Settings,
    config_path: &Path,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "Current configuration:")?;
    writeln!(out)?;
    match settings.to_masked_toml() {
        Ok(toml) => writeln!(out, "{}", toml)?,
        Err(e) => writeln!(out, "  (could not render settings: {})", e)?,
    }

    if config_path.exists() {
        writeln!(out, "Config file: {} (exists)", config_path.display())
    } else {
        writeln!(out, "Config file: {} (not found)", config_path.display())
    }
}

/// Write the default config file to `config_path`.
///
/// Refuses to overwrite an existing file.
pub fn init_config(config_path: &Path) -> Result<(), String> {
    if config_path.exists() {
        return Err(format!(
            "Config file already exists: {}\nUse 'adforge config show' to view current settings.",
            config_path.display()
        ));
    }

    // Create parent directories if needed
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Error creating config directory: {}", e))?;
        }
    }

    std::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| format!("Error writing config file: {}", e))
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, settings: &Settings, config: Option<&Path>) {
    let config_path = config.map(PathBuf::from).unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let stdout = std::io::stdout();
            if let Err(e) = show_config(settings, &config_path, &mut stdout.lock()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        ConfigAction::Init => match init_config(&config_path) {
            Ok(()) => println!("Created config file: {}", config_path.display()),
            Err(message) => {
                eprintln!("{}", message);
                std::process::exit(1);
            }
        },
    }
}

/// Run the brief-to-commercial pipeline once and report the outcome.
///
/// Exits the process with status 1 on failure.
pub async fn run_commercial(settings: &Settings, brief: &Path, name: &str) {
    match build_commercial(settings, brief, name).await {
        Ok(ad) => {
            println!("{}", "Commercial ad created.".green());
            println!("  Image: {}", ad.paths.image.display());
            println!("  Video: {}", ad.paths.video.display());
            println!("  Sound: {}", ad.paths.sound.display());
            println!("  Final: {}", ad.paths.final_video.display());
            println!("  Duration: {:.1}s", ad.duration_secs);
        }
        Err(message) => {
            eprintln!("{}", format!("Error creating commercial ad: {}", message).red());
            std::process::exit(1);
        }
    }
}

async fn build_commercial(
    settings: &Settings,
    brief: &Path,
    name: &str,
) -> Result<CommercialAd, String> {
    let gemini = GeminiClient::new(settings).map_err(|e| e.to_string())?;
    let sound = SoundClient::new(settings).map_err(|e| e.to_string())?;
    let layout = ArtifactLayout::new(&settings.output.root);

    prompt_to_commercial_ad(&gemini, &sound, &Ffmpeg::default(), &layout, brief, name)
        .await
        .map_err(|e| e.to_string())
}
