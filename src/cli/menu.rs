//! Interactive numbered menu.
//!
//! Reads choices and answers line by line from any `BufRead` and writes
//! colored output to any `Write`, so a scripted session can drive it.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::artifacts::{write_atomic, ArtifactLayout};
use crate::commercial::{prompt_to_commercial_ad, CommercialError};
use crate::config::Settings;
use crate::gemini::{convert_normalized_box, GeminiClient, GeminiError, SaveError};
use crate::media::{Ffmpeg, MediaToolkit};
use crate::sound::{SoundClient, SoundError, DEFAULT_PROMPT_INFLUENCE};

const BANNER: &str = r"
             _  __
  __ _  __| |/ _| ___  _ __ __ _  ___
 / _` |/ _` | |_ / _ \| '__/ _` |/ _ \
| (_| | (_| |  _| (_) | | | (_| |  __/
 \__,_|\__,_|_|  \___/|_|  \__, |\___|
                           |___/
";

const MENU_ENTRIES: &[&str] = &[
    "Generate Text Response",
    "Create Image",
    "Edit Image",
    "Describe Image",
    "Get Bounding Boxes",
    "Get Segmentation Masks",
    "Generate Video from Prompt",
    "Generate Video from Image",
    "Create Commercial Ad from Product Image",
    "Create Commercial Ad from Brief",
    "Generate Sound Effect",
    "Text to Speech",
    "Quit",
];

/// Failure of a single menu action.
#[derive(Debug, thiserror::Error)]
enum ActionError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Sound(#[from] SoundError),

    #[error(transparent)]
    Commercial(#[from] CommercialError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// Whether the loop should keep going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Menu session state.
pub struct Menu<R, W> {
    gemini: Option<GeminiClient>,
    sound: Option<SoundClient>,
    media: Box<dyn MediaToolkit>,
    layout: ArtifactLayout,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// Build a menu from settings.
    ///
    /// Missing API keys don't fail here; the affected entries report the
    /// error when chosen.
    pub fn new(settings: &Settings, input: R, output: W) -> Self {
        let gemini = match GeminiClient::new(settings) {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("Generative client unavailable: {}", e);
                None
            }
        };
        let sound = match SoundClient::new(settings) {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("Sound client unavailable: {}", e);
                None
            }
        };

        Self {
            gemini,
            sound,
            media: Box::new(Ffmpeg::default()),
            layout: ArtifactLayout::new(&settings.output.root),
            input,
            output,
        }
    }

    /// Replace the media toolkit used for compositing.
    pub fn with_media(mut self, media: Box<dyn MediaToolkit>) -> Self {
        self.media = media;
        self
    }

    /// Consume the menu and return its writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user quits or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", BANNER.magenta().bold())?;

        loop {
            self.print_menu()?;
            let prompt = format!("\nEnter your choice (1-{}): ", MENU_ENTRIES.len());
            let Some(choice) = self.ask(&prompt)? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.generate_text().await?,
                "2" => self.create_image().await?,
                "3" => self.edit_image().await?,
                "4" => self.describe_image().await?,
                "5" => self.bounding_boxes().await?,
                "6" => self.segmentation().await?,
                "7" => self.video_from_prompt().await?,
                "8" => self.video_from_image().await?,
                "9" => self.commercial_from_image().await?,
                "10" => self.commercial_from_brief().await?,
                "11" => self.sound_effect().await?,
                "12" => self.text_to_speech().await?,
                "13" => {
                    writeln!(self.output, "{}", "Exiting. Goodbye!".magenta())?;
                    Flow::Exit
                }
                _ => {
                    writeln!(self.output, "{}", "Invalid choice. Please try again.".red())?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.output.flush()
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "{}", "\nMenu:".blue().bold())?;
        for (i, entry) in MENU_ENTRIES.iter().enumerate() {
            writeln!(self.output, "{}", format!("{}. {}", i + 1, entry).blue())?;
        }
        Ok(())
    }

    /// Prompt for one line. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt.yellow())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn status(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message.cyan())
    }

    fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message.green())
    }

    fn report(&mut self, action: &str, result: Result<String, ActionError>) -> io::Result<Flow> {
        match result {
            Ok(message) => self.success(&message)?,
            Err(e) => writeln!(self.output, "{}", format!("Error {}: {}", action, e).red())?,
        }
        Ok(Flow::Continue)
    }

    async fn generate_text(&mut self) -> io::Result<Flow> {
        let Some(prompt) = self.ask("Enter your text prompt: ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Generating text response...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let reply = gemini.invoke(&prompt).await?;
            Ok(format!("\nResponse:\n{}", reply))
        }
        .await;
        self.report("generating text", result)
    }

    async fn create_image(&mut self) -> io::Result<Flow> {
        let Some(prompt) = self.ask("Enter your image generation prompt: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) = self.ask("Enter output image filename (e.g., output.png): ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Generating image...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let image = gemini.create_image(&prompt).await?;
            image.save(Path::new(&output)).await?;
            Ok(format!("Image saved as {}", output))
        }
        .await;
        self.report("creating image", result)
    }

    async fn edit_image(&mut self) -> io::Result<Flow> {
        let Some(path) = self.ask("Enter the path of the image to edit: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(prompt) = self.ask("Enter your editing prompt: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) =
            self.ask("Enter output image filename for edited image (e.g., edited.png): ")?
        else {
            return Ok(Flow::Exit);
        };
        self.status("Editing image...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let image = gemini.edit_image(Path::new(&path), &prompt).await?;
            image.save(Path::new(&output)).await?;
            Ok(format!("Edited image saved as {}", output))
        }
        .await;
        self.report("editing image", result)
    }

    async fn describe_image(&mut self) -> io::Result<Flow> {
        let Some(path) = self.ask("Enter the path of the image to describe: ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Describing image...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let description = gemini.describe_image(Path::new(&path)).await?;
            Ok(format!("\nImage Description:\n{}", description))
        }
        .await;
        self.report("describing image", result)
    }

    async fn bounding_boxes(&mut self) -> io::Result<Flow> {
        let Some(path) = self.ask("Enter the path of the image: ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Retrieving bounding boxes...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let boxes = gemini.get_bounding_boxes(Path::new(&path)).await?;
            let (width, height) = image::image_dimensions(&path)?;
            let pixels: Vec<_> = boxes
                .iter()
                .map(|b| convert_normalized_box(b, width, height))
                .collect();
            Ok(format!(
                "\nBounding Boxes (normalized):\n{}\n\nBounding Boxes ({}x{} pixels):\n{}",
                serde_json::to_string_pretty(&boxes)?,
                width,
                height,
                serde_json::to_string_pretty(&pixels)?
            ))
        }
        .await;
        self.report("retrieving bounding boxes", result)
    }

    async fn segmentation(&mut self) -> io::Result<Flow> {
        let Some(path) = self.ask("Enter the path of the image: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(prompt) = self.ask("Enter a segmentation prompt (blank for default): ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Retrieving segmentation masks...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let masks = gemini
                .get_segmentation(Path::new(&path), Some(prompt.as_str()))
                .await?;
            Ok(format!(
                "\nSegmentation Output:\n{}",
                serde_json::to_string_pretty(&masks)?
            ))
        }
        .await;
        self.report("retrieving segmentation", result)
    }

    async fn video_from_prompt(&mut self) -> io::Result<Flow> {
        let Some(prompt) = self.ask("Enter your video generation prompt: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) =
            self.ask("Enter output video filename (e.g., output_video.mp4): ")?
        else {
            return Ok(Flow::Exit);
        };
        self.status("Generating video from prompt...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let written = gemini
                .generate_video_from_prompt(&prompt, Path::new(&output))
                .await?;
            Ok(saved_videos_message(&written))
        }
        .await;
        self.report("generating video from prompt", result)
    }

    async fn video_from_image(&mut self) -> io::Result<Flow> {
        let Some(image_path) = self.ask("Enter the path of the image: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(prompt) = self.ask("Enter your video generation prompt: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) =
            self.ask("Enter output video filename (e.g., output_video.mp4): ")?
        else {
            return Ok(Flow::Exit);
        };
        let Some(skip) = self.ask("Skip image creation and use the image as is? (y/n): ")?
        else {
            return Ok(Flow::Exit);
        };
        self.status("Generating video from image...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let written = gemini
                .generate_video_from_image(
                    Path::new(&image_path),
                    &prompt,
                    Path::new(&output),
                    is_yes(&skip),
                )
                .await?;
            Ok(saved_videos_message(&written))
        }
        .await;
        self.report("generating video from image", result)
    }

    async fn commercial_from_image(&mut self) -> io::Result<Flow> {
        let Some(image_path) = self.ask("Enter the path of the product image: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) =
            self.ask("Enter output video filename (e.g., commercial.mp4): ")?
        else {
            return Ok(Flow::Exit);
        };
        let Some(skip) = self.ask("Skip image creation? (y/n): ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Creating commercial ad...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let image_path = Path::new(&image_path);
            let description = gemini.describe_image(image_path).await?;
            let written = gemini
                .generate_video_from_image(
                    image_path,
                    &description,
                    Path::new(&output),
                    is_yes(&skip),
                )
                .await?;
            Ok(format!(
                "Commercial ad video saved as {}",
                display_paths(&written)
            ))
        }
        .await;
        self.report("creating commercial ad", result)
    }

    async fn commercial_from_brief(&mut self) -> io::Result<Flow> {
        let Some(brief) = self.ask("Enter the path of the brief file: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(base) = self.ask("Enter a base name for the outputs (e.g., launch): ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Creating commercial ad from brief...")?;

        let result: Result<String, ActionError> = async {
            let gemini = self.gemini.as_ref().ok_or(GeminiError::MissingApiKey)?;
            let sound = self.sound.as_ref().ok_or(SoundError::MissingApiKey)?;
            let ad = prompt_to_commercial_ad(
                gemini,
                sound,
                &*self.media,
                &self.layout,
                Path::new(&brief),
                &base,
            )
            .await?;
            Ok(format!(
                "Commercial ad video saved as {}",
                ad.paths.final_video.display()
            ))
        }
        .await;
        self.report("creating commercial ad", result)
    }

    async fn sound_effect(&mut self) -> io::Result<Flow> {
        let Some(text) = self.ask("Describe the sound effect: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(duration) = self.ask("Duration in seconds (0.5-22): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) = self.ask("Enter output audio filename (e.g., effect.mp3): ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Generating sound effect...")?;

        let result: Result<String, ActionError> = async {
            let sound = self.sound.as_ref().ok_or(SoundError::MissingApiKey)?;
            let seconds: f64 = duration
                .parse()
                .map_err(|_| ActionError::InvalidNumber(duration.clone()))?;
            let audio = sound
                .text_to_effect(&text, seconds, DEFAULT_PROMPT_INFLUENCE)
                .await?;
            write_atomic(Path::new(&output), &audio).await?;
            Ok(format!("Sound effect saved as {}", output))
        }
        .await;
        self.report("generating sound effect", result)
    }

    async fn text_to_speech(&mut self) -> io::Result<Flow> {
        let Some(text) = self.ask("Enter the text to speak: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(voice) = self.ask("Voice id (blank for default): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(output) = self.ask("Enter output audio filename (e.g., speech.mp3): ")? else {
            return Ok(Flow::Exit);
        };
        self.status("Synthesizing speech...")?;

        let result: Result<String, ActionError> = async {
            let sound = self.sound.as_ref().ok_or(SoundError::MissingApiKey)?;
            let audio = sound.text_to_speech(&text, &voice).await?;
            write_atomic(Path::new(&output), &audio).await?;
            Ok(format!("Speech saved as {}", output))
        }
        .await;
        self.report("converting text to speech", result)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn saved_videos_message(paths: &[PathBuf]) -> String {
    format!("Video saved as {}", display_paths(paths))
}
