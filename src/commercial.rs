//! Brief-to-commercial pipeline.
//!
//! Turns a written product brief into a finished video ad: product still,
//! storyboard, generated clip, sound effect, and the final mix. Every step
//! waits on the previous one and the first failure stops the run.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::artifacts::{write_atomic, ArtifactError, ArtifactLayout, ArtifactPaths};
use crate::gemini::{GeminiClient, GeminiError, SaveError};
use crate::media::{duration_or_default, MediaError, MediaToolkit};
use crate::sound::{SoundClient, SoundError, DEFAULT_PROMPT_INFLUENCE};

/// Offset of the sound effect within the final mix.
const SOUND_EFFECT_OFFSET_SECS: f64 = 0.0;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ReadBrief,
    ProductImage,
    Storyboard,
    Video,
    SoundEffect,
    Composite,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ReadBrief => "reading brief",
            Step::ProductImage => "product image",
            Step::Storyboard => "storyboard",
            Step::Video => "video generation",
            Step::SoundEffect => "sound effect",
            Step::Composite => "final composite",
        };
        f.write_str(name)
    }
}

/// The underlying failure of a pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Sound(#[from] SoundError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("brief is empty")]
    EmptyBrief,
}

/// A pipeline failure, naming the step that failed.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct CommercialError {
    pub step: Step,
    #[source]
    pub source: StepError,
}

trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, CommercialError>;
}

impl<T, E: Into<StepError>> AtStep<T> for Result<T, E> {
    fn at(self, step: Step) -> Result<T, CommercialError> {
        self.map_err(|e| CommercialError {
            step,
            source: e.into(),
        })
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct CommercialAd {
    pub paths: ArtifactPaths,
    pub image_prompt: String,
    pub storyboard: String,
    pub sound_prompt: String,
    pub duration_secs: f64,
    /// Every downloaded sample; the first is `paths.video`.
    pub video_samples: Vec<PathBuf>,
}

/// Request for a single image-generation prompt.
pub fn image_prompt_request(brief: &str) -> String {
    format!(
        "You write prompts for an image generation model. From the product brief below, \
         write one prompt for a clean, photorealistic hero shot of the product. Name the \
         setting, lighting, camera angle and color palette. Reply with the prompt only.\n\n\
         Brief:\n{}",
        brief.trim()
    )
}

/// Request for an ad storyboard suitable for a video model.
pub fn storyboard_request(brief: &str) -> String {
    format!(
        "You are a creative director. Turn the product brief below into a storyboard for \
         an eight second video commercial. Describe the opening shot, the product reveal \
         and the closing shot, with camera movement and mood for each. Do not include \
         dialogue or on-screen text. Reply with the storyboard only.\n\n\
         Brief:\n{}",
        brief.trim()
    )
}

/// Request for a sound-effect description matching a storyboard.
pub fn sound_prompt_request(storyboard: &str) -> String {
    format!(
        "Describe, in one or two sentences, the background sound design for the commercial \
         storyboard below: ambience, impacts and musical texture. No speech. Reply with the \
         description only.\n\n\
         Storyboard:\n{}",
        storyboard.trim()
    )
}

/// Run the full pipeline for the brief at `brief_path`.
///
/// Artifacts are named after `base` inside `layout`.
pub async fn prompt_to_commercial_ad(
    gemini: &GeminiClient,
    sound: &SoundClient,
    media: &dyn MediaToolkit,
    layout: &ArtifactLayout,
    brief_path: &Path,
    base: &str,
) -> Result<CommercialAd, CommercialError> {
    // 1. Brief
    let paths = layout.paths_for(base).at(Step::ReadBrief)?;
    log::info!("Reading brief from {}", brief_path.display());
    let brief = tokio::fs::read_to_string(brief_path)
        .await
        .at(Step::ReadBrief)?;
    if brief.trim().is_empty() {
        return Err(CommercialError {
            step: Step::ReadBrief,
            source: StepError::EmptyBrief,
        });
    }
    layout.ensure_dirs().await.at(Step::ReadBrief)?;

    // 2. Product still
    log::info!("Generating product image");
    let image_prompt = gemini
        .invoke(&image_prompt_request(&brief))
        .await
        .at(Step::ProductImage)?;
    let image = gemini
        .create_image(&image_prompt)
        .await
        .at(Step::ProductImage)?;
    image.save(&paths.image).await.at(Step::ProductImage)?;
    log::info!("Product image saved to {}", paths.image.display());

    // 3. Storyboard
    log::info!("Writing storyboard");
    let storyboard = gemini
        .invoke(&storyboard_request(&brief))
        .await
        .at(Step::Storyboard)?;

    // 4. Video
    log::info!("Generating video");
    let video_samples = gemini
        .generate_video_from_prompt(&storyboard, &paths.video)
        .await
        .at(Step::Video)?;
    let video = video_samples
        .first()
        .cloned()
        .unwrap_or_else(|| paths.video.clone());
    log::info!("Video saved to {}", video.display());

    // 5. Sound effect
    log::info!("Generating sound effect");
    let sound_prompt = gemini
        .invoke(&sound_prompt_request(&storyboard))
        .await
        .at(Step::SoundEffect)?;
    let duration_secs = duration_or_default(media, &video).await;
    let audio = sound
        .text_to_effect(&sound_prompt, duration_secs, DEFAULT_PROMPT_INFLUENCE)
        .await
        .at(Step::SoundEffect)?;
    write_atomic(&paths.sound, &audio)
        .await
        .at(Step::SoundEffect)?;
    log::info!("Sound effect saved to {}", paths.sound.display());

    // 6. Mix
    log::info!("Compositing final video");
    media
        .render_silence(duration_secs, &paths.silent_audio)
        .await
        .at(Step::Composite)?;
    media
        .add_audio_to_video(
            &video,
            &paths.silent_audio,
            &paths.sound,
            &paths.final_video,
            SOUND_EFFECT_OFFSET_SECS,
        )
        .await
        .at(Step::Composite)?;
    log::info!("Commercial ready: {}", paths.final_video.display());

    Ok(CommercialAd {
        paths,
        image_prompt,
        storyboard,
        sound_prompt,
        duration_secs,
        video_samples,
    })
}
