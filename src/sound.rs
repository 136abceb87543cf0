//! Sound-effect and speech synthesis via the ElevenLabs REST API.
//!
//! Both calls return MP3 bytes; the caller decides where they go.

use serde::Serialize;

use crate::config::Settings;
use crate::http::{build_client, error_body};

/// Shortest sound effect the service accepts, in seconds.
pub const MIN_EFFECT_SECONDS: f64 = 0.5;

/// Longest sound effect the service accepts, in seconds.
pub const MAX_EFFECT_SECONDS: f64 = 22.0;

/// Prompt influence used when the caller has no preference.
pub const DEFAULT_PROMPT_INFLUENCE: f64 = 0.8;

/// Speech model used for narration.
pub const TTS_MODEL_ID: &str = "eleven_flash_v2_5";

const API_KEY_HEADER: &str = "xi-api-key";
const AUDIO_MPEG: &str = "audio/mpeg";

/// Errors that can occur while synthesizing audio.
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("ElevenLabs API key not configured")]
    MissingApiKey,

    #[error("Empty text")]
    EmptyText,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Sound API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct SoundEffectRequest<'a> {
    text: &'a str,
    duration_seconds: f64,
    prompt_influence: f64,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.6,
            similarity_boost: 0.8,
            style: 1.0,
            use_speaker_boost: true,
        }
    }
}

/// Clamp a requested effect length into the accepted range.
///
/// Non-finite values fall back to the minimum.
pub fn clamp_duration(seconds: f64) -> f64 {
    if !seconds.is_finite() {
        return MIN_EFFECT_SECONDS;
    }
    seconds.clamp(MIN_EFFECT_SECONDS, MAX_EFFECT_SECONDS)
}

fn clamp_influence(influence: f64) -> f64 {
    if !influence.is_finite() {
        return DEFAULT_PROMPT_INFLUENCE;
    }
    influence.clamp(0.0, 1.0)
}

/// Client for the sound synthesis service.
pub struct SoundClient {
    api_key: String,
    base_url: String,
    voice_id: String,
    http_client: reqwest::Client,
}

impl SoundClient {
    /// Create a client from settings.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::MissingApiKey` if no ElevenLabs key is configured.
    pub fn new(settings: &Settings) -> Result<Self, SoundError> {
        let eleven = &settings.elevenlabs;
        if eleven.api_key.trim().is_empty() {
            return Err(SoundError::MissingApiKey);
        }
        Ok(Self {
            api_key: eleven.api_key.clone(),
            base_url: eleven.base_url.trim_end_matches('/').to_string(),
            voice_id: eleven.voice_id.clone(),
            http_client: build_client()?,
        })
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// Generate a sound effect described by `text`.
    ///
    /// `duration_seconds` is clamped to 0.5..=22 and `prompt_influence` to 0..=1.
    pub async fn text_to_effect(
        &self,
        text: &str,
        duration_seconds: f64,
        prompt_influence: f64,
    ) -> Result<Vec<u8>, SoundError> {
        if text.trim().is_empty() {
            return Err(SoundError::EmptyText);
        }
        let body = SoundEffectRequest {
            text,
            duration_seconds: clamp_duration(duration_seconds),
            prompt_influence: clamp_influence(prompt_influence),
        };
        log::info!(
            "Generating {:.1}s sound effect: {}",
            body.duration_seconds,
            text
        );

        let url = format!("{}/sound-generation", self.base_url);
        self.post_audio(&url, &body).await
    }

    /// Narrate `text` with `voice_id`, or the configured voice when it is blank.
    pub async fn text_to_speech(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SoundError> {
        if text.trim().is_empty() {
            return Err(SoundError::EmptyText);
        }
        let voice_id = match voice_id.trim() {
            "" => self.voice_id.as_str(),
            v => v,
        };
        let body = SpeechRequest {
            text,
            model_id: TTS_MODEL_ID,
            voice_settings: VoiceSettings::default(),
        };
        log::info!("Synthesizing speech with voice {}", voice_id);

        let url = format!("{}/text-to-speech/{}", self.base_url, voice_id);
        self.post_audio(&url, &body).await
    }

    async fn post_audio<T: Serialize>(&self, url: &str, body: &T) -> Result<Vec<u8>, SoundError> {
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, AUDIO_MPEG)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let message = error_body(response).await;
            log::error!("Sound API returned {}: {}", status, message);
            return Err(SoundError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
