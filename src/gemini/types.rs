//! Request/response types for the Gemini REST API, plus the image values
//! passed between calls.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::artifacts::write_atomic;

// === generateContent ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    /// A single user turn made of `parts`.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: None,
            safety_settings: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_safety(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = settings;
        self
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(image: &ImageSource) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type().to_string(),
                data: image.to_base64(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

/// Harm categories relaxed for product image generation.
const RELAXED_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_CIVIC_INTEGRITY",
];

pub(crate) fn relaxed_safety_settings() -> Vec<SafetySetting> {
    RELAXED_CATEGORIES
        .iter()
        .map(|&category| SafetySetting {
            category,
            threshold: "BLOCK_NONE",
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, if any.
    pub fn first_parts(&self) -> Option<&[Part]> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
    }

    /// Concatenated text of the first candidate. `None` when there is no text.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// === Imagen :predict ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImagenRequest {
    pub instances: Vec<ImagenInstance>,
    pub parameters: ImagenParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImagenInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImagenParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImagenResponse {
    #[serde(default)]
    pub predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImagenPrediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
}

// === Veo :predictLongRunning ===

#[derive(Debug, Serialize)]
pub(crate) struct VideoRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VideoImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

impl From<&ImageSource> for VideoImage {
    fn from(image: &ImageSource) -> Self {
        Self {
            bytes_base64_encoded: image.to_base64(),
            mime_type: image.mime_type().to_string(),
        }
    }
}

/// Generation parameters for a video job.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl VideoParameters {
    /// Landscape text-to-video, adults allowed.
    pub fn for_prompt() -> Self {
        Self {
            aspect_ratio: "16:9".to_string(),
            person_generation: Some("allow_adult".to_string()),
            sample_count: None,
            duration_seconds: None,
        }
    }

    /// Vertical 8-second clip animated from a first frame.
    pub fn for_image() -> Self {
        Self {
            aspect_ratio: "9:16".to_string(),
            person_generation: None,
            sample_count: Some(1),
            duration_seconds: Some(8),
        }
    }
}

/// A long-running operation handle as returned by submit and poll.
#[derive(Debug, Deserialize)]
pub(crate) struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResponse>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoRef {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// Download URIs of every produced sample, in order.
    pub fn sample_uris(&self) -> Vec<String> {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| {
                r.generated_samples
                    .iter()
                    .filter_map(|s| s.video.as_ref().map(|v| v.uri.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// === Image values ===

/// The first frame handed to a video job.
///
/// Either produced by the image model during the call, or read from a file
/// the caller supplied. Both are consumed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Generated { bytes: Vec<u8>, mime_type: String },
    Provided { bytes: Vec<u8>, mime_type: String },
}

impl ImageSource {
    pub fn bytes(&self) -> &[u8] {
        match self {
            ImageSource::Generated { bytes, .. } | ImageSource::Provided { bytes, .. } => bytes,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            ImageSource::Generated { mime_type, .. } | ImageSource::Provided { mime_type, .. } => {
                mime_type
            }
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, ImageSource::Generated { .. })
    }

    pub(crate) fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.bytes())
    }

    /// Wrap caller-supplied bytes, detecting the MIME type from the content.
    pub fn provided(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let format = image::guess_format(&bytes)?;
        Ok(ImageSource::Provided {
            mime_type: format.to_mime_type().to_string(),
            bytes,
        })
    }
}

/// Image bytes returned by a generation or edit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Accept `bytes` only if they look like a known image format.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let format = image::guess_format(&bytes).ok()?;
        Some(Self {
            mime_type: format.to_mime_type().to_string(),
            bytes,
        })
    }

    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    /// Encode for `path`: as-is when the extension matches (or is unknown),
    /// otherwise transcoded into the format the extension names.
    pub fn encode_for_path(&self, path: &Path) -> Result<Vec<u8>, image::ImageError> {
        let target = ImageFormat::from_path(path).ok();
        match (self.format(), target) {
            (Some(source), Some(target)) if source != target => {
                let mut decoded = image::load_from_memory_with_format(&self.bytes, source)?;
                if target == ImageFormat::Jpeg {
                    // JPEG has no alpha channel.
                    decoded = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
                }
                let mut out = Vec::new();
                decoded.write_to(&mut Cursor::new(&mut out), target)?;
                Ok(out)
            }
            _ => Ok(self.bytes.clone()),
        }
    }

    /// Save atomically to `path`. Nothing is written if encoding fails.
    pub async fn save(&self, path: &Path) -> Result<(), SaveError> {
        let encoded = self.encode_for_path(path)?;
        write_atomic(path, &encoded).await?;
        Ok(())
    }

    pub fn into_source(self) -> ImageSource {
        ImageSource::Generated {
            bytes: self.bytes,
            mime_type: self.mime_type,
        }
    }
}

/// Errors while writing an image to disk.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
