//! GeminiClient - handles communication with the Gemini, Imagen and Veo APIs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

use super::boxes::{parse_bounding_boxes, parse_segmentation, BoundingBox, SegmentationMask};
use super::poll::{PollPolicy, Sleeper, TokioSleeper};
use super::types::{
    relaxed_safety_settings, GenerateContentRequest, GenerateContentResponse, GeneratedImage,
    GenerationConfig, ImageSource, ImagenInstance, ImagenParameters, ImagenRequest,
    ImagenResponse, Operation, Part, SaveError, VideoImage, VideoInstance, VideoParameters,
    VideoRequest,
};
use crate::artifacts::partial_path;
use crate::config::{GoogleSettings, Settings};
use crate::http::{
    build_client, error_body, is_content_policy_error, parse_retry_after,
    HTTP_STATUS_BAD_REQUEST, HTTP_STATUS_FORBIDDEN, HTTP_STATUS_TOO_MANY_REQUESTS,
};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Fixed instruction for image descriptions.
pub const DESCRIBE_PROMPT: &str = "Describe this image";

/// Fixed instruction for bounding-box detection.
pub const BOUNDING_BOX_PROMPT: &str = "Return a bounding box for each of the objects in this image \
     in [ymin, xmin, ymax, xmax] format.";

/// Default instruction for segmentation.
pub const SEGMENTATION_PROMPT: &str = "Give the segmentation masks for the wooden and glass items. \
     Output a JSON list of segmentation masks where each entry contains the 2D \
     bounding box in the key 'box_2d', the segmentation mask in key 'mask', and \
     the text label in the key 'label'. Use descriptive labels.";

/// Instruction used to turn a product prompt into a cinematic video prompt.
const AUGMENTATION_INSTRUCTION: &str = "Rewrite the product prompt below as a professional, \
     cinematic short-form video concept for vertical social platforms. Use the attached image \
     as the product and the opening frame. Describe camera moves, transitions, lighting and \
     mood scene by scene so the clip feels premium and keeps viewers watching. Return only the \
     rewritten prompt with no commentary.";

/// Aspect ratio of the still generated as a first frame.
const FIRST_FRAME_ASPECT_RATIO: &str = "16:9";

/// Validate a prompt before sending it to the API.
pub fn validate_prompt(prompt: &str) -> Result<(), GeminiError> {
    if prompt.trim().is_empty() {
        return Err(GeminiError::EmptyPrompt);
    }
    Ok(())
}

/// Output path for the `index`-th sample of a video job.
///
/// The first sample lands exactly at `output` (with `.mp4` added when it has
/// no extension); later samples get a `_<index>` suffix.
pub fn sample_output_path(output: &Path, index: usize) -> PathBuf {
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    if index == 0 {
        return output.with_extension(ext);
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    output.with_file_name(format!("{}_{}.{}", stem, index, ext))
}

/// Client for the generative content service.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    settings: GoogleSettings,
    poll: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
    limiter: Arc<Semaphore>,
    http_client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client from settings.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::MissingApiKey` if no Google API key is configured.
    pub fn new(settings: &Settings) -> Result<Self, GeminiError> {
        let google = &settings.google;
        if google.api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        Ok(Self {
            api_key: google.api_key.clone(),
            base_url: google.base_url.trim_end_matches('/').to_string(),
            settings: google.clone(),
            poll: PollPolicy::from(&settings.video),
            sleeper: Arc::new(TokioSleeper),
            limiter: Arc::new(Semaphore::new(google.max_concurrent_calls.max(1))),
            http_client: build_client()?,
        })
    }

    /// Replace the sleeper used between video status checks.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the polling policy.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    // === Text ===

    /// Generate a text reply for `prompt` with the fast model.
    pub async fn invoke(&self, prompt: &str) -> Result<String, GeminiError> {
        validate_prompt(prompt)?;

        let request = GenerateContentRequest::user(vec![Part::text(prompt)])
            .with_config(self.text_config(None));
        let response = self
            .generate_content(&self.settings.fast_model, &request)
            .await?;

        response.text().ok_or(GeminiError::EmptyResponse("text"))
    }

    /// Describe the image at `path`.
    pub async fn describe_image(&self, path: &Path) -> Result<String, GeminiError> {
        log::info!("Describing image at {}", path.display());
        let image = read_image(path).await?;

        let request =
            GenerateContentRequest::user(vec![Part::text(DESCRIBE_PROMPT), Part::image(&image)])
                .with_config(self.text_config(Some(vec!["TEXT"])));
        let response = self
            .generate_content(&self.settings.fast_model, &request)
            .await?;

        response
            .text()
            .ok_or(GeminiError::EmptyResponse("image description"))
    }

    // === Images ===

    /// Create an image from `prompt`.
    pub async fn create_image(&self, prompt: &str) -> Result<GeneratedImage, GeminiError> {
        validate_prompt(prompt)?;

        let request = GenerateContentRequest::user(vec![Part::text(prompt)])
            .with_config(self.text_config(Some(vec!["TEXT", "IMAGE"])))
            .with_safety(relaxed_safety_settings());
        let response = self
            .generate_content(&self.settings.image_generation_model, &request)
            .await?;

        extract_image(&response)
    }

    /// Modify the image at `path` according to `prompt`.
    pub async fn edit_image(&self, path: &Path, prompt: &str) -> Result<GeneratedImage, GeminiError> {
        validate_prompt(prompt)?;
        let image = reencode_image(path).await?;

        let request = GenerateContentRequest::user(vec![Part::text(prompt), Part::image(&image)])
            .with_config(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..GenerationConfig::default()
            });
        let response = self
            .generate_content(&self.settings.image_generation_model, &request)
            .await?;

        extract_image(&response)
    }

    /// Generate a still with the Imagen model.
    pub async fn generate_still(&self, prompt: &str) -> Result<GeneratedImage, GeminiError> {
        validate_prompt(prompt)?;

        let url = format!("{}/models/{}:predict", self.base_url, self.settings.imagen_model);
        let request = ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: FIRST_FRAME_ASPECT_RATIO.to_string(),
            },
        };

        let response: ImagenResponse = self.post_json(&url, &request).await?.json().await?;
        let encoded = response
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
            .ok_or(GeminiError::NoValidImage)?;
        let bytes = BASE64_STANDARD.decode(encoded)?;
        GeneratedImage::from_bytes(bytes).ok_or(GeminiError::NoValidImage)
    }

    // === Detection ===

    /// Detect objects and return their normalized bounding boxes.
    pub async fn get_bounding_boxes(&self, path: &Path) -> Result<Vec<BoundingBox>, GeminiError> {
        let text = self.ask_about_image(path, BOUNDING_BOX_PROMPT, "bounding boxes").await?;
        parse_bounding_boxes(&text).ok_or(GeminiError::BoundingBoxParse)
    }

    /// Segment the image. `prompt` replaces the default instruction.
    pub async fn get_segmentation(
        &self,
        path: &Path,
        prompt: Option<&str>,
    ) -> Result<Vec<SegmentationMask>, GeminiError> {
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(SEGMENTATION_PROMPT);
        let text = self.ask_about_image(path, prompt, "segmentation").await?;
        parse_segmentation(&text).map_err(GeminiError::SegmentationParse)
    }

    async fn ask_about_image(
        &self,
        path: &Path,
        instruction: &str,
        what: &'static str,
    ) -> Result<String, GeminiError> {
        let image = read_image(path).await?;
        let request =
            GenerateContentRequest::user(vec![Part::text(instruction), Part::image(&image)])
                .with_config(self.text_config(None));
        let response = self
            .generate_content(&self.settings.pro_model, &request)
            .await?;
        response.text().ok_or(GeminiError::EmptyResponse(what))
    }

    // === Video ===

    /// Generate a video from a text prompt and download every sample.
    ///
    /// Returns the paths written, first sample at `output`.
    pub async fn generate_video_from_prompt(
        &self,
        prompt: &str,
        output: &Path,
    ) -> Result<Vec<PathBuf>, GeminiError> {
        validate_prompt(prompt)?;
        log::info!("Starting video generation for prompt: {}", prompt);

        let instance = VideoInstance {
            prompt: prompt.to_string(),
            image: None,
        };
        self.run_video_job(instance, VideoParameters::for_prompt(), output)
            .await
    }

    /// Generate a video whose first frame is an image.
    ///
    /// When `skip_image_creation` is false, a still is generated from `prompt`
    /// and saved to `image_path` first; otherwise the image at `image_path`
    /// is used. The prompt is then rewritten into a cinematic version. If the
    /// rewrite fails the original prompt is used.
    pub async fn generate_video_from_image(
        &self,
        image_path: &Path,
        prompt: &str,
        output: &Path,
        skip_image_creation: bool,
    ) -> Result<Vec<PathBuf>, GeminiError> {
        validate_prompt(prompt)?;

        let image = if skip_image_creation {
            read_image(image_path).await?
        } else {
            let still = self.generate_still(prompt).await?;
            still.save(image_path).await?;
            still.into_source()
        };
        log::info!(
            "Using {} first frame {} ({})",
            if image.is_generated() { "generated" } else { "provided" },
            image_path.display(),
            image.mime_type()
        );

        let video_prompt = self.augment_prompt(prompt, &image).await;

        let instance = VideoInstance {
            prompt: video_prompt,
            image: Some(VideoImage::from(&image)),
        };
        self.run_video_job(instance, VideoParameters::for_image(), output)
            .await
    }

    /// Rewrite `prompt` for video, falling back to `prompt` on any failure.
    pub async fn augment_prompt(&self, prompt: &str, image: &ImageSource) -> String {
        match self.try_augment(prompt, image).await {
            Ok(augmented) => {
                log::info!("Augmented prompt: {}", augmented);
                augmented
            }
            Err(e) => {
                log::warn!("Prompt augmentation failed, using original prompt: {}", e);
                prompt.to_string()
            }
        }
    }

    async fn try_augment(&self, prompt: &str, image: &ImageSource) -> Result<String, GeminiError> {
        let instruction = format!("{}\n\nProduct prompt: {}", AUGMENTATION_INSTRUCTION, prompt);
        let request = GenerateContentRequest::user(vec![Part::text(instruction), Part::image(image)]);
        let response = self
            .generate_content(&self.settings.fast_model, &request)
            .await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(GeminiError::EmptyResponse("augmented prompt"))
    }

    async fn run_video_job(
        &self,
        instance: VideoInstance,
        parameters: VideoParameters,
        output: &Path,
    ) -> Result<Vec<PathBuf>, GeminiError> {
        let operation = self.submit_video(instance, parameters).await?;
        log::info!("Video job submitted: {}", operation.name);

        let operation = self.wait_for_operation(operation).await?;

        if let Some(error) = operation.error {
            log::error!(
                "Video generation failed (code {:?}): {}",
                error.code,
                error.message
            );
            return Err(GeminiError::GenerationFailed(error.message));
        }

        let uris = operation.sample_uris();
        if uris.is_empty() {
            return Err(GeminiError::NoSamples);
        }

        let mut written = Vec::with_capacity(uris.len());
        for (index, uri) in uris.iter().enumerate() {
            let dest = sample_output_path(output, index);
            log::info!("Downloading sample {} to {}", index, dest.display());
            written.push(self.download_video(uri, &dest).await?);
        }
        Ok(written)
    }

    async fn submit_video(
        &self,
        instance: VideoInstance,
        parameters: VideoParameters,
    ) -> Result<Operation, GeminiError> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url, self.settings.video_generation_model
        );
        let request = VideoRequest {
            instances: vec![instance],
            parameters,
        };
        Ok(self.post_json(&url, &request).await?.json().await?)
    }

    /// Poll `operation` until done, sleeping `interval` between checks.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::Timeout` once the accumulated wait reaches the
    /// policy's `max_wait` without completion, or at once for a zero interval.
    async fn wait_for_operation(&self, mut operation: Operation) -> Result<Operation, GeminiError> {
        let mut polls: u32 = 0;

        while !operation.done {
            if !self.poll.should_continue(polls) {
                let waited = self.poll.waited(polls);
                log::error!("Video generation timed out after {:?}", waited);
                return Err(GeminiError::Timeout { waited });
            }
            self.sleeper.sleep(self.poll.interval).await;
            polls += 1;

            operation = self.get_operation(&operation.name).await?;
            log::debug!("Operation {} done={}", operation.name, operation.done);
        }

        Ok(operation)
    }

    async fn get_operation(&self, name: &str) -> Result<Operation, GeminiError> {
        let url = format!("{}/{}", self.base_url, name);
        let _permit = self.limiter.acquire().await?;
        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = check_response(response, "Status check").await?;
        Ok(response.json().await?)
    }

    /// Download a video file from a URL to disk.
    ///
    /// Streams the body into a `.part` sibling and renames it on success.
    pub async fn download_video(&self, url: &str, dest: &Path) -> Result<PathBuf, GeminiError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let _permit = self.limiter.acquire().await?;
        let response = self
            .http_client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = check_response(response, "Video download").await?;

        let tmp = partial_path(dest);
        let result = stream_to_file(response, &tmp).await;
        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
        tokio::fs::rename(&tmp, dest).await?;

        Ok(dest.to_path_buf())
    }

    // === Plumbing ===

    fn text_config(&self, modalities: Option<Vec<&str>>) -> GenerationConfig {
        GenerationConfig {
            temperature: Some(self.settings.temperature),
            max_output_tokens: Some(self.settings.max_tokens),
            response_modalities: modalities
                .map(|m| m.into_iter().map(str::to_string).collect()),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        Ok(self.post_json(&url, request).await?.json().await?)
    }

    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, GeminiError> {
        let _permit = self.limiter.acquire().await?;
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        check_response(response, "API request").await
    }
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<(), GeminiError> {
    use futures_util::StreamExt;

    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Map non-success responses to a `GeminiError`.
async fn check_response(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, GeminiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == HTTP_STATUS_TOO_MANY_REQUESTS {
        let retry_after_secs = parse_retry_after(&response);
        let message = error_body(response).await;
        log::warn!(
            "Rate limited by Gemini API. Retry-After: {:?} seconds",
            retry_after_secs
        );
        return Err(GeminiError::RateLimit {
            message,
            retry_after_secs,
        });
    }

    let message = error_body(response).await;

    if (status.as_u16() == HTTP_STATUS_BAD_REQUEST || status.as_u16() == HTTP_STATUS_FORBIDDEN)
        && is_content_policy_error(&message)
    {
        log::warn!("Request rejected by content policy: {}", message);
        return Err(GeminiError::ContentPolicyViolation { message });
    }

    Err(GeminiError::Api {
        status: status.as_u16(),
        message: format!("{} failed: {}", context, message),
    })
}

/// First inline payload of the first candidate that decodes to an image.
fn extract_image(response: &GenerateContentResponse) -> Result<GeneratedImage, GeminiError> {
    let parts = response.first_parts().ok_or(GeminiError::NoCandidates)?;

    parts
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .filter_map(|data| BASE64_STANDARD.decode(&data.data).ok())
        .find_map(GeneratedImage::from_bytes)
        .ok_or(GeminiError::NoValidImage)
}

async fn read_image(path: &Path) -> Result<ImageSource, GeminiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| GeminiError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
    ImageSource::provided(bytes).map_err(|e| GeminiError::InvalidImage {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load an image, decode it, and re-encode it in its own format.
async fn reencode_image(path: &Path) -> Result<ImageSource, GeminiError> {
    let original = read_image(path).await?;
    let invalid = |e: image::ImageError| GeminiError::InvalidImage {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let format = image::ImageFormat::from_mime_type(original.mime_type()).ok_or_else(|| {
        GeminiError::InvalidImage {
            path: path.to_path_buf(),
            reason: format!("unsupported image type {}", original.mime_type()),
        }
    })?;
    let decoded = image::load_from_memory_with_format(original.bytes(), format).map_err(invalid)?;

    let mut bytes = Vec::new();
    decoded
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .map_err(invalid)?;

    Ok(ImageSource::Provided {
        bytes,
        mime_type: format.to_mime_type().to_string(),
    })
}

/// Errors that can occur during generative service operations.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("Google API key not configured")]
    MissingApiKey,

    #[error("Empty prompt")]
    EmptyPrompt,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Content policy violation: {message}")]
    ContentPolicyViolation { message: String },

    #[error("No candidates received from model")]
    NoCandidates,

    #[error("No valid image data received from model")]
    NoValidImage,

    #[error("No {0} received from model")]
    EmptyResponse(&'static str),

    #[error("Could not read image at {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid image at {}: {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },

    #[error("Failed to parse bounding boxes from response")]
    BoundingBoxParse,

    #[error("Failed to parse segmentation JSON from response: {0}")]
    SegmentationParse(serde_json::Error),

    #[error("Video generation failed: {0}")]
    GenerationFailed(String),

    #[error("Video generation finished without any samples")]
    NoSamples,

    #[error("Video generation timed out after {waited:?}")]
    Timeout { waited: Duration },

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to save image: {0}")]
    Save(#[from] SaveError),

    #[error("Request limiter closed: {0}")]
    Limiter(#[from] tokio::sync::AcquireError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key(key: &str) -> Settings {
        let mut settings = Settings::default();
        settings.google.api_key = key.to_string();
        settings
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = GeminiClient::new(&settings_with_key("  "));
        assert!(matches!(result, Err(GeminiError::MissingApiKey)));
    }

    #[test]
    fn test_new_uses_settings() {
        let mut settings = settings_with_key("key");
        settings.google.base_url = "http://localhost:1234/v1beta/".to_string();
        settings.video.poll_interval_secs = 3;
        let client = GeminiClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/v1beta");
        assert_eq!(client.poll_policy().interval, Duration::from_secs(3));
    }

    #[test]
    fn test_validate_prompt() {
        assert!(validate_prompt("red sports car").is_ok());
        assert!(matches!(validate_prompt(" \n"), Err(GeminiError::EmptyPrompt)));
    }

    #[test]
    fn test_sample_output_path() {
        let out = Path::new("videos/launch.mp4");
        assert_eq!(sample_output_path(out, 0), PathBuf::from("videos/launch.mp4"));
        assert_eq!(sample_output_path(out, 2), PathBuf::from("videos/launch_2.mp4"));

        let bare = Path::new("clip");
        assert_eq!(sample_output_path(bare, 0), PathBuf::from("clip.mp4"));
        assert_eq!(sample_output_path(bare, 1), PathBuf::from("clip_1.mp4"));
    }

    #[test]
    fn test_extract_image_requires_candidates() {
        let response = GenerateContentResponse::default();
        assert!(matches!(
            extract_image(&response),
            Err(GeminiError::NoCandidates)
        ));
    }

    #[test]
    fn test_extract_image_skips_undecodable_parts() {
        let png = {
            let img = image::RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0]));
            let mut out = Vec::new();
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
                .unwrap();
            out
        };
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/png", "data": "not base64!"}},
                {"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(b"garbage")}},
                {"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(&png)}}
            ]}}]
        }))
        .unwrap();

        let image = extract_image(&response).unwrap();
        assert_eq!(image.bytes, png);
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_extract_image_without_payload() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I can't draw that"}]}}]
        }))
        .unwrap();
        assert!(matches!(
            extract_image(&response),
            Err(GeminiError::NoValidImage)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            GeminiError::MissingApiKey.to_string(),
            "Google API key not configured"
        );
        assert_eq!(
            GeminiError::NoValidImage.to_string(),
            "No valid image data received from model"
        );
        assert_eq!(
            GeminiError::EmptyResponse("image description").to_string(),
            "No image description received from model"
        );
        let err = GeminiError::Api {
            status: 500,
            message: "API request failed: boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): API request failed: boom");
    }

    #[tokio::test]
    async fn test_read_image_missing_file() {
        let result = read_image(Path::new("/definitely/not/here.png")).await;
        assert!(matches!(result, Err(GeminiError::ImageRead { .. })));
    }

    #[tokio::test]
    async fn test_read_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"plain text").unwrap();
        let result = read_image(&path).await;
        assert!(matches!(result, Err(GeminiError::InvalidImage { .. })));
    }
}
