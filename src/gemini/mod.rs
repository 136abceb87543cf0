//! Generative content service integration.
//!
//! Text replies, image creation and editing, image understanding (captions,
//! bounding boxes, segmentation masks) and long-running video generation
//! against the Gemini, Imagen and Veo REST endpoints.

mod boxes;
mod client;
mod poll;
mod types;

pub use boxes::{
    convert_normalized_box, parse_bounding_boxes, parse_segmentation, BoundingBox, PixelBox,
    SegmentationMask,
};
pub use client::{
    sample_output_path, validate_prompt, GeminiClient, GeminiError, BOUNDING_BOX_PROMPT,
    DESCRIBE_PROMPT, SEGMENTATION_PROMPT,
};
pub use poll::{PollPolicy, Sleeper, TokioSleeper, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
pub use types::{GeneratedImage, ImageSource, SaveError, VideoParameters};
