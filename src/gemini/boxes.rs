//! Bounding-box and segmentation parsing for semi-structured model output.

use serde::{Deserialize, Serialize};

/// Scale that Gemini normalizes box coordinates to.
pub const NORMALIZED_SCALE: f64 = 1000.0;

/// A bounding box in normalized `[0, 1000]` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,
}

impl BoundingBox {
    fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [ymin, xmin, ymax, xmax] => Some(Self {
                ymin: *ymin,
                xmin: *xmin,
                ymax: *ymax,
                xmax: *xmax,
            }),
            _ => None,
        }
    }
}

/// A bounding box in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub ymin: u32,
    pub xmin: u32,
    pub ymax: u32,
    pub xmax: u32,
}

/// One segmentation entry as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// `[y0, x0, y1, x1]`, normalized to 1000.
    pub box_2d: Vec<f64>,
    /// Base64-encoded PNG probability mask.
    pub mask: String,
    pub label: String,
}

/// Convert a normalized box into pixel space for an image of `width` x `height`.
///
/// Coordinates outside `[0, 1000]` are clamped first, so the result always
/// lies inside the image.
pub fn convert_normalized_box(norm_box: &BoundingBox, width: u32, height: u32) -> PixelBox {
    let scale = |value: f64, extent: u32| -> u32 {
        let clamped = value.clamp(0.0, NORMALIZED_SCALE);
        ((clamped / NORMALIZED_SCALE) * f64::from(extent)) as u32
    };

    PixelBox {
        ymin: scale(norm_box.ymin, height),
        xmin: scale(norm_box.xmin, width),
        ymax: scale(norm_box.ymax, height),
        xmax: scale(norm_box.xmax, width),
    }
}

/// Strip a surrounding markdown code fence (```` ```json ... ``` ````), if any.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse bounding boxes out of a model reply.
///
/// Tries strict JSON (`[[ymin, xmin, ymax, xmax], ...]`) first. If the reply
/// isn't valid JSON, falls back to reading one bracketed box per line.
/// Entries that don't have exactly four numbers are skipped. Returns `None`
/// when no box could be parsed at all.
pub fn parse_bounding_boxes(text: &str) -> Option<Vec<BoundingBox>> {
    let body = strip_code_fence(text);

    let strict = match serde_json::from_str::<Vec<serde_json::Value>>(body) {
        Ok(entries) => entries
            .iter()
            .filter_map(|entry| {
                let values = entry
                    .as_array()?
                    .iter()
                    .map(serde_json::Value::as_f64)
                    .collect::<Option<Vec<f64>>>()?;
                BoundingBox::from_slice(&values)
            })
            .collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };

    // A lone flat `[a, b, c, d]` is valid JSON but not a list of boxes.
    let boxes = if strict.is_empty() {
        parse_bracketed_lines(body)
    } else {
        strict
    };

    if boxes.is_empty() {
        None
    } else {
        Some(boxes)
    }
}

fn parse_bracketed_lines(body: &str) -> Vec<BoundingBox> {
    let mut boxes = Vec::new();
    let mut skipped = 0usize;

    for line in body.lines() {
        let line = line.trim().trim_end_matches(',');
        if line.is_empty() {
            continue;
        }
        let inner = line.trim_matches(|c| c == '[' || c == ']');
        let parsed = inner
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .ok()
            .and_then(|values| BoundingBox::from_slice(&values));

        match parsed {
            Some(b) => boxes.push(b),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} unparseable bounding box line(s)", skipped);
    }
    boxes
}

/// Parse segmentation masks. Strict: any malformed JSON is an error.
pub fn parse_segmentation(text: &str) -> Result<Vec<SegmentationMask>, serde_json::Error> {
    serde_json::from_str(strip_code_fence(text))
}
