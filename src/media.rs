//! Media compositing through `ffmpeg` and `ffprobe` subprocesses.
//!
//! Argument lists are built by plain functions so the filter graphs can be
//! checked without running any binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

/// Duration assumed for a video whose length cannot be probed.
pub const FALLBACK_DURATION_SECS: f64 = 10.0;

/// Sample rate of rendered silence.
const SILENCE_SAMPLE_RATE: u32 = 44_100;

const VIDEO_CODEC: &str = "libx264";
const AUDIO_CODEC: &str = "aac";

/// Errors that can occur during media operations
#[derive(Debug)]
pub enum MediaError {
    /// ffmpeg or ffprobe executable not found
    FfmpegNotFound,
    /// The process exited with non-zero status
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
    /// ffprobe output was not a duration
    InvalidDuration(String),
    /// I/O error while spawning or waiting
    IoError(std::io::Error),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::FfmpegNotFound => {
                write!(
                    f,
                    "FFmpeg not found. Please install ffmpeg (with ffprobe) and make sure it is on PATH"
                )
            }
            MediaError::ProcessFailed { exit_code, stderr } => {
                write!(f, "FFmpeg exited with code {:?}\n{}", exit_code, stderr)
            }
            MediaError::InvalidDuration(out) => {
                write!(f, "Could not read a duration from ffprobe output: {:?}", out)
            }
            MediaError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MediaError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::FfmpegNotFound
        } else {
            MediaError::IoError(e)
        }
    }
}

/// The media operations the commercial pipeline needs.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Length of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError>;

    /// Write a silent mp3 of exactly `duration_secs` to `output`.
    async fn render_silence(&self, duration_secs: f64, output: &Path) -> Result<(), MediaError>;

    /// Mix `secondary` (delayed by `start_time_seconds`) onto `primary`,
    /// attach the result to `video` and encode to `output`.
    ///
    /// The output lasts as long as `video`, whatever the length of `primary`.
    async fn add_audio_to_video(
        &self,
        video: &Path,
        primary_audio: &Path,
        secondary_audio: &Path,
        output: &Path,
        start_time_seconds: f64,
    ) -> Result<(), MediaError>;
}

/// Filter graph that delays input 2 and sums it onto input 1.
///
/// The mix is padded with silence so `-shortest` always ends it with the
/// video stream.
pub fn audio_mix_filter(start_time_seconds: f64) -> String {
    let delay_ms = (start_time_seconds.max(0.0) * 1000.0).round() as u64;
    format!(
        "[2:a]adelay={}:all=1[sec];[1:a][sec]amix=inputs=2:duration=first:normalize=0,apad[aout]",
        delay_ms
    )
}

/// Arguments for muxing two audio tracks onto a video.
pub fn mux_args(
    video: &Path,
    primary_audio: &Path,
    secondary_audio: &Path,
    output: &Path,
    start_time_seconds: f64,
) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        path_arg(video),
        "-i".to_string(),
        path_arg(primary_audio),
        "-i".to_string(),
        path_arg(secondary_audio),
        "-filter_complex".to_string(),
        audio_mix_filter(start_time_seconds),
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "[aout]".to_string(),
        "-c:v".to_string(),
        VIDEO_CODEC.to_string(),
        "-c:a".to_string(),
        AUDIO_CODEC.to_string(),
        "-shortest".to_string(),
        path_arg(output),
    ]
}

/// Arguments for rendering `duration_secs` of stereo silence as mp3.
pub fn silence_args(duration_secs: f64, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("anullsrc=r={}:cl=stereo", SILENCE_SAMPLE_RATE),
        "-t".to_string(),
        format!("{:.3}", duration_secs.max(0.0)),
        "-q:a".to_string(),
        "9".to_string(),
        "-acodec".to_string(),
        "libmp3lame".to_string(),
        path_arg(output),
    ]
}

/// Arguments for printing only the container duration.
pub fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path_arg(path),
    ]
}

/// Parse ffprobe's duration output. Rejects non-positive values.
pub fn parse_duration_output(output: &str) -> Option<f64> {
    let seconds: f64 = output.lines().next()?.trim().parse().ok()?;
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

/// Sibling path ffmpeg renders into before the result is moved to `output`.
///
/// The extension is kept so ffmpeg still picks the muxer from the name:
/// `videos/ad_final.mp4` becomes `videos/ad_final.part.mp4`.
pub fn staged_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match output.extension() {
        Some(ext) => output.with_file_name(format!("{}.part.{}", stem, ext.to_string_lossy())),
        None => output.with_file_name(format!("{}.part", stem)),
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Probe `path`, or fall back to [`FALLBACK_DURATION_SECS`].
pub async fn duration_or_default(media: &dyn MediaToolkit, path: &Path) -> f64 {
    match media.probe_duration(path).await {
        Ok(seconds) => seconds,
        Err(e) => {
            log::warn!(
                "Could not probe duration of {}, assuming {}s: {}",
                path.display(),
                FALLBACK_DURATION_SECS,
                e
            );
            FALLBACK_DURATION_SECS
        }
    }
}

/// [`MediaToolkit`] backed by the ffmpeg command-line tools.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Run `program` to completion and return its stdout.
    async fn run(program: &Path, args: &[String]) -> Result<String, MediaError> {
        log::debug!("Running {} {}", program.display(), args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::error!("{} failed: {}", program.display(), stderr);
            return Err(MediaError::ProcessFailed {
                exit_code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run ffmpeg with `args` built for a staged path, then move the result
    /// to `output`. The staged file is removed if ffmpeg fails.
    async fn render_to<F>(&self, output: &Path, args: F) -> Result<(), MediaError>
    where
        F: FnOnce(&Path) -> Vec<String>,
    {
        let staged = staged_output_path(output);
        if let Err(e) = Self::run(&self.ffmpeg, &args(&staged)).await {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e);
        }
        tokio::fs::rename(&staged, output)
            .await
            .map_err(MediaError::IoError)
    }
}

#[async_trait]
impl MediaToolkit for Ffmpeg {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        let stdout = Self::run(&self.ffprobe, &probe_args(path)).await?;
        parse_duration_output(&stdout).ok_or_else(|| MediaError::InvalidDuration(stdout))
    }

    async fn render_silence(&self, duration_secs: f64, output: &Path) -> Result<(), MediaError> {
        self.render_to(output, |staged| silence_args(duration_secs, staged))
            .await
    }

    async fn add_audio_to_video(
        &self,
        video: &Path,
        primary_audio: &Path,
        secondary_audio: &Path,
        output: &Path,
        start_time_seconds: f64,
    ) -> Result<(), MediaError> {
        self.render_to(output, |staged| {
            mux_args(
                video,
                primary_audio,
                secondary_audio,
                staged,
                start_time_seconds,
            )
        })
        .await?;
        log::info!("Final video written to {}", output.display());
        Ok(())
    }
}
