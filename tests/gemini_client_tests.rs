//! Mock HTTP tests for GeminiClient.
//!
//! These tests cover:
//! - Request routing and API key header
//! - Image extraction from generateContent replies
//! - Bounding box fallback parsing
//! - Video job polling, timeout, and sample download
//! - Prompt augmentation fallback
//! - Error classification

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adforge::config::Settings;
use adforge::gemini::{BoundingBox, GeminiClient, GeminiError, PollPolicy, Sleeper};

/// Sleeper that returns immediately and records each requested delay.
#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }

    fn all(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.google.api_key = "test-google-key".to_string();
    settings.google.base_url = server.uri();
    settings
}

fn client_for(server: &MockServer) -> (GeminiClient, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let client = GeminiClient::new(&settings_for(server))
        .unwrap()
        .with_sleeper(sleeper.clone());
    (client, sleeper)
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn text_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}

fn generate_path(model: &str) -> String {
    format!("/models/{}:generateContent", model)
}

fn operation(done: bool, uris: &[String]) -> serde_json::Value {
    let samples: Vec<_> = uris
        .iter()
        .map(|uri| serde_json::json!({"video": {"uri": uri}}))
        .collect();
    serde_json::json!({
        "name": "operations/op-1",
        "done": done,
        "response": {"generateVideoResponse": {"generatedSamples": samples}}
    })
}

// === Text ===

#[tokio::test]
async fn test_invoke_sends_api_key_and_returns_text() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.fast_model)))
        .and(header("x-goog-api-key", "test-google-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"parts": [{"text": "Say hi"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&settings).unwrap();
    assert_eq!(client.invoke("Say hi").await.unwrap(), "Hi there");
}

#[tokio::test]
async fn test_invoke_empty_prompt_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    assert!(matches!(
        client.invoke("   ").await,
        Err(GeminiError::EmptyPrompt)
    ));
}

#[tokio::test]
async fn test_rate_limit_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_string("quota exceeded"),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    match client.invoke("hello").await {
        Err(GeminiError::RateLimit {
            message,
            retry_after_secs,
        }) => {
            assert_eq!(message, "quota exceeded");
            assert_eq!(retry_after_secs, Some(30));
        }
        other => panic!("Expected RateLimit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_safety_block_is_content_policy_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Prompt was blocked due to SAFETY"),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    assert!(matches!(
        client.create_image("something").await,
        Err(GeminiError::ContentPolicyViolation { .. })
    ));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    match client.invoke("hello").await {
        Err(GeminiError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("internal"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

// === Images ===

#[tokio::test]
async fn test_create_image_extracts_inline_image() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let png = png_bytes();

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.image_generation_model)))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here is your car"},
                {"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(&png)}}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&settings).unwrap();
    let image = client.create_image("red sports car").await.unwrap();
    assert_eq!(image.bytes, png);
    assert_eq!(image.mime_type, "image/png");
}

#[tokio::test]
async fn test_create_image_without_image_part_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("I can only talk")))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    assert!(matches!(
        client.create_image("red sports car").await,
        Err(GeminiError::NoValidImage)
    ));
}

#[tokio::test]
async fn test_edit_image_sends_reencoded_source() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let png = png_bytes();

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("shoe.jpg");
    let mut jpeg = Vec::new();
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([0, 90, 160])))
        .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .unwrap();
    std::fs::write(&source, &jpeg).unwrap();

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.image_generation_model)))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"parts": [
                {"text": "make it red"},
                {"inlineData": {"mimeType": "image/jpeg"}}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(&png)}}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let edited = client.edit_image(&source, "make it red").await.unwrap();
    assert_eq!(edited.bytes, png);
}

#[tokio::test]
async fn test_describe_image_sends_image_inline() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let png = png_bytes();
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("product.png");
    std::fs::write(&image_path, &png).unwrap();

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.fast_model)))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"parts": [
                {"text": "Describe this image"},
                {"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(&png)}}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("A red square")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&settings).unwrap();
    assert_eq!(client.describe_image(&image_path).await.unwrap(), "A red square");
}

#[tokio::test]
async fn test_describe_missing_image_fails_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    assert!(matches!(
        client.describe_image(Path::new("/no/such/image.png")).await,
        Err(GeminiError::ImageRead { .. })
    ));
}

// === Detection ===

#[tokio::test]
async fn test_bounding_boxes_fall_back_to_line_parsing() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("scene.png");
    std::fs::write(&image_path, png_bytes()).unwrap();

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.pro_model)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_reply("[10, 20, 30, 40],\nnot a box\n[50, 60, 70, 80]")),
        )
        .mount(&server)
        .await;

    let client = GeminiClient::new(&settings).unwrap();
    let boxes = client.get_bounding_boxes(&image_path).await.unwrap();
    assert_eq!(
        boxes,
        vec![
            BoundingBox {
                ymin: 10.0,
                xmin: 20.0,
                ymax: 30.0,
                xmax: 40.0
            },
            BoundingBox {
                ymin: 50.0,
                xmin: 60.0,
                ymax: 70.0,
                xmax: 80.0
            },
        ]
    );
}

#[tokio::test]
async fn test_bounding_boxes_unparseable_reply_fails() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("scene.png");
    std::fs::write(&image_path, png_bytes()).unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("no objects found")))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    assert!(matches!(
        client.get_bounding_boxes(&image_path).await,
        Err(GeminiError::BoundingBoxParse)
    ));
}

#[tokio::test]
async fn test_segmentation_parses_fenced_json() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("table.png");
    std::fs::write(&image_path, png_bytes()).unwrap();

    let reply = "```json\n[{\"box_2d\": [1, 2, 3, 4], \"mask\": \"data:image/png;base64,AAAA\", \"label\": \"glass cup\"}]\n```";
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"parts": [{"text": "Find the cups"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let masks = client
        .get_segmentation(&image_path, Some("Find the cups"))
        .await
        .unwrap();
    assert_eq!(masks.len(), 1);
    assert_eq!(masks[0].label, "glass cup");
    assert_eq!(masks[0].box_2d, vec![1.0, 2.0, 3.0, 4.0]);
}

// === Video ===

#[tokio::test]
async fn test_video_job_done_on_third_check_sleeps_twice() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let video_uri = format!("{}/files/video-1.mp4", server.uri());

    Mock::given(method("POST"))
        .and(path(format!(
            "/models/{}:predictLongRunning",
            settings.google.video_generation_model
        )))
        .and(body_partial_json(serde_json::json!({
            "instances": [{"prompt": "a drone shot over mountains"}],
            "parameters": {"aspectRatio": "16:9", "personGeneration": "allow_adult"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(false, &[])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(false, &[])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(operation(true, &[video_uri.clone()])),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/video-1.mp4"))
        .and(header("x-goog-api-key", "test-google-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake mp4 data".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("videos").join("drone.mp4");

    let sleeper = Arc::new(RecordingSleeper::default());
    let client = GeminiClient::new(&settings)
        .unwrap()
        .with_sleeper(sleeper.clone());
    let written = client
        .generate_video_from_prompt("a drone shot over mountains", &output)
        .await
        .unwrap();

    assert_eq!(written, vec![output.clone()]);
    assert_eq!(std::fs::read(&output).unwrap(), b"fake mp4 data");
    assert_eq!(
        sleeper.all(),
        vec![Duration::from_secs(20), Duration::from_secs(20)]
    );
}

#[tokio::test]
async fn test_video_job_never_done_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(false, &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(false, &[])))
        .mount(&server)
        .await;

    let (client, sleeper) = client_for(&server);
    let client = client.with_poll_policy(PollPolicy {
        interval: Duration::from_secs(20),
        max_wait: Duration::from_secs(60),
    });

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.mp4");
    let result = client.generate_video_from_prompt("forever", &output).await;

    match result {
        Err(GeminiError::Timeout { waited }) => assert_eq!(waited, Duration::from_secs(60)),
        other => panic!("Expected Timeout, got {:?}", other),
    }
    assert_eq!(sleeper.count(), 3);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_zero_poll_interval_times_out_without_polling() {
    let server = MockServer::start().await;
    let mut settings = settings_for(&server);
    settings.video.poll_interval_secs = 0;
    settings.video.max_wait_secs = 60;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(false, &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(false, &[])))
        .expect(0)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let client = GeminiClient::new(&settings)
        .unwrap()
        .with_sleeper(sleeper.clone());

    let dir = tempfile::tempdir().unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.generate_video_from_prompt("spin", &dir.path().join("spin.mp4")),
    )
    .await
    .expect("poll loop must return");

    assert!(matches!(
        result,
        Err(GeminiError::Timeout { waited }) if waited == Duration::ZERO
    ));
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn test_video_job_error_is_generation_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "operations/op-1",
            "done": true,
            "error": {"code": 3, "message": "prompt rejected"}
        })))
        .mount(&server)
        .await;

    let (client, sleeper) = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let result = client
        .generate_video_from_prompt("anything", &dir.path().join("out.mp4"))
        .await;

    match result {
        Err(GeminiError::GenerationFailed(message)) => assert_eq!(message, "prompt rejected"),
        other => panic!("Expected GenerationFailed, got {:?}", other),
    }
    assert_eq!(sleeper.count(), 0);
}

#[tokio::test]
async fn test_video_job_without_samples_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(true, &[])))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        client
            .generate_video_from_prompt("anything", &dir.path().join("out.mp4"))
            .await,
        Err(GeminiError::NoSamples)
    ));
}

#[tokio::test]
async fn test_every_sample_is_downloaded() {
    let server = MockServer::start().await;
    let uris = vec![
        format!("{}/files/a.mp4", server.uri()),
        format!("{}/files/b.mp4", server.uri()),
    ];

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(true, &uris)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"first".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second".to_vec()))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("clip");
    let written = client
        .generate_video_from_prompt("two takes", &output)
        .await
        .unwrap();

    let first = dir.path().join("clip.mp4");
    let second = dir.path().join("clip_1.mp4");
    assert_eq!(written, vec![first.clone(), second.clone()]);
    assert_eq!(std::fs::read(first).unwrap(), b"first");
    assert_eq!(std::fs::read(second).unwrap(), b"second");
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    let uri = format!("{}/files/gone.mp4", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(true, &[uri])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/gone.mp4"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("gone.mp4");
    let result = client.generate_video_from_prompt("vanishing", &output).await;

    assert!(matches!(result, Err(GeminiError::Api { status: 404, .. })));
    assert!(!output.exists());
    assert!(!dir.path().join("gone.mp4.part").exists());
}

#[tokio::test]
async fn test_augmentation_failure_submits_original_prompt() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let video_uri = format!("{}/files/ad.mp4", server.uri());

    // Augmentation call fails
    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.fast_model)))
        .respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/models/{}:predictLongRunning",
            settings.google.video_generation_model
        )))
        .and(body_partial_json(serde_json::json!({
            "instances": [{
                "prompt": "sleek headphones on a desk",
                "image": {"mimeType": "image/png"}
            }],
            "parameters": {"aspectRatio": "9:16", "sampleCount": 1, "durationSeconds": 8}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(true, &[video_uri])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/ad.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ad".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("headphones.png");
    std::fs::write(&image_path, png_bytes()).unwrap();
    let output = dir.path().join("ad.mp4");

    let client = GeminiClient::new(&settings).unwrap();
    let written = client
        .generate_video_from_image(&image_path, "sleek headphones on a desk", &output, true)
        .await
        .unwrap();

    assert_eq!(written, vec![output.clone()]);
    assert_eq!(std::fs::read(&output).unwrap(), b"ad");
}

#[tokio::test]
async fn test_augmented_prompt_is_submitted() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let video_uri = format!("{}/files/ad.mp4", server.uri());

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.fast_model)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_reply("  Slow dolly-in on headphones at golden hour  ")),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "instances": [{"prompt": "Slow dolly-in on headphones at golden hour"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(true, &[video_uri])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/ad.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ad".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("headphones.png");
    std::fs::write(&image_path, png_bytes()).unwrap();

    let client = GeminiClient::new(&settings).unwrap();
    client
        .generate_video_from_image(&image_path, "headphones", &dir.path().join("ad.mp4"), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_video_from_image_creates_first_frame() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);
    let png = png_bytes();
    let video_uri = format!("{}/files/ad.mp4", server.uri());

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:predict", settings.google.imagen_model)))
        .and(body_partial_json(serde_json::json!({
            "instances": [{"prompt": "a coffee mug"}],
            "parameters": {"sampleCount": 1, "aspectRatio": "16:9"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [{"bytesBase64Encoded": BASE64_STANDARD.encode(&png), "mimeType": "image/png"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(generate_path(&settings.google.fast_model)))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("steam rising")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/models/{}:predictLongRunning",
            settings.google.video_generation_model
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation(true, &[video_uri])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/ad.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ad".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("frames").join("mug.png");

    let client = GeminiClient::new(&settings).unwrap();
    client
        .generate_video_from_image(&image_path, "a coffee mug", &dir.path().join("mug.mp4"), false)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&image_path).unwrap(), png);
}
