use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use nanogate::llm::{
    CandidateInvoker, CandidateModel, CascadingSelector, GenerationResponse, LLM, LLMError,
    Prompt, ResponsePart, RetryPolicy,
};
use nanogate::server::MAX_UPLOAD_BYTES;
use nanogate::{AppState, Gateway, app_router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// A text model that always gives the same answer, or always fails.
struct FixedLLM {
    reply: Result<String, LLMError>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LLM for FixedLLM {
    async fn prompt(&self, _prompt: Prompt) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

/// Image models where only `picture_from` returns a picture.
struct FakeImages {
    picture_from: Option<&'static str>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

#[async_trait]
impl CandidateInvoker for FakeImages {
    async fn invoke(
        &self,
        candidate: &CandidateModel,
        prompt: &Prompt,
    ) -> Result<GenerationResponse, LLMError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if self.picture_from == Some(candidate.name()) {
            Ok(GenerationResponse {
                parts: vec![ResponsePart::InlineData {
                    mime_type: "image/png".to_string(),
                    data: vec![1, 2, 3],
                }],
            })
        } else {
            Err(LLMError::PromptError(
                "[503 Service Unavailable] UNAVAILABLE: The model is overloaded.".to_string(),
            ))
        }
    }
}

struct Harness {
    router: Router,
    text_calls: Arc<AtomicUsize>,
    image_prompts: Arc<Mutex<Vec<Prompt>>>,
}

fn harness(reply: Result<String, LLMError>, picture_from: Option<&'static str>) -> Harness {
    let text_calls = Arc::new(AtomicUsize::new(0));
    let image_prompts = Arc::new(Mutex::new(Vec::new()));
    let text = FixedLLM {
        reply,
        calls: text_calls.clone(),
    };
    let images = Arc::new(FakeImages {
        picture_from,
        prompts: image_prompts.clone(),
    });
    let selector = CascadingSelector::new(vec![
        CandidateModel::new("image-model-a"),
        CandidateModel::new("image-model-b"),
    ])
    .unwrap();
    let gateway = Gateway::new(
        Box::new(text),
        Some(RetryPolicy::new(3, Duration::from_secs(2), 1.5)),
        images,
        selector,
    )
    .unwrap();

    Harness {
        router: app_router(AppState::new(gateway)),
        text_calls,
        image_prompts,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(uri: &str, parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Request<Body> {
    const BOUNDARY: &str = "nanogate-test-boundary";
    let mut body = Vec::new();
    for (name, file, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((filename, mime)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, body)
}

#[tokio::test]
async fn root_identifies_the_backend() {
    let h = harness(Ok("unused".to_string()), None);
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("NANO BANANA BACKEND"));
}

#[tokio::test]
async fn chat_without_message_is_a_bad_request() {
    let h = harness(Ok("unused".to_string()), None);
    let (status, body) = send(&h.router, post_json("/api/chat", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "error": true,
            "success": false,
            "message": "message is required",
            "details": "message is required"
        })
    );
    assert_eq!(h.text_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn chat_returns_cleaned_text() {
    let h = harness(Ok("Sure, **happy** to help!".to_string()), None);
    let (status, body) = send(&h.router, post_json("/api/chat", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": "Sure, happy to help!"}));
}

#[tokio::test]
async fn cartoon_story_is_labelled() {
    let h = harness(Ok("Once upon a time.".to_string()), None);
    let (status, body) = send(
        &h.router,
        post_json("/api/cartoon-story", json!({"storyText": "a brave cat"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Cartoon-story");
    assert_eq!(body["feature"], "Cartoon studio");
    assert_eq!(body["data"], "Once upon a time.");
}

#[tokio::test]
async fn image_generation_without_body_uses_the_default_prompt() {
    let h = harness(Ok("unused".to_string()), Some("image-model-b"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-image")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "image");
    assert_eq!(body["data"], "data:image/png;base64,AQID");
    assert_eq!(body["model"], "image-model-b");
    assert_eq!(
        body["prompt"],
        "generate the image of dog riding on scooter with remote control"
    );
    assert_eq!(h.image_prompts.lock().unwrap().len(), 2);
    assert_eq!(h.text_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_json_body_uses_the_default_prompt() {
    let h = harness(Ok("unused".to_string()), Some("image-model-a"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-image")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "image-model-a");
    assert_eq!(
        body["prompt"],
        "generate the image of dog riding on scooter with remote control"
    );
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() {
    let h = harness(Ok("unused".to_string()), None);
    let (status, body) = send(
        &h.router,
        post_json("/api/generate-ad", json!({"product": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON body")
    );
    assert_eq!(body["message"], body["details"]);
    assert_eq!(h.text_calls.load(Ordering::SeqCst), 0);

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();
    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn image_generation_degrades_when_no_model_draws() {
    let h = harness(Ok("A scooter-riding dog.".to_string()), None);
    let (status, body) = send(
        &h.router,
        post_json("/api/generate-image", json!({"prompt": "a dog"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "text");
    assert!(body["data"].as_str().unwrap().contains("A scooter-riding dog."));
    assert!(body["note"].is_string());
    assert_eq!(h.text_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn overloaded_text_model_maps_to_service_unavailable() {
    let h = harness(
        Err(LLMError::PromptError("503 The model is overloaded".to_string())),
        None,
    );
    let (status, body) = send(
        &h.router,
        post_json("/api/generate-animation", json!({"prompt": "samurai"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], true);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("temporarily overloaded")
    );
    assert_eq!(body["details"], "Animation generation temporarily unavailable");
    assert_eq!(h.text_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn fatal_text_failure_is_not_retried() {
    let h = harness(
        Err(LLMError::PromptError("API key not valid".to_string())),
        None,
    );
    let (status, body) = send(
        &h.router,
        post_json("/api/generate-ad", json!({"product": "shoes"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "AI service error: API key not valid");
    assert_eq!(body["details"], "Advertisement generation temporarily unavailable");
    assert_eq!(h.text_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn photo_upload_is_sent_to_the_image_models() {
    let h = harness(Ok("unused".to_string()), Some("image-model-a"));
    let request = post_multipart(
        "/api/transform-photo",
        &[
            ("image", Some(("me.jpg", "image/jpeg")), &b"\xff\xd8\xff"[..]),
            ("era", None, &b"1920s"[..]),
            ("style", None, &b"sepia"[..]),
        ],
    );
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "image");
    assert_eq!(body["feature"], "Time Travel Camera");
    assert_eq!(body["targetEra"], "1920s");
    assert_eq!(body["targetStyle"], "sepia");

    let prompts = h.image_prompts.lock().unwrap();
    let image = prompts[0].image.as_ref().unwrap();
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.data, b"\xff\xd8\xff".to_vec());
    assert!(prompts[0].text.contains("1920s"));
}

#[tokio::test]
async fn photo_upload_must_be_an_image() {
    let h = harness(Ok("unused".to_string()), Some("image-model-a"));
    let request = post_multipart(
        "/api/transform-photo",
        &[("image", Some(("notes.txt", "text/plain")), &b"hello"[..])],
    );
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Only image files are allowed!");
    assert!(h.image_prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn photo_without_upload_is_described() {
    let h = harness(Ok("Imagine a top hat.".to_string()), Some("image-model-a"));
    let (status, body) = send(
        &h.router,
        post_json("/api/transform-photo", json!({"description": "me at the beach"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "photo-transform");
    assert_eq!(body["data"], "Imagine a top hat.");
    assert_eq!(body["note"], "Text-only transformation (no image uploaded)");
    assert!(h.image_prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn photo_upload_at_the_size_limit_is_accepted() {
    let h = harness(Ok("unused".to_string()), Some("image-model-a"));
    let image = vec![0u8; MAX_UPLOAD_BYTES];
    let request = post_multipart(
        "/api/transform-photo",
        &[("image", Some(("big.png", "image/png")), &image[..])],
    );
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "image");
    let prompts = h.image_prompts.lock().unwrap();
    assert_eq!(prompts[0].image.as_ref().unwrap().data.len(), MAX_UPLOAD_BYTES);
}

#[tokio::test]
async fn photo_upload_over_the_size_limit_is_rejected() {
    let h = harness(Ok("unused".to_string()), Some("image-model-a"));
    let image = vec![0u8; MAX_UPLOAD_BYTES + 1];
    let request = post_multipart(
        "/api/transform-photo",
        &[("image", Some(("big.png", "image/png")), &image[..])],
    );
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Image too large: the limit is 10 MiB");
    assert!(h.image_prompts.lock().unwrap().is_empty());
}
