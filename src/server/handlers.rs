use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{AppState, MAX_UPLOAD_BYTES};
use super::error::{ApiError, ApiResult};
use crate::gateway::{FeatureReply, FeatureRequest, PhotoTransformRequest};
use crate::llm::InlineImage;

#[derive(Debug, Default, Deserialize)]
pub struct ChatBody {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptBody {
    prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryBody {
    story_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdBody {
    brand: Option<String>,
    product: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhotoBody {
    description: Option<String>,
    era: Option<String>,
    style: Option<String>,
}

/// A JSON request body. A missing body, an empty one, or one sent without a
/// JSON content type yields `T::default()`, so every field falls back to its
/// feature default. Malformed JSON is reported as a bad request.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !content_type(request.headers()).starts_with("application/json") {
            return Ok(JsonBody(T::default()));
        }
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
    }
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub async fn root() -> &'static str {
    "NANO BANANA BACKEND"
}

pub async fn chat(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ChatBody>,
) -> ApiResult<Json<FeatureReply>> {
    serve(&state, FeatureRequest::chat(body.message)).await
}

pub async fn generate_image(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PromptBody>,
) -> ApiResult<Json<FeatureReply>> {
    serve(&state, FeatureRequest::image(body.prompt)).await
}

pub async fn generate_animation(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PromptBody>,
) -> ApiResult<Json<FeatureReply>> {
    serve(&state, FeatureRequest::animation(body.prompt)).await
}

pub async fn cartoon_story(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<StoryBody>,
) -> ApiResult<Json<FeatureReply>> {
    serve(&state, FeatureRequest::cartoon_story(body.story_text)).await
}

pub async fn generate_ad(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<AdBody>,
) -> ApiResult<Json<FeatureReply>> {
    serve(&state, FeatureRequest::advertisement(body.brand, body.product)).await
}

/// Accepts either a multipart form with an `image` file or a JSON body.
pub async fn transform_photo(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<FeatureReply>> {
    let photo = if content_type(request.headers()).starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        read_photo_form(multipart).await?
    } else {
        let JsonBody(body) = JsonBody::<PhotoBody>::from_request(request, &state).await?;
        PhotoTransformRequest::new(body.description, body.era, body.style, None)
    };

    serve(&state, FeatureRequest::photo_transform(photo)).await
}

async fn read_photo_form(mut multipart: Multipart) -> ApiResult<PhotoTransformRequest> {
    let mut fields = PhotoBody::default();
    let mut image = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let mime_type = field.content_type().unwrap_or("").to_string();
                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image: {e}")))?
                {
                    if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                        return Err(ApiError::BadRequest(format!(
                            "Image too large: the limit is {} MiB",
                            MAX_UPLOAD_BYTES / (1024 * 1024)
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }
                // Browsers send an empty part when no file was picked.
                if data.is_empty() {
                    continue;
                }
                if !mime_type.starts_with("image/") {
                    return Err(ApiError::BadRequest(
                        "Only image files are allowed!".to_string(),
                    ));
                }
                image = Some(InlineImage { data, mime_type });
            }
            "description" | "era" | "style" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
                let slot = match name.as_str() {
                    "description" => &mut fields.description,
                    "era" => &mut fields.era,
                    _ => &mut fields.style,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }

    Ok(PhotoTransformRequest::new(
        fields.description,
        fields.era,
        fields.style,
        image,
    ))
}

async fn serve(state: &AppState, request: FeatureRequest) -> ApiResult<Json<FeatureReply>> {
    let feature = request.feature();
    state
        .gateway
        .run(request)
        .await
        .map(Json)
        .map_err(|error| ApiError::feature(feature, error))
}
