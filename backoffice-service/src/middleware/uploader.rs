use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ops_core::error::AppError;
use uuid::Uuid;

/// Uploader identity extractor.
///
/// Reads the optional X-User-ID header supplied by a fronting proxy or BFF.
/// There is no authentication layer in this service, so the value is
/// recorded on imported batches for bookkeeping only.
#[derive(Debug, Clone, Copy)]
pub struct UploaderId(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for UploaderId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uploader = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                Uuid::parse_str(v).map_err(|_| {
                    AppError::BadRequest(anyhow::anyhow!("X-User-ID must be a UUID"))
                })
            })
            .transpose()?;

        if let Some(uploader) = &uploader {
            tracing::Span::current().record("uploader_id", uploader.to_string().as_str());
        }

        Ok(UploaderId(uploader))
    }
}
