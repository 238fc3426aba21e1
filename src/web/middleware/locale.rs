use std::convert::Infallible;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{
        header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::error::ErrorDetail;
use crate::i18n::Locale;

fn negotiate(headers: &HeaderMap) -> Locale {
    Locale::negotiate(headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
}

#[async_trait]
impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Locale>()
            .copied()
            .unwrap_or_else(|| negotiate(&parts.headers)))
    }
}

/// Negotiates the request locale, re-renders error details in it and tags
/// the response with `Content-Language`.
pub async fn localize_errors(mut request: Request, next: Next) -> Response {
    let locale = negotiate(request.headers());
    request.extensions_mut().insert(locale);

    let mut response = next.run(request).await;

    if locale != Locale::En {
        if let Some(ErrorDetail(msg)) = response.extensions_mut().remove::<ErrorDetail>() {
            let body = json!({ "detail": msg.render(locale) }).to_string();
            let headers = response.headers_mut();
            headers.remove(CONTENT_LENGTH);
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *response.body_mut() = Body::from(body);
        }
    }

    response
        .headers_mut()
        .insert(CONTENT_LANGUAGE, HeaderValue::from_static(locale.as_str()));
    response
}
