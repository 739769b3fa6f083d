use axum::{extract::Request, middleware::Next, response::Response};

use crate::gateway::IDENTITY_HEADERS;

/// Drops client-supplied identity headers.
///
/// Must sit outside the authorization gate so that any identity header a
/// handler sees was written by the gate for this request.
pub async fn strip_identity_headers(mut request: Request, next: Next) -> Response {
    for name in IDENTITY_HEADERS {
        if request.headers_mut().remove(&name).is_some() {
            tracing::warn!(
                "Stripped client-supplied {} header on {} {}",
                name,
                request.method(),
                request.uri().path()
            );
        }
    }

    next.run(request).await
}
