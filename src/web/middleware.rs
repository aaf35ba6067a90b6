use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{Redirect, Response};

use super::flash::{FlashMessage, set_flash};
use super::load_state;
use super::prelude::*;

/// Sends sessions without a verified API key back to the key form.
pub(crate) async fn require_credential(
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Result<Response, PostsmithError> {
    if load_state(&session).await?.is_verified() {
        return Ok(next.run(request).await);
    }

    info!("{} {} without a verified API key", request.method(), request.uri());
    set_flash(&session, FlashMessage::error("Please verify your API key first.")).await?;
    Ok(Redirect::to("/").into_response())
}
