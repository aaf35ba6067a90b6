//! Form handlers behind the page's buttons.
//!
//! Backend failures end up as flash messages, never as error pages, so the
//! session stays usable and the user can just try again.

use axum::response::Redirect;

use super::csrf::validate_csrf;
use super::flash::{FlashMessage, set_flash};
use super::prelude::*;
use super::{load_state, save_state};
use crate::constants::MAX_IMAGES_PER_REQUEST;
use crate::credential::{Credential, verify_credential};
use crate::generate::generate;
use crate::images::{derive_image_prompts, synthesize_all};
use crate::post::{GeneratedPost, PostRequest};
use crate::session::{ImageSlot, PostForm, SessionState};

#[derive(Deserialize)]
pub(crate) struct CsrfForm {
    csrf_token: String,
}

#[derive(Deserialize)]
pub(crate) struct VerifyForm {
    csrf_token: String,
    #[serde(default)]
    api_key: String,
}

#[derive(Deserialize)]
pub(crate) struct CreateForm {
    csrf_token: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    platform: String,
    #[serde(default)]
    tone: String,
    #[serde(default)]
    length: String,
    #[serde(default)]
    custom_word_count: Option<String>,
}

impl CreateForm {
    fn custom_word_count(&self) -> Option<u32> {
        self.custom_word_count
            .as_deref()
            .and_then(|value| value.trim().parse().ok())
    }

    fn to_post_form(&self) -> PostForm {
        PostForm {
            topic: self.topic.clone(),
            platform: self.platform.clone(),
            tone: self.tone.clone(),
            length: self.length.clone(),
            custom_word_count: self
                .custom_word_count()
                .unwrap_or(PostForm::default().custom_word_count),
        }
    }

    fn to_request(&self) -> Result<PostRequest, String> {
        let fields = [&self.topic, &self.platform, &self.tone, &self.length];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err("Please fill in all fields.".to_string());
        }
        PostRequest::parse(
            &self.topic,
            &self.platform,
            &self.tone,
            &self.length,
            self.custom_word_count(),
        )
        .map_err(|err| err.to_string())
    }
}

#[derive(Deserialize)]
pub(crate) struct EditForm {
    csrf_token: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
pub(crate) struct ImagesForm {
    csrf_token: String,
    #[serde(default)]
    count: Option<String>,
}

impl ImagesForm {
    /// Requested image count; blank or unparseable means one.
    fn count(&self) -> usize {
        self.count
            .as_deref()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_IMAGES_PER_REQUEST)
    }
}

fn post_flash(post: &GeneratedPost) -> FlashMessage {
    let summary = format!(
        "Post generated: {} words (target {}).",
        post.actual_word_count, post.target_word_count
    );
    if post.corrected {
        FlashMessage::success(format!(
            "{summary} The first draft missed the target, so it was rewritten once."
        ))
    } else {
        FlashMessage::success(summary)
    }
}

async fn finish(
    session: &Session,
    state: &SessionState,
    flash: FlashMessage,
) -> Result<Redirect, PostsmithError> {
    save_state(session, state).await?;
    set_flash(session, flash).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn verify_handler(
    State(app): State<AppState>,
    session: Session,
    Form(form): Form<VerifyForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;

    let credential = match Credential::new(&form.api_key) {
        Ok(credential) => credential,
        Err(err) => return finish(&session, &state, FlashMessage::error(err.to_string())).await,
    };

    let backend = app.connector.connect(&credential);
    let flash = match verify_credential(backend.as_ref(), &app.models.helper_model).await {
        Ok(()) => {
            state.credential = Some(credential);
            // Rotate the id now that the session holds a secret.
            session.cycle_id().await?;
            FlashMessage::success("API Key verified successfully!")
        }
        Err(err) => FlashMessage::error(err.to_string()),
    };
    finish(&session, &state, flash).await
}

pub(crate) async fn logout_handler(
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;
    state.sign_out();
    finish(&session, &state, FlashMessage::success("API key forgotten.")).await
}

pub(crate) async fn create_handler(
    State(app): State<AppState>,
    session: Session,
    Form(form): Form<CreateForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;
    state.form = form.to_post_form();

    let request = match form.to_request() {
        Ok(request) => request,
        Err(message) => return finish(&session, &state, FlashMessage::error(message)).await,
    };
    let flash = run_generation(&app, &mut state, request).await?;
    finish(&session, &state, flash).await
}

pub(crate) async fn regenerate_handler(
    State(app): State<AppState>,
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;
    let Some(request) = state.request.clone() else {
        return finish(&session, &state, FlashMessage::error("Create a post first.")).await;
    };
    let flash = run_generation(&app, &mut state, request).await?;
    finish(&session, &state, flash).await
}

/// Generates a post into `state`; on failure `state` keeps its previous post.
async fn run_generation(
    app: &AppState,
    state: &mut SessionState,
    request: PostRequest,
) -> Result<FlashMessage, PostsmithError> {
    let credential = state
        .credential
        .as_ref()
        .ok_or(PostsmithError::Unauthorized)?;
    let backend = app.connector.connect(credential);
    info!(
        "Generating {} {} post for {}",
        request.length, request.tone, request.platform
    );
    match generate(backend.as_ref(), &app.models.post_model, &request).await {
        Ok(post) => {
            let flash = post_flash(&post);
            state.accept_post(request, post);
            Ok(flash)
        }
        Err(err) => {
            error!("Post generation failed: {err}");
            Ok(FlashMessage::error(err.to_string()))
        }
    }
}

pub(crate) async fn reset_handler(
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;
    state.reset();
    save_state(&session, &state).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn edit_handler(
    session: Session,
    Form(form): Form<EditForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;
    if state.post.is_none() {
        return finish(&session, &state, FlashMessage::error("Create a post first.")).await;
    }
    state.edit(&form.text);
    let words = state.edited_word_count();
    finish(&session, &state, FlashMessage::success(format!("Edits saved ({words} words)."))).await
}

/// Handles both "generate images" and "regenerate images"; prompts are derived fresh each time.
pub(crate) async fn images_handler(
    State(app): State<AppState>,
    session: Session,
    Form(form): Form<ImagesForm>,
) -> Result<Redirect, PostsmithError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut state = load_state(&session).await?;
    let (Some(request), Some(_)) = (state.request.as_ref(), state.post.as_ref()) else {
        return finish(&session, &state, FlashMessage::error("Create a post first.")).await;
    };
    let credential = state
        .credential
        .as_ref()
        .ok_or(PostsmithError::Unauthorized)?;

    let count = form.count();
    let backend = app.connector.connect(credential);
    let derived = derive_image_prompts(
        backend.as_ref(),
        &app.models.helper_model,
        &request.topic,
        &state.edited_text,
        count,
    )
    .await;
    let fallback = derived.is_fallback();
    let results = synthesize_all(
        backend.as_ref(),
        &app.models.image_model,
        derived.prompts(),
    )
    .await;
    state.store_images(derived, results);

    let failed = state
        .images
        .iter()
        .filter(|slot| matches!(slot, ImageSlot::Failed { .. }))
        .count();
    let total = state.images.len();
    let flash = if failed == total {
        FlashMessage::error("Error generating images: every image request failed.")
    } else if failed > 0 {
        FlashMessage::warning(format!("{} of {total} images failed.", failed))
    } else if fallback {
        FlashMessage::warning(
            "Couldn't derive image prompts from the post, used a generic prompt instead.",
        )
    } else {
        FlashMessage::success(format!("Generated {total} image(s)."))
    };
    finish(&session, &state, flash).await
}
