use super::csrf::csrf_token;
use super::flash;
use super::load_state;
use super::prelude::*;
use crate::post::{Length, Platform, Tone};
use crate::session::{ImageSlot, SessionState};

#[derive(Clone, Debug)]
pub(crate) struct SelectOption {
    pub(crate) value: &'static str,
    pub(crate) selected: bool,
}

fn options(values: impl Iterator<Item = &'static str>, current: &str) -> Vec<SelectOption> {
    values
        .map(|value| SelectOption {
            value,
            selected: value == current,
        })
        .collect()
}

#[derive(Clone, Debug)]
pub(crate) struct ImageView {
    pub(crate) number: usize,
    pub(crate) prompt: String,
    pub(crate) ok: bool,
    pub(crate) data_url: String,
    pub(crate) download_url: String,
    pub(crate) error: String,
}

impl ImageView {
    fn new(index: usize, slot: &ImageSlot) -> Self {
        match slot {
            ImageSlot::Ready(image) => Self {
                number: index + 1,
                prompt: image.prompt.clone(),
                ok: true,
                data_url: format!("data:image/png;base64,{}", image.payload),
                download_url: format!("/images/{index}"),
                error: String::new(),
            },
            ImageSlot::Failed { prompt, message } => Self {
                number: index + 1,
                prompt: prompt.clone(),
                ok: false,
                data_url: String::new(),
                download_url: String::new(),
                error: message.clone(),
            },
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) verified: bool,
    pub(crate) csrf_token: String,
    pub(crate) has_flash: bool,
    pub(crate) flash_message: String,
    pub(crate) flash_class: String,
    pub(crate) topic: String,
    pub(crate) platforms: Vec<SelectOption>,
    pub(crate) tones: Vec<SelectOption>,
    pub(crate) lengths: Vec<SelectOption>,
    pub(crate) custom_word_count: u32,
    pub(crate) has_post: bool,
    pub(crate) post_text: String,
    pub(crate) word_count: usize,
    pub(crate) target_word_count: u32,
    pub(crate) corrected: bool,
    pub(crate) has_images: bool,
    pub(crate) images_fallback: bool,
    pub(crate) images: Vec<ImageView>,
}

impl IndexTemplate {
    fn new(state: &SessionState, csrf_token: String, flash: Option<flash::FlashMessage>) -> Self {
        let (has_flash, flash_message, flash_class) = match flash {
            Some(message) => (true, message.text, message.class),
            None => (false, String::new(), String::new()),
        };
        let form = &state.form;
        let images: Vec<ImageView> = state
            .images
            .iter()
            .enumerate()
            .map(|(index, slot)| ImageView::new(index, slot))
            .collect();

        Self {
            verified: state.is_verified(),
            csrf_token,
            has_flash,
            flash_message,
            flash_class,
            topic: form.topic.clone(),
            platforms: options(Platform::ALL.into_iter().map(Platform::as_str), &form.platform),
            tones: options(Tone::ALL.into_iter().map(Tone::as_str), &form.tone),
            lengths: options(Length::ALL.into_iter().map(Length::as_str), &form.length),
            custom_word_count: form.custom_word_count,
            has_post: state.post.is_some(),
            post_text: state.edited_text.clone(),
            word_count: state.edited_word_count(),
            target_word_count: state
                .post
                .as_ref()
                .map(|post| post.target_word_count)
                .unwrap_or_default(),
            corrected: state.post.as_ref().is_some_and(|post| post.corrected),
            has_images: !images.is_empty(),
            images_fallback: state.image_prompts_fallback,
            images,
        }
    }
}

/// handles the / GET
pub(crate) async fn index_handler(session: Session) -> Result<IndexTemplate, PostsmithError> {
    let state = load_state(&session).await?;
    let csrf_token = csrf_token(&session).await?;
    let flash = flash::take_flash_message(&session).await?;
    Ok(IndexTemplate::new(&state, csrf_token, flash))
}
