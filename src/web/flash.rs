use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::PostsmithError;

const FLASH_KEY: &str = "flash";

/// A one-shot message shown on the next page render.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub(crate) struct FlashMessage {
    pub(crate) text: String,
    pub(crate) class: String,
}

impl FlashMessage {
    pub(crate) fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: "success".to_string(),
        }
    }

    pub(crate) fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: "warning".to_string(),
        }
    }

    pub(crate) fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: "error".to_string(),
        }
    }
}

pub(crate) async fn set_flash(
    session: &Session,
    message: FlashMessage,
) -> Result<(), PostsmithError> {
    session.insert(FLASH_KEY, message).await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, PostsmithError> {
    Ok(session.remove::<FlashMessage>(FLASH_KEY).await?)
}
