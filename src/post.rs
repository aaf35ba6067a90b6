//! Post requests, the option enums the user picks from, and generated posts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_CUSTOM_WORD_COUNT;

/// Where the post is going to be published.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// LinkedIn
    LinkedIn,
    /// Twitter / X
    Twitter,
    /// WhatsApp
    WhatsApp,
}

impl Platform {
    /// Every platform, in display order.
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::Twitter, Platform::WhatsApp];

    /// Display name, also accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Twitter => "Twitter",
            Platform::WhatsApp => "WhatsApp",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "twitter" => Ok(Platform::Twitter),
            "whatsapp" => Ok(Platform::WhatsApp),
            _ => Err(RequestError::UnknownPlatform(s.to_string())),
        }
    }
}

/// Voice of the post.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Tone {
    /// Polished and credible
    Professional,
    /// Relaxed
    Casual,
    /// Funny
    Humorous,
    /// Uplifting
    Inspirational,
    /// Factual
    Informative,
    /// Call-to-action driven
    Persuasive,
    /// Warm
    Friendly,
    /// Energetic
    Enthusiastic,
    /// Mocking
    Sarcastic,
    /// Supportive
    Empathetic,
}

impl Tone {
    /// Every tone, in display order.
    pub const ALL: [Tone; 10] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Humorous,
        Tone::Inspirational,
        Tone::Informative,
        Tone::Persuasive,
        Tone::Friendly,
        Tone::Enthusiastic,
        Tone::Sarcastic,
        Tone::Empathetic,
    ];

    /// Display name, also accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
            Tone::Humorous => "Humorous",
            Tone::Inspirational => "Inspirational",
            Tone::Informative => "Informative",
            Tone::Persuasive => "Persuasive",
            Tone::Friendly => "Friendly",
            Tone::Enthusiastic => "Enthusiastic",
            Tone::Sarcastic => "Sarcastic",
            Tone::Empathetic => "Empathetic",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RequestError::UnknownTone(s.to_string()))
    }
}

/// How long the post should be.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Length {
    /// About 75 words
    Short,
    /// About 175 words
    Medium,
    /// About 400 words
    Long,
    /// A 3-5 part thread with `[Post N]` markers
    Thread,
    /// Caller supplied word count
    Custom,
}

impl Length {
    /// Every length, in display order.
    pub const ALL: [Length; 5] = [
        Length::Short,
        Length::Medium,
        Length::Long,
        Length::Thread,
        Length::Custom,
    ];

    /// Display name, also accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Length::Short => "Short",
            Length::Medium => "Medium",
            Length::Long => "Long",
            Length::Thread => "Thread",
            Length::Custom => "Custom",
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Length {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Length::Short),
            "medium" => Ok(Length::Medium),
            "long" => Ok(Length::Long),
            "thread" => Ok(Length::Thread),
            "custom" | "custom length" => Ok(Length::Custom),
            _ => Err(RequestError::UnknownLength(s.to_string())),
        }
    }
}

/// Rejections raised while building or validating a [`PostRequest`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RequestError {
    /// The topic was empty or whitespace
    EmptyTopic,
    /// Platform string did not match any [`Platform`]
    UnknownPlatform(String),
    /// Tone string did not match any [`Tone`]
    UnknownTone(String),
    /// Length string did not match any [`Length`]
    UnknownLength(String),
    /// Custom length without a word count in `1..=2000`
    CustomWordCount(Option<u32>),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTopic => write!(f, "Please enter a topic for the post"),
            Self::UnknownPlatform(value) => write!(f, "Unknown platform: {value:?}"),
            Self::UnknownTone(value) => write!(f, "Unknown tone: {value:?}"),
            Self::UnknownLength(value) => write!(f, "Unknown length: {value:?}"),
            Self::CustomWordCount(Some(count)) => write!(
                f,
                "Custom word count must be between 1 and {MAX_CUSTOM_WORD_COUNT}, got {count}"
            ),
            Self::CustomWordCount(None) => {
                write!(f, "Custom length needs a word count between 1 and {MAX_CUSTOM_WORD_COUNT}")
            }
        }
    }
}

impl std::error::Error for RequestError {}

/// Everything needed to ask for one post.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PostRequest {
    /// What the post is about
    pub topic: String,
    /// Target platform
    pub platform: Platform,
    /// Voice
    pub tone: Tone,
    /// Size bucket
    pub length: Length,
    /// Word target when `length` is [`Length::Custom`]
    pub custom_word_count: Option<u32>,
}

impl PostRequest {
    /// Builds a request without a custom word count.
    pub fn new(topic: impl Into<String>, platform: Platform, tone: Tone, length: Length) -> Self {
        Self {
            topic: topic.into(),
            platform,
            tone,
            length,
            custom_word_count: None,
        }
    }

    /// Sets the word target used by [`Length::Custom`].
    pub fn with_custom_word_count(mut self, words: u32) -> Self {
        self.custom_word_count = Some(words);
        self
    }

    /// Builds a request from the raw strings a form or command line hands over.
    pub fn parse(
        topic: &str,
        platform: &str,
        tone: &str,
        length: &str,
        custom_word_count: Option<u32>,
    ) -> Result<Self, RequestError> {
        let request = Self {
            topic: topic.trim().to_string(),
            platform: platform.parse()?,
            tone: tone.parse()?,
            length: length.parse()?,
            custom_word_count,
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks the invariants that the enum types can't express.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.topic.trim().is_empty() {
            return Err(RequestError::EmptyTopic);
        }
        Ok(())
    }
}

/// A post as returned by the generation loop.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPost {
    /// Post body
    pub text: String,
    /// Word count the post was aimed at
    pub target_word_count: u32,
    /// Whitespace-delimited word count of `text`
    pub actual_word_count: usize,
    /// True when the corrective pass produced `text`
    pub corrected: bool,
}

/// Counts whitespace-separated tokens.
///
/// Markdown, emoji and hashtags count like any other token.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
