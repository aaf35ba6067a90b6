//! Turns a [`PostRequest`] into the instructions sent to the text model.
//!
//! Nothing in here talks to a backend.

use crate::backend::CompletionRequest;
use crate::constants::{
    CORRECTION_TEMPERATURE, GENERATION_TEMPERATURE, MAX_CUSTOM_WORD_COUNT, MAX_OUTPUT_TOKENS,
    TOKENS_PER_WORD,
};
use crate::post::{Length, Platform, PostRequest, RequestError, Tone};

const SYSTEM_INSTRUCTION: &str = "You are an expert social media manager. \
You write posts that fit the platform, match the requested tone, and land close to the requested length. \
Reply with the post text only, without any preamble or commentary.";

/// Instructions and sampling settings for one completion.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposedPrompt {
    /// System-level instruction
    pub system_instruction: String,
    /// The user turn
    pub user_instruction: String,
    /// Output token budget
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl ComposedPrompt {
    /// Attaches a model name, producing a backend request.
    pub fn for_model(self, model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            system_instruction: self.system_instruction,
            user_instruction: self.user_instruction,
            max_output_tokens: self.max_output_tokens,
            temperature: Some(self.temperature),
        }
    }
}

/// Word target for a request.
///
/// Threads aim longer on platforms that tolerate longer segments.
pub fn resolve_target_word_count(request: &PostRequest) -> Result<u32, RequestError> {
    let target = match request.length {
        Length::Short => 75,
        Length::Medium => 175,
        Length::Long => 400,
        Length::Thread => match request.platform {
            Platform::Twitter => 450,
            Platform::WhatsApp => 500,
            Platform::LinkedIn => 600,
        },
        Length::Custom => match request.custom_word_count {
            Some(words) if (1..=MAX_CUSTOM_WORD_COUNT).contains(&words) => words,
            other => return Err(RequestError::CustomWordCount(other)),
        },
    };
    Ok(target)
}

/// Token budget for a word target, capped at [`MAX_OUTPUT_TOKENS`].
pub fn max_output_tokens(target_word_count: u32) -> u32 {
    target_word_count
        .saturating_mul(TOKENS_PER_WORD)
        .min(MAX_OUTPUT_TOKENS)
}

/// Platform-specific writing rules.
pub fn platform_directive(platform: Platform) -> &'static str {
    match platform {
        Platform::LinkedIn => {
            "Write for a professional network: a strong opening line, short paragraphs, \
             and up to three relevant hashtags at the end."
        }
        Platform::Twitter => {
            "Respect the 280-character limit for each post, keep sentences punchy, and use hashtags."
        }
        Platform::WhatsApp => {
            "Write it as a conversational message to share in chats: direct, personal, \
             emojis welcome, no hashtags."
        }
    }
}

/// How the tone should come across.
pub fn tone_directive(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => "polished and credible, with clear value for the reader",
        Tone::Casual => "relaxed and conversational, like talking to a friend",
        Tone::Humorous => "light-hearted and funny, with a playful twist",
        Tone::Inspirational => "uplifting and motivating, ending on an encouraging note",
        Tone::Informative => "clear and factual, focused on useful takeaways",
        Tone::Persuasive => "convincing, building toward a clear call to action",
        Tone::Friendly => "warm and approachable",
        Tone::Enthusiastic => "energetic and excited, with genuine passion for the subject",
        Tone::Sarcastic => "witty with a hint of mockery",
        Tone::Empathetic => "understanding and supportive, acknowledging how the reader feels",
    }
}

/// Segment marker rule: threads need `[Post N]` markers, everything else must not have them.
pub fn segment_rule(length: Length) -> &'static str {
    match length {
        Length::Thread => {
            "Split the content into a thread of 3 to 5 posts. Start each post with its marker \
             on its own line: [Post 1], [Post 2], and so on."
        }
        Length::Short | Length::Medium | Length::Long | Length::Custom => {
            "Write a single post. Do not split it into parts and do not use markers such as [Post 1]."
        }
    }
}

/// The first-pass prompt.
pub fn compose(request: &PostRequest, target_word_count: u32) -> ComposedPrompt {
    let user_instruction = format!(
        "Create a social media post about \"{topic}\" for {platform}.\n\
         Platform guidance: {platform_directive}\n\
         Tone: {tone}, meaning {tone_directive}.\n\
         Target length: {target_word_count} words. Stay within 10% of this target.\n\
         {segment_rule}",
        topic = request.topic,
        platform = request.platform,
        platform_directive = platform_directive(request.platform),
        tone = request.tone,
        tone_directive = tone_directive(request.tone),
        segment_rule = segment_rule(request.length),
    );

    ComposedPrompt {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_instruction,
        max_output_tokens: max_output_tokens(target_word_count),
        temperature: GENERATION_TEMPERATURE,
    }
}

/// The follow-up prompt used when the first draft missed the word target.
pub fn compose_corrective(
    request: &PostRequest,
    target_word_count: u32,
    previous_text: &str,
    actual_word_count: usize,
) -> ComposedPrompt {
    let direction = if actual_word_count > target_word_count as usize {
        "shorten"
    } else {
        "expand"
    };
    let user_instruction = format!(
        "The {platform} post below about \"{topic}\" has {actual_word_count} words, \
         but it needs to be {target_word_count} words.\n\
         Rewrite it to {direction} it to {target_word_count} words (within 10%), \
         keeping the same message and a {tone} tone ({tone_directive}).\n\
         Platform guidance: {platform_directive}\n\
         {segment_rule}\n\n\
         Post:\n{previous_text}",
        platform = request.platform,
        topic = request.topic,
        tone = request.tone,
        tone_directive = tone_directive(request.tone),
        platform_directive = platform_directive(request.platform),
        segment_rule = segment_rule(request.length),
    );

    ComposedPrompt {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        user_instruction,
        max_output_tokens: max_output_tokens(target_word_count),
        temperature: CORRECTION_TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(length: Length) -> PostRequest {
        PostRequest::new("AI Summit", Platform::Twitter, Tone::Humorous, length)
    }

    #[test]
    fn fixed_lengths_resolve_to_literal_targets() {
        assert_eq!(resolve_target_word_count(&request(Length::Short)), Ok(75));
        assert_eq!(resolve_target_word_count(&request(Length::Medium)), Ok(175));
        assert_eq!(resolve_target_word_count(&request(Length::Long)), Ok(400));
    }

    #[test]
    fn thread_targets_stay_in_range() {
        for platform in Platform::ALL {
            let request = PostRequest::new("x", platform, Tone::Casual, Length::Thread);
            let target = resolve_target_word_count(&request).expect("thread target");
            assert!((450..=600).contains(&target), "{platform}: {target}");
        }
    }

    #[test]
    fn custom_length_uses_the_supplied_count() {
        let custom = request(Length::Custom).with_custom_word_count(250);
        assert_eq!(resolve_target_word_count(&custom), Ok(250));
        let edge = request(Length::Custom).with_custom_word_count(2000);
        assert_eq!(resolve_target_word_count(&edge), Ok(2000));
    }

    #[test]
    fn custom_length_out_of_range_is_rejected() {
        for words in [0, 2001] {
            let custom = request(Length::Custom).with_custom_word_count(words);
            assert_eq!(
                resolve_target_word_count(&custom),
                Err(RequestError::CustomWordCount(Some(words)))
            );
        }
        assert_eq!(
            resolve_target_word_count(&request(Length::Custom)),
            Err(RequestError::CustomWordCount(None))
        );
    }

    #[test]
    fn twitter_short_prompt() {
        let prompt = compose(&request(Length::Short), 75);
        assert!(prompt.user_instruction.contains("\"AI Summit\""));
        assert!(prompt.user_instruction.contains("280-character limit"));
        assert!(prompt.user_instruction.contains("75 words"));
        assert!(prompt.user_instruction.contains("do not use markers"));
        assert!(!prompt.user_instruction.contains("[Post 2]"));
        assert_eq!(prompt.max_output_tokens, 150);
        assert_eq!(prompt.temperature, GENERATION_TEMPERATURE);
    }

    #[test]
    fn thread_prompt_asks_for_markers() {
        let prompt = compose(&request(Length::Thread), 450);
        assert!(prompt.user_instruction.contains("[Post 1], [Post 2]"));
        assert!(prompt.user_instruction.contains("3 to 5 posts"));
    }

    #[test]
    fn sarcastic_tone_directive() {
        let request =
            PostRequest::new("Mondays", Platform::LinkedIn, Tone::Sarcastic, Length::Short);
        let prompt = compose(&request, 75);
        assert!(prompt.user_instruction.contains("witty with a hint of mockery"));
    }

    #[test]
    fn token_budget_is_capped() {
        assert_eq!(max_output_tokens(400), 800);
        assert_eq!(max_output_tokens(2000), 4000);
        assert_eq!(max_output_tokens(3000), MAX_OUTPUT_TOKENS);
        assert_eq!(max_output_tokens(u32::MAX), MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn corrective_prompt_embeds_previous_attempt() {
        let prompt = compose_corrective(&request(Length::Short), 75, "far too short", 3);
        assert!(prompt.user_instruction.contains("has 3 words"));
        assert!(prompt.user_instruction.contains("needs to be 75 words"));
        assert!(prompt.user_instruction.contains("expand"));
        assert!(prompt.user_instruction.ends_with("far too short"));
        assert!(prompt.user_instruction.contains("do not use markers"));
        assert_eq!(prompt.temperature, CORRECTION_TEMPERATURE);
        assert_eq!(prompt.max_output_tokens, 150);
    }

    #[test]
    fn corrective_thread_prompt_keeps_markers() {
        let prompt = compose_corrective(&request(Length::Thread), 450, "[Post 1] too long", 900);
        assert!(prompt.user_instruction.contains("[Post 1], [Post 2]"));
        assert!(prompt.user_instruction.contains("3 to 5 posts"));
        assert!(!prompt.user_instruction.contains("do not use markers"));
        assert!(prompt.user_instruction.contains("shorten"));
        assert_eq!(prompt.max_output_tokens, 900);
    }

    #[test]
    fn composing_is_deterministic() {
        let request = request(Length::Medium);
        assert_eq!(compose(&request, 175), compose(&request, 175));
    }
}
