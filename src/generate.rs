//! Text generation collaborators.
//!
//! Docfill does not talk to any text generation provider itself. Callers plug
//! one in through [`TextGenerator`]; any closure with the right signature
//! works:
//!
//! ```
//! use docfill::generate::{generate_with_retry, RetryPolicy, TextGenerator};
//!
//! let echo = |prompt: &str, _system: Option<&str>, _temperature: f32, _max_tokens: u32| {
//!     Ok::<_, docfill::Error>(format!("Echo: {}", prompt))
//! };
//! let text = generate_with_retry(&echo, &RetryPolicy::new(1), "hi", None, 0.7, 100).unwrap();
//! assert_eq!(text, "Echo: hi");
//! ```

use std::thread;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::sections::Section;

/// A provider that turns a prompt into text.
pub trait TextGenerator {
    /// Generate text for `prompt`.
    fn generate(
        &self,
        prompt: &str,
        system_message: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str, Option<&str>, f32, u32) -> Result<String>,
{
    fn generate(
        &self,
        prompt: &str,
        system_message: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        self(prompt, system_message, temperature, max_tokens)
    }
}

/// Builds the `(system_message, prompt)` pair for a section.
pub trait PromptBuilder {
    /// Build prompts asking for the content of `section`.
    fn build_prompt(
        &self,
        section: &Section,
        user_notes: &str,
        previous_context: &str,
        tone: &str,
        length_guideline: &str,
    ) -> (String, String);
}

/// What the caller wants written for a section.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Free-form requirements for the section
    pub user_notes: String,
    /// Desired tone
    pub tone: String,
    /// Length guidance, e.g. "2-3 paragraphs"
    pub length_guideline: String,
    /// Number of preceding sections used as context
    pub context_window: usize,
}

impl GenerationRequest {
    /// Create a request with default tone and length.
    pub fn new(user_notes: impl Into<String>) -> Self {
        Self {
            user_notes: user_notes.into(),
            ..Self::default()
        }
    }

    /// Set the tone.
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// Set the length guidance.
    pub fn with_length(mut self, length_guideline: impl Into<String>) -> Self {
        self.length_guideline = length_guideline.into();
        self
    }

    /// Set how many preceding sections are used as context.
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            user_notes: String::new(),
            tone: "professional".to_string(),
            length_guideline: "2-3 paragraphs".to_string(),
            context_window: 2,
        }
    }
}

/// Default prompt builder for section content.
#[derive(Debug, Clone, Default)]
pub struct SectionPromptBuilder {
    document_context: String,
}

impl SectionPromptBuilder {
    /// Create a builder without document context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe the whole document in every prompt.
    pub fn with_document_context(mut self, context: impl Into<String>) -> Self {
        self.document_context = context.into();
        self
    }

    /// Prompts asking to revise previously generated content.
    pub fn refinement_prompt(
        &self,
        section_title: &str,
        original_content: &str,
        refinement_notes: &str,
    ) -> (String, String) {
        log::debug!("Building refinement prompt for section: {}", section_title);
        let system = "You are an expert editor helping to refine and improve document content.\n\n\
            Your task is to revise the provided content based on specific feedback while:\n\
            - Maintaining the original structure and flow where appropriate\n\
            - Addressing all refinement requirements\n\
            - Preserving the professional tone\n\
            - Improving clarity and conciseness\n\
            - Ensuring coherent transitions\n\n\
            Provide only the revised content without meta-commentary."
            .to_string();
        let prompt = format!(
            "SECTION: {}\n\nORIGINAL CONTENT:\n{}\n\nREFINEMENT REQUIREMENTS:\n{}\n\n\
             Please revise the content based on these requirements.",
            section_title, original_content, refinement_notes
        );
        (system, prompt)
    }

    /// Prompts asking for a short summary of `content`.
    pub fn summary_prompt(&self, content: &str, max_words: usize) -> (String, String) {
        let system = "You are a skilled summarizer. Create concise, accurate summaries that \
            capture key points."
            .to_string();
        let prompt = format!(
            "Please provide a concise summary (maximum {} words) of the following content:\n\n{}\n\nSummary:",
            max_words, content
        );
        (system, prompt)
    }

    fn system_message(tone: &str, length_guideline: &str) -> String {
        format!(
            "You are an expert content writer helping to create high-quality document sections.\n\n\
             Your task is to generate clear, well-structured content that:\n\
             - Matches the {} tone requested\n\
             - Is approximately {} in length\n\
             - Flows naturally from the provided context\n\
             - Addresses all points mentioned in the user's notes\n\
             - Uses proper grammar, spelling, and formatting\n\
             - Avoids repetition and filler content\n\n\
             Generate only the section content itself, without adding headers, titles, or meta-commentary.",
            tone, length_guideline
        )
    }
}

impl PromptBuilder for SectionPromptBuilder {
    fn build_prompt(
        &self,
        section: &Section,
        user_notes: &str,
        previous_context: &str,
        tone: &str,
        length_guideline: &str,
    ) -> (String, String) {
        log::debug!("Building prompt for section: {}", section.title);

        let mut parts = Vec::new();
        if !self.document_context.is_empty() {
            parts.push(format!("DOCUMENT CONTEXT:\n{}\n", self.document_context));
        }
        parts.push(format!(
            "SECTION TO WRITE:\nTitle: {}\nLevel: {}\n",
            section.title, section.level
        ));
        let description = section.description().collect::<Vec<_>>().join("\n");
        if !description.is_empty() {
            parts.push(format!("EXISTING SECTION DESCRIPTION:\n{}\n", description));
        }
        if !previous_context.is_empty() {
            parts.push(format!("PREVIOUS SECTIONS CONTEXT:\n{}\n", previous_context));
        }
        parts.push(format!("USER REQUIREMENTS AND NOTES:\n{}\n", user_notes));
        parts.push(
            "Please generate content for this section that incorporates the above requirements \
             and flows naturally with the document context. Write the content directly without \
             adding section headers or labels."
                .to_string(),
        );

        let system = Self::system_message(tone, length_guideline);
        let prompt = parts.join("\n");
        log::debug!(
            "Prompt built - System: {} chars, User: {} chars",
            system.chars().count(),
            prompt.chars().count()
        );
        (system, prompt)
    }
}

/// Rough token count, at about four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// How often and how patiently a generation call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles after each failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with `max_attempts` attempts and a one second base delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Delay after the failed attempt numbered `attempt` (from 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl From<&GenerationConfig> for RetryPolicy {
    fn from(config: &GenerationConfig) -> Self {
        Self::new(config.max_retries)
    }
}

/// Call `generator`, retrying failures with exponential backoff.
///
/// Returns the last error once every attempt has failed.
pub fn generate_with_retry<G: TextGenerator + ?Sized>(
    generator: &G,
    policy: &RetryPolicy,
    prompt: &str,
    system_message: Option<&str>,
    temperature: f32,
    max_tokens: u32,
) -> Result<String> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match generator.generate(prompt, system_message, temperature, max_tokens) {
            Ok(text) => {
                log::info!("Generated {} characters", text.chars().count());
                return Ok(text);
            }
            Err(e) => {
                log::warn!(
                    "Generation attempt {}/{} failed: {}",
                    attempt + 1,
                    attempts,
                    e
                );
                last_error = Some(e);
                if attempt + 1 < attempts {
                    let delay = policy.delay_for(attempt);
                    log::info!("Retrying in {:?}...", delay);
                    thread::sleep(delay);
                }
            }
        }
    }

    log::error!("All generation attempts failed");
    Err(last_error.unwrap_or_else(|| Error::Generation("no generation attempt was made".into())))
}
