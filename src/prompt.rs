//! Marketing-copy prompt templating.
//!
//! [`ContentTone`] is the generation parameter that distinguishes cache
//! variants of the same upload. [`build_prompt`] assembles the brief sent to
//! the generative text service.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::KeyReelError;

/// Voice requested for the generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentTone {
    /// Polished, business-appropriate.
    #[default]
    Professional,
    /// Warm and conversational.
    CasualFriendly,
    /// Light humour in the brand voice.
    Humorous,
    /// Uplifting and motivating.
    Inspirational,
    /// Confident thought leadership.
    Authoritative,
    /// Clear and educational.
    Informative,
}

impl ContentTone {
    /// Every tone, in menu order.
    pub const ALL: [ContentTone; 6] = [
        ContentTone::Professional,
        ContentTone::CasualFriendly,
        ContentTone::Humorous,
        ContentTone::Inspirational,
        ContentTone::Authoritative,
        ContentTone::Informative,
    ];

    /// Display label. Also used as the cache variant.
    pub fn label(self) -> &'static str {
        match self {
            ContentTone::Professional => "Professional",
            ContentTone::CasualFriendly => "Casual/Friendly",
            ContentTone::Humorous => "Humorous",
            ContentTone::Inspirational => "Inspirational",
            ContentTone::Authoritative => "Authoritative",
            ContentTone::Informative => "Informative",
        }
    }

    /// Guidance sentence inserted into the prompt.
    pub fn description(self) -> &'static str {
        match self {
            ContentTone::Professional => {
                "Create polished, business-appropriate content that maintains professionalism while being engaging."
            }
            ContentTone::CasualFriendly => {
                "Use a warm, approachable tone that feels conversational and relatable to the audience."
            }
            ContentTone::Humorous => {
                "Incorporate appropriate humor that aligns with the brand voice while keeping the content engaging and shareable."
            }
            ContentTone::Inspirational => {
                "Create uplifting content that motivates and inspires the audience while highlighting key messages."
            }
            ContentTone::Authoritative => {
                "Position the brand as a thought leader with confident, expert-level insights and clear value propositions."
            }
            ContentTone::Informative => {
                "Focus on delivering clear, valuable information that educates the audience on key points."
            }
        }
    }
}

impl Display for ContentTone {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl FromStr for ContentTone {
    type Err = KeyReelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "professional" => Ok(ContentTone::Professional),
            "casual/friendly" | "casual" | "friendly" => Ok(ContentTone::CasualFriendly),
            "humorous" | "funny" => Ok(ContentTone::Humorous),
            "inspirational" => Ok(ContentTone::Inspirational),
            "authoritative" => Ok(ContentTone::Authoritative),
            "informative" => Ok(ContentTone::Informative),
            _ => Err(KeyReelError::InvalidConfiguration(format!(
                "unknown content tone: {value}"
            ))),
        }
    }
}

const TASK_SECTIONS: &str = "\
1. PRIMARY HEADLINE: A compelling, attention-grabbing headline that would work well overlaid on the video or as the primary message. (1-2 lines maximum)

2. SOCIAL MEDIA CAPTION: A strategic caption for posting this content on the target platforms mentioned. Should expand on the headline and include a subtle call to action. (100-150 characters)

3. HASHTAGS: 3-5 relevant and strategic hashtags that would increase engagement and visibility for the specified audience.

4. KEY MESSAGE: The core takeaway or value proposition that viewers should remember. (1-2 sentences)

5. ADDITIONAL CONTENT RECOMMENDATIONS: Suggest 2-3 ways this video content could be repurposed or extended for the campaign.

Format your response with clear headings for each section.
Ensure all content aligns with the brand voice and campaign goals specified.";

/// Assemble the generation brief.
///
/// An empty (or whitespace-only) transcript switches the brief to work from
/// the frames alone.
///
/// # Example
///
/// ```
/// use keyreel::{ContentTone, build_prompt};
///
/// let prompt = build_prompt("", "Brand: Acme", ContentTone::Humorous);
/// assert!(prompt.contains("No transcript is available."));
/// assert!(prompt.contains("Brand: Acme"));
/// ```
pub fn build_prompt(transcript: &str, brand_context: &str, tone: ContentTone) -> String {
    let transcript = transcript.trim();
    let (analysis, sources) = if transcript.is_empty() {
        (
            "The video appears to be about [analyze what you can see in the frames].\nNo transcript is available.".to_string(),
            "the visual content from the video frames and the provided brand context",
        )
    } else {
        (
            format!("Transcript: {transcript}"),
            "the visual content from the video frames, the transcript, and the provided brand context",
        )
    };

    format!(
        "You are a professional content creator working for an enterprise marketing agency.

## CONTENT ANALYSIS
{analysis}

## BRAND AND CAMPAIGN CONTEXT
{context}

## CONTENT TONE GUIDANCE
{guidance}

## YOUR TASK
Based on {sources}, create:

{TASK_SECTIONS}
",
        context = brand_context.trim(),
        guidance = tone.description(),
    )
}
