//! Brand and campaign details for the generation brief.
//!
//! [`BrandContext`] renders as the labelled block placed under
//! "BRAND AND CAMPAIGN CONTEXT" in the prompt. Blank fields render as
//! `Not specified` so the generator always sees every label.

use std::fmt::{Display, Formatter, Result as FmtResult};

const NOT_SPECIFIED: &str = "Not specified";

/// Who the copy is for and what the campaign wants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandContext {
    /// Brand or company name.
    pub brand: String,
    /// Industry the brand operates in.
    pub industry: String,
    /// Description of the target audience.
    pub audience: String,
    /// Tone and personality of the brand.
    pub voice: String,
    /// Campaign name, if any.
    pub campaign: String,
    /// Primary campaign goal, e.g. "Brand Awareness".
    pub goal: String,
    /// Platforms the copy will be posted to.
    pub platforms: Vec<String>,
    /// Free-form requirements, keywords, or themes to avoid.
    pub instructions: String,
    /// Content category, e.g. "Product Demonstration".
    pub category: String,
}

impl BrandContext {
    /// An empty context; every field renders as unspecified.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = industry.into();
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = campaign.into();
        self
    }

    #[must_use]
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Append a target platform.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Brand name, or `Not specified`.
    pub fn brand_or_default(&self) -> &str {
        or_default(&self.brand, NOT_SPECIFIED)
    }

    /// Campaign name, or `Not specified`.
    pub fn campaign_or_default(&self) -> &str {
        or_default(&self.campaign, NOT_SPECIFIED)
    }

    /// Content category, or `Not specified`.
    pub fn category_or_default(&self) -> &str {
        or_default(&self.category, NOT_SPECIFIED)
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

impl Display for BrandContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let platforms: Vec<&str> = self
            .platforms
            .iter()
            .map(|platform| platform.trim())
            .filter(|platform| !platform.is_empty())
            .collect();
        let platforms = if platforms.is_empty() {
            NOT_SPECIFIED.to_string()
        } else {
            platforms.join(", ")
        };

        writeln!(f, "Brand: {}", self.brand_or_default())?;
        writeln!(f, "Industry: {}", or_default(&self.industry, NOT_SPECIFIED))?;
        writeln!(f, "Target Audience: {}", or_default(&self.audience, NOT_SPECIFIED))?;
        writeln!(f, "Brand Voice: {}", or_default(&self.voice, NOT_SPECIFIED))?;
        writeln!(f, "Campaign: {}", self.campaign_or_default())?;
        writeln!(f, "Goal: {}", or_default(&self.goal, NOT_SPECIFIED))?;
        writeln!(f, "Platforms: {platforms}")?;
        writeln!(
            f,
            "Additional Instructions: {}",
            or_default(&self.instructions, "None")
        )?;
        write!(f, "Content Category: {}", self.category_or_default())
    }
}
