//! Personality formatting pass.
//!
//! Optional post-processing of a composed reply: an opener, emoji after
//! excitement words, markdown bullets and bold key terms, and a closing
//! phrase. Choices among phrases go through a [`PhrasePicker`] so callers
//! can inject a seeded or scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

use crate::error::AppError;

static EXCITEMENT_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(great|amazing|awesome|excellent|fantastic|perfect|boost|love|exciting)\b")
        .expect("Invalid regex: excitement words")
});
static PLAIN_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*•][ \t]+").expect("Invalid regex: plain bullet")
});
static KEY_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(special offer|free|discount|pricing|guaranteed|exclusive)\b")
        .expect("Invalid regex: key terms")
});

const MARKDOWN_BULLET: &str = "▸ ";

pub const MODERATE_EMOJIS: &[&str] = &["✨", "👍", "😊"];
pub const HIGH_EMOJIS: &[&str] = &["🚀", "🎉", "🔥", "💯", "✨"];

/// Communication tone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Enthusiastic,
    Direct,
}

impl Tone {
    pub fn openers(&self) -> &'static [&'static str] {
        match self {
            Tone::Friendly => &["😊 ", "Happy to help! ", "Great question! "],
            Tone::Professional => &["Certainly. ", "Thank you for your question. "],
            Tone::Enthusiastic => &["🎉 ", "Awesome question! ", "Love it! "],
            Tone::Direct => &["Sure. ", "Here you go. "],
        }
    }

    pub fn closers(&self) -> &'static [&'static str] {
        match self {
            Tone::Friendly => &[
                "Let me know if there's anything else I can help with!",
                "Feel free to ask me anything else!",
            ],
            Tone::Professional => &[
                "Please let me know if you need further information.",
                "I'm happy to provide additional details.",
            ],
            Tone::Enthusiastic => &[
                "Can't wait to help you get started!",
                "Let's make it happen!",
            ],
            Tone::Direct => &["Anything else?"],
        }
    }
}

impl FromStr for Tone {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friendly" => Ok(Tone::Friendly),
            "professional" => Ok(Tone::Professional),
            "enthusiastic" => Ok(Tone::Enthusiastic),
            "direct" => Ok(Tone::Direct),
            other => Err(AppError::Validation(format!("Unknown tone: {}", other))),
        }
    }
}

/// How many emoji get inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiLevel {
    Minimal,
    #[default]
    Moderate,
    High,
}

impl EmojiLevel {
    fn palette(&self) -> &'static [&'static str] {
        match self {
            EmojiLevel::Minimal => &[],
            EmojiLevel::Moderate => MODERATE_EMOJIS,
            EmojiLevel::High => HIGH_EMOJIS,
        }
    }

    /// Max decorated words; 0 means all.
    fn limit(&self) -> usize {
        match self {
            EmojiLevel::Moderate => 1,
            _ => 0,
        }
    }
}

impl FromStr for EmojiLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(EmojiLevel::Minimal),
            "moderate" => Ok(EmojiLevel::Moderate),
            "high" => Ok(EmojiLevel::High),
            other => Err(AppError::Validation(format!("Unknown emoji level: {}", other))),
        }
    }
}

/// Response length preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Brief,
    #[default]
    Balanced,
    Detailed,
}

impl DetailLevel {
    /// Length a reply must exceed before a closing phrase is added.
    fn closing_threshold(&self) -> Option<usize> {
        match self {
            DetailLevel::Brief => None,
            DetailLevel::Balanced => Some(40),
            DetailLevel::Detailed => Some(0),
        }
    }
}

impl FromStr for DetailLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(DetailLevel::Brief),
            "balanced" => Ok(DetailLevel::Balanced),
            "detailed" => Ok(DetailLevel::Detailed),
            other => Err(AppError::Validation(format!("Unknown detail level: {}", other))),
        }
    }
}

/// Resolved formatting preferences for one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityConfig {
    pub tone: Tone,
    pub emoji_level: EmojiLevel,
    pub detail_level: DetailLevel,
    pub use_markdown: bool,
    pub be_enthusiastic: bool,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            tone: Tone::Friendly,
            emoji_level: EmojiLevel::Moderate,
            detail_level: DetailLevel::Balanced,
            use_markdown: true,
            be_enthusiastic: true,
        }
    }
}

/// Caller-supplied options, kept loose so bad values can fall back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityOverrides {
    #[serde(default)]
    pub tone: Option<Value>,
    #[serde(default)]
    pub emoji_level: Option<Value>,
    #[serde(default)]
    pub detail_level: Option<Value>,
    #[serde(default)]
    pub use_markdown: Option<Value>,
    #[serde(default)]
    pub be_enthusiastic: Option<Value>,
}

impl PersonalityConfig {
    /// Apply overrides on top of the default configuration.
    ///
    /// Unrecognized values keep the default for that field.
    pub fn resolve(overrides: &PersonalityOverrides) -> Self {
        let base = Self::default();
        Self {
            tone: parse_choice("tone", overrides.tone.as_ref(), base.tone),
            emoji_level: parse_choice("emojiLevel", overrides.emoji_level.as_ref(), base.emoji_level),
            detail_level: parse_choice("detailLevel", overrides.detail_level.as_ref(), base.detail_level),
            use_markdown: parse_flag("useMarkdown", overrides.use_markdown.as_ref(), base.use_markdown),
            be_enthusiastic: parse_flag(
                "beEnthusiastic",
                overrides.be_enthusiastic.as_ref(),
                base.be_enthusiastic,
            ),
        }
    }
}

fn parse_choice<T: FromStr>(field: &str, value: Option<&Value>, default: T) -> T {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
            warn!("Ignoring unrecognized {} value '{}'", field, s);
            default
        }),
        Some(other) => {
            warn!("Ignoring non-string {} value {}", field, other);
            default
        }
    }
}

fn parse_flag(field: &str, value: Option<&Value>, default: bool) -> bool {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("false") => false,
        Some(other) => {
            warn!("Ignoring unrecognized {} value {}", field, other);
            default
        }
    }
}

/// Source of phrase choices.
pub trait PhrasePicker {
    /// Index in `0..len`; `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Picker backed by a random number generator.
#[derive(Debug, Clone)]
pub struct RngPicker<R = StdRng> {
    rng: R,
}

impl RngPicker<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic picker for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> PhrasePicker for RngPicker<R> {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

fn pick<'a>(picker: &mut dyn PhrasePicker, options: &[&'a str]) -> &'a str {
    let idx = picker.pick_index(options.len());
    options[idx.min(options.len() - 1)]
}

/// Apply a personality configuration to a composed reply.
pub fn apply_personality(
    text: &str,
    config: &PersonalityConfig,
    picker: &mut dyn PhrasePicker,
) -> String {
    let mut out = text.trim().to_string();

    let palette = config.emoji_level.palette();
    if !palette.is_empty() {
        out = EXCITEMENT_WORDS
            .replacen(&out, config.emoji_level.limit(), |caps: &Captures<'_>| {
                format!("{} {}", &caps[0], pick(&mut *picker, palette))
            })
            .into_owned();
    }

    if config.use_markdown {
        out = PLAIN_BULLET.replace_all(&out, MARKDOWN_BULLET).into_owned();
        out = KEY_TERMS.replace_all(&out, "**$1**").into_owned();
    }

    let wants_closing = config
        .detail_level
        .closing_threshold()
        .is_some_and(|min| !out.ends_with('?') && out.chars().count() > min);
    if wants_closing {
        out.push_str("\n\n");
        out.push_str(pick(picker, config.tone.closers()));
    }

    if config.be_enthusiastic {
        out = format!("{}{}", pick(picker, config.tone.openers()), out);
    }

    out
}
