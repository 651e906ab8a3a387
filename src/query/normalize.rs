//! Question normalization for embedding.
//!
//! Stored chunks carry `model_name` values like `mavic-4-pro` (lowercase,
//! hyphen-joined, vendor prefix stripped, straight from the URL path).
//! Rewriting model mentions in the question into that canonical form before
//! embedding tightens the alignment between question and chunk vectors. The
//! rewrite is only ever applied to the embedding-side copy of the question;
//! the prompt always carries the user's original words.

use std::sync::OnceLock;

use regex::{Captures, Regex};

static MODEL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn model_pattern() -> &'static Regex {
    MODEL_PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:dji\s+)?((?:mavic|air|mini|phantom|avata|inspire|matrice|neo|flip)(?:\s+\d+\w*)?(?:\s+(?:pro|plus|cine|classic|se|rtk|enterprise|s))*)\b",
        )
        .expect("model name pattern is valid")
    })
}

/// Rewrites known drone model mentions into the canonical store form:
/// `"DJI Mavic 4 Pro"` becomes `"mavic-4-pro"`. Text without model mentions
/// is returned unchanged.
pub fn normalize_model_names(question: &str) -> String {
    model_pattern()
        .replace_all(question, |caps: &Captures<'_>| {
            caps[1]
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("-")
        })
        .into_owned()
}
