use once_cell::sync::Lazy;
use regex::Regex;

/// Words masked out of chirp bodies.
pub const BLOCKED_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];

pub const MASK: &str = "****";

// Whole-word, case-insensitive. `\b` lets adjacent punctuation through
// ("fornax!" matches) but rejects longer words ("fornaxy").
static BLOCKED_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)\b(?:{})\b", BLOCKED_WORDS.join("|"));
    Regex::new(&pattern).expect("valid profanity regex")
});

/// Replace every blocked word with [`MASK`], leaving all other text as is.
pub fn mask_profanity(body: &str) -> String {
    BLOCKED_RE.replace_all(body, MASK).into_owned()
}
