// Lightweight tokenizer shared by query scoring and recommendation synthesis
use ahash::AHashSet;

/// Unordered set of lowercase query tokens
pub type TokenSet = AHashSet<String>;

/// Lowercase, split on any non-alphanumeric character, drop empty tokens.
/// Order is preserved and duplicates are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenize into a set
pub fn token_set(text: &str) -> TokenSet {
    tokenize(text).into_iter().collect()
}
