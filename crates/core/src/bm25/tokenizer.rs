//! Configurable tokenizer for BM25 indexing and querying.
//!
//! Lowercases (optionally), treats every non-letter/non-number character as a
//! separator (optionally), splits on whitespace, optionally deletes numeric
//! characters and drops tokens shorter than the minimum length. The same
//! configuration must be used for documents and queries.

use crate::config::TokenizerConfig;

/// Tokenizer bound to a [`TokenizerConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Creates a tokenizer with the given options.
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// The options this tokenizer applies.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Split text into tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let buffer = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let strip = self.config.remove_punctuation;

        buffer
            .split(|c: char| c.is_whitespace() || (strip && !c.is_alphanumeric()))
            .filter_map(|raw| {
                let token: String = if self.config.remove_numbers {
                    raw.chars().filter(|c| !c.is_numeric()).collect()
                } else {
                    raw.to_string()
                };
                let len = token.chars().count();
                (len > 0 && len >= self.config.min_token_length).then_some(token)
            })
            .collect()
    }
}

/// Tokenize with the default options.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_defaults() {
        let tokens = tokenize("The quick, brown fox! Jumps over 2 lazy dogs.");
        assert_eq!(
            tokens,
            vec!["the", "quick", "brown", "fox", "jumps", "over", "2", "lazy", "dogs"]
        );
    }

    #[test]
    fn test_tokenize_unicode_letters_kept() {
        let tokens = tokenize("Caffè «latte» über-straße");
        assert_eq!(tokens, vec!["caffè", "latte", "über", "straße"]);
    }

    #[test]
    fn test_tokenize_empty_and_punctuation_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ... !!! ---").is_empty());
    }

    #[test]
    fn test_no_lowercase() {
        let t = Tokenizer::new(TokenizerConfig {
            lowercase: false,
            ..TokenizerConfig::default()
        });
        assert_eq!(t.tokenize("Red Fox"), vec!["Red", "Fox"]);
    }

    #[test]
    fn test_keep_punctuation() {
        let t = Tokenizer::new(TokenizerConfig {
            remove_punctuation: false,
            ..TokenizerConfig::default()
        });
        assert_eq!(t.tokenize("e-mail, now"), vec!["e-mail,", "now"]);
    }

    #[test]
    fn test_remove_numbers() {
        let t = Tokenizer::new(TokenizerConfig {
            remove_numbers: true,
            ..TokenizerConfig::default()
        });
        assert_eq!(t.tokenize("route 66 abc123"), vec!["route", "abc"]);
    }

    #[test]
    fn test_min_token_length() {
        let t = Tokenizer::new(TokenizerConfig {
            min_token_length: 3,
            ..TokenizerConfig::default()
        });
        assert_eq!(t.tokenize("a an the fox"), vec!["the", "fox"]);
    }
}
