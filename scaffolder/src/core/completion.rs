//! Completion-phrase detection for plain-text model turns.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Phrases the model is told to emit when a session is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhrases {
    Generation,
    FeatureAddition,
}

const GENERATION_PHRASES: &[&str] = &[
    "project generation is complete",
    "project structure is now complete",
];

const FEATURE_PHRASES: &[&str] = &[
    "feature implementation is complete",
    "feature has been successfully added",
];

static GENERATION_RE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(GENERATION_PHRASES));
static FEATURE_RE: LazyLock<Regex> = LazyLock::new(|| phrase_regex(FEATURE_PHRASES));

/// Case-insensitive alternation where each inter-word space matches any whitespace run.
fn phrase_regex(phrases: &[&str]) -> Regex {
    let alternation = phrases
        .iter()
        .map(|phrase| {
            phrase
                .split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .unwrap()
}

impl CompletionPhrases {
    pub fn phrases(&self) -> &'static [&'static str] {
        match self {
            CompletionPhrases::Generation => GENERATION_PHRASES,
            CompletionPhrases::FeatureAddition => FEATURE_PHRASES,
        }
    }

    /// The phrase the system prompt asks the model to use.
    pub fn primary(&self) -> &'static str {
        self.phrases()[0]
    }

    /// Progress line reported once the model declares the session finished.
    pub fn finished_message(&self) -> &'static str {
        match self {
            CompletionPhrases::Generation => "Project generation complete!",
            CompletionPhrases::FeatureAddition => "Feature addition complete!",
        }
    }

    pub fn is_complete(&self, text: &str) -> bool {
        match self {
            CompletionPhrases::Generation => GENERATION_RE.is_match(text),
            CompletionPhrases::FeatureAddition => FEATURE_RE.is_match(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_phrases_match_case_insensitively() {
        let phrases = CompletionPhrases::Generation;
        assert!(phrases.is_complete("All done. Project Generation Is Complete."));
        assert!(phrases.is_complete("The PROJECT STRUCTURE IS NOW COMPLETE!"));
        assert!(!phrases.is_complete("The project generation is almost complete"));
    }

    #[test]
    fn phrases_tolerate_line_wrapping() {
        assert!(CompletionPhrases::Generation.is_complete("project generation\nis  complete"));
    }

    #[test]
    fn feature_phrases_do_not_cross_use_cases() {
        assert!(CompletionPhrases::FeatureAddition.is_complete("The feature has been successfully added."));
        assert!(CompletionPhrases::FeatureAddition.is_complete("feature implementation is complete"));
        assert!(!CompletionPhrases::FeatureAddition.is_complete("project generation is complete"));
        assert!(!CompletionPhrases::Generation.is_complete("feature implementation is complete"));
    }

    #[test]
    fn primary_is_first_phrase() {
        assert_eq!(
            CompletionPhrases::Generation.primary(),
            "project generation is complete"
        );
    }
}
