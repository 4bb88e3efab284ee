//! Text normalization: raw text to an ordered token sequence.
//!
//! Two strategies cover the two pipelines this engine supports. The plain
//! pipeline works per surface token: optional case folding, stopword and
//! punctuation filtering, stemming applied last. The lemma pipeline
//! replaces each token with its lemma first, so every later step sees
//! lemma forms. Both preserve tokenizer order; steps only drop or replace
//! tokens, never reorder them.

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    // Word units plus runs of anything else printable, so punctuation
    // survives tokenization and filtering stays a separate decision.
    static ref TOKEN: Regex =
        Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*|[^\p{L}\s]+").expect("valid regex");
}

/// Splits raw text into word-level units. Implementations must preserve
/// input order; downstream steps only filter or replace what the
/// tokenizer emits.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Default tokenizer: NFKC-normalizes the input, then extracts
/// letter-initial word units and punctuation or digit runs. Case is kept;
/// folding is a separate configurable step.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>();
        TOKEN
            .find_iter(&normalized)
            .map(|mat| mat.as_str().to_string())
            .collect()
    }
}

/// Maps a surface token to its lemma. Lookup-table or rule-based
/// implementations both fit; the pipeline treats this as opaque.
pub trait Lemmatizer: Send + Sync {
    fn lemma(&self, token: &str) -> String;
}

/// Produces the final token sequence a [`crate::Document`] is built from.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Vec<String>;
}

/// Which normalization steps are active. Every step is independent; the
/// stopword set is supplied by the caller and `None` disables the filter.
#[derive(Debug, Default, Clone)]
pub struct NormalizeConfig {
    /// Lowercase each token before any filtering.
    pub downcase: bool,
    /// Drop tokens found in this set, post-downcase.
    pub stopwords: Option<HashSet<String>>,
    /// Drop tokens made entirely of punctuation characters.
    pub strip_punctuation: bool,
    /// Stem each surviving token (English Snowball). The lemma pipeline
    /// ignores this; lemmatization already reduces to a base form.
    pub stem: bool,
}

impl NormalizeConfig {
    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.as_ref().map_or(false, |set| set.contains(token))
    }
}

/// True for tokens consisting only of ASCII punctuation, e.g. `.` or `?!`.
pub fn is_punctuation(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation())
}

/// Per-surface-token pipeline: downcase, filter stopwords, filter
/// punctuation, stem last. Stemming after filtering means the stopword
/// set matches surface forms, never stems.
pub struct PlainNormalizer {
    tokenizer: Box<dyn Tokenizer>,
    config: NormalizeConfig,
    stemmer: Option<Stemmer>,
}

impl PlainNormalizer {
    pub fn new(tokenizer: Box<dyn Tokenizer>, config: NormalizeConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };
        Self { tokenizer, config, stemmer }
    }

    /// Builds the pipeline on the default [`WordTokenizer`].
    pub fn with_defaults(config: NormalizeConfig) -> Self {
        Self::new(Box::new(WordTokenizer), config)
    }
}

impl Normalizer for PlainNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for raw in self.tokenizer.tokenize(text) {
            let token = if self.config.downcase { raw.to_lowercase() } else { raw };
            if self.config.is_stopword(&token) {
                continue;
            }
            if self.config.strip_punctuation && is_punctuation(&token) {
                continue;
            }
            match &self.stemmer {
                Some(stemmer) => out.push(stemmer.stem(&token).into_owned()),
                None => out.push(token),
            }
        }
        out
    }
}

/// Lemma-first pipeline: every token is replaced by its lemma before any
/// filtering, so stopword and punctuation checks operate on lemma forms.
/// The `stem` flag is ignored here.
pub struct LemmaNormalizer {
    tokenizer: Box<dyn Tokenizer>,
    lemmatizer: Box<dyn Lemmatizer>,
    config: NormalizeConfig,
}

impl LemmaNormalizer {
    pub fn new(
        tokenizer: Box<dyn Tokenizer>,
        lemmatizer: Box<dyn Lemmatizer>,
        config: NormalizeConfig,
    ) -> Self {
        Self { tokenizer, lemmatizer, config }
    }
}

impl Normalizer for LemmaNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for raw in self.tokenizer.tokenize(text) {
            let lemma = self.lemmatizer.lemma(&raw);
            let token = if self.config.downcase { lemma.to_lowercase() } else { lemma };
            if self.config.is_stopword(&token) {
                continue;
            }
            if self.config.strip_punctuation && is_punctuation(&token) {
                continue;
            }
            out.push(token);
        }
        out
    }
}
