//! Vector-space retrieval over an in-memory corpus, plus evaluation of
//! ranked output against a relevance key.
//!
//! The pipeline is: normalize text into tokens ([`normalize`]), reduce
//! token sequences to frequency counts ([`corpus`]), weight and compare
//! vectors ([`rank`]), and grade result files against ground truth
//! ([`eval`]). Normalization and similarity are strategy traits chosen at
//! construction time; everything downstream is deterministic for a given
//! corpus and configuration.

pub mod corpus;
pub mod error;
pub mod eval;
pub mod normalize;
pub mod rank;

pub use corpus::{Corpus, Document, Query};
pub use error::Error;
pub use eval::{evaluate, grade, QueryScores, RelevanceKey, Report, ResponseSet};
pub use normalize::{
    LemmaNormalizer, Lemmatizer, NormalizeConfig, Normalizer, PlainNormalizer, Tokenizer,
    WordTokenizer,
};
pub use rank::{
    EmbeddingProvider, EmbeddingScorer, Hit, Retriever, SimilarityScorer, TfIdfScorer,
    DEFAULT_INCLUSION_THRESHOLD,
};

pub type DocId = u32;
pub type QueryId = u32;

pub type Result<T> = std::result::Result<T, Error>;
