//! Batch driver for the retrieval engine: legacy-format collection
//! parsing, ranking runs over a document/query pair, the classic
//! normalization-variant battery, and scoring of result files against a
//! relevance key.

pub mod cranfield;
pub mod embeddings;
pub mod run;
pub mod stopwords;
