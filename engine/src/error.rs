use thiserror::Error as ThisError;

/// Errors surfaced by normalization, ranking, and evaluation.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Normalization removed every token. A zero-length document would
    /// divide by zero in term-frequency computation, so construction
    /// refuses it outright.
    #[error("id {0}: no tokens remain after normalization")]
    EmptyDocument(u32),

    /// Ranking against an empty corpus is undefined (idf needs N > 0).
    #[error("corpus contains no documents")]
    EmptyCorpus,

    /// The query vector has zero magnitude, so cosine similarity is
    /// undefined against every document and the whole pass is refused.
    #[error("query {0}: zero-norm vector, similarity is undefined")]
    ZeroNormQuery(u32),

    /// A key or response line did not split into exactly three fields.
    #[error("line {line}: expected `query_id doc_id score`, got {text:?}")]
    MalformedLine { line: usize, text: String },

    /// A key or response field failed numeric parsing.
    #[error("line {line}: {field} {value:?} is not a number")]
    BadField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
