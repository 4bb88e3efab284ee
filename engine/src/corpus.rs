//! Frequency model: token sequences reduced to occurrence counts, plus
//! the corpus-wide aggregate statistics that idf is defined over.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::error::Error;
use crate::{DocId, QueryId};

/// A document reduced to occurrence counts. Counts keep first-occurrence
/// order, so anything iterating terms is deterministic for a given input.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocId,
    counts: IndexMap<String, u32>,
    length: usize,
}

impl Document {
    /// Builds the frequency view of a normalized token sequence. An empty
    /// sequence is refused: a zero-length document would divide by zero
    /// in term-frequency computation.
    pub fn from_tokens(id: DocId, tokens: Vec<String>) -> Result<Self, Error> {
        if tokens.is_empty() {
            return Err(Error::EmptyDocument(id));
        }
        let length = tokens.len();
        let mut counts = IndexMap::new();
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }
        Ok(Self { id, counts, length })
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    /// Total token count, repeats included. Always the sum of the
    /// per-term counts.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Occurrence count of `term`, 0 when absent.
    pub fn count(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Term frequency: occurrence count over document length.
    pub fn tf(&self, term: &str) -> f64 {
        self.count(term) as f64 / self.length as f64
    }

    /// Distinct terms with their counts, in first-occurrence order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }
}

/// A query is a document whose distinct terms double as the vector
/// dimensions of a ranking pass. First-occurrence order makes the
/// dimension layout reproducible for identical input.
#[derive(Debug, Clone)]
pub struct Query {
    doc: Document,
}

impl Query {
    pub fn from_tokens(id: QueryId, tokens: Vec<String>) -> Result<Self, Error> {
        Ok(Self { doc: Document::from_tokens(id, tokens)? })
    }

    pub fn id(&self) -> QueryId {
        self.doc.id()
    }

    /// Distinct tokens in first-occurrence order; one vector dimension each.
    pub fn unique_terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.doc.counts.keys().map(|term| term.as_str())
    }

    /// The underlying frequency view.
    pub fn document(&self) -> &Document {
        &self.doc
    }
}

/// The indexed collection. Append-only and never reordered; document ids
/// are taken as given, so duplicates stay distinct members.
#[derive(Debug, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    aggregate: HashMap<String, u64>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from normalized tokens and appends it.
    pub fn add_document(&mut self, id: DocId, tokens: Vec<String>) -> Result<&Document, Error> {
        let doc = Document::from_tokens(id, tokens)?;
        for (term, count) in doc.terms() {
            *self.aggregate.entry(term.to_string()).or_insert(0) += u64::from(count);
        }
        self.documents.push(doc);
        Ok(&self.documents[self.documents.len() - 1])
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Total occurrences of `term` across every document. An occurrence
    /// sum, not a containing-document count.
    pub fn aggregate_frequency(&self, term: &str) -> u64 {
        self.aggregate.get(term).copied().unwrap_or(0)
    }

    /// `ln(N / (1 + aggregate_frequency))`. Goes negative once a term
    /// occurs more often than there are documents; callers take the raw
    /// value, there is no clamping.
    pub fn idf(&self, term: &str) -> f64 {
        (self.len() as f64 / (1.0 + self.aggregate_frequency(term) as f64)).ln()
    }
}
