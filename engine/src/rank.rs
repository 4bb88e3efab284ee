//! Vector weighting and similarity ranking.
//!
//! Vector dimensions are the query's distinct tokens in first-occurrence
//! order; document vectors are built only over those dimensions, since a
//! term outside the query cannot move a cosine score. Per-document scoring
//! is data-parallel, and the final order is total (score descending, then
//! document id ascending), so parallel runs match sequential ones exactly.

use rayon::prelude::*;
use serde::Serialize;

use crate::corpus::{Corpus, Document, Query};
use crate::error::Error;
use crate::normalize::Normalizer;
use crate::{DocId, QueryId};

/// Minimum similarity for a document to enter the result list. The filter
/// is strictly greater-than.
pub const DEFAULT_INCLUSION_THRESHOLD: f64 = 1e-4;

/// One ranked result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub score: f64,
}

/// Token-to-vector source for the embedding scorer. The engine only
/// averages and compares; where the vectors come from is the caller's
/// concern.
pub trait EmbeddingProvider: Send + Sync {
    /// Dimensionality of every vector this provider yields.
    fn dim(&self) -> usize;
    /// The vector for `token`, or `None` when out of vocabulary.
    fn vector(&self, token: &str) -> Option<Vec<f64>>;
}

/// Scores every corpus document against one query.
pub trait SimilarityScorer: Send + Sync {
    /// Unsorted, unfiltered scores. Documents whose similarity is
    /// undefined (zero-norm vector) are skipped; a zero-norm query aborts
    /// the whole pass with [`Error::ZeroNormQuery`].
    fn score_corpus(&self, corpus: &Corpus, query: &Query) -> Result<Vec<Hit>, Error>;
}

fn dot(u: &[f64], v: &[f64]) -> f64 {
    u.iter().zip(v).map(|(a, b)| a * b).sum()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity, or `None` when either vector has zero magnitude.
/// The undefined case is surfaced instead of leaking a NaN into ranking.
pub fn cosine(u: &[f64], v: &[f64]) -> Option<f64> {
    let nu = norm(u);
    let nv = norm(v);
    if nu == 0.0 || nv == 0.0 {
        return None;
    }
    Some(dot(u, v) / (nu * nv))
}

/// Classic tf-idf weighting over the query's dimensions. Idf comes from
/// the corpus aggregate counts and is used as-is, negative values included.
#[derive(Debug, Default, Clone, Copy)]
pub struct TfIdfScorer;

impl TfIdfScorer {
    fn weight_vector(doc: &Document, dims: &[&str], idf: &[f64]) -> Vec<f64> {
        dims.iter().zip(idf).map(|(term, &w)| doc.tf(term) * w).collect()
    }
}

impl SimilarityScorer for TfIdfScorer {
    fn score_corpus(&self, corpus: &Corpus, query: &Query) -> Result<Vec<Hit>, Error> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let dims: Vec<&str> = query.unique_terms().collect();
        let idf: Vec<f64> = dims.iter().map(|term| corpus.idf(term)).collect();
        let query_vec = Self::weight_vector(query.document(), &dims, &idf);
        if norm(&query_vec) == 0.0 {
            return Err(Error::ZeroNormQuery(query.id()));
        }
        let hits = corpus
            .documents()
            .par_iter()
            .filter_map(|doc| {
                let doc_vec = Self::weight_vector(doc, &dims, &idf);
                match cosine(&query_vec, &doc_vec) {
                    Some(score) => Some(Hit { doc_id: doc.id(), score }),
                    None => {
                        tracing::trace!(doc_id = doc.id(), "zero-norm document, skipped");
                        None
                    }
                }
            })
            .collect();
        Ok(hits)
    }
}

/// Averaged-embedding similarity. Every token occurrence contributes to
/// the mean: out-of-vocabulary tokens add a zero vector but still count
/// in the denominator.
pub struct EmbeddingScorer {
    provider: Box<dyn EmbeddingProvider>,
    normalized: bool,
}

impl EmbeddingScorer {
    /// `normalized` selects the unit-length variant of the averaged vector.
    pub fn new(provider: Box<dyn EmbeddingProvider>, normalized: bool) -> Self {
        Self { provider, normalized }
    }

    /// Mean of the token vectors over all `doc.len()` occurrences, or
    /// `None` when the mean has zero magnitude (for instance, every token
    /// out of vocabulary).
    fn averaged(&self, doc: &Document) -> Option<Vec<f64>> {
        let mut sum = vec![0.0; self.provider.dim()];
        for (term, count) in doc.terms() {
            if let Some(vector) = self.provider.vector(term) {
                for (acc, &component) in sum.iter_mut().zip(&vector) {
                    *acc += component * f64::from(count);
                }
            }
        }
        let len = doc.len() as f64;
        for component in sum.iter_mut() {
            *component /= len;
        }
        let magnitude = norm(&sum);
        if magnitude == 0.0 {
            return None;
        }
        if self.normalized {
            for component in sum.iter_mut() {
                *component /= magnitude;
            }
        }
        Some(sum)
    }
}

impl SimilarityScorer for EmbeddingScorer {
    fn score_corpus(&self, corpus: &Corpus, query: &Query) -> Result<Vec<Hit>, Error> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let query_vec = self
            .averaged(query.document())
            .ok_or(Error::ZeroNormQuery(query.id()))?;
        let hits = corpus
            .documents()
            .par_iter()
            .filter_map(|doc| {
                let doc_vec = self.averaged(doc)?;
                let score = cosine(&query_vec, &doc_vec)?;
                Some(Hit { doc_id: doc.id(), score })
            })
            .collect();
        Ok(hits)
    }
}

/// A retrieval session: one normalization strategy, one similarity
/// strategy, and the corpus they operate on. Built once, queried many
/// times; the corpus only grows.
pub struct Retriever {
    normalizer: Box<dyn Normalizer>,
    scorer: Box<dyn SimilarityScorer>,
    corpus: Corpus,
    threshold: f64,
}

impl Retriever {
    pub fn new(normalizer: Box<dyn Normalizer>, scorer: Box<dyn SimilarityScorer>) -> Self {
        Self {
            normalizer,
            scorer,
            corpus: Corpus::new(),
            threshold: DEFAULT_INCLUSION_THRESHOLD,
        }
    }

    /// Overrides [`DEFAULT_INCLUSION_THRESHOLD`] for this session.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Normalizes `text` and indexes it under `id`. Fails when every
    /// token is filtered out.
    pub fn add_document(&mut self, id: DocId, text: &str) -> Result<&Document, Error> {
        let tokens = self.normalizer.normalize(text);
        self.corpus.add_document(id, tokens)
    }

    /// Normalizes `text` into a query without touching the corpus.
    pub fn make_query(&self, id: QueryId, text: &str) -> Result<Query, Error> {
        Query::from_tokens(id, self.normalizer.normalize(text))
    }

    /// Ranks the whole corpus against `query`: scores every document,
    /// keeps pairs strictly above the threshold, and sorts by score
    /// descending with ties broken by ascending document id.
    pub fn rank(&self, query: &Query) -> Result<Vec<Hit>, Error> {
        let mut hits: Vec<Hit> = self
            .scorer
            .score_corpus(&self.corpus, query)?
            .into_iter()
            .filter(|hit| hit.score > self.threshold)
            .collect();
        hits.sort_unstable_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        Ok(hits)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{NormalizeConfig, PlainNormalizer};

    fn tfidf_retriever() -> Retriever {
        let normalizer = PlainNormalizer::with_defaults(NormalizeConfig {
            downcase: true,
            ..Default::default()
        });
        Retriever::new(Box::new(normalizer), Box::new(TfIdfScorer))
    }

    fn cat_dog_retriever() -> Retriever {
        let mut r = tfidf_retriever();
        r.add_document(1, "cat dog cat").unwrap();
        r.add_document(2, "dog dog fish").unwrap();
        r
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -0.5, 0.2];
        let c = cosine(&v, &v).unwrap();
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_of_zero_vector_is_undefined() {
        assert!(cosine(&[0.0, 0.0], &[1.0, 2.0]).is_none());
        assert!(cosine(&[1.0, 2.0], &[0.0, 0.0]).is_none());
    }

    #[test]
    fn ranks_cat_dog_corpus() {
        let r = cat_dog_retriever();
        let query = r.make_query(9, "cat dog").unwrap();
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, 1);
        assert_eq!(hits[1].doc_id, 2);
        assert!((hits[0].score - 0.9447).abs() < 1e-3);
        assert!((hits[1].score - 0.8632).abs() < 1e-3);

        // Straight-line recomputation: idf from aggregate counts, tf over
        // the query's two dimensions, then cosine.
        let idf_cat = (2.0f64 / 3.0).ln();
        let idf_dog = (2.0f64 / 4.0).ln();
        let q = [0.5 * idf_cat, 0.5 * idf_dog];
        let a = [(2.0 / 3.0) * idf_cat, (1.0 / 3.0) * idf_dog];
        let b = [0.0, (2.0 / 3.0) * idf_dog];
        let expect_a = cosine(&q, &a).unwrap();
        let expect_b = cosine(&q, &b).unwrap();
        assert!((hits[0].score - expect_a).abs() < 1e-12);
        assert!((hits[1].score - expect_b).abs() < 1e-12);
    }

    #[test]
    fn document_scores_itself_at_one() {
        let mut r = tfidf_retriever();
        r.add_document(1, "cat dog").unwrap();
        r.add_document(2, "bird").unwrap();
        r.add_document(3, "bird stone").unwrap();
        let query = r.make_query(9, "cat dog").unwrap();
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_document_corpus_self_similarity_is_one() {
        let mut r = tfidf_retriever();
        r.add_document(1, "flow past a flat plate").unwrap();
        // Every idf is ln(1/2) here; the vectors are parallel anyway.
        let query = r.make_query(1, "flow past a flat plate").unwrap();
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_filter_is_strictly_greater() {
        let r = cat_dog_retriever().with_threshold(0.9);
        let query = r.make_query(9, "cat dog").unwrap();
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 1);
    }

    #[test]
    fn ties_break_by_ascending_doc_id() {
        let mut r = tfidf_retriever();
        r.add_document(7, "wing flutter").unwrap();
        r.add_document(3, "wing flutter").unwrap();
        let query = r.make_query(9, "wing flutter").unwrap();
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].score - hits[1].score).abs() < 1e-15);
        assert_eq!(hits[0].doc_id, 3);
        assert_eq!(hits[1].doc_id, 7);
    }

    #[test]
    fn zero_overlap_documents_are_skipped() {
        let mut r = cat_dog_retriever();
        r.add_document(3, "bird").unwrap();
        let query = r.make_query(9, "cat dog").unwrap();
        let hits = r.rank(&query).unwrap();
        let ids: Vec<u32> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn empty_corpus_refuses_to_rank() {
        let r = tfidf_retriever();
        let query = r.make_query(9, "cat").unwrap();
        let err = r.rank(&query).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }

    #[test]
    fn zero_norm_query_aborts_the_pass() {
        let mut r = tfidf_retriever();
        // "cat" occurs once over two documents: idf = ln(2/2) = 0, so the
        // query vector collapses to zero.
        r.add_document(1, "cat").unwrap();
        r.add_document(2, "dog bird").unwrap();
        let query = r.make_query(9, "cat").unwrap();
        let err = r.rank(&query).unwrap_err();
        assert!(matches!(err, Error::ZeroNormQuery(9)));
    }

    #[test]
    fn negative_idf_still_ranks() {
        let mut r = tfidf_retriever();
        r.add_document(1, "cat cat cat cat").unwrap();
        r.add_document(2, "cat dog").unwrap();
        let query = r.make_query(9, "cat").unwrap();
        // idf(cat) = ln(2/6) < 0; one dimension, so the similarity of any
        // matching document is the sign-stable cosine of parallel vectors.
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    struct TinyVectors;

    impl EmbeddingProvider for TinyVectors {
        fn dim(&self) -> usize {
            2
        }
        fn vector(&self, token: &str) -> Option<Vec<f64>> {
            match token {
                "cat" => Some(vec![1.0, 0.0]),
                "dog" => Some(vec![0.0, 1.0]),
                _ => None,
            }
        }
    }

    fn embedding_retriever(normalized: bool) -> Retriever {
        let normalizer = PlainNormalizer::with_defaults(NormalizeConfig {
            downcase: true,
            ..Default::default()
        });
        let scorer = EmbeddingScorer::new(Box::new(TinyVectors), normalized);
        Retriever::new(Box::new(normalizer), Box::new(scorer))
    }

    #[test]
    fn averaging_counts_every_occurrence() {
        let scorer = EmbeddingScorer::new(Box::new(TinyVectors), false);
        let doc = Document::from_tokens(1, vec!["cat".into(), "fish".into()]).unwrap();
        // "fish" is out of vocabulary: zero contribution, but the mean is
        // still over two occurrences.
        let avg = scorer.averaged(&doc).unwrap();
        assert_eq!(avg, vec![0.5, 0.0]);
    }

    #[test]
    fn normalized_variant_has_unit_length() {
        let scorer = EmbeddingScorer::new(Box::new(TinyVectors), true);
        let doc = Document::from_tokens(1, vec!["cat".into(), "fish".into()]).unwrap();
        let avg = scorer.averaged(&doc).unwrap();
        assert_eq!(avg, vec![1.0, 0.0]);
    }

    #[test]
    fn all_out_of_vocabulary_is_undefined() {
        let scorer = EmbeddingScorer::new(Box::new(TinyVectors), false);
        let doc = Document::from_tokens(1, vec!["fish".into(), "bird".into()]).unwrap();
        assert!(scorer.averaged(&doc).is_none());
    }

    #[test]
    fn embedding_mode_ranks_and_skips_unknown_documents() {
        let mut r = embedding_retriever(false);
        r.add_document(1, "cat cat").unwrap();
        r.add_document(2, "dog").unwrap();
        r.add_document(3, "fish").unwrap();
        let query = r.make_query(9, "cat dog").unwrap();
        let hits = r.rank(&query).unwrap();
        // Documents 1 and 2 tie at cos 45 degrees; document 3 has no known
        // tokens and is skipped.
        let ids: Vec<u32> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![1, 2]);
        for hit in &hits {
            assert!((hit.score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        }
    }

    #[test]
    fn normalized_mode_scores_match_plain_averaging() {
        let mut plain = embedding_retriever(false);
        let mut unit = embedding_retriever(true);
        for r in [&mut plain, &mut unit] {
            r.add_document(1, "cat cat dog").unwrap();
            r.add_document(2, "dog dog cat fish").unwrap();
        }
        let q1 = plain.make_query(9, "cat dog").unwrap();
        let q2 = unit.make_query(9, "cat dog").unwrap();
        let h1 = plain.rank(&q1).unwrap();
        let h2 = unit.rank(&q2).unwrap();
        assert_eq!(h1.len(), h2.len());
        for (a, b) in h1.iter().zip(&h2) {
            assert_eq!(a.doc_id, b.doc_id);
            assert!((a.score - b.score).abs() < 1e-12);
        }
    }

    #[test]
    fn embedding_query_with_no_known_tokens_aborts() {
        let mut r = embedding_retriever(false);
        r.add_document(1, "cat").unwrap();
        let query = r.make_query(9, "fish").unwrap();
        let err = r.rank(&query).unwrap_err();
        assert!(matches!(err, Error::ZeroNormQuery(9)));
    }

    #[test]
    fn score_exactly_at_threshold_is_excluded() {
        let mut r = embedding_retriever(false).with_threshold(0.0);
        r.add_document(1, "cat").unwrap();
        r.add_document(2, "dog").unwrap();
        let query = r.make_query(9, "dog").unwrap();
        // Document 1 is orthogonal to the query: cosine exactly 0.0,
        // which is not strictly above the threshold.
        let hits = r.rank(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 2);
    }
}
