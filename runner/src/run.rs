//! Batch operations: rank a collection against its queries, sweep the
//! normalization battery, and score result files against a key.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use engine::eval::{evaluate, write_ranking, RelevanceKey, Report, ResponseSet};
use engine::normalize::{NormalizeConfig, Normalizer, PlainNormalizer};
use engine::rank::{Retriever, SimilarityScorer, TfIdfScorer, DEFAULT_INCLUSION_THRESHOLD};

use crate::cranfield;
use crate::stopwords;

/// Counters from one ranking run. Skipped entries normalized to nothing
/// or had an undefined similarity; they are logged, not fatal.
#[derive(Debug, Default)]
pub struct RankStats {
    pub documents: usize,
    pub skipped_documents: usize,
    pub queries: usize,
    pub skipped_queries: usize,
}

/// Ranks every query in `queries` against the collection in `docs`,
/// writing `query_id doc_id score` lines to `output`.
pub fn run_rank(
    docs: &Path,
    queries: &Path,
    output: &Path,
    normalizer: Box<dyn Normalizer>,
    scorer: Box<dyn SimilarityScorer>,
    threshold: f64,
) -> Result<RankStats> {
    let mut retriever = Retriever::new(normalizer, scorer).with_threshold(threshold);
    let mut stats = RankStats::default();

    for (id, text) in cranfield::parse_documents(docs)? {
        match retriever.add_document(id, &text) {
            Ok(_) => stats.documents += 1,
            Err(err) => {
                tracing::warn!(doc_id = id, error = %err, "skipping document");
                stats.skipped_documents += 1;
            }
        }
    }
    tracing::info!(
        num_docs = stats.documents,
        skipped = stats.skipped_documents,
        "corpus built"
    );

    let mut out = BufWriter::new(
        File::create(output).with_context(|| format!("creating {}", output.display()))?,
    );
    for (id, text) in cranfield::parse_queries(queries)? {
        let query = match retriever.make_query(id, &text) {
            Ok(query) => query,
            Err(err) => {
                tracing::warn!(query_id = id, error = %err, "skipping query");
                stats.skipped_queries += 1;
                continue;
            }
        };
        match retriever.rank(&query) {
            Ok(hits) => {
                write_ranking(&mut out, id, &hits)?;
                stats.queries += 1;
            }
            Err(err) => {
                tracing::warn!(query_id = id, error = %err, "skipping query");
                stats.skipped_queries += 1;
            }
        }
    }
    out.flush()?;
    Ok(stats)
}

/// One entry in the classic normalization battery.
pub struct Variant {
    pub name: &'static str,
    pub downcase: bool,
    pub stopwords: bool,
    pub strip_punctuation: bool,
    pub stem: bool,
}

impl Variant {
    pub fn config(&self) -> NormalizeConfig {
        NormalizeConfig {
            downcase: self.downcase,
            stopwords: self.stopwords.then(stopwords::english),
            strip_punctuation: self.strip_punctuation,
            stem: self.stem,
        }
    }
}

/// The step combinations worth comparing against each other, from the
/// bare baseline up to every step at once.
pub const VARIANTS: &[Variant] = &[
    Variant {
        name: "plain",
        downcase: false,
        stopwords: false,
        strip_punctuation: false,
        stem: false,
    },
    Variant {
        name: "downcase",
        downcase: true,
        stopwords: false,
        strip_punctuation: false,
        stem: false,
    },
    Variant {
        name: "stopwords",
        downcase: false,
        stopwords: true,
        strip_punctuation: false,
        stem: false,
    },
    Variant {
        name: "stopwords_punct",
        downcase: false,
        stopwords: true,
        strip_punctuation: true,
        stem: false,
    },
    Variant {
        name: "stopwords_stem",
        downcase: false,
        stopwords: true,
        strip_punctuation: false,
        stem: true,
    },
    Variant {
        name: "stopwords_punct_stem",
        downcase: false,
        stopwords: true,
        strip_punctuation: true,
        stem: true,
    },
    Variant {
        name: "downcase_stopwords_punct_stem",
        downcase: true,
        stopwords: true,
        strip_punctuation: true,
        stem: true,
    },
];

/// Runs every battery variant over the same files with the tf-idf scorer,
/// one result file per variant, named after the variant.
pub fn run_sweep(docs: &Path, queries: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for variant in VARIANTS {
        let started = Instant::now();
        let normalizer = PlainNormalizer::with_defaults(variant.config());
        let stats = run_rank(
            docs,
            queries,
            &out_dir.join(variant.name),
            Box::new(normalizer),
            Box::new(TfIdfScorer),
            DEFAULT_INCLUSION_THRESHOLD,
        )?;
        tracing::info!(
            variant = variant.name,
            queries = stats.queries,
            took_s = started.elapsed().as_secs_f64(),
            "variant complete"
        );
    }
    Ok(())
}

/// Scores one response file against an already-loaded key.
pub fn score_file(key: &RelevanceKey, responses: &Path) -> Result<Report> {
    let responses = ResponseSet::from_path(responses)
        .with_context(|| format!("reading responses from {}", responses.display()))?;
    Ok(evaluate(key, &responses))
}
