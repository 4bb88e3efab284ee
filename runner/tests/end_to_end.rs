use std::fs;
use std::path::Path;

use engine::eval::ResponseSet;
use engine::normalize::{NormalizeConfig, PlainNormalizer};
use engine::rank::{EmbeddingScorer, TfIdfScorer, DEFAULT_INCLUSION_THRESHOLD};
use runner::embeddings::FileEmbeddings;
use runner::run::{run_rank, run_sweep, score_file, VARIANTS};
use runner::stopwords;
use tempfile::tempdir;

const DOCS: &str = "\
.I 1
.T
shock wave interaction
.W
shock waves on a supersonic wing
.I 2
.T
boundary layer studies
.W
boundary layer flow over a flat plate
.I 3
.T
heat transfer
.W
heat transfer in turbulent boundary layers
";

const QUERIES: &str = "\
.I 1
.W
boundary layer flow
.I 2
.W
supersonic shock waves
";

fn write_collection(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let docs = dir.join("cran.all");
    let queries = dir.join("cran.qry");
    fs::write(&docs, DOCS).unwrap();
    fs::write(&queries, QUERIES).unwrap();
    (docs, queries)
}

fn downcase_normalizer() -> PlainNormalizer {
    PlainNormalizer::with_defaults(NormalizeConfig { downcase: true, ..Default::default() })
}

#[test]
fn rank_then_score_the_collection() {
    let dir = tempdir().unwrap();
    let (docs, queries) = write_collection(dir.path());
    let output = dir.path().join("results");

    let stats = run_rank(
        &docs,
        &queries,
        &output,
        Box::new(downcase_normalizer()),
        Box::new(TfIdfScorer),
        DEFAULT_INCLUSION_THRESHOLD,
    )
    .unwrap();
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.skipped_documents, 0);
    assert_eq!(stats.queries, 2);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Query 1 matches both boundary-layer documents, best first; query 2
    // matches only the supersonic document.
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("1 2 "));
    assert!(lines[1].starts_with("1 3 "));
    assert_eq!(lines[2], "2 1 1.0000");

    let responses = ResponseSet::from_path(&output).unwrap();
    assert_eq!(responses.len(), 2);

    let key_path = dir.path().join("crankey");
    fs::write(&key_path, "1 2 1\n1 3 1\n2 1 1\n").unwrap();
    let key = engine::eval::RelevanceKey::from_path(&key_path, None).unwrap();
    let report = score_file(&key, &output).unwrap();
    assert_eq!(report.per_query.len(), 2);
    assert!(report.missing.is_empty());
    assert!((report.mean.precision - 1.0).abs() < 1e-12);
    assert!((report.mean.recall - 1.0).abs() < 1e-12);
    assert!((report.mean.average_precision - 1.0).abs() < 1e-9);
}

#[test]
fn degenerate_documents_and_queries_are_skipped() {
    let dir = tempdir().unwrap();
    let docs = dir.path().join("cran.all");
    let queries = dir.path().join("cran.qry");
    // Document 1 and query 1 are nothing but stopwords; both normalize
    // to empty and must be skipped without aborting the batch.
    fs::write(
        &docs,
        ".I 1\n.W\nthe of and\n\
         .I 2\n.W\nboundary layer flow over boundary\n\
         .I 3\n.W\nheat transfer in turbulent layers\n",
    )
    .unwrap();
    fs::write(&queries, ".I 1\n.W\nthe and a\n.I 2\n.W\nboundary layer flow\n").unwrap();
    let output = dir.path().join("results");

    let normalizer = PlainNormalizer::with_defaults(NormalizeConfig {
        downcase: true,
        stopwords: Some(stopwords::english()),
        ..Default::default()
    });
    let stats = run_rank(
        &docs,
        &queries,
        &output,
        Box::new(normalizer),
        Box::new(TfIdfScorer),
        DEFAULT_INCLUSION_THRESHOLD,
    )
    .unwrap();
    assert_eq!(stats.documents, 2);
    assert_eq!(stats.skipped_documents, 1);
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.skipped_queries, 1);

    // Only the surviving query writes rankings, and only document 2
    // shares a weighted term with it.
    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text, "2 2 1.0000\n");
}

#[test]
fn embedding_mode_ranks_from_a_vector_file() {
    let dir = tempdir().unwrap();
    let (docs, queries) = write_collection(dir.path());
    let vectors = dir.path().join("vectors.txt");
    fs::write(
        &vectors,
        "boundary 1.0 0.0\nlayer 1.0 0.0\nflow 1.0 0.0\n\
         shock 0.0 1.0\nwaves 0.0 1.0\nsupersonic 0.0 1.0\n",
    )
    .unwrap();
    let output = dir.path().join("results_embed");

    let provider = FileEmbeddings::load(&vectors).unwrap();
    let stats = run_rank(
        &docs,
        &queries,
        &output,
        Box::new(downcase_normalizer()),
        Box::new(EmbeddingScorer::new(Box::new(provider), false)),
        DEFAULT_INCLUSION_THRESHOLD,
    )
    .unwrap();
    assert_eq!(stats.queries, 2);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Orthogonal topic vectors: each query scores only its own topic's
    // documents; cross-topic cosines are zero and fall under the threshold.
    assert_eq!(lines, vec!["1 2 1.0000", "1 3 1.0000", "2 1 1.0000"]);
}

#[test]
fn sweep_writes_one_file_per_variant() {
    let dir = tempdir().unwrap();
    let (docs, queries) = write_collection(dir.path());
    let out_dir = dir.path().join("sweep");

    run_sweep(&docs, &queries, &out_dir).unwrap();

    for variant in VARIANTS {
        let path = out_dir.join(variant.name);
        let responses = ResponseSet::from_path(&path)
            .unwrap_or_else(|err| panic!("{}: {err}", variant.name));
        assert!(!responses.is_empty(), "{} produced no rankings", variant.name);
    }
}
