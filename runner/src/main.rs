use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use engine::eval::RelevanceKey;
use engine::normalize::{NormalizeConfig, Normalizer, PlainNormalizer};
use engine::rank::{EmbeddingScorer, SimilarityScorer, TfIdfScorer, DEFAULT_INCLUSION_THRESHOLD};
use runner::embeddings::FileEmbeddings;
use runner::{run, stopwords};

#[derive(Parser)]
#[command(name = "runner")]
#[command(about = "Rank a legacy document collection against its queries and score the results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Tf-idf weighted cosine similarity
    Tfidf,
    /// Averaged word embeddings
    EmbedAvg,
    /// Unit-length averaged word embeddings
    EmbedNorm,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every query against the document collection
    Rank {
        /// Document file in the legacy `.I` format
        #[arg(long)]
        docs: PathBuf,
        /// Query file in the legacy `.I` format
        #[arg(long)]
        queries: PathBuf,
        /// Output file of `query_id doc_id score` lines
        #[arg(long)]
        output: PathBuf,
        /// Lowercase tokens before filtering
        #[arg(long, default_value_t = false)]
        downcase: bool,
        /// Filter the built-in English stopword list
        #[arg(long, default_value_t = false)]
        stopwords: bool,
        /// Additional stopwords, one per line
        #[arg(long)]
        stopword_file: Option<PathBuf>,
        /// Drop pure-punctuation tokens
        #[arg(long, default_value_t = false)]
        strip_punct: bool,
        /// Stem tokens with the English Snowball stemmer
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Similarity backend
        #[arg(long, value_enum, default_value_t = Mode::Tfidf)]
        mode: Mode,
        /// Word-vector file for the embedding modes
        #[arg(long)]
        embeddings: Option<PathBuf>,
        /// Minimum similarity for a result to be emitted (strictly greater)
        #[arg(long, default_value_t = DEFAULT_INCLUSION_THRESHOLD)]
        threshold: f64,
    },
    /// Run the whole normalization battery, one result file per variant
    Sweep {
        /// Document file in the legacy `.I` format
        #[arg(long)]
        docs: PathBuf,
        /// Query file in the legacy `.I` format
        #[arg(long)]
        queries: PathBuf,
        /// Directory for the per-variant result files
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
    },
    /// Score response files against a relevance key
    Score {
        /// Relevance key of `query_id doc_id score` lines
        #[arg(long)]
        key: PathBuf,
        /// Drop key entries whose document id exceeds this
        #[arg(long)]
        max_doc_id: Option<u32>,
        /// Print each report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Response files to score
        #[arg(required = true)]
        responses: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            docs,
            queries,
            output,
            downcase,
            stopwords,
            stopword_file,
            strip_punct,
            stem,
            mode,
            embeddings,
            threshold,
        } => {
            let config =
                build_config(downcase, stopwords, stopword_file.as_deref(), strip_punct, stem)?;
            let normalizer: Box<dyn Normalizer> = Box::new(PlainNormalizer::with_defaults(config));
            let scorer = build_scorer(mode, embeddings.as_deref())?;
            let stats = run::run_rank(&docs, &queries, &output, normalizer, scorer, threshold)?;
            tracing::info!(
                queries = stats.queries,
                skipped_queries = stats.skipped_queries,
                output = %output.display(),
                "rank complete"
            );
            Ok(())
        }
        Commands::Sweep { docs, queries, out_dir } => run::run_sweep(&docs, &queries, &out_dir),
        Commands::Score { key, max_doc_id, json, responses } => {
            let key = RelevanceKey::from_path(&key, max_doc_id)
                .with_context(|| format!("reading key from {}", key.display()))?;
            for path in &responses {
                let report = run::score_file(&key, path)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("{}:", path.display());
                    println!("{report}");
                }
            }
            Ok(())
        }
    }
}

fn build_config(
    downcase: bool,
    builtin: bool,
    stopword_file: Option<&Path>,
    strip_punct: bool,
    stem: bool,
) -> Result<NormalizeConfig> {
    let mut set = if builtin { stopwords::english() } else { HashSet::new() };
    if let Some(path) = stopword_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading stopwords from {}", path.display()))?;
        set.extend(
            text.lines()
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(String::from),
        );
    }
    Ok(NormalizeConfig {
        downcase,
        stopwords: if set.is_empty() { None } else { Some(set) },
        strip_punctuation: strip_punct,
        stem,
    })
}

fn build_scorer(mode: Mode, embeddings: Option<&Path>) -> Result<Box<dyn SimilarityScorer>> {
    match mode {
        Mode::Tfidf => Ok(Box::new(TfIdfScorer)),
        Mode::EmbedAvg | Mode::EmbedNorm => {
            let path = match embeddings {
                Some(path) => path,
                None => bail!("--embeddings is required for the embedding modes"),
            };
            let provider = FileEmbeddings::load(path)?;
            let normalized = matches!(mode, Mode::EmbedNorm);
            Ok(Box::new(EmbeddingScorer::new(Box::new(provider), normalized)))
        }
    }
}
