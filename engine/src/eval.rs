//! Ranking-quality evaluation: precision, recall, F-score and
//! milestone-interpolated average precision against a relevance key,
//! plus the whitespace-triple file format the rankings travel in.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::Error;
use crate::rank::Hit;
use crate::{DocId, QueryId};

/// Writes one `query_id doc_id score` line per hit, scores at fixed
/// four-decimal precision, in ranking order.
pub fn write_ranking<W: Write>(out: &mut W, query: QueryId, hits: &[Hit]) -> io::Result<()> {
    for hit in hits {
        writeln!(out, "{} {} {:.4}", query, hit.doc_id, hit.score)?;
    }
    Ok(())
}

fn split_triple(line_no: usize, line: &str) -> Result<(&str, &str, &str), Error> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(first), Some(second), Some(third), None) => Ok((first, second, third)),
        _ => Err(Error::MalformedLine { line: line_no, text: line.trim_end().to_string() }),
    }
}

fn parse_id(line_no: usize, field: &'static str, value: &str) -> Result<u32, Error> {
    value
        .parse()
        .map_err(|_| Error::BadField { line: line_no, field, value: value.to_string() })
}

fn parse_score(line_no: usize, value: &str) -> Result<f64, Error> {
    value
        .parse()
        .map_err(|_| Error::BadField { line: line_no, field: "score", value: value.to_string() })
}

/// Ground truth: the relevant document ids per query. Membership checks
/// are order-insensitive; iteration keeps file order. Duplicate documents
/// keep their first occurrence.
#[derive(Debug, Default, Clone)]
pub struct RelevanceKey {
    queries: IndexMap<QueryId, IndexSet<DocId>>,
}

impl RelevanceKey {
    /// Reads `query_id doc_id score` triples. The score is ignored but
    /// still has to parse as a number. With `max_doc_id` set, entries
    /// pointing past it are dropped; keys shipped alongside a fixed
    /// corpus routinely list a handful of out-of-range documents.
    pub fn from_reader<R: Read>(reader: R, max_doc_id: Option<DocId>) -> Result<Self, Error> {
        let mut queries: IndexMap<QueryId, IndexSet<DocId>> = IndexMap::new();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let (query, doc, score) = split_triple(line_no, &line)?;
            let query = parse_id(line_no, "query id", query)?;
            let doc = parse_id(line_no, "document id", doc)?;
            parse_score(line_no, score)?;
            if max_doc_id.map_or(false, |cap| doc > cap) {
                continue;
            }
            queries.entry(query).or_default().insert(doc);
        }
        Ok(Self { queries })
    }

    pub fn from_path(path: impl AsRef<Path>, max_doc_id: Option<DocId>) -> Result<Self, Error> {
        Self::from_reader(File::open(path)?, max_doc_id)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Relevant documents for `query`, in key-file order.
    pub fn relevant(&self, query: QueryId) -> Option<&IndexSet<DocId>> {
        self.queries.get(&query)
    }

    /// Queries in key-file order with their relevant sets.
    pub fn iter(&self) -> impl Iterator<Item = (QueryId, &IndexSet<DocId>)> + '_ {
        self.queries.iter().map(|(&query, docs)| (query, docs))
    }
}

/// The rankings under judgment: document ids per query in ranked order.
/// Duplicates within a query are dropped, first occurrence wins.
#[derive(Debug, Default, Clone)]
pub struct ResponseSet {
    queries: IndexMap<QueryId, IndexSet<DocId>>,
}

impl ResponseSet {
    /// Reads `query_id doc_id score` triples; all three fields must parse.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut queries: IndexMap<QueryId, IndexSet<DocId>> = IndexMap::new();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let (query, doc, score) = split_triple(line_no, &line)?;
            let query = parse_id(line_no, "query id", query)?;
            let doc = parse_id(line_no, "document id", doc)?;
            parse_score(line_no, score)?;
            queries.entry(query).or_default().insert(doc);
        }
        Ok(Self { queries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_reader(File::open(path)?)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Ranked documents for `query`, best first.
    pub fn ranked(&self, query: QueryId) -> Option<&IndexSet<DocId>> {
        self.queries.get(&query)
    }
}

/// Per-query quality measures. The `truncated_*` fields recompute
/// precision, recall, and F over only the first `|keys|` responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryScores {
    pub average_precision: f64,
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
    pub truncated_precision: f64,
    pub truncated_recall: f64,
    pub truncated_f: f64,
}

impl QueryScores {
    const ZERO: Self = Self {
        average_precision: 0.0,
        precision: 0.0,
        recall: 0.0,
        f_score: 0.0,
        truncated_precision: 0.0,
        truncated_recall: 0.0,
        truncated_f: 0.0,
    };
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Harmonic mean of precision and recall, 0 when either side is 0.
pub fn f_score(precision: f64, recall: f64) -> f64 {
    if precision == 0.0 || recall == 0.0 {
        0.0
    } else {
        2.0 / (1.0 / precision + 1.0 / recall)
    }
}

/// Milestone-interpolated average precision. Walking the ranked responses,
/// every relevant hit advances recall; each strictly-crossed multiple of
/// 0.1 records the precision at that point, and one jump may cross and
/// record several. The score is the mean of the recorded values, 0 when
/// no milestone was ever crossed. The milestone accumulates by repeated
/// addition: ten steps land just below 1.0, so full recall still crosses
/// the final milestone.
pub fn average_precision(keys: &IndexSet<DocId>, responses: &IndexSet<DocId>) -> f64 {
    if keys.is_empty() {
        return 0.0;
    }
    let total = keys.len() as f64;
    let mut correct = 0usize;
    let mut seen = 0usize;
    let mut milestone = 0.1;
    let mut recorded = Vec::new();
    for doc in responses {
        seen += 1;
        if keys.contains(doc) {
            correct += 1;
            let precision = correct as f64 / seen as f64;
            let recall = correct as f64 / total;
            while recall > milestone {
                recorded.push(precision);
                milestone += 0.1;
            }
        }
    }
    if recorded.is_empty() {
        return 0.0;
    }
    recorded.iter().sum::<f64>() / recorded.len() as f64
}

/// Grades one query's ranked responses against its relevant set.
pub fn grade(keys: &IndexSet<DocId>, responses: &IndexSet<DocId>) -> QueryScores {
    let correct = responses.iter().filter(|doc| keys.contains(*doc)).count();
    let precision = ratio(correct, responses.len());
    let recall = ratio(correct, keys.len());

    let cut = keys.len().min(responses.len());
    let correct_cut = responses
        .iter()
        .take(keys.len())
        .filter(|doc| keys.contains(*doc))
        .count();
    let truncated_precision = ratio(correct_cut, cut);
    let truncated_recall = ratio(correct_cut, keys.len());

    QueryScores {
        average_precision: average_precision(keys, responses),
        precision,
        recall,
        f_score: f_score(precision, recall),
        truncated_precision,
        truncated_recall,
        truncated_f: f_score(truncated_precision, truncated_recall),
    }
}

/// Outcome of scoring a response set against a key: per-query scores in
/// key order, queries with no responses at all (reported separately and
/// excluded from the means), and the means over everything evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub per_query: Vec<(QueryId, QueryScores)>,
    pub missing: Vec<QueryId>,
    pub mean: QueryScores,
}

/// Scores every query the key knows about against `responses`.
pub fn evaluate(key: &RelevanceKey, responses: &ResponseSet) -> Report {
    let mut per_query = Vec::new();
    let mut missing = Vec::new();
    for (query, keys) in key.iter() {
        match responses.ranked(query) {
            Some(ranked) => per_query.push((query, grade(keys, ranked))),
            None => missing.push(query),
        }
    }
    let mean = mean_scores(per_query.iter().map(|(_, scores)| *scores));
    Report { per_query, missing, mean }
}

fn mean_scores<I>(scores: I) -> QueryScores
where
    I: Iterator<Item = QueryScores>,
{
    let mut sum = QueryScores::ZERO;
    let mut count = 0usize;
    for s in scores {
        sum.average_precision += s.average_precision;
        sum.precision += s.precision;
        sum.recall += s.recall;
        sum.f_score += s.f_score;
        sum.truncated_precision += s.truncated_precision;
        sum.truncated_recall += s.truncated_recall;
        sum.truncated_f += s.truncated_f;
        count += 1;
    }
    if count == 0 {
        return QueryScores::ZERO;
    }
    let n = count as f64;
    QueryScores {
        average_precision: sum.average_precision / n,
        precision: sum.precision / n,
        recall: sum.recall / n,
        f_score: sum.f_score / n,
        truncated_precision: sum.truncated_precision / n,
        truncated_recall: sum.truncated_recall / n,
        truncated_f: sum.truncated_f / n,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "queries evaluated: {}", self.per_query.len())?;
        if !self.missing.is_empty() {
            writeln!(f, "queries with no responses: {:?}", self.missing)?;
        }
        writeln!(f, "mean average precision:   {:.4}", self.mean.average_precision)?;
        writeln!(f, "mean precision:           {:.4}", self.mean.precision)?;
        writeln!(f, "mean recall:              {:.4}", self.mean.recall)?;
        writeln!(f, "mean f-score:             {:.4}", self.mean.f_score)?;
        writeln!(f, "mean truncated precision: {:.4}", self.mean.truncated_precision)?;
        writeln!(f, "mean truncated recall:    {:.4}", self.mean.truncated_recall)?;
        write!(f, "mean truncated f-score:   {:.4}", self.mean.truncated_f)
    }
}
