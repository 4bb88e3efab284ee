//! Reader for the line-oriented legacy collection format: a `.I <n>` line
//! opens a record, other `.X` marker lines contribute their remainder,
//! and everything else is body text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use engine::{DocId, QueryId};

/// Parses the document file; ids come from the `.I` lines. Records whose
/// body ends up empty are dropped.
pub fn parse_documents(path: &Path) -> Result<Vec<(DocId, String)>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_documents(BufReader::new(file))
}

fn read_documents<R: BufRead>(reader: R) -> Result<Vec<(DocId, String)>> {
    let mut documents = Vec::new();
    let mut current: Option<DocId> = None;
    let mut text = String::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix(".I") {
            if let Some(id) = current {
                if !text.is_empty() {
                    documents.push((id, std::mem::take(&mut text)));
                }
            }
            text.clear();
            current = Some(
                rest.trim()
                    .parse()
                    .with_context(|| format!("bad document id in {line:?}"))?,
            );
        } else if line.starts_with('.') {
            if let Some(rest) = line.get(3..) {
                push_line(&mut text, rest);
            }
        } else {
            push_line(&mut text, &line);
        }
    }
    if let Some(id) = current {
        if !text.is_empty() {
            documents.push((id, text));
        }
    }
    Ok(documents)
}

/// Parses the query file. Queries are renumbered sequentially from 1 in
/// file order; the relevance keys shipped with these collections follow
/// that numbering, not the raw `.I` values.
pub fn parse_queries(path: &Path) -> Result<Vec<(QueryId, String)>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_queries(BufReader::new(file))
}

fn read_queries<R: BufRead>(reader: R) -> Result<Vec<(QueryId, String)>> {
    let mut queries = Vec::new();
    let mut current: QueryId = 0;
    let mut text = String::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with(".I") {
            if current > 0 && !text.is_empty() {
                queries.push((current, std::mem::take(&mut text)));
            }
            text.clear();
            current += 1;
        } else if line.starts_with(".W") {
            if let Some(rest) = line.get(3..) {
                push_line(&mut text, rest);
            }
        } else {
            push_line(&mut text, &line);
        }
    }
    if current > 0 && !text.is_empty() {
        queries.push((current, text));
    }
    Ok(queries)
}

fn push_line(text: &mut String, line: &str) {
    text.push_str(line);
    text.push('\n');
}
