//! Word-vector file loader: one token per line followed by its
//! whitespace-separated components. Dimensionality is fixed by the first
//! vector line.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use engine::rank::EmbeddingProvider;

/// In-memory token to vector table read from a text file.
pub struct FileEmbeddings {
    dim: usize,
    vectors: HashMap<String, Vec<f64>>,
}

impl FileEmbeddings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let embeddings = Self::read(BufReader::new(file))?;
        tracing::info!(
            tokens = embeddings.vectors.len(),
            dim = embeddings.dim,
            "loaded word vectors"
        );
        Ok(embeddings)
    }

    fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut dim = 0usize;
        let mut vectors = HashMap::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let token = match fields.next() {
                Some(token) => token.to_string(),
                None => continue,
            };
            let components = fields
                .map(|field| {
                    field
                        .parse::<f64>()
                        .with_context(|| format!("line {}: bad component {field:?}", idx + 1))
                })
                .collect::<Result<Vec<f64>>>()?;
            if components.is_empty() {
                bail!("line {}: token {token:?} has no vector components", idx + 1);
            }
            if dim == 0 {
                dim = components.len();
            } else if components.len() != dim {
                bail!(
                    "line {}: expected {dim} components, found {}",
                    idx + 1,
                    components.len()
                );
            }
            vectors.insert(token, components);
        }
        if vectors.is_empty() {
            bail!("no word vectors found");
        }
        Ok(Self { dim, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingProvider for FileEmbeddings {
    fn dim(&self) -> usize {
        self.dim
    }

    fn vector(&self, token: &str) -> Option<Vec<f64>> {
        self.vectors.get(token).cloned()
    }
}
