//! In-memory reference engine
//!
//! Implements the full `VoucherIndex` contract: BM25 best-fields
//! keyword matching with automatic fuzziness, exact cosine scoring on
//! the chosen dense field, disjunctive should-clause combination and
//! hard metadata filters, all inside a single writer lock so document
//! replacement stays atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use voucher_search_core::{cosine, Result, Voucher};
use voucher_search_text::fold_tokens;

use super::query::{DenseField, IndexHit, IndexQuery, LexicalClause, LexicalField};
use super::schema::DocumentValidator;
use super::VoucherIndex;

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

/// The bundled index engine
pub struct MemoryIndex {
    validator: DocumentValidator,
    inner: RwLock<BTreeMap<String, StoredDoc>>,
}

struct StoredDoc {
    voucher: Voucher,
    name_tokens: Vec<String>,
    content_tokens: Vec<String>,
}

impl StoredDoc {
    fn tokens(&self, field: LexicalField) -> &[String] {
        match field {
            LexicalField::Name => &self.name_tokens,
            LexicalField::Content => &self.content_tokens,
        }
    }
}

impl MemoryIndex {
    pub fn new(validator: DocumentValidator) -> Self {
        Self {
            validator,
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// Analyzer shared by index and query sides: folded word tokens
    fn tokenize(text: &str) -> Vec<String> {
        fold_tokens(text)
    }

    /// Best-fields score for one document
    fn lexical_score(
        clause: &LexicalClause,
        query_tokens: &[String],
        doc: &StoredDoc,
        stats: &FieldStats,
    ) -> f32 {
        let mut best = 0.0f32;
        for (field, field_boost) in &clause.fields {
            let score = stats.bm25(*field, query_tokens, doc.tokens(*field));
            best = best.max(score * field_boost);
        }
        clause.boost * best
    }

    /// Per-document dense vector for the chosen field, falling back to
    /// the combined vector when the axis is not indexed
    fn dense_vector(voucher: &Voucher, field: DenseField) -> &[f32] {
        let optional = match field {
            DenseField::Content => return &voucher.embeddings.content,
            DenseField::Combined => return &voucher.embeddings.combined,
            DenseField::Location => voucher.embeddings.location.as_deref(),
            DenseField::Service => voucher.embeddings.service.as_deref(),
            DenseField::Target => voucher.embeddings.target.as_deref(),
        };
        optional.unwrap_or(&voucher.embeddings.combined)
    }
}

#[async_trait]
impl VoucherIndex for MemoryIndex {
    async fn upsert(&self, voucher: Voucher) -> Result<()> {
        self.validator.validate(&voucher)?;

        let doc = StoredDoc {
            name_tokens: Self::tokenize(&voucher.name),
            content_tokens: Self::tokenize(&voucher.content),
            voucher,
        };

        let mut inner = self.inner.write();
        inner.insert(doc.voucher.id.clone(), doc);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.inner.write().remove(id).is_some())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().len())
    }

    async fn search(&self, query: IndexQuery) -> Result<Vec<IndexHit>> {
        let inner = self.inner.read();

        let query_tokens: Vec<String> = query
            .lexical
            .as_ref()
            .map(|clause| Self::tokenize(&clause.text))
            .unwrap_or_default();

        let stats = FieldStats::collect(&inner, &query_tokens);

        let mut hits: Vec<IndexHit> = Vec::new();
        for doc in inner.values() {
            if !query.filters.iter().all(|f| f.accepts(&doc.voucher)) {
                continue;
            }

            let mut include = false;
            let mut score = 0.0f32;

            let lexical_score = query.lexical.as_ref().and_then(|clause| {
                let s = Self::lexical_score(clause, &query_tokens, doc, &stats);
                (s > 0.0).then_some(s)
            });
            if let Some(s) = lexical_score {
                include = true;
                score += s;
            }

            let cosine_score = query.dense.as_ref().map(|clause| {
                let vector = Self::dense_vector(&doc.voucher, clause.field);
                let c = cosine(&clause.vector, vector);
                score += (c + 1.0) * clause.boost;
                c
            });
            if cosine_score.is_some() {
                include = true;
            }

            if include {
                hits.push(IndexHit {
                    voucher: doc.voucher.clone(),
                    lexical_score,
                    cosine: cosine_score,
                    score,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.voucher.id.cmp(&b.voucher.id))
        });
        hits.truncate(query.size);

        tracing::debug!(hits = hits.len(), "index query executed");
        Ok(hits)
    }
}

/// Corpus statistics for BM25, computed over the whole index
struct FieldStats {
    doc_count: usize,
    name_avg_len: f32,
    content_avg_len: f32,
    /// df per query token, name field then content field
    name_df: Vec<usize>,
    content_df: Vec<usize>,
}

impl FieldStats {
    fn collect(docs: &BTreeMap<String, StoredDoc>, query_tokens: &[String]) -> Self {
        let doc_count = docs.len();
        let mut name_len_sum = 0usize;
        let mut content_len_sum = 0usize;
        let mut name_df = vec![0usize; query_tokens.len()];
        let mut content_df = vec![0usize; query_tokens.len()];

        for doc in docs.values() {
            name_len_sum += doc.name_tokens.len();
            content_len_sum += doc.content_tokens.len();
            for (i, qt) in query_tokens.iter().enumerate() {
                if doc.name_tokens.iter().any(|dt| fuzzy_match(qt, dt)) {
                    name_df[i] += 1;
                }
                if doc.content_tokens.iter().any(|dt| fuzzy_match(qt, dt)) {
                    content_df[i] += 1;
                }
            }
        }

        let denom = doc_count.max(1) as f32;
        Self {
            doc_count,
            name_avg_len: name_len_sum as f32 / denom,
            content_avg_len: content_len_sum as f32 / denom,
            name_df,
            content_df,
        }
    }

    fn bm25(&self, field: LexicalField, query_tokens: &[String], doc_tokens: &[String]) -> f32 {
        if self.doc_count == 0 || doc_tokens.is_empty() {
            return 0.0;
        }
        let (avg_len, df) = match field {
            LexicalField::Name => (self.name_avg_len, &self.name_df),
            LexicalField::Content => (self.content_avg_len, &self.content_df),
        };
        let doc_len = doc_tokens.len() as f32;
        let n = self.doc_count as f32;

        let mut score = 0.0f32;
        for (i, qt) in query_tokens.iter().enumerate() {
            let tf = doc_tokens.iter().filter(|dt| fuzzy_match(qt, dt)).count() as f32;
            if tf == 0.0 {
                continue;
            }
            let df = df[i] as f32;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            let norm = 1.0 - BM25_B + BM25_B * doc_len / avg_len.max(1.0);
            score += idf * tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * norm);
        }
        score
    }
}

/// Automatic fuzziness: term length 0-2 exact, 3-5 one edit, 6+ two
fn fuzzy_match(query_token: &str, doc_token: &str) -> bool {
    if query_token == doc_token {
        return true;
    }
    let max_edits = match query_token.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    };
    if max_edits == 0 {
        return false;
    }
    bounded_levenshtein(query_token, doc_token, max_edits)
}

/// Levenshtein distance check with an upper bound
fn bounded_levenshtein(a: &str, b: &str, max_edits: usize) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max_edits {
        return false;
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1];
        let mut row_min = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let value = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
            row_min = row_min.min(value);
            current.push(value);
        }
        if row_min > max_edits {
            return false;
        }
        previous = current;
    }
    previous[b.len()] <= max_edits
}
