//! Document schema: combined embedding construction and ingest-time
//! validation
//!
//! The combined vector is built once, at write time, from fixed
//! index-time weights. Changing those weights requires re-indexing;
//! query-time adaptive deltas never touch stored vectors.

use std::sync::Arc;

use voucher_search_config::IndexFieldWeights;
use voucher_search_core::{
    normalize_in_place, Error, FieldEmbeddings, PriceRange, Result, Voucher,
};
use voucher_search_text::LocationRegistry;

/// Allowed deviation of a stored vector's norm from 1.0
const NORM_TOLERANCE: f32 = 1e-3;
/// Allowed per-element deviation between stored and recomputed combined
const COMBINED_TOLERANCE: f32 = 1e-4;

/// Weighted unit-normalized combination of the present field vectors
///
/// Missing fields are skipped; the final unit-normalization implicitly
/// renormalizes the remaining weights.
pub fn build_combined(embeddings: &FieldEmbeddings, weights: &IndexFieldWeights) -> Vec<f32> {
    let dimension = embeddings.content.len();
    let mut combined = vec![0.0f32; dimension];

    for (field, vector) in embeddings.present_fields() {
        let weight = weights.for_field(field);
        for (slot, value) in combined.iter_mut().zip(vector.iter()) {
            *slot += weight * value;
        }
    }

    normalize_in_place(&mut combined);
    combined
}

/// Ingest-time invariant checks
///
/// Every violation rejects the write with `InvalidDocument`; the core
/// never repairs documents at query time.
pub struct DocumentValidator {
    dimension: usize,
    weights: IndexFieldWeights,
    registry: Arc<LocationRegistry>,
}

impl DocumentValidator {
    pub fn new(
        dimension: usize,
        weights: IndexFieldWeights,
        registry: Arc<LocationRegistry>,
    ) -> Self {
        Self {
            dimension,
            weights,
            registry,
        }
    }

    pub fn validate(&self, voucher: &Voucher) -> Result<()> {
        if voucher.id.trim().is_empty() {
            return Err(Error::InvalidDocument("empty id".to_string()));
        }
        if voucher.name.trim().is_empty() {
            return Err(Error::InvalidDocument(format!(
                "voucher {} has an empty name",
                voucher.id
            )));
        }

        self.check_vector(&voucher.id, "content", &voucher.embeddings.content)?;
        self.check_vector(&voucher.id, "combined", &voucher.embeddings.combined)?;
        for (label, vector) in [
            ("name", &voucher.embeddings.name),
            ("location", &voucher.embeddings.location),
            ("service", &voucher.embeddings.service),
            ("target", &voucher.embeddings.target),
        ] {
            if let Some(vector) = vector {
                self.check_vector(&voucher.id, label, vector)?;
            }
        }

        self.check_combined(voucher)?;
        self.check_location(voucher)?;
        self.check_price(voucher)?;

        if !(0.0..=1.0).contains(&voucher.data_quality_score) {
            return Err(Error::InvalidDocument(format!(
                "voucher {} data_quality_score out of range",
                voucher.id
            )));
        }

        Ok(())
    }

    fn check_vector(&self, id: &str, label: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::InvalidDocument(format!(
                "voucher {id} field {label}: dimension {} != {}",
                vector.len(),
                self.dimension
            )));
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(Error::InvalidDocument(format!(
                "voucher {id} field {label}: norm {norm} is not unit-length"
            )));
        }
        Ok(())
    }

    fn check_combined(&self, voucher: &Voucher) -> Result<()> {
        let expected = build_combined(&voucher.embeddings, &self.weights);
        let max_diff = expected
            .iter()
            .zip(voucher.embeddings.combined.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        if max_diff > COMBINED_TOLERANCE {
            return Err(Error::InvalidDocument(format!(
                "voucher {}: combined embedding deviates from the weighted field sum by {max_diff}",
                voucher.id
            )));
        }
        Ok(())
    }

    fn check_location(&self, voucher: &Voucher) -> Result<()> {
        if voucher.location.is_unknown() {
            return Ok(());
        }
        let known = self
            .registry
            .canonical_names()
            .iter()
            .any(|name| *name == voucher.location.name);
        if !known {
            return Err(Error::InvalidDocument(format!(
                "voucher {}: location '{}' is not a canonical area",
                voucher.id, voucher.location.name
            )));
        }
        Ok(())
    }

    fn check_price(&self, voucher: &Voucher) -> Result<()> {
        let expected = PriceRange::from_price(voucher.price);
        if expected != voucher.price_range {
            return Err(Error::InvalidDocument(format!(
                "voucher {}: price_range {} inconsistent with price {:?} (expected {})",
                voucher.id, voucher.price_range, voucher.price, expected
            )));
        }
        Ok(())
    }
}
