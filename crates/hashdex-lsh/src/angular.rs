//! Random-hyperplane LSH for angular (cosine) similarity.
//!
//! The classic construction from Mining of Massive Datasets, chapter 3:
//! sample `tables * hash_len` random hyperplanes; each table's code is the
//! concatenated sign bits of the vector's projections onto its `hash_len`
//! planes, prefixed with the table index so identical bit patterns from
//! different tables remain distinct index terms.

use rand::Rng;
use rand_distr::StandardNormal;

use hashdex_core::error::{MatchError, MatchResult};
use hashdex_core::tracing_config::TARGET_PREFIX;
use hashdex_core::traits::{HashingModel, dot, l2_normalize, magnitude};
use hashdex_core::types::HashAndFreq;

use crate::code_writer::CodeWriter;

/// Magnitudes inside `[1 - NORM_TOLERANCE, 1 + NORM_TOLERANCE]` are treated
/// as already normalized and hashed without copying.
const NORM_TOLERANCE: f32 = 0.01;

/// Locality-sensitive hashing model for angular similarity.
///
/// Hyperplane components are drawn i.i.d. standard normal from the
/// caller-supplied generator at construction; the model owns them
/// exclusively and never reseeds. Codes are deterministic for a fixed model
/// instance — deployments that persist indexed codes must pin the seed and
/// the `rand` major version together so a rebuilt model reproduces the same
/// plane set.
#[derive(Debug, Clone)]
pub struct AngularLshModel {
    dims: usize,
    tables: usize,
    hash_len: usize,
    /// Flat `(tables * hash_len) x dims` plane matrix, row-major.
    planes: Vec<f32>,
}

impl AngularLshModel {
    /// Sample a model: `tables` hash tables of `hash_len` hyperplanes each,
    /// for `dims`-dimensional vectors.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidConfig` when `dims`, `tables`, or
    /// `hash_len` is zero.
    pub fn new<R: Rng + ?Sized>(
        dims: usize,
        tables: usize,
        hash_len: usize,
        rng: &mut R,
    ) -> MatchResult<Self> {
        validate_dimensions(dims, tables, hash_len)?;
        let planes = (0..tables * hash_len * dims)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        tracing::debug!(
            target: TARGET_PREFIX,
            dimension = dims,
            tables,
            hash_length = hash_len,
            "sampled angular LSH hyperplanes"
        );
        Ok(Self {
            dims,
            tables,
            hash_len,
            planes,
        })
    }

    /// Build a model over an explicit plane matrix. Test seam; `new` is the
    /// production entry point.
    fn from_planes(
        dims: usize,
        tables: usize,
        hash_len: usize,
        planes: Vec<f32>,
    ) -> MatchResult<Self> {
        validate_dimensions(dims, tables, hash_len)?;
        if planes.len() != tables * hash_len * dims {
            return Err(MatchError::InvalidConfig {
                field: "planes".to_owned(),
                value: planes.len().to_string(),
                reason: format!("expected tables * hash_len * dims = {}", tables * hash_len * dims),
            });
        }
        Ok(Self {
            dims,
            tables,
            hash_len,
            planes,
        })
    }

    /// Number of hash tables (codes emitted per vector).
    #[must_use]
    pub const fn tables(&self) -> usize {
        self.tables
    }

    /// Number of sign bits per table code.
    #[must_use]
    pub const fn hash_len(&self) -> usize {
        self.hash_len
    }

    fn plane(&self, table: usize, bit: usize) -> &[f32] {
        let row = table * self.hash_len + bit;
        &self.planes[row * self.dims..(row + 1) * self.dims]
    }
}

impl HashingModel for AngularLshModel {
    fn dimension(&self) -> usize {
        self.dims
    }

    fn hash(&self, vector: &[f32]) -> MatchResult<Vec<HashAndFreq>> {
        if vector.len() != self.dims {
            return Err(MatchError::DimensionMismatch {
                expected: self.dims,
                found: vector.len(),
            });
        }

        // Angular LSH depends on unit vectors; copy only when needed.
        let normalized;
        let values: &[f32] = if (magnitude(vector) - 1.0).abs() <= NORM_TOLERANCE {
            vector
        } else {
            normalized = l2_normalize(vector);
            &normalized
        };

        let mut codes = Vec::with_capacity(self.tables);
        for table in 0..self.tables {
            #[allow(clippy::cast_possible_truncation)]
            let prefix = (table as u32).to_le_bytes();
            let mut writer = CodeWriter::with_prefix(&prefix);
            for bit in 0..self.hash_len {
                writer.push(dot(self.plane(table, bit), values) > 0.0);
            }
            codes.push(HashAndFreq::once(writer.into_bytes()));
        }
        Ok(codes)
    }
}

fn validate_dimensions(dims: usize, tables: usize, hash_len: usize) -> MatchResult<()> {
    for (field, value) in [("dims", dims), ("tables", tables), ("hash_len", hash_len)] {
        if value == 0 {
            return Err(MatchError::InvalidConfig {
                field: field.to_owned(),
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
    }
    Ok(())
}
