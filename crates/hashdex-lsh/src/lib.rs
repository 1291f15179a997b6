//! Locality-sensitive hashing models for hashdex.
//!
//! A [`hashdex_core::HashingModel`] turns a dense vector into an ordered
//! sequence of weighted hash codes that double as index terms. This crate
//! ships the angular (cosine) variant, [`AngularLshModel`], plus the
//! [`CodeWriter`] bit-packing buffer models build their codes with.
//!
//! Models for other similarity metrics implement the same trait; there is
//! deliberately no model base type beyond it.

pub mod angular;
pub mod code_writer;

pub use angular::AngularLshModel;
pub use code_writer::CodeWriter;
