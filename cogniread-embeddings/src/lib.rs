//! Deterministic text embeddings derived from a SHA-256 digest.
//!
//! The vector is not semantic; it stands in for a model until one is wired up.
//! Each digest byte `b` becomes `b / 255`, so every component lies in `[0, 1]`.
//! Dimensions up to [`DIGEST_LEN`] take a prefix of the digest values; larger
//! dimensions repeat the digest values cyclically and truncate.
//!
//! ```
//! use cogniread_embeddings::Embedder;
//!
//! let embedder = Embedder::new(16).unwrap();
//! let v = embedder.embed("hello");
//! assert_eq!(v.len(), 16);
//! assert_eq!(v, embedder.embed("hello"));
//! ```

use std::num::NonZeroUsize;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of bytes in a SHA-256 digest, and the period of the tiling pattern.
pub const DIGEST_LEN: usize = 32;

/// Ordered sequence of floats in `[0, 1]`, one per dimension.
pub type EmbeddingVector = Vec<f64>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("embedding dimension must be a positive integer")]
    ZeroDimension,
}

/// Compute the embedding of `text` with exactly `dim` components.
pub fn embed(text: &str, dim: NonZeroUsize) -> EmbeddingVector {
    let digest = Sha256::digest(text.as_bytes());
    digest
        .iter()
        .map(|&b| f64::from(b) / 255.0)
        .cycle()
        .take(dim.get())
        .collect()
}

/// Embedder bound to a fixed output dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embedder {
    dim: NonZeroUsize,
}

impl Embedder {
    pub fn new(dim: usize) -> Result<Self, EmbeddingError> {
        NonZeroUsize::new(dim)
            .map(|dim| Self { dim })
            .ok_or(EmbeddingError::ZeroDimension)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim.get()
    }

    #[inline]
    pub fn embed(&self, text: &str) -> EmbeddingVector {
        embed(text, self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    // sha256("hello")
    const HELLO_DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn hello_matches_digest_bytes() {
        let bytes = hex::decode(HELLO_DIGEST).unwrap();
        let v = embed("hello", dim(16));
        assert_eq!(v.len(), 16);
        assert_eq!(v[0], f64::from(bytes[0]) / 255.0);
        assert_eq!(v[0], 44.0 / 255.0);
        for (value, byte) in v.iter().zip(&bytes) {
            assert_eq!(*value, f64::from(*byte) / 255.0);
        }
    }

    #[test]
    fn length_and_range_hold_for_many_dimensions() {
        let long = "x".repeat(20_000);
        for d in [1, 2, 16, 31, 32, 33, 64, 100, 1000] {
            for text in ["a", "hello", "ünïcödé ✓", long.as_str()] {
                let v = embed(text, dim(d));
                assert_eq!(v.len(), d);
                assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
            }
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(embed("same input", dim(48)), embed("same input", dim(48)));
        assert_ne!(embed("one", dim(16)), embed("two", dim(16)));
    }

    #[test]
    fn prefix_property_within_digest_length() {
        let long = embed("prefix", dim(DIGEST_LEN));
        for d in 1..=DIGEST_LEN {
            assert_eq!(embed("prefix", dim(d))[..], long[..d]);
        }
    }

    #[test]
    fn tiling_repeats_every_digest_length() {
        let v = embed("tile me", dim(DIGEST_LEN * 3 + 5));
        for i in DIGEST_LEN..v.len() {
            assert_eq!(v[i], v[i - DIGEST_LEN]);
        }
        assert_eq!(v[..DIGEST_LEN], embed("tile me", dim(DIGEST_LEN))[..]);
    }

    #[test]
    fn embedder_rejects_zero_dimension() {
        assert_eq!(Embedder::new(0), Err(EmbeddingError::ZeroDimension));
        let e = Embedder::new(7).unwrap();
        assert_eq!(e.dim(), 7);
        assert_eq!(e.embed("abc"), embed("abc", dim(7)));
    }
}
