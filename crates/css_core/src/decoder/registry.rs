//! Name-based decoder registry.
//!
//! Backends register a factory under one or more case-insensitive names.
//! `get` is the strict lookup; `select` falls back to the default backend
//! with a warning when the requested name is unknown.

use super::{Decoder, MatchingDecoder, UnionFindDecoder};
use crate::QecError;
use crate::dem::DetectorErrorModel;
use log::warn;
use std::collections::BTreeMap;

/// Constructs a backend for a detector error model.
pub type DecoderFactory = fn(&DetectorErrorModel) -> Result<Box<dyn Decoder>, QecError>;

/// Name of the backend `select` falls back to.
pub const DEFAULT_DECODER: &str = "matching";

fn build_matching(dem: &DetectorErrorModel) -> Result<Box<dyn Decoder>, QecError> {
    Ok(Box::new(MatchingDecoder::new(dem)?))
}

fn build_union_find(dem: &DetectorErrorModel) -> Result<Box<dyn Decoder>, QecError> {
    Ok(Box::new(UnionFindDecoder::new(dem)?))
}

#[derive(Clone)]
pub struct DecoderRegistry {
    factories: BTreeMap<String, DecoderFactory>,
    default: String,
}

impl DecoderRegistry {
    /// Registry with no backends.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
            default: DEFAULT_DECODER.to_string(),
        }
    }

    /// Registry with the built-in matching and union-find backends.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for name in ["matching", "mwpm", "pymatching"] {
            registry.register(name, build_matching);
        }
        for name in ["union_find", "union-find", "unionfind", "uf"] {
            registry.register(name, build_union_find);
        }
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, factory: DecoderFactory) {
        self.factories.insert(name.to_ascii_lowercase(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Builds the backend registered under `name`.
    ///
    /// # Returns
    ///
    /// `DecoderUnavailable` if no backend has that name.
    pub fn get(&self, name: &str, dem: &DetectorErrorModel) -> Result<Box<dyn Decoder>, QecError> {
        let factory = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| QecError::DecoderUnavailable(name.to_string()))?;
        factory(dem)
    }

    /// Builds the requested backend, or the default one if `name` is `None`
    /// or unknown.
    pub fn select(
        &self,
        name: Option<&str>,
        dem: &DetectorErrorModel,
    ) -> Result<Box<dyn Decoder>, QecError> {
        match name {
            Some(n) if self.contains(n) => self.get(n, dem),
            Some(n) => {
                warn!(
                    "decoder '{}' is not available, falling back to '{}'",
                    n, self.default
                );
                self.get(&self.default, dem)
            }
            None => self.get(&self.default, dem),
        }
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
