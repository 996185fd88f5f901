//! Caching adapters.

pub mod narrative_cache;

pub use narrative_cache::NarrativeCache;
