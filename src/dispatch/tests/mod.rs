//! Unit tests for the dispatch module.
//!
//! Tests are organised by component, covering happy paths, rejection paths,
//! and the edge cases of trigger matching and argument collection.
