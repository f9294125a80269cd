//! Test Module
//!
//! Cross-module test suite for the SiteChat engine.
//!
//! ## Test Categories
//! - `knowledge_tests`: payload normalization and write-merge behavior
//! - `brain_tests`: intent, matching, composition and the personality pass
//! - `responder_tests`: end-to-end requests against an in-memory store

pub mod knowledge_tests;
pub mod responder_tests;
