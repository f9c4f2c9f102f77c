//! Shared types for leakwatch: identifier descriptors, fingerprints, leak
//! records, browser-facing messages and the traits the detector uses to
//! reach the browser.

pub mod collaborators;
pub mod config;
pub mod domain;
pub mod fingerprint;
pub mod identifiers;
pub mod messages;
pub mod models;
pub mod tracker_domains;
