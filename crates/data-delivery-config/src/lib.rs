// crates/data-delivery-config/src/lib.rs
// ============================================================================
// Module: Data Delivery Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for data-delivery.toml semantics.
// Dependencies: data-delivery-core, serde, toml
// ============================================================================

//! ## Overview
//! `data-delivery-config` defines the configuration model for Data Delivery
//! hosts. It provides strict, fail-closed validation and converts validated
//! settings into the runtime configuration types of `data-delivery-core`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
