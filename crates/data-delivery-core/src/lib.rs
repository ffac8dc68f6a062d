// crates/data-delivery-core/src/lib.rs
// ============================================================================
// Module: Data Delivery Core Library
// Description: Public API surface for the Data Delivery core.
// Purpose: Expose subscription types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Data Delivery core negotiates subscription changes against a bandwidth
//! manager so the scheduler and the subscription registry never disagree, and
//! caches the metadata subscription dialogs offer. It is backend-agnostic and
//! integrates through explicit interfaces rather than a specific transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::BandwidthError;
pub use interfaces::BandwidthService;
pub use interfaces::ForceApplyPrompt;
pub use interfaces::MetadataError;
pub use interfaces::MetadataSource;
pub use interfaces::NotificationError;
pub use interfaces::NotificationSender;
pub use interfaces::OverlapDetector;
pub use interfaces::RegistryError;
pub use interfaces::RegistryGateway;
pub use runtime::CatalogEntry;
pub use runtime::Facet;
pub use runtime::FacetOutcome;
pub use runtime::InMemoryMetadataSource;
pub use runtime::InMemoryRegistry;
pub use runtime::MetadataCache;
pub use runtime::MetadataCacheConfig;
pub use runtime::MutationPlan;
pub use runtime::RefreshReport;
pub use runtime::Resolution;
pub use runtime::ResolutionContext;
pub use runtime::ServiceError;
pub use runtime::SubscriptionService;
pub use runtime::SubscriptionServiceConfig;
