// crates/data-delivery-core/src/runtime/mod.rs
// ============================================================================
// Module: Data Delivery Runtime
// Description: Schedule negotiation, force-apply resolution, metadata caching,
//              and in-memory backends.
// Purpose: Execute subscription changes against the Data Delivery interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the subscription service state machine, the pure
//! force-apply resolution it delegates to, and the metadata cache used by
//! subscription dialogs. All mutation entry points go through the same
//! negotiation path.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod memory;
pub mod metadata;
pub mod negotiator;
pub mod resolution;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use memory::CatalogEntry;
pub use memory::InMemoryMetadataSource;
pub use memory::InMemoryRegistry;
pub use metadata::DEFAULT_FACET_TIMEOUT;
pub use metadata::Facet;
pub use metadata::FacetOutcome;
pub use metadata::MetadataCache;
pub use metadata::MetadataCacheConfig;
pub use metadata::RefreshReport;
pub use negotiator::NO_SUBSCRIPTIONS_MESSAGE;
pub use negotiator::ServiceError;
pub use negotiator::SubscriptionService;
pub use negotiator::SubscriptionServiceConfig;
pub use resolution::MutationPlan;
pub use resolution::Resolution;
pub use resolution::ResolutionContext;
pub use resolution::offered_options;
pub use resolution::prompt_configuration;
pub use resolution::resolve;
