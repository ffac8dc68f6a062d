// crates/data-delivery-core/src/runtime/memory.rs
// ============================================================================
// Module: Data Delivery In-Memory Backends
// Description: In-memory subscription registry and metadata catalog.
// Purpose: Provide deterministic backends for tests and local demos.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryRegistry`] implements [`RegistryGateway`] and [`OverlapDetector`]
//! over a mutex-protected map. [`InMemoryMetadataSource`] answers metadata
//! queries from a fixed catalog. Neither is intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::DataSetName;
use crate::core::DataType;
use crate::core::Envelope;
use crate::core::LevelName;
use crate::core::OverlapKind;
use crate::core::OverlapReport;
use crate::core::ParameterName;
use crate::core::ProviderName;
use crate::core::Subscription;
use crate::core::SubscriptionName;
use crate::core::UserId;
use crate::interfaces::MetadataError;
use crate::interfaces::MetadataSource;
use crate::interfaces::OverlapDetector;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistryGateway;

// ============================================================================
// SECTION: In-Memory Registry
// ============================================================================

/// In-memory subscription registry for tests and local demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistry {
    /// Subscriptions keyed by name, protected by a mutex.
    subscriptions: Arc<Mutex<BTreeMap<SubscriptionName, Subscription>>>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the given subscriptions.
    #[must_use]
    pub fn with_subscriptions(subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        let map = subscriptions
            .into_iter()
            .map(|subscription| (subscription.name.clone(), subscription))
            .collect();
        Self {
            subscriptions: Arc::new(Mutex::new(map)),
        }
    }

    /// Returns every stored subscription in name order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry lock is poisoned.
    pub fn all(&self) -> Result<Vec<Subscription>, RegistryError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Acquires the registry map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<SubscriptionName, Subscription>>, RegistryError> {
        self.subscriptions
            .lock()
            .map_err(|_| RegistryError::Handler("subscription registry mutex poisoned".to_string()))
    }
}

impl RegistryGateway for InMemoryRegistry {
    fn store(&self, _user: &UserId, subscription: &Subscription) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&subscription.name) {
            return Err(RegistryError::Handler(format!(
                "subscription {} already exists",
                subscription.name
            )));
        }
        guard.insert(subscription.name.clone(), subscription.clone());
        Ok(())
    }

    fn update(&self, _user: &UserId, subscription: &Subscription) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        let Some(existing) = guard.get_mut(&subscription.name) else {
            return Err(RegistryError::Handler(format!(
                "subscription {} not found",
                subscription.name
            )));
        };
        *existing = subscription.clone();
        Ok(())
    }

    fn update_all(
        &self,
        user: &UserId,
        subscriptions: &[Subscription],
    ) -> Result<(), RegistryError> {
        for subscription in subscriptions {
            self.update(user, subscription)?;
        }
        Ok(())
    }

    fn delete(&self, _user: &UserId, subscriptions: &[Subscription]) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        for subscription in subscriptions {
            guard.remove(&subscription.name);
        }
        Ok(())
    }

    fn get_by_name(&self, name: &SubscriptionName) -> Result<Option<Subscription>, RegistryError> {
        Ok(self.lock()?.get(name).cloned())
    }
}

impl OverlapDetector for InMemoryRegistry {
    fn check_overlap(&self, subscriptions: &[Subscription]) -> Result<OverlapReport, RegistryError> {
        let guard = self.lock()?;
        let mut duplicates = BTreeSet::new();
        let mut partial = BTreeSet::new();
        for candidate in subscriptions {
            for existing in guard.values() {
                if existing.name == candidate.name || existing.deleted || !existing.is_active() {
                    continue;
                }
                if !same_data_set(existing, candidate)
                    || !existing.coverage.intersects(&candidate.coverage)
                {
                    continue;
                }
                if existing.coverage.contains(&candidate.coverage)
                    && existing.time.covers(&candidate.time)
                {
                    duplicates.insert(existing.name.clone());
                } else {
                    partial.insert(existing.name.clone());
                }
            }
        }
        let report = if !duplicates.is_empty() {
            OverlapReport {
                kind: OverlapKind::Duplicate,
                subscription_names: duplicates,
            }
        } else if !partial.is_empty() {
            OverlapReport {
                kind: OverlapKind::Partial,
                subscription_names: partial,
            }
        } else {
            OverlapReport::none()
        };
        Ok(report)
    }
}

/// Returns true when both subscriptions request the same data set.
fn same_data_set(left: &Subscription, right: &Subscription) -> bool {
    left.provider == right.provider
        && left.data_set == right.data_set
        && left.data_type == right.data_type
}

// ============================================================================
// SECTION: In-Memory Metadata
// ============================================================================

/// Catalog entry describing one data set.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Data type of the data set.
    pub data_type: DataType,
    /// Provider serving the data set.
    pub provider: ProviderName,
    /// Data set name.
    pub data_set: DataSetName,
    /// Spatial coverage.
    pub coverage: Envelope,
    /// Parameters available.
    pub parameters: Vec<ParameterName>,
    /// Levels available.
    pub levels: Vec<LevelName>,
}

/// Metadata source answering from a fixed catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataSource {
    /// Catalog entries.
    entries: Vec<CatalogEntry>,
}

impl InMemoryMetadataSource {
    /// Creates a source over the given catalog.
    #[must_use]
    pub const fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
        }
    }

    /// Returns entries of the data type whose coverage meets the area.
    fn matching<'a>(
        &'a self,
        data_type: &'a DataType,
        area: Option<&'a Envelope>,
    ) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.iter().filter(move |entry| {
            &entry.data_type == data_type
                && area.is_none_or(|area| entry.coverage.intersects(area))
        })
    }
}

impl MetadataSource for InMemoryMetadataSource {
    fn providers(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<ProviderName>, MetadataError> {
        Ok(self.matching(data_type, area).map(|entry| entry.provider.clone()).collect())
    }

    fn data_sets(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<DataSetName>, MetadataError> {
        Ok(self.matching(data_type, area).map(|entry| entry.data_set.clone()).collect())
    }

    fn parameters(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<ParameterName>, MetadataError> {
        Ok(self.matching(data_type, area).flat_map(|entry| entry.parameters.iter().cloned()).collect())
    }

    fn levels(
        &self,
        data_type: &DataType,
        area: Option<&Envelope>,
    ) -> Result<Vec<LevelName>, MetadataError> {
        Ok(self.matching(data_type, area).flat_map(|entry| entry.levels.iter().cloned()).collect())
    }
}
