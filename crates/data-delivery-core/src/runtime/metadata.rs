// crates/data-delivery-core/src/runtime/metadata.rs
// ============================================================================
// Module: Data Delivery Metadata Cache
// Description: Lazily populated cache of available providers, data sets,
//              parameters, and levels for a data type and area.
// Purpose: Keep subscription dialogs responsive without repeating remote queries.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! [`MetadataCache`] holds four independent facet sets for the selected data
//! type and area. [`MetadataCache::reread_metadata`] only raises a flag; the
//! next [`MetadataCache::read_metadata`] clears every facet and fetches all four
//! in parallel, one worker thread per facet, waiting at most the configured
//! facet timeout.
//!
//! Invariants:
//! - A facet set is published by swapping a fully built `Arc`; readers never
//!   observe a partially built set.
//! - A facet that fails or times out stays unpopulated, so the next getter
//!   queries it again on demand.
//! - Results from a superseded refresh are discarded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::DataSetName;
use crate::core::DataType;
use crate::core::Envelope;
use crate::core::LevelName;
use crate::core::ParameterName;
use crate::core::ProviderName;
use crate::interfaces::MetadataError;
use crate::interfaces::MetadataSource;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default time a refresh waits for its facet queries.
pub const DEFAULT_FACET_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataCacheConfig {
    /// Maximum time a refresh waits for the facet queries.
    pub facet_timeout: Duration,
}

impl Default for MetadataCacheConfig {
    fn default() -> Self {
        Self {
            facet_timeout: DEFAULT_FACET_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Refresh Report
// ============================================================================

/// Metadata facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    /// Data providers.
    Providers,
    /// Data set names.
    DataSets,
    /// Parameter names.
    Parameters,
    /// Level names.
    Levels,
}

impl Facet {
    /// Every facet, in refresh order.
    pub const ALL: [Self; 4] = [Self::Providers, Self::DataSets, Self::Parameters, Self::Levels];

    /// Returns a stable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Providers => "providers",
            Self::DataSets => "data_sets",
            Self::Parameters => "parameters",
            Self::Levels => "levels",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of fetching one facet during a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetOutcome {
    /// Facet loaded with the given number of entries.
    Loaded(usize),
    /// Facet query failed.
    Failed(String),
    /// Facet query did not finish before the deadline.
    TimedOut,
}

/// Partial-result report of a metadata refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// False when no refresh was pending and the cache was left untouched.
    pub refreshed: bool,
    /// Outcome per facet.
    pub outcomes: BTreeMap<Facet, FacetOutcome>,
}

impl RefreshReport {
    /// Returns true when every fetched facet loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(|outcome| matches!(outcome, FacetOutcome::Loaded(_)))
    }

    /// Returns the facets that failed or timed out.
    #[must_use]
    pub fn incomplete_facets(&self) -> Vec<Facet> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, FacetOutcome::Loaded(_)))
            .map(|(facet, _)| *facet)
            .collect()
    }
}

// ============================================================================
// SECTION: Cache State
// ============================================================================

/// Mutable cache state behind the lock.
#[derive(Debug)]
struct CacheState {
    /// Selected data type.
    data_type: Option<DataType>,
    /// Spatial filter.
    area: Option<Envelope>,
    /// Whether the next read discards and refetches.
    reread: bool,
    /// Incremented whenever facets are cleared; stale results are dropped.
    generation: u64,
    /// Cached providers.
    providers: Option<Arc<BTreeSet<ProviderName>>>,
    /// Cached data set names.
    data_sets: Option<Arc<BTreeSet<DataSetName>>>,
    /// Cached parameter names.
    parameters: Option<Arc<BTreeSet<ParameterName>>>,
    /// Cached level names.
    levels: Option<Arc<BTreeSet<LevelName>>>,
}

impl CacheState {
    /// Drops every cached facet.
    fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.providers = None;
        self.data_sets = None;
        self.parameters = None;
        self.levels = None;
    }
}

/// Facet entries returned by a worker.
enum FacetData {
    /// Provider entries.
    Providers(Vec<ProviderName>),
    /// Data set entries.
    DataSets(Vec<DataSetName>),
    /// Parameter entries.
    Parameters(Vec<ParameterName>),
    /// Level entries.
    Levels(Vec<LevelName>),
}

impl FacetData {
    /// Publishes the entries into the state and returns the set size.
    fn publish(self, state: &mut CacheState) -> usize {
        match self {
            Self::Providers(entries) => publish_set(&mut state.providers, entries),
            Self::DataSets(entries) => publish_set(&mut state.data_sets, entries),
            Self::Parameters(entries) => publish_set(&mut state.parameters, entries),
            Self::Levels(entries) => publish_set(&mut state.levels, entries),
        }
    }
}

/// Builds a set and swaps it into the slot.
fn publish_set<T: Ord>(slot: &mut Option<Arc<BTreeSet<T>>>, entries: Vec<T>) -> usize {
    let set: BTreeSet<T> = entries.into_iter().collect();
    let count = set.len();
    *slot = Some(Arc::new(set));
    count
}

/// Runs one facet query.
fn fetch_facet(
    source: &dyn MetadataSource,
    facet: Facet,
    data_type: &DataType,
    area: Option<&Envelope>,
) -> Result<FacetData, MetadataError> {
    match facet {
        Facet::Providers => source.providers(data_type, area).map(FacetData::Providers),
        Facet::DataSets => source.data_sets(data_type, area).map(FacetData::DataSets),
        Facet::Parameters => source.parameters(data_type, area).map(FacetData::Parameters),
        Facet::Levels => source.levels(data_type, area).map(FacetData::Levels),
    }
}

// ============================================================================
// SECTION: Metadata Cache
// ============================================================================

/// Cache of available metadata for the selected data type and area.
pub struct MetadataCache {
    /// Remote catalog.
    source: Arc<dyn MetadataSource>,
    /// Cache configuration.
    config: MetadataCacheConfig,
    /// Cached facets and selection.
    state: RwLock<CacheState>,
}

impl MetadataCache {
    /// Creates an empty cache. The first read always fetches.
    #[must_use]
    pub fn new(source: Arc<dyn MetadataSource>, config: MetadataCacheConfig) -> Self {
        Self {
            source,
            config,
            state: RwLock::new(CacheState {
                data_type: None,
                area: None,
                reread: true,
                generation: 0,
                providers: None,
                data_sets: None,
                parameters: None,
                levels: None,
            }),
        }
    }

    /// Returns the cache configuration.
    #[must_use]
    pub const fn config(&self) -> &MetadataCacheConfig {
        &self.config
    }

    /// Sets the spatial filter used by subsequent fetches.
    pub fn set_area(&self, area: Option<Envelope>) {
        self.write_state().area = area;
    }

    /// Requests a full refetch on the next [`Self::read_metadata`].
    pub fn reread_metadata(&self) {
        self.write_state().reread = true;
    }

    /// Returns the selected data type.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        self.read_state().data_type.clone()
    }

    /// Refetches every facet for `data_type` when a reread is pending.
    pub fn read_metadata(&self, data_type: &DataType) -> RefreshReport {
        let (area, generation) = {
            let mut state = self.write_state();
            if !state.reread {
                return RefreshReport::default();
            }
            state.reread = false;
            state.clear();
            state.data_type = Some(data_type.clone());
            (state.area, state.generation)
        };
        debug!(data_type = %data_type, "refreshing metadata");

        let (sender, receiver) = mpsc::channel();
        let mut outcomes = BTreeMap::new();
        let mut pending = BTreeSet::new();
        for facet in Facet::ALL {
            let source = Arc::clone(&self.source);
            let sender = sender.clone();
            let data_type = data_type.clone();
            let spawned = thread::Builder::new()
                .name(format!("metadata-{}", facet.label()))
                .spawn(move || {
                    let result = fetch_facet(source.as_ref(), facet, &data_type, area.as_ref());
                    let _ = sender.send((facet, result));
                });
            match spawned {
                Ok(_) => {
                    pending.insert(facet);
                }
                Err(err) => {
                    warn!(facet = %facet, error = %err, "unable to start metadata worker");
                    outcomes.insert(facet, FacetOutcome::Failed(err.to_string()));
                }
            }
        }
        drop(sender);

        let deadline = Instant::now() + self.config.facet_timeout;
        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok((facet, result)) = receiver.recv_timeout(remaining) else {
                break;
            };
            pending.remove(&facet);
            let outcome = match result {
                Ok(data) => {
                    let mut state = self.write_state();
                    if state.generation == generation {
                        FacetOutcome::Loaded(data.publish(&mut state))
                    } else {
                        FacetOutcome::Failed("refresh superseded".to_string())
                    }
                }
                Err(err) => {
                    warn!(facet = %facet, data_type = %data_type, error = %err, "metadata query failed");
                    FacetOutcome::Failed(err.to_string())
                }
            };
            outcomes.insert(facet, outcome);
        }
        for facet in pending {
            warn!(facet = %facet, data_type = %data_type, "metadata query timed out");
            outcomes.insert(facet, FacetOutcome::TimedOut);
        }

        let report = RefreshReport {
            refreshed: true,
            outcomes,
        };
        info!(
            data_type = %data_type,
            complete = report.is_complete(),
            "metadata refresh finished"
        );
        report
    }

    /// Returns the available providers, fetching them if unpopulated.
    pub fn available_data_providers(&self) -> Arc<BTreeSet<ProviderName>> {
        self.facet_or_fetch(
            Facet::Providers,
            |state| state.providers.clone(),
            |source, data_type, area| source.providers(data_type, area),
            |state, set| state.providers = Some(set),
        )
    }

    /// Returns the available data set names, fetching them if unpopulated.
    pub fn available_data_sets(&self) -> Arc<BTreeSet<DataSetName>> {
        self.facet_or_fetch(
            Facet::DataSets,
            |state| state.data_sets.clone(),
            |source, data_type, area| source.data_sets(data_type, area),
            |state, set| state.data_sets = Some(set),
        )
    }

    /// Returns the available parameter names, fetching them if unpopulated.
    pub fn available_parameters(&self) -> Arc<BTreeSet<ParameterName>> {
        self.facet_or_fetch(
            Facet::Parameters,
            |state| state.parameters.clone(),
            |source, data_type, area| source.parameters(data_type, area),
            |state, set| state.parameters = Some(set),
        )
    }

    /// Returns the available level names, fetching them if unpopulated.
    pub fn available_levels(&self) -> Arc<BTreeSet<LevelName>> {
        self.facet_or_fetch(
            Facet::Levels,
            |state| state.levels.clone(),
            |source, data_type, area| source.levels(data_type, area),
            |state, set| state.levels = Some(set),
        )
    }

    /// Returns a cached facet or queries it on demand.
    ///
    /// Failures yield an empty set that is not cached.
    fn facet_or_fetch<T, G, F, P>(&self, facet: Facet, get: G, fetch: F, put: P) -> Arc<BTreeSet<T>>
    where
        T: Ord,
        G: Fn(&CacheState) -> Option<Arc<BTreeSet<T>>>,
        F: FnOnce(
            &dyn MetadataSource,
            &DataType,
            Option<&Envelope>,
        ) -> Result<Vec<T>, MetadataError>,
        P: FnOnce(&mut CacheState, Arc<BTreeSet<T>>),
    {
        let (data_type, area, generation) = {
            let state = self.read_state();
            if let Some(set) = get(&state) {
                return set;
            }
            let Some(data_type) = state.data_type.clone() else {
                return Arc::new(BTreeSet::new());
            };
            (data_type, state.area, state.generation)
        };
        match fetch(self.source.as_ref(), &data_type, area.as_ref()) {
            Ok(entries) => {
                let set: Arc<BTreeSet<T>> = Arc::new(entries.into_iter().collect());
                let mut state = self.write_state();
                if state.generation == generation {
                    put(&mut state, Arc::clone(&set));
                }
                set
            }
            Err(err) => {
                warn!(facet = %facet, data_type = %data_type, error = %err, "metadata query failed");
                Arc::new(BTreeSet::new())
            }
        }
    }

    /// Acquires the state for reading, recovering from poisoning.
    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the state for writing, recovering from poisoning.
    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
