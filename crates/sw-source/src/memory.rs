use std::collections::BTreeMap;

use sw_schemas::{BusinessHoursRule, PollingObservation, StoreId, StoreTimezoneRecord};

use crate::{SourceError, StoreDataSource};

#[derive(Debug, Clone, Default)]
struct StoreRows {
    timezone: Option<String>,
    hours: Vec<BusinessHoursRule>,
    observations: Vec<PollingObservation>,
}

/// Rows held in memory, keyed by store.
///
/// The store directory is the set of stores with at least one poll, which
/// mirrors the distinct-store query against the polling table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreDataSource {
    stores: BTreeMap<StoreId, StoreRows>,
}

impl MemoryStoreDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(
        observations: Vec<PollingObservation>,
        hours: Vec<BusinessHoursRule>,
        timezones: Vec<StoreTimezoneRecord>,
    ) -> Self {
        let mut src = Self::new();
        for o in observations {
            src.push_observation(o);
        }
        for h in hours {
            src.push_hours(h);
        }
        for tz in timezones {
            src.set_timezone(&tz.store_id, tz.timezone_name);
        }
        src
    }

    pub fn push_observation(&mut self, obs: PollingObservation) {
        self.stores
            .entry(obs.store_id.clone())
            .or_default()
            .observations
            .push(obs);
    }

    pub fn push_hours(&mut self, rule: BusinessHoursRule) {
        self.stores
            .entry(rule.store_id.clone())
            .or_default()
            .hours
            .push(rule);
    }

    /// First record for a store wins, as with a `LIMIT 1` lookup.
    pub fn set_timezone(&mut self, store_id: &str, timezone_name: String) {
        let entry = self.stores.entry(store_id.to_string()).or_default();
        if entry.timezone.is_none() {
            entry.timezone = Some(timezone_name);
        }
    }

    pub fn observation_count(&self) -> usize {
        self.stores.values().map(|s| s.observations.len()).sum()
    }
}

#[async_trait::async_trait]
impl StoreDataSource for MemoryStoreDataSource {
    fn source_name(&self) -> &'static str {
        "memory"
    }

    async fn list_store_ids(&self) -> Result<Vec<StoreId>, SourceError> {
        Ok(self
            .stores
            .iter()
            .filter(|(_, rows)| !rows.observations.is_empty())
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn get_timezone(&self, store_id: &str) -> Result<Option<String>, SourceError> {
        Ok(self.stores.get(store_id).and_then(|s| s.timezone.clone()))
    }

    async fn get_business_hours(&self, store_id: &str) -> Result<Vec<BusinessHoursRule>, SourceError> {
        Ok(self
            .stores
            .get(store_id)
            .map(|s| s.hours.clone())
            .unwrap_or_default())
    }

    async fn get_observations(&self, store_id: &str) -> Result<Vec<PollingObservation>, SourceError> {
        Ok(self
            .stores
            .get(store_id)
            .map(|s| s.observations.clone())
            .unwrap_or_default())
    }
}
