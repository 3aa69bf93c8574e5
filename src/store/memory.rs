//! In-process store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{ParameterStore, check_scope, decode_scope};
use crate::error::Result;
use crate::ink::CalibrationFamily;
use crate::params::CalibrationParameters;

/// [`ParameterStore`] holding records in memory.
///
/// Records are kept as JSON values so that legacy or hand-edited records can
/// be seeded with [`MemoryStore::insert_raw`] and go through the same
/// validation as a file-backed load.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Option<CalibrationFamily>, serde_json::Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record without validation.
    pub fn insert_raw(&self, family: Option<CalibrationFamily>, value: serde_json::Value) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(family, value);
    }
}

impl ParameterStore for MemoryStore {
    fn load(&self, family: Option<CalibrationFamily>) -> Result<Option<CalibrationParameters>> {
        let value = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&family)
            .cloned();
        value.map(|v| decode_scope(v, family)).transpose()
    }

    fn save(&self, params: &CalibrationParameters, family: Option<CalibrationFamily>) -> Result<()> {
        let params = check_scope(params.clone(), family)?;
        let value = serde_json::to_value(params)?;
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(family, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ink::Channel;

    #[test]
    fn test_scopes_are_independent() {
        let store = MemoryStore::new();
        let mut special = CalibrationParameters::default();
        special.base_consumption.set(Channel::Gloss, 0.05);
        store.save(&special, Some(CalibrationFamily::Special)).unwrap();

        assert_eq!(store.load(None).unwrap(), None);
        assert_eq!(store.load(Some(CalibrationFamily::Standard)).unwrap(), None);
        assert_eq!(store.load(Some(CalibrationFamily::Special)).unwrap(), Some(special));
    }

    #[test]
    fn test_family_record_only_checks_own_channels() {
        let store = MemoryStore::new();
        let mut params = CalibrationParameters::default();
        // out of band for a standard channel, irrelevant to the special scope
        params.channel_scaling_factor.set(Channel::Yellow, 0.5);
        store.save(&params, Some(CalibrationFamily::Special)).unwrap();
        assert!(store.save(&params, Some(CalibrationFamily::Standard)).is_err());
        assert!(store.save(&params, None).is_err());
    }

    #[test]
    fn test_concurrent_saves() {
        let store = MemoryStore::new();
        std::thread::scope(|s| {
            for i in 0..4u32 {
                let store = &store;
                s.spawn(move || {
                    let mut params = CalibrationParameters::default();
                    params
                        .channel_scaling_factor
                        .set(Channel::Cyan, 0.0001 * f64::from(i + 1));
                    store.save(&params, None).unwrap();
                });
            }
        });
        let loaded = store.load(None).unwrap().unwrap();
        let cyan = *loaded.channel_scaling_factor.get(Channel::Cyan);
        assert!([0.0001, 0.0002, 0.0003, 0.0004].iter().any(|v| (v - cyan).abs() < 1e-12));
    }
}
