//! Persistence of calibration parameters.
//!
//! Parameters are stored in three scopes: a combined record (`None`) and one
//! record per [`CalibrationFamily`]. Every implementation validates on the way
//! in and on the way out, so a defective record (for example scaling factors
//! persisted 100x too small) is rejected at load instead of reaching an
//! estimate. [`load_merged`] resolves the scopes into one usable record.

mod json;
mod memory;

use tracing::warn;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{Error, Result};
use crate::ink::CalibrationFamily;
use crate::params::{
    CalibrationParameters, MergedParameters, ParameterSource, merge_by_channel_group, validate_scoped,
};

/// Storage backend for calibration parameters.
///
/// `family = None` addresses the combined record.
pub trait ParameterStore: Send + Sync {
    /// Load and validate the record of a scope. `Ok(None)` when nothing is stored.
    fn load(&self, family: Option<CalibrationFamily>) -> Result<Option<CalibrationParameters>>;

    /// Validate and store the record of a scope, replacing any previous one.
    fn save(&self, params: &CalibrationParameters, family: Option<CalibrationFamily>) -> Result<()>;
}

/// Name of a scope in file names, logs and errors.
#[must_use]
pub fn scope_name(family: Option<CalibrationFamily>) -> &'static str {
    match family {
        None => "combined",
        Some(CalibrationFamily::Standard) => "standard",
        Some(CalibrationFamily::Special) => "special",
    }
}

/// Check a record against the bands of its scope.
///
/// A family record only vouches for its own channels; the combined record
/// vouches for all of them.
pub(crate) fn check_scope(
    params: CalibrationParameters,
    family: Option<CalibrationFamily>,
) -> Result<CalibrationParameters> {
    Ok(validate_scoped(params, family)?)
}

/// Decode a stored JSON value and check it against its scope.
pub(crate) fn decode_scope(
    value: serde_json::Value,
    family: Option<CalibrationFamily>,
) -> Result<CalibrationParameters> {
    let params = CalibrationParameters::decode_json_value(value)?;
    check_scope(params, family)
}

/// Save, read back and compare.
///
/// A store that does not return exactly what was written yields
/// [`Error::StoreMismatch`].
pub fn save_verified(
    store: &dyn ParameterStore,
    params: &CalibrationParameters,
    family: Option<CalibrationFamily>,
) -> Result<()> {
    store.save(params, family)?;
    match store.load(family)? {
        Some(stored) if stored == *params => Ok(()),
        _ => Err(Error::StoreMismatch {
            scope: scope_name(family).to_string(),
        }),
    }
}

/// Load all three scopes and merge them over `defaults`.
///
/// A scope that fails to load (I/O, corrupt JSON, band violation) is logged
/// and treated as absent, so the result always holds usable parameters.
pub fn load_merged(store: &dyn ParameterStore, defaults: &CalibrationParameters) -> MergedParameters {
    let load = |family: Option<CalibrationFamily>| match store.load(family) {
        Ok(params) => params,
        Err(e) => {
            warn!(scope = scope_name(family), error = %e, "ignoring stored parameters");
            None
        }
    };
    let standard = load(Some(CalibrationFamily::Standard));
    let special = load(Some(CalibrationFamily::Special));
    let combined = load(None);

    let merged = merge_by_channel_group(
        standard.as_ref(),
        special.as_ref(),
        combined.as_ref(),
        defaults,
    );
    if merged.area_source == ParameterSource::Default
        && merged
            .channel_sources
            .iter()
            .all(|(_, s)| *s == ParameterSource::Default)
    {
        tracing::info!("no stored parameters usable, using defaults");
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ink::Channel;

    fn defective() -> CalibrationParameters {
        let mut p = CalibrationParameters::default();
        p.channel_scaling_factor.set(Channel::Cyan, 0.000_003_9);
        p
    }

    #[test]
    fn test_scope_names() {
        assert_eq!(scope_name(None), "combined");
        assert_eq!(scope_name(Some(CalibrationFamily::Special)), "special");
    }

    #[test]
    fn test_save_verified_roundtrip() {
        let store = MemoryStore::new();
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Black, 0.000_412_37);
        save_verified(&store, &params, Some(CalibrationFamily::Standard)).unwrap();
        assert_eq!(store.load(Some(CalibrationFamily::Standard)).unwrap(), Some(params));
    }

    /// Accepts every save and keeps none of them.
    struct Forgetful;

    impl ParameterStore for Forgetful {
        fn load(&self, _family: Option<CalibrationFamily>) -> Result<Option<CalibrationParameters>> {
            Ok(None)
        }

        fn save(&self, _params: &CalibrationParameters, _family: Option<CalibrationFamily>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_verified_detects_lost_write() {
        let err = save_verified(&Forgetful, &CalibrationParameters::default(), None).unwrap_err();
        assert!(matches!(err, Error::StoreMismatch { ref scope } if scope == "combined"));
    }

    #[test]
    fn test_defective_record_rejected_on_save() {
        let store = MemoryStore::new();
        let err = store.save(&defective(), None).unwrap_err();
        assert!(matches!(err, Error::Validation(ref v) if v.involves(Channel::Cyan)));
        assert_eq!(store.load(None).unwrap(), None);
    }

    #[test]
    fn test_load_merged_falls_back_past_defective_scope() {
        let store = MemoryStore::new();
        store.insert_raw(
            Some(CalibrationFamily::Standard),
            serde_json::to_value(defective()).unwrap(),
        );
        let mut combined = CalibrationParameters::default();
        combined.channel_scaling_factor.set(Channel::Cyan, 0.000_39);
        store.save(&combined, None).unwrap();

        let merged = load_merged(&store, &CalibrationParameters::default());
        assert_eq!(*merged.parameters.channel_scaling_factor.get(Channel::Cyan), 0.000_39);
        assert_eq!(*merged.channel_sources.get(Channel::Cyan), ParameterSource::Combined);
        assert_eq!(merged.area_source, ParameterSource::Combined);
    }

    #[test]
    fn test_load_merged_empty_store_is_defaults() {
        let defaults = CalibrationParameters::default();
        let merged = load_merged(&MemoryStore::new(), &defaults);
        assert_eq!(merged.parameters, defaults);
        assert_eq!(merged.area_source, ParameterSource::Default);
    }
}
