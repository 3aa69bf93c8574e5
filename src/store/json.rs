//! One JSON file per scope under a directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ParameterStore, check_scope, decode_scope, scope_name};
use crate::error::Result;
use crate::ink::CalibrationFamily;
use crate::params::{CalibrationParameters, ValidationError};

/// File contents: the parameters plus where and when they were saved.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<P> {
    scope: String,
    #[serde(with = "crate::rfc3339")]
    saved_at: DateTime<Utc>,
    parameters: P,
}

/// File-backed [`ParameterStore`].
///
/// Files are named `calibration-<scope>.json`. A save writes a sibling
/// temporary file and renames it over the target, so readers see either the
/// old or the new record. Saves through one store are serialized.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the record of a scope.
    #[must_use]
    pub fn path_for(&self, family: Option<CalibrationFamily>) -> PathBuf {
        self.dir
            .join(format!("calibration-{}.json", scope_name(family)))
    }

    /// Save timestamp of a scope's record, if one exists.
    pub fn saved_at(&self, family: Option<CalibrationFamily>) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .read_envelope(family)?
            .map(|envelope| envelope.saved_at))
    }

    fn read_envelope(
        &self,
        family: Option<CalibrationFamily>,
    ) -> Result<Option<Envelope<serde_json::Value>>> {
        let path = self.path_for(family);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(&content)?;
        if envelope.scope != scope_name(family) {
            return Err(ValidationError::malformed(format!(
                "{} holds a '{}' record",
                path.display(),
                envelope.scope
            ))
            .into());
        }
        Ok(Some(envelope))
    }
}

impl ParameterStore for JsonFileStore {
    fn load(&self, family: Option<CalibrationFamily>) -> Result<Option<CalibrationParameters>> {
        self.read_envelope(family)?
            .map(|envelope| decode_scope(envelope.parameters, family))
            .transpose()
    }

    fn save(&self, params: &CalibrationParameters, family: Option<CalibrationFamily>) -> Result<()> {
        let params = check_scope(params.clone(), family)?;
        let envelope = Envelope {
            scope: scope_name(family).to_string(),
            saved_at: Utc::now(),
            parameters: params,
        };
        let content = serde_json::to_string_pretty(&envelope)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.path_for(family);
        write_atomic(&path, content.as_bytes())?;
        tracing::debug!(path = %path.display(), scope = scope_name(family), "saved parameters");
        Ok(())
    }
}

/// Write `bytes` to a synced sibling file and rename it over `path`.
/// The sibling is removed if any step fails.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let result = write_synced(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::ink::Channel;
    use crate::store::save_verified;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::White, 0.001_234_5);

        assert_eq!(store.load(Some(CalibrationFamily::Special)).unwrap(), None);
        save_verified(&store, &params, Some(CalibrationFamily::Special)).unwrap();

        let loaded = store.load(Some(CalibrationFamily::Special)).unwrap().unwrap();
        assert_eq!(loaded, params);
        assert!(store.saved_at(Some(CalibrationFamily::Special)).unwrap().is_some());
        assert!(store.path_for(Some(CalibrationFamily::Special)).exists());
        assert!(!store.path_for(None).exists());
    }

    #[test]
    fn test_save_of_loaded_record_is_identity() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.save(&CalibrationParameters::default(), None).unwrap();
        let first = store.load(None).unwrap().unwrap();
        store.save(&first, None).unwrap();
        assert_eq!(store.load(None).unwrap().unwrap(), first);
    }

    #[test]
    fn test_defective_file_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Magenta, 0.000_000_4);
        let envelope = serde_json::json!({
            "scope": "standard",
            "saved_at": "2024-03-01T12:00:00+00:00",
            "parameters": params,
        });
        std::fs::write(
            store.path_for(Some(CalibrationFamily::Standard)),
            serde_json::to_string(&envelope).unwrap(),
        )
        .unwrap();

        let err = store.load(Some(CalibrationFamily::Standard)).unwrap_err();
        assert!(matches!(err, Error::Validation(ref v) if v.involves(Channel::Magenta)));
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let envelope = serde_json::json!({
            "scope": "combined",
            "saved_at": "2024-03-01T12:00:00+00:00",
            "parameters": { "base_consumption": CalibrationParameters::default().base_consumption },
        });
        std::fs::write(store.path_for(None), envelope.to_string()).unwrap();
        assert!(matches!(store.load(None), Err(Error::Validation(_))));
    }

    #[test]
    fn test_wrong_scope_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .save(&CalibrationParameters::default(), Some(CalibrationFamily::Standard))
            .unwrap();
        std::fs::rename(
            store.path_for(Some(CalibrationFamily::Standard)),
            store.path_for(Some(CalibrationFamily::Special)),
        )
        .unwrap();
        assert!(store.load(Some(CalibrationFamily::Special)).is_err());
    }

    #[test]
    fn test_save_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.save(&CalibrationParameters::default(), None).unwrap();
        let names: Vec<String> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["calibration-combined.json".to_string()]);
    }

    #[test]
    fn test_failed_rename_cleans_up() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        // a non-empty directory in place of the target makes the rename fail
        let target = store.path_for(None);
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        assert!(matches!(
            store.save(&CalibrationParameters::default(), None),
            Err(Error::Io(_))
        ));
        assert!(!target.with_extension("json.tmp").exists());
        assert!(target.join("keep").exists());
    }
}
