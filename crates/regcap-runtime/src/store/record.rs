//! Persisted capability records.

use super::{GenericStore, StorageError};
use chrono::{DateTime, Utc};
use regcap_types::{RegionHandle, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The set of capability URLs issued to one region.
///
/// `urls` maps each module's URL name to the path fragment it minted
/// (`/CAPS/inventory/<id>/`). Host and port are not part of the record;
/// they are chosen at issue time and only returned to the caller.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use regcap_runtime::CapabilityRecord;
/// use regcap_types::RegionHandle;
///
/// let expiration = Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap();
/// let record = CapabilityRecord::new("sess1", RegionHandle::new(1000), Default::default(), expiration);
///
/// assert_eq!(record.key(), "1000");
/// assert!(!record.is_expired_at(expiration));
/// assert!(record.is_expired_at(expiration + chrono::Duration::seconds(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    /// Record format version.
    pub version: u32,
    pub session_id: String,
    pub region_handle: RegionHandle,
    pub urls: BTreeMap<String, String>,
    pub expiration: DateTime<Utc>,
}

impl CapabilityRecord {
    /// Current record format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Store kind under which records are filed.
    pub const KIND: &'static str = "GridRegistrationUrls";

    /// Creates a record in the current format.
    pub fn new(
        session_id: impl Into<String>,
        region_handle: RegionHandle,
        urls: BTreeMap<String, String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            session_id: session_id.into(),
            region_handle,
            urls,
            expiration,
        }
    }

    /// Returns the store key for this record.
    #[must_use]
    pub fn key(&self) -> String {
        self.region_handle.to_string()
    }

    /// Returns `true` once `now` is strictly past the expiration.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes from JSON.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::VersionIncompatible` for records written in
    /// another format version, and `StorageError::Serialization` for
    /// malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        #[derive(Deserialize)]
        struct VersionProbe {
            #[serde(default)]
            version: u32,
        }

        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.version != Self::CURRENT_VERSION {
            return Err(StorageError::VersionIncompatible {
                file_version: probe.version,
                supported_version: Self::CURRENT_VERSION,
            });
        }

        Ok(serde_json::from_str(json)?)
    }
}

/// Typed view of a [`GenericStore`] holding [`CapabilityRecord`]s.
///
/// Records are filed under [`Scope::GLOBAL`] and
/// [`CapabilityRecord::KIND`], keyed by the decimal region handle.
#[derive(Debug, Clone)]
pub struct RecordStore<S> {
    inner: S,
}

impl<S: GenericStore> RecordStore<S> {
    /// Wraps a generic store.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the underlying store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Writes a record, replacing any record for the same region.
    pub async fn put(&self, record: &CapabilityRecord) -> Result<(), StorageError> {
        let json = record.to_json()?;
        self.inner
            .add(Scope::GLOBAL, CapabilityRecord::KIND, &record.key(), &json)
            .await
    }

    /// Loads the record for a region.
    pub async fn get(&self, handle: RegionHandle) -> Result<Option<CapabilityRecord>, StorageError> {
        self.inner
            .get(Scope::GLOBAL, CapabilityRecord::KIND, &handle.to_string())
            .await?
            .map(|json| CapabilityRecord::from_json(&json))
            .transpose()
    }

    /// Deletes the record for a region. Returns `true` if one existed.
    pub async fn remove(&self, handle: RegionHandle) -> Result<bool, StorageError> {
        self.inner
            .remove(Scope::GLOBAL, CapabilityRecord::KIND, &handle.to_string())
            .await
    }

    /// Loads every record, decoding each independently.
    ///
    /// The outer error is a store failure; inner errors are per-record
    /// decode failures that callers may skip.
    pub async fn all(&self) -> Result<Vec<Result<CapabilityRecord, StorageError>>, StorageError> {
        let values = self
            .inner
            .get_all(Scope::GLOBAL, CapabilityRecord::KIND)
            .await?;
        Ok(values
            .iter()
            .map(|json| CapabilityRecord::from_json(json))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn sample(handle: u64, session: &str) -> CapabilityRecord {
        let mut urls = BTreeMap::new();
        urls.insert("inventory".to_string(), "/CAPS/inventory/abc/".to_string());
        CapabilityRecord::new(
            session,
            RegionHandle::new(handle),
            urls,
            Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn json_field_names() {
        let json = sample(1000, "sess1").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["session_id"], "sess1");
        assert_eq!(value["region_handle"], 1000);
        assert_eq!(value["urls"]["inventory"], "/CAPS/inventory/abc/");
    }

    #[test]
    fn from_json_rejects_other_versions() {
        let mut record = sample(1, "s");
        record.version = 2;
        let json = serde_json::to_string(&record).unwrap();

        let err = CapabilityRecord::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            StorageError::VersionIncompatible {
                file_version: 2,
                supported_version: 1
            }
        ));
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = CapabilityRecord::from_json("not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn expiry_is_strict() {
        let record = sample(1, "s");
        assert!(!record.is_expired_at(record.expiration));
        assert!(record.is_expired_at(record.expiration + chrono::Duration::milliseconds(1)));
    }

    #[tokio::test]
    async fn put_overwrites_same_region() {
        let store = RecordStore::new(MemoryStore::new());
        store.put(&sample(1000, "first")).await.unwrap();
        store.put(&sample(1000, "second")).await.unwrap();

        let loaded = store.get(RegionHandle::new(1000)).await.unwrap().unwrap();
        assert_eq!(loaded.session_id, "second");
        assert_eq!(store.inner().count(Scope::GLOBAL, CapabilityRecord::KIND), 1);
    }

    #[tokio::test]
    async fn all_reports_bad_records_individually() {
        let store = RecordStore::new(MemoryStore::new());
        store.put(&sample(1, "a")).await.unwrap();
        store
            .inner()
            .add(Scope::GLOBAL, CapabilityRecord::KIND, "2", "{broken")
            .await
            .unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].is_ok());
        assert!(all[1].is_err());
    }

    #[tokio::test]
    async fn remove_missing_is_false() {
        let store = RecordStore::new(MemoryStore::new());
        assert!(!store.remove(RegionHandle::new(5)).await.unwrap());
        assert!(store.get(RegionHandle::new(5)).await.unwrap().is_none());
    }
}
