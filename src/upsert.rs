use crate::basin::{tidylon, BasinMask};
use crate::cube::Cube;
use crate::docs::{MetaDoc, PointDoc};
use crate::error::{Error, Result};
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Collection;
use tracing::{debug, error};

/// Storage operations the reconciler needs from the point collection:
/// lookup by id, insert, and whole-document replace by id.
#[async_trait]
pub trait PointStore: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<PointDoc>>;
    async fn insert(&self, doc: &PointDoc) -> Result<()>;
    async fn replace(&self, doc: &PointDoc) -> Result<()>;
}

#[async_trait]
impl PointStore for Collection<PointDoc> {
    async fn find(&self, id: &str) -> Result<Option<PointDoc>> {
        Ok(self.find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert(&self, doc: &PointDoc) -> Result<()> {
        self.insert_one(doc, None).await?;
        Ok(())
    }

    async fn replace(&self, doc: &PointDoc) -> Result<()> {
        self.replace_one(doc! { "_id": &doc._id }, doc, None).await?;
        Ok(())
    }
}

/// Fold a candidate into the record already stored for the same lattice
/// point: `metadata` and `data` are concatenated existing-first so the two
/// lists stay index-aligned, every other field keeps the existing record's
/// value. Append-only; a dataset loaded twice shows up twice.
pub fn merge(mut existing: PointDoc, candidate: &PointDoc) -> PointDoc {
    existing.metadata.extend(candidate.metadata.iter().cloned());
    existing.data.extend(candidate.data.iter().cloned());
    existing
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Inserted,
    Merged,
}

/// Reconcile one candidate against the store: insert it if its lattice point
/// is new, otherwise merge-and-replace. Read-then-write, not atomic; this
/// loader runs as a single sequential process.
pub async fn reconcile<S: PointStore>(store: &S, candidate: &PointDoc) -> Result<Outcome> {
    match store.find(&candidate._id).await? {
        Some(existing) => {
            let merged = merge(existing, candidate);
            store.replace(&merged).await?;
            Ok(Outcome::Merged)
        }
        None => {
            store.insert(candidate).await?;
            Ok(Outcome::Inserted)
        }
    }
}

/// Storage seam for the write-once metadata record.
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Insert the record; an already-present id yields `MetadataConflict`.
    async fn insert(&self, doc: &MetaDoc) -> Result<()>;
}

#[async_trait]
impl MetaStore for Collection<MetaDoc> {
    async fn insert(&self, doc: &MetaDoc) -> Result<()> {
        match self.insert_one(doc, None).await {
            Ok(_) => Ok(()),
            Err(err) => Err(meta_write_error(err, &doc._id)),
        }
    }
}

/// Classify a metadata insert failure: duplicate key (server code 11000)
/// means the record already exists, anything else is an ordinary store
/// failure.
pub fn meta_write_error(err: mongodb::error::Error, id: &str) -> Error {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_err)) if write_err.code == 11000 => {
            Error::MetadataConflict { id: id.to_string() }
        }
        _ => Error::Mongo(err),
    }
}

/// Write the dataset's metadata record. A duplicate id is surfaced as
/// `MetadataConflict` so the caller can report it and carry on.
pub async fn insert_metadata<S: MetaStore>(store: &S, meta: &MetaDoc) -> Result<()> {
    store.insert(meta).await
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: u64,
    pub merged: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl std::fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inserted={} merged={} skipped={} failed={}",
            self.inserted, self.merged, self.skipped, self.failed
        )
    }
}

/// Walk the full time x latitude x longitude lattice and reconcile one
/// candidate per populated cell. Per-point failures are logged with the
/// offending record and counted; they never abort the run.
pub async fn load_points<S: PointStore>(
    cube: &Cube,
    mask: &BasinMask,
    store: &S,
    dataset_id: &str,
) -> LoadSummary {
    let mut summary = LoadSummary::default();

    for (time_idx, timestamp) in cube.axes.time.iter().enumerate() {
        debug!(timestep = %timestamp, "processing time slice");
        for (lat_idx, &latitude) in cube.axes.lat.iter().enumerate() {
            for (lon_idx, &raw_lon) in cube.axes.lon.iter().enumerate() {
                let value = cube.value(time_idx, lat_idx, lon_idx);
                // nothing to record, drop it
                if value.is_nan() {
                    summary.skipped += 1;
                    continue;
                }

                let longitude = tidylon(raw_lon);
                let basin = match mask.lookup(longitude, latitude) {
                    Ok(basin) => basin,
                    Err(err) => {
                        error!(%err, longitude, latitude, "basin lookup failed");
                        summary.failed += 1;
                        continue;
                    }
                };

                let candidate =
                    PointDoc::candidate(dataset_id, timestamp, longitude, latitude, basin, value);
                match reconcile(store, &candidate).await {
                    Ok(Outcome::Inserted) => summary.inserted += 1,
                    Ok(Outcome::Merged) => summary.merged += 1,
                    Err(err) => {
                        error!(%err, record = ?candidate, "point write failed");
                        summary.failed += 1;
                    }
                }
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{GeoJSONPoint, DATASET_ID};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn point(id: &str, dataset: &str, value: f64) -> PointDoc {
        let ts = Utc.with_ymd_and_hms(2005, 1, 15, 0, 0, 0).unwrap();
        PointDoc {
            _id: id.to_string(),
            metadata: vec![dataset.to_string()],
            geolocation: GeoJSONPoint {
                location_type: String::from("Point"),
                coordinates: [-159.5, -64.5],
            },
            basin: 3,
            timestamp: bson::DateTime::from_chrono(ts),
            data: vec![vec![value]],
        }
    }

    #[test]
    fn merge_concatenates_existing_first() {
        let existing = point("a", DATASET_ID, 1.5);
        let candidate = point("a", "other_product", 2.5);
        let merged = merge(existing, &candidate);
        assert_eq!(
            merged.metadata,
            vec![DATASET_ID.to_string(), "other_product".to_string()]
        );
        assert_eq!(merged.data, vec![vec![1.5], vec![2.5]]);
        assert_eq!(merged.data.len(), merged.metadata.len());
    }

    #[test]
    fn merge_keeps_existing_fields() {
        let mut existing = point("a", DATASET_ID, 1.5);
        existing.basin = 7;
        let mut candidate = point("a", "other_product", 2.5);
        candidate.basin = 2;
        candidate.geolocation.coordinates = [0.0, 0.0];
        let merged = merge(existing, &candidate);
        assert_eq!(merged.basin, 7);
        assert_eq!(merged.geolocation.coordinates, [-159.5, -64.5]);
    }

    #[test]
    fn merge_does_not_dedup_replayed_dataset() {
        let existing = point("a", DATASET_ID, 1.5);
        let candidate = point("a", DATASET_ID, 1.5);
        let merged = merge(existing, &candidate);
        assert_eq!(merged.metadata.len(), 2);
        assert_eq!(merged.data.len(), 2);
    }

    struct MemStore(Mutex<HashMap<String, PointDoc>>);

    impl MemStore {
        fn new() -> MemStore {
            MemStore(Mutex::new(HashMap::new()))
        }
    }

    #[async_trait]
    impl PointStore for MemStore {
        async fn find(&self, id: &str) -> Result<Option<PointDoc>> {
            Ok(self.0.lock().unwrap().get(id).cloned())
        }

        async fn insert(&self, doc: &PointDoc) -> Result<()> {
            self.0.lock().unwrap().insert(doc._id.clone(), doc.clone());
            Ok(())
        }

        async fn replace(&self, doc: &PointDoc) -> Result<()> {
            self.0.lock().unwrap().insert(doc._id.clone(), doc.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn reconcile_inserts_then_merges() {
        let store = MemStore::new();

        let first = point("a", "product_a", 1.5);
        assert_eq!(reconcile(&store, &first).await.unwrap(), Outcome::Inserted);

        let stored = store.find("a").await.unwrap().unwrap();
        assert_eq!(stored.metadata, vec!["product_a".to_string()]);
        assert_eq!(stored.data, vec![vec![1.5]]);

        let second = point("a", "product_b", 2.5);
        assert_eq!(reconcile(&store, &second).await.unwrap(), Outcome::Merged);

        let stored = store.find("a").await.unwrap().unwrap();
        assert_eq!(
            stored.metadata,
            vec!["product_a".to_string(), "product_b".to_string()]
        );
        assert_eq!(stored.data, vec![vec![1.5], vec![2.5]]);
        assert_eq!(stored.data.len(), stored.metadata.len());
    }

    struct MemMetaStore(Mutex<HashMap<String, MetaDoc>>);

    impl MemMetaStore {
        fn new() -> MemMetaStore {
            MemMetaStore(Mutex::new(HashMap::new()))
        }
    }

    #[async_trait]
    impl MetaStore for MemMetaStore {
        async fn insert(&self, doc: &MetaDoc) -> Result<()> {
            let mut docs = self.0.lock().unwrap();
            if docs.contains_key(&doc._id) {
                return Err(Error::MetadataConflict {
                    id: doc._id.clone(),
                });
            }
            docs.insert(doc._id.clone(), doc.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn metadata_record_is_write_once() {
        let store = MemMetaStore::new();
        let meta = crate::docs::kg21_metadata(&crate::grid::GridAxes::kg21());

        insert_metadata(&store, &meta).await.unwrap();
        match insert_metadata(&store, &meta).await {
            Err(Error::MetadataConflict { id }) => assert_eq!(id, DATASET_ID),
            other => panic!("expected MetadataConflict, got {:?}", other),
        }
    }

    #[test]
    fn non_duplicate_metadata_failure_stays_a_store_error() {
        let err = mongodb::error::Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));
        assert!(matches!(
            meta_write_error(err, DATASET_ID),
            Error::Mongo(_)
        ));
    }

    #[tokio::test]
    async fn reconcile_leaves_distinct_points_alone() {
        let store = MemStore::new();
        reconcile(&store, &point("a", "product_a", 1.5)).await.unwrap();
        reconcile(&store, &point("b", "product_a", 2.5)).await.unwrap();

        assert_eq!(store.find("a").await.unwrap().unwrap().data, vec![vec![1.5]]);
        assert_eq!(store.find("b").await.unwrap().unwrap().data, vec![vec![2.5]]);
    }
}
