use crate::block::{compute_hash, Fingerprint};
use crate::catalog::Catalog;
use chrono::{DateTime, Utc};

/// One recorded transition: an immutable catalog snapshot plus its lineage.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Unique hash of this revision (covers parent, fingerprint, time and label).
    pub id: Fingerprint,
    /// Id of the previous revision (`None` for the initial, empty catalog).
    pub parent: Option<Fingerprint>,
    /// Engine version at which this revision was recorded.
    pub version: u64,
    /// Fingerprint of `catalog`.
    pub fingerprint: Fingerprint,
    /// Intent that produced this revision, e.g. "combine".
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub catalog: Catalog,
}

impl Revision {
    pub fn new(parent: Option<Fingerprint>, version: u64, label: String, catalog: Catalog) -> Self {
        Self::with_timestamp(parent, version, label, catalog, Utc::now())
    }

    /// Create a revision with an explicit timestamp (for testing / determinism).
    pub fn with_timestamp(
        parent: Option<Fingerprint>,
        version: u64,
        label: String,
        catalog: Catalog,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let fingerprint = catalog.fingerprint();
        let id = Self::compute_id(&parent, version, &fingerprint, &timestamp, &label);
        Self {
            id,
            parent,
            version,
            fingerprint,
            label,
            timestamp,
            catalog,
        }
    }

    /// First eight hex digits of the id.
    pub fn short_id(&self) -> &str {
        &self.id[..8]
    }

    fn compute_id(
        parent: &Option<Fingerprint>,
        version: u64,
        fingerprint: &str,
        timestamp: &DateTime<Utc>,
        label: &str,
    ) -> Fingerprint {
        let payload = format!(
            "parent:{}\nversion:{}\ncatalog:{}\ntime:{}\nlabel:{}",
            parent.as_deref().unwrap_or("none"),
            version,
            fingerprint,
            timestamp.to_rfc3339(),
            label,
        );
        compute_hash(payload.as_bytes())
    }
}

/// Number of oldest revisions to drop so that at most `limit` remain (0 = unlimited).
pub fn excess_revisions(len: usize, limit: usize) -> usize {
    if limit == 0 {
        0
    } else {
        len.saturating_sub(limit.max(1))
    }
}
