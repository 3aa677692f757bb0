use crate::abacus::Abacus;
use crate::block::{compute_hash, Block, BlockId, BlockKind, Fingerprint};
use crate::mold::Mold;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// An immutable snapshot of every block on the canvas.
///
/// Each transition produces a new `Catalog` (copy-on-write semantics); prior
/// snapshots held by the revision log are never touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    blocks: BTreeMap<BlockId, Block>,
}

/// A batch of removals and upserts applied as one transition.
#[derive(Debug, Clone, Default)]
pub struct Changes {
    removed: Vec<BlockId>,
    upserted: Vec<Block>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(mut self, id: &BlockId) -> Self {
        self.removed.push(id.clone());
        self
    }

    pub fn upsert(mut self, block: Block) -> Self {
        self.upserted.push(block);
        self
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert or replace a block. Returns a new catalog.
    pub fn insert(&self, block: Block) -> Self {
        self.apply(Changes::new().upsert(block))
    }

    /// Remove a block. Returns a new catalog.
    pub fn remove(&self, id: &BlockId) -> Self {
        self.apply(Changes::new().remove(id))
    }

    /// Apply removals first, then upserts. Returns a new catalog.
    pub fn apply(&self, changes: Changes) -> Self {
        let mut blocks = self.blocks.clone();
        for id in &changes.removed {
            blocks.remove(id);
        }
        for block in changes.upserted {
            blocks.insert(block.id.clone(), block);
        }
        Self { blocks }
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Simple, power and product blocks.
    pub fn numbers(&self) -> impl Iterator<Item = &Block> {
        self.iter().filter(|b| b.kind.is_number())
    }

    pub fn molds(&self) -> impl Iterator<Item = (&BlockId, &Mold)> {
        self.iter().filter_map(|b| match &b.kind {
            BlockKind::Mold(m) => Some((&b.id, m)),
            _ => None,
        })
    }

    pub fn abaci(&self) -> impl Iterator<Item = (&BlockId, &Abacus)> {
        self.iter().filter_map(|b| match &b.kind {
            BlockKind::Abacus(a) => Some((&b.id, a)),
            _ => None,
        })
    }

    /// Hash over the canonical JSON form; independent of insertion order.
    pub fn fingerprint(&self) -> Fingerprint {
        let serialized = serde_json::to_vec(&self.blocks).unwrap_or_default();
        compute_hash(&serialized)
    }

    /// What a step did to the canvas, comparing this catalog to a `later` one.
    ///
    /// Fused or factored blocks show up as removed plus added; moved, filled
    /// and recounted blocks keep their id and show up as modified.
    pub fn diff(&self, later: &Catalog) -> CatalogDiff {
        let ids: BTreeSet<&BlockId> = self.blocks.keys().chain(later.blocks.keys()).collect();
        let mut diff = CatalogDiff::default();
        for id in ids {
            match (self.blocks.get(id), later.blocks.get(id)) {
                (None, Some(_)) => diff.added.push(id.clone()),
                (Some(_), None) => diff.removed.push(id.clone()),
                (Some(before), Some(after)) if before != after => diff.modified.push(id.clone()),
                _ => {}
            }
        }
        diff
    }
}

/// Block ids that appeared, disappeared or changed between two snapshots.
/// Each list is sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    pub added: Vec<BlockId>,
    pub removed: Vec<BlockId>,
    pub modified: Vec<BlockId>,
}

impl CatalogDiff {
    pub fn is_empty(&self) -> bool {
        self.total_changes() == 0
    }

    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}
