use crate::abacus::Abacus;
use crate::block::{Block, BlockId, BlockKind, Position, Power, Product};
use crate::catalog::{Catalog, Changes};
use crate::config::{EngineConfig, FactorMode, IdScheme, OccupiedMold, SplitOffset};
use crate::error::Notice;
use crate::intent::Intent;
use crate::mold::{Fill, Mold, MoldShape, Restore, Snapshot};
use crate::numtheory::{factor_pair, is_valid_divisor};
use crate::revision::{excess_revisions, Revision};
use crate::MAX_VALUE;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request for more input from the user. Not a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Ask which divisor to split `block` by.
    ManualFactor { block: BlockId, value: u64 },
}

/// Result of one intent. The catalog itself is read from [`Engine::catalog`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub notice: Option<Notice>,
    pub prompt: Option<Prompt>,
    /// Blocks minted by this intent, in creation order.
    pub created: Vec<BlockId>,
}

impl Outcome {
    /// No notice, no prompt, nothing minted. The catalog may still have changed.
    fn quiet() -> Self {
        Self::default()
    }

    fn notice(notice: Notice) -> Self {
        info!(%notice, "intent rejected");
        Self {
            notice: Some(notice),
            ..Self::default()
        }
    }

    fn prompt(prompt: Prompt) -> Self {
        Self {
            prompt: Some(prompt),
            ..Self::default()
        }
    }

    fn created(ids: Vec<BlockId>) -> Self {
        Self {
            created: ids,
            ..Self::default()
        }
    }

    /// No notice and no prompt.
    pub fn is_quiet(&self) -> bool {
        self.notice.is_none() && self.prompt.is_none()
    }
}

/// Owns the block catalog and applies every intent as one atomic transition.
pub struct Engine {
    config: EngineConfig,
    catalog: Catalog,
    version: u64,
    next_seq: u64,
    history: Vec<Revision>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let catalog = Catalog::empty();
        let root = Revision::new(None, 0, "init".into(), catalog.clone());
        Self {
            config,
            catalog,
            version: 0,
            next_seq: 0,
            history: vec![root],
        }
    }

    /// Current read-only snapshot.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Advances by one per recorded transition, undo included. Never decreases.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn factor_mode(&self) -> FactorMode {
        self.config.factor_mode
    }

    pub fn set_factor_mode(&mut self, mode: FactorMode) -> Outcome {
        debug!(%mode, "factor mode changed");
        self.config.factor_mode = mode;
        Outcome::quiet()
    }

    /// Retained revisions, newest first.
    pub fn log(&self) -> Vec<&Revision> {
        self.history.iter().rev().collect()
    }

    // ── Creation ──────────────────────────────────────────────

    pub fn create_simple(&mut self, value: u64, position: Position) -> Outcome {
        if value == 0 {
            warn!("refusing to create a block with value 0");
            return Outcome::quiet();
        }
        if value > MAX_VALUE {
            return Outcome::notice(Notice::ValueTooLarge);
        }
        let id = self.mint_id();
        let next = self
            .catalog
            .insert(Block::simple(id.clone(), position, value));
        self.commit("create_simple", next);
        Outcome::created(vec![id])
    }

    pub fn create_mold(&mut self, shape: MoldShape, side: u64, position: Position) -> Outcome {
        let Some(mold) = Mold::new(shape, side) else {
            return Outcome::notice(Notice::ValueTooLarge);
        };
        let id = self.mint_id();
        let next = self
            .catalog
            .insert(Block::new(id.clone(), position, BlockKind::Mold(mold)));
        self.commit("create_mold", next);
        Outcome::created(vec![id])
    }

    pub fn create_abacus(&mut self, position: Position) -> Outcome {
        let id = self.mint_id();
        let next = self.catalog.insert(Block::new(
            id.clone(),
            position,
            BlockKind::Abacus(Abacus::new()),
        ));
        self.commit("create_abacus", next);
        Outcome::created(vec![id])
    }

    // ── Combination ───────────────────────────────────────────

    /// Drop `dragged_id` onto `target_id`.
    ///
    /// A number onto an abacus deposits, onto a mold fills (or multiplies in
    /// place), onto another number fuses into a power or product. Every other
    /// pairing is a no-op.
    pub fn combine(&mut self, dragged_id: &BlockId, target_id: &BlockId) -> Outcome {
        if dragged_id == target_id {
            return Outcome::quiet();
        }
        let (Some(dragged), Some(target)) = (self.lookup(dragged_id), self.lookup(target_id))
        else {
            return Outcome::quiet();
        };
        let (dragged, target) = (dragged.clone(), target.clone());
        let Some(value) = dragged.value() else {
            debug!(dragged = %dragged.id, "only number blocks can be dropped onto others");
            return Outcome::quiet();
        };

        match &target.kind {
            BlockKind::Abacus(abacus) => self.deposit(&dragged, value, &target, abacus),
            BlockKind::Mold(mold) => self.pour(&dragged, value, &target, mold),
            _ => self.fuse(&dragged, &target),
        }
    }

    fn deposit(&mut self, dragged: &Block, value: u64, target: &Block, abacus: &Abacus) -> Outcome {
        let current = u64::try_from(abacus.total()).unwrap_or(0);
        if current.checked_add(value).map_or(true, |t| t > MAX_VALUE) {
            return Outcome::notice(Notice::ValueTooLarge);
        }
        let mut abacus = abacus.clone();
        let total = abacus.deposit(value);
        debug!(abacus = %target.id, value, total, "deposited into abacus");

        let next = self.catalog.apply(
            Changes::new()
                .remove(&dragged.id)
                .upsert(Block::new(target.id.clone(), target.position, BlockKind::Abacus(abacus))),
        );
        self.commit("combine", next);
        Outcome::quiet()
    }

    fn pour(&mut self, dragged: &Block, value: u64, target: &Block, mold: &Mold) -> Outcome {
        let mold = match mold.filled_value() {
            Some(held) if held > 0 => match self.config.occupied_mold {
                OccupiedMold::Reject => return Outcome::notice(Notice::MoldOccupied),
                OccupiedMold::Multiply => match mold.clone().multiplied(value) {
                    Some(mold) => mold,
                    None => return Outcome::notice(Notice::ValueTooLarge),
                },
            },
            _ => mold.clone().filled(Fill {
                occupant: dragged.id.clone(),
                value,
                restore: Restore::of(&dragged.kind),
            }),
        };
        debug!(
            mold = %target.id,
            held = mold.filled_value().unwrap_or_default(),
            surplus = mold.surplus(),
            perfect = mold.is_perfect_fit(),
            "mold filled"
        );

        let next = self.catalog.apply(
            Changes::new()
                .remove(&dragged.id)
                .upsert(Block::new(target.id.clone(), target.position, BlockKind::Mold(mold))),
        );
        self.commit("combine", next);
        Outcome::quiet()
    }

    fn fuse(&mut self, dragged: &Block, target: &Block) -> Outcome {
        let (Some((dragged_base, dragged_exp)), Some((target_base, target_exp))) =
            (dragged.kind.power_parts(), target.kind.power_parts())
        else {
            return Outcome::quiet();
        };

        let kind = if dragged_base == target_base {
            dragged_exp
                .checked_add(target_exp)
                .and_then(|exp| Power::new(dragged_base, exp))
                .map(BlockKind::Power)
        } else {
            let (Some(a), Some(b)) = (dragged.value(), target.value()) else {
                return Outcome::quiet();
            };
            Product::new(a, b).map(BlockKind::Product)
        };
        let Some(kind) = kind else {
            return Outcome::notice(Notice::ValueTooLarge);
        };

        let id = self.mint_id();
        let next = self.catalog.apply(
            Changes::new()
                .remove(&dragged.id)
                .remove(&target.id)
                .upsert(Block::new(id.clone(), target.position, kind)),
        );
        self.commit("combine", next);
        Outcome::created(vec![id])
    }

    // ── Clicks and factoring ──────────────────────────────────

    /// Release an occupied mold, or factor a number block according to the factor mode.
    pub fn click(&mut self, id: &BlockId) -> Outcome {
        let Some(block) = self.lookup(id).cloned() else {
            return Outcome::quiet();
        };
        match &block.kind {
            BlockKind::Mold(mold) if mold.is_occupied() => self.release(&block, mold, "click"),
            BlockKind::Mold(_) | BlockKind::Abacus(_) => Outcome::quiet(),
            _ => match self.config.factor_mode {
                FactorMode::Manual => request_manual_factor(&block),
                FactorMode::Automatic => self.split(&block),
            },
        }
    }

    /// Split a number block by a user-chosen divisor.
    pub fn apply_manual_factor(&mut self, id: &BlockId, divisor: i64) -> Outcome {
        let Some(block) = self.lookup(id).cloned() else {
            return Outcome::quiet();
        };
        let Some(value) = block.value() else {
            return Outcome::quiet();
        };
        match u64::try_from(divisor) {
            Ok(d) if is_valid_divisor(value, d) => {
                self.factor_block(&block, Some((d, value / d)), "apply_manual_factor")
            }
            _ => Outcome::notice(Notice::InvalidDivisor { value, divisor }),
        }
    }

    fn split(&mut self, block: &Block) -> Outcome {
        match &block.kind {
            BlockKind::Product(p) => {
                let [a, b] = p.factors();
                self.replace_with_children(
                    block,
                    BlockKind::Simple { value: a },
                    BlockKind::Simple { value: b },
                    "click",
                )
            }
            BlockKind::Power(p) => {
                if p.exponent() <= 1 {
                    return Outcome::quiet();
                }
                let base = p.base();
                let rest = p.exponent() - 1;
                let remainder = if rest == 1 {
                    BlockKind::Simple { value: base }
                } else {
                    match Power::new(base, rest) {
                        Some(power) => BlockKind::Power(power),
                        None => return Outcome::quiet(),
                    }
                };
                self.replace_with_children(
                    block,
                    remainder,
                    BlockKind::Simple { value: base },
                    "click",
                )
            }
            _ => self.factor_block(block, None, "click"),
        }
    }

    /// Replace `block` with two simple blocks: `pair`, or the canonical factor pair.
    fn factor_block(&mut self, block: &Block, pair: Option<(u64, u64)>, label: &str) -> Outcome {
        let value = block.value().unwrap_or_default();
        let Some((a, b)) = pair.or_else(|| factor_pair(value)) else {
            return Outcome::notice(Notice::PrimeNumber { value });
        };
        self.replace_with_children(
            block,
            BlockKind::Simple { value: a },
            BlockKind::Simple { value: b },
            label,
        )
    }

    fn replace_with_children(
        &mut self,
        parent: &Block,
        left: BlockKind,
        right: BlockKind,
        label: &str,
    ) -> Outcome {
        let SplitOffset { dx, dy } = self.config.split_offset;
        let left_id = self.mint_id();
        let right_id = self.mint_id();
        let next = self.catalog.apply(
            Changes::new()
                .remove(&parent.id)
                .upsert(Block::new(left_id.clone(), parent.position.offset(-dx, dy), left))
                .upsert(Block::new(right_id.clone(), parent.position.offset(dx, dy), right)),
        );
        self.commit(label, next);
        Outcome::created(vec![left_id, right_id])
    }

    // ── Molds ─────────────────────────────────────────────────

    fn release(&mut self, block: &Block, mold: &Mold, label: &str) -> Outcome {
        let Some(fill) = mold.fill() else {
            return Outcome::quiet();
        };
        let (id, kind) = match &fill.restore {
            Restore::Simple => (
                fill.occupant.clone(),
                BlockKind::Simple { value: fill.value },
            ),
            Restore::Snapshot(Snapshot::Power(p)) => (fill.occupant.clone(), BlockKind::Power(p.clone())),
            Restore::Snapshot(Snapshot::Product(p)) => {
                (fill.occupant.clone(), BlockKind::Product(p.clone()))
            }
            Restore::Merged => (self.mint_id(), BlockKind::Simple { value: fill.value }),
        };
        let id = if self.catalog.contains(&id) {
            warn!(%id, "occupant id already on the canvas, minting a fresh one");
            self.mint_id()
        } else {
            id
        };

        let restored = Block::new(
            id.clone(),
            block.position.offset(0.0, self.config.split_offset.dy),
            kind,
        );
        let emptied = Block::new(
            block.id.clone(),
            block.position,
            BlockKind::Mold(mold.clone().emptied()),
        );
        let next = self
            .catalog
            .apply(Changes::new().upsert(emptied).upsert(restored));
        self.commit(label, next);
        Outcome::created(vec![id])
    }

    // ── Placement and deletion ────────────────────────────────

    pub fn move_block(&mut self, id: &BlockId, position: Position) -> Outcome {
        let Some(block) = self.lookup(id) else {
            return Outcome::quiet();
        };
        if block.position == position {
            return Outcome::quiet();
        }
        let next = self.catalog.insert(block.at(position));
        self.commit("move", next);
        Outcome::quiet()
    }

    /// Remove a block. An occupied mold releases its occupant instead.
    pub fn delete_block(&mut self, id: &BlockId) -> Outcome {
        let Some(block) = self.lookup(id).cloned() else {
            return Outcome::quiet();
        };
        if let BlockKind::Mold(mold) = &block.kind {
            if mold.is_occupied() {
                return self.release(&block, mold, "delete");
            }
        }
        let next = self.catalog.remove(id);
        self.commit("delete", next);
        Outcome::quiet()
    }

    // ── Abacus ────────────────────────────────────────────────

    /// Set a row's bead count and renormalize (carry up, borrow down).
    ///
    /// Decrements that cannot be covered by borrowing are clamped silently.
    pub fn change_abacus_beads(&mut self, abacus_id: &BlockId, row: u64, beads: i64) -> Outcome {
        let Some((block, abacus)) = self.lookup_abacus(abacus_id) else {
            return Outcome::quiet();
        };
        if abacus.beads(row).is_none() {
            debug!(abacus = %abacus_id, row, "no such abacus row");
            return Outcome::quiet();
        }
        if beads > 0
            && abacus
                .total_with(row, beads)
                .map_or(true, |total| total > MAX_VALUE as i64)
        {
            return Outcome::notice(Notice::ValueTooLarge);
        }
        let mut updated = abacus.clone();
        if let Err(e) = updated.set_beads(row, beads) {
            debug!(abacus = %abacus_id, %e, "bead change clamped");
        }
        if updated == abacus {
            return Outcome::quiet();
        }
        self.replace_abacus(&block, updated, "change_abacus_beads");
        Outcome::quiet()
    }

    pub fn add_abacus_row(&mut self, abacus_id: &BlockId) -> Outcome {
        let Some((block, mut abacus)) = self.lookup_abacus(abacus_id) else {
            return Outcome::quiet();
        };
        let Some(place) = abacus.add_row() else {
            return Outcome::notice(Notice::ValueTooLarge);
        };
        debug!(abacus = %abacus_id, place, "abacus row added");
        self.replace_abacus(&block, abacus, "add_abacus_row");
        Outcome::quiet()
    }

    /// Turn the abacus total into a simple block and zero every row.
    pub fn export_abacus(&mut self, abacus_id: &BlockId) -> Outcome {
        let Some((block, mut abacus)) = self.lookup_abacus(abacus_id) else {
            return Outcome::quiet();
        };
        let value = match u64::try_from(abacus.total()) {
            Ok(v) if v > MAX_VALUE => return Outcome::notice(Notice::ValueTooLarge),
            Ok(v) if v > 0 => v,
            _ => return Outcome::notice(Notice::AbacusEmpty),
        };
        abacus.clear();

        let id = self.mint_id();
        let exported = Block::simple(
            id.clone(),
            block.position.offset(self.config.split_offset.dx, 0.0),
            value,
        );
        let next = self.catalog.apply(
            Changes::new()
                .upsert(Block::new(block.id.clone(), block.position, BlockKind::Abacus(abacus)))
                .upsert(exported),
        );
        self.commit("export_abacus", next);
        Outcome::created(vec![id])
    }

    fn lookup_abacus(&self, id: &BlockId) -> Option<(Block, Abacus)> {
        let block = self.lookup(id)?;
        match &block.kind {
            BlockKind::Abacus(a) => Some((block.clone(), a.clone())),
            _ => None,
        }
    }

    fn replace_abacus(&mut self, block: &Block, abacus: Abacus, label: &str) {
        let next = self.catalog.insert(Block::new(
            block.id.clone(),
            block.position,
            BlockKind::Abacus(abacus),
        ));
        self.commit(label, next);
    }

    // ── History ───────────────────────────────────────────────

    /// Restore the previous revision's catalog. `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        self.history.pop();
        let Some(head) = self.history.last() else {
            return false;
        };
        self.catalog = head.catalog.clone();
        self.version += 1;
        debug!(version = self.version, restored = head.short_id(), "undo");
        true
    }

    // ── Intents ───────────────────────────────────────────────

    pub fn apply(&mut self, intent: &Intent) -> Outcome {
        match intent {
            Intent::CreateSimple { value, x, y } => self.create_simple(*value, Position::new(*x, *y)),
            Intent::CreateMold { shape, side, x, y } => {
                self.create_mold(*shape, *side, Position::new(*x, *y))
            }
            Intent::CreateAbacus { x, y } => self.create_abacus(Position::new(*x, *y)),
            Intent::Combine { dragged, target } => self.combine(dragged, target),
            Intent::Click { block } => self.click(block),
            Intent::ApplyManualFactor { block, divisor } => self.apply_manual_factor(block, *divisor),
            Intent::Move { block, x, y } => self.move_block(block, Position::new(*x, *y)),
            Intent::Delete { block } => self.delete_block(block),
            Intent::ChangeAbacusBeads { abacus, row, beads } => {
                self.change_abacus_beads(abacus, *row, *beads)
            }
            Intent::AddAbacusRow { abacus } => self.add_abacus_row(abacus),
            Intent::ExportAbacus { abacus } => self.export_abacus(abacus),
            Intent::SetFactorMode { mode } => self.set_factor_mode(*mode),
            Intent::Undo => {
                self.undo();
                Outcome::quiet()
            }
        }
    }

    /// Apply intents in order, one at a time.
    pub fn replay(&mut self, intents: &[Intent]) -> Vec<Outcome> {
        intents.iter().map(|intent| self.apply(intent)).collect()
    }

    // ── Internal ──────────────────────────────────────────────

    fn lookup(&self, id: &BlockId) -> Option<&Block> {
        let block = self.catalog.get(id);
        if block.is_none() {
            warn!(%id, "unknown block id");
        }
        block
    }

    fn mint_id(&mut self) -> BlockId {
        match self.config.id_scheme {
            IdScheme::Uuid => BlockId::new(format!("block-{}", Uuid::new_v4())),
            IdScheme::Sequential => {
                self.next_seq += 1;
                BlockId::new(format!("block-{}", self.next_seq))
            }
        }
    }

    fn commit(&mut self, label: &str, catalog: Catalog) {
        self.version += 1;
        let parent = self.history.last().map(|r| r.id.clone());
        let revision = Revision::new(parent, self.version, label.to_string(), catalog.clone());
        debug!(
            label,
            version = self.version,
            fingerprint = &revision.fingerprint[..12],
            blocks = catalog.len(),
            "transition recorded"
        );
        self.catalog = catalog;
        self.history.push(revision);

        let excess = excess_revisions(self.history.len(), self.config.history_limit);
        self.history.drain(..excess);
    }
}

fn request_manual_factor(block: &Block) -> Outcome {
    let value = block.value().unwrap_or_default();
    if factor_pair(value).is_none() {
        return Outcome::notice(Notice::PrimeNumber { value });
    }
    Outcome::prompt(Prompt::ManualFactor {
        block: block.id.clone(),
        value,
    })
}
