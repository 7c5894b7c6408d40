//! `CompactorState` — the heart of the mutation compactor (§4.1).
//!
//! Per-partition bookkeeping (empty flags, active range tombstone,
//! emission history, limits, stats) plus the fragment-consume
//! operations that apply tombstones, expire TTL'd cells, purge
//! tombstones past grace period, and enforce row/partition limits with
//! mid-partition resumability.
//!
//! `CompactorState` does not own its consumers — every `consume_*`
//! operation takes the main consumer and the GC consumer by mutable
//! reference, so the same state can be driven by different consumer
//! pairs across pages (see [`super::facade::CompactorFacade`]).

use std::rc::Rc;

use tracing::trace;

use super::consumer::FragmentConsumer;
use super::fragment::{
    Cell, ClusteringKey, ClusteringRow, CollectionMutation, ColumnId, ColumnValue,
    CompactionStats, DecoratedKey, PositionInPartition, RangeTombstoneChange, Row, RowMarker,
    RowTombstone, StaticRow, StopIteration, Tombstone, WallTime,
};
use super::gc_buffer::GarbageCollectorBuffer;
use super::oracle::PurgeableOracle;
use super::schema::{GcPolicy, PartitionSlice, Schema};

// ------------------------------------------------------------------------------------------------
// Mode
// ------------------------------------------------------------------------------------------------

/// Which of the two operating modes (§4.1 "Configuration and construction")
/// this state was constructed for.
enum Mode {
    /// Compaction at read time: limits are enforced, GC is disabled.
    Query { query_time: WallTime },
    /// Compaction at SSTable-rewrite time: limits are infinite, purged
    /// data is forwarded to the GC consumer.
    SstableRewrite {
        compaction_time: WallTime,
        oracle: Rc<dyn PurgeableOracle>,
    },
}

impl Mode {
    fn now(&self) -> WallTime {
        match self {
            Mode::Query { query_time } => *query_time,
            Mode::SstableRewrite { compaction_time, .. } => *compaction_time,
        }
    }

    fn is_sstable_rewrite(&self) -> bool {
        matches!(self, Mode::SstableRewrite { .. })
    }
}

// ------------------------------------------------------------------------------------------------
// CompactorState
// ------------------------------------------------------------------------------------------------

pub struct CompactorState {
    schema: Rc<dyn Schema>,
    gc_policy: Rc<dyn GcPolicy>,
    slice: PartitionSlice,
    mode: Mode,
    gc_buffer: Option<GarbageCollectorBuffer>,
    stats: CompactionStats,

    /// Per-partition cap derived from `slice` at construction (1 for
    /// `SELECT DISTINCT`, else the slice's own limit, `u64::MAX` in
    /// SSTable-rewrite mode).
    partition_row_limit: u64,

    /// Remaining overall row budget across the whole query, decremented
    /// at `consume_end_of_partition` and persisted across pages.
    row_limit: u64,
    /// Remaining partition budget across the whole query.
    partition_limit: u64,

    // ---- per-partition state, reset by consume_new_partition ----
    current_partition_key: Option<DecoratedKey>,
    last_dk: Option<DecoratedKey>,
    empty: bool,
    empty_for_gc: bool,
    rows_in_partition: u64,
    static_row_live: bool,
    partition_tombstone: Tombstone,
    effective_range_tombstone: Tombstone,
    current_emitted_tombstone: Tombstone,
    current_emitted_gc_tombstone: Tombstone,
    current_partition_limit: u64,
    max_purgeable: Option<i64>,
    gc_before: Option<WallTime>,
    last_static_row: Option<StaticRow>,
    last_pos: PositionInPartition,
    return_static_content_on_empty_rows: bool,
    /// Debug-only: whether a clustering row has been seen yet in this
    /// partition, so a late-arriving static row can be flagged (§7).
    seen_clustering_row: bool,

    /// Latched by a row hitting `current_partition_limit`; cleared at
    /// `start_new_page` or when `consume_end_of_partition` decides the
    /// page should continue into the next partition.
    stop: bool,
}

impl CompactorState {
    /// Constructs a state for query-time compaction (§4.1 "Query mode").
    pub fn for_query(
        schema: Rc<dyn Schema>,
        gc_policy: Rc<dyn GcPolicy>,
        query_time: WallTime,
        slice: PartitionSlice,
        row_limit: u64,
        partition_limit: u64,
    ) -> Self {
        let partition_row_limit = slice.effective_partition_row_limit();
        Self::new(
            schema,
            gc_policy,
            slice,
            Mode::Query { query_time },
            None,
            partition_row_limit,
            row_limit,
            partition_limit,
        )
    }

    /// Constructs a state for SSTable-rewrite compaction (§4.1 "SSTable-compaction mode").
    pub fn for_sstable_rewrite(
        schema: Rc<dyn Schema>,
        gc_policy: Rc<dyn GcPolicy>,
        compaction_time: WallTime,
        oracle: Rc<dyn PurgeableOracle>,
    ) -> Self {
        let slice = schema.full_slice();
        Self::new(
            schema,
            gc_policy,
            slice,
            Mode::SstableRewrite {
                compaction_time,
                oracle,
            },
            Some(GarbageCollectorBuffer::new()),
            u64::MAX,
            u64::MAX,
            u64::MAX,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        schema: Rc<dyn Schema>,
        gc_policy: Rc<dyn GcPolicy>,
        slice: PartitionSlice,
        mode: Mode,
        gc_buffer: Option<GarbageCollectorBuffer>,
        partition_row_limit: u64,
        row_limit: u64,
        partition_limit: u64,
    ) -> Self {
        Self {
            schema,
            gc_policy,
            slice,
            mode,
            gc_buffer,
            stats: CompactionStats::default(),
            partition_row_limit,
            row_limit,
            partition_limit,
            current_partition_key: None,
            last_dk: None,
            empty: true,
            empty_for_gc: true,
            rows_in_partition: 0,
            static_row_live: false,
            partition_tombstone: Tombstone::empty(),
            effective_range_tombstone: Tombstone::empty(),
            current_emitted_tombstone: Tombstone::empty(),
            current_emitted_gc_tombstone: Tombstone::empty(),
            current_partition_limit: row_limit.min(partition_row_limit),
            max_purgeable: None,
            gc_before: None,
            last_static_row: None,
            last_pos: PositionInPartition::PartitionStart,
            return_static_content_on_empty_rows: slice.returns_static_content_on_empty_rows(),
            seen_clustering_row: false,
            stop: false,
        }
    }

    // ----------------------------------------------------------------------------------------
    // Accessors used by external observers (§5 "shared ownership handle")
    // ----------------------------------------------------------------------------------------

    pub fn stats(&self) -> CompactionStats {
        self.stats
    }

    pub fn current_partition(&self) -> Option<&DecoratedKey> {
        self.current_partition_key.as_ref()
    }

    pub fn current_position(&self) -> &PositionInPartition {
        &self.last_pos
    }

    pub fn row_limit(&self) -> u64 {
        self.row_limit
    }

    pub fn partition_limit(&self) -> u64 {
        self.partition_limit
    }

    fn now(&self) -> WallTime {
        self.mode.now()
    }

    // ----------------------------------------------------------------------------------------
    // Purge predicate (§4.1 "Purge predicate")
    // ----------------------------------------------------------------------------------------

    /// `true` iff `t` may be dropped without being forwarded anywhere —
    /// i.e. some other copy of the data it shadows is guaranteed to
    /// survive. Unconditionally `true` in query mode (applying is always
    /// safe; the GC consumer is simply never wired up there), and
    /// `t.timestamp < max_purgeable` in SSTable-rewrite mode.
    pub fn can_gc(&mut self, t: Tombstone) -> bool {
        if !self.mode.is_sstable_rewrite() {
            return true;
        }
        if t.is_empty() {
            return false;
        }
        self.ensure_max_purgeable();
        t.timestamp < self.max_purgeable.expect("primed above")
    }

    /// `can_gc(t) && t.deletion_time < gc_before` — `t` is both safe to
    /// drop and past its grace period.
    pub fn can_purge_tombstone(&mut self, t: Tombstone) -> bool {
        if !self.can_gc(t) {
            return false;
        }
        self.ensure_gc_before();
        t.deletion_time < self.gc_before.expect("primed above")
    }

    fn ensure_max_purgeable(&mut self) {
        if self.max_purgeable.is_some() {
            return;
        }
        let max_purgeable = match &self.mode {
            Mode::SstableRewrite { oracle, .. } => {
                let key = self
                    .current_partition_key
                    .as_ref()
                    .expect("max_purgeable requested before a partition started");
                oracle.max_purgeable_timestamp(key)
            }
            Mode::Query { .. } => i64::MAX,
        };
        self.max_purgeable = Some(max_purgeable);
    }

    fn ensure_gc_before(&mut self) {
        if self.gc_before.is_some() {
            return;
        }
        let key = self
            .current_partition_key
            .as_ref()
            .expect("gc_before requested before a partition started")
            .clone();
        let now = self.now();
        let gc_before = self.gc_policy.gc_before_for_key(self.schema.as_ref(), &key, now);
        self.gc_before = Some(gc_before);
    }

    // ----------------------------------------------------------------------------------------
    // Lazy partition-start announcement
    // ----------------------------------------------------------------------------------------

    fn announce_to_main<C: FragmentConsumer>(&mut self, main: &mut C) {
        if self.empty {
            let key = self
                .current_partition_key
                .as_ref()
                .expect("announce requested before a partition started");
            main.consume_new_partition(key);
            self.empty = false;
        }
    }

    fn announce_to_gc<G: FragmentConsumer>(&mut self, gc: &mut G) {
        if self.empty_for_gc {
            let key = self
                .current_partition_key
                .as_ref()
                .expect("announce requested before a partition started");
            gc.consume_new_partition(key);
            self.empty_for_gc = false;
        }
    }

    // ----------------------------------------------------------------------------------------
    // consume_new_partition
    // ----------------------------------------------------------------------------------------

    pub fn consume_new_partition(&mut self, key: DecoratedKey) {
        debug_assert!(
            self.current_partition_key.is_none() || self.stop,
            "new partition started without a stop or start_new_page"
        );

        self.current_partition_key = Some(key);
        self.last_dk = None;
        self.empty = true;
        self.empty_for_gc = true;
        self.rows_in_partition = 0;
        self.static_row_live = false;
        self.partition_tombstone = Tombstone::empty();
        self.effective_range_tombstone = Tombstone::empty();
        self.current_emitted_tombstone = Tombstone::empty();
        self.current_emitted_gc_tombstone = Tombstone::empty();
        self.current_partition_limit = self.row_limit.min(self.partition_row_limit);
        self.max_purgeable = None;
        self.gc_before = None;
        self.last_static_row = None;
        self.last_pos = PositionInPartition::PartitionStart;
        self.return_static_content_on_empty_rows = self.slice.returns_static_content_on_empty_rows();
        self.seen_clustering_row = false;
        self.stop = false;
        self.stats.partitions += 1;
    }

    // ----------------------------------------------------------------------------------------
    // consume(partition_tombstone)
    // ----------------------------------------------------------------------------------------

    pub fn consume_partition_tombstone<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        tombstone: Tombstone,
        main: &mut C,
        gc: &mut G,
    ) {
        self.partition_tombstone = tombstone;

        if self.can_purge_tombstone(tombstone) {
            self.announce_to_gc(gc);
            gc.consume_partition_tombstone(tombstone);
        } else {
            self.announce_to_main(main);
            main.consume_partition_tombstone(tombstone);
        }
    }

    // ----------------------------------------------------------------------------------------
    // consume(static_row)
    // ----------------------------------------------------------------------------------------

    pub fn consume_static_row<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        mut row: StaticRow,
        main: &mut C,
        gc: &mut G,
    ) -> StopIteration {
        debug_assert!(!self.stop, "fragment fed after a latched stop without start_new_page");
        debug_assert!(!self.seen_clustering_row, "static row arrived after a clustering row");

        self.last_static_row = Some(row.clone());

        if self.gc_buffer.is_some() {
            self.gc_buffer.as_mut().unwrap().start_collecting_static_row();
        }

        let row_tombstone = RowTombstone::from_partition_tombstone(self.partition_tombstone);
        let now = self.now();
        let is_live = self.compact_row(&mut row.cells, row_tombstone.dominant(), now);

        self.stats.static_rows.record(is_live);
        self.static_row_live = is_live;

        if let Some(gc_buffer) = self.gc_buffer.as_mut() {
            if let Some(dead_row) = gc_buffer.take_static_row() {
                self.announce_to_gc(gc);
                let dead_tombstone = RowTombstone::from_partition_tombstone(self.partition_tombstone);
                gc.consume_static_row(dead_row, dead_tombstone, false);
            }
        }

        let purged = self.can_purge_tombstone(self.partition_tombstone);
        let emitted_tombstone = if purged {
            RowTombstone::none()
        } else {
            row_tombstone
        };

        if is_live || !row.is_empty() {
            self.announce_to_main(main);
            return main.consume_static_row(row, emitted_tombstone, is_live);
        }

        StopIteration::No
    }

    // ----------------------------------------------------------------------------------------
    // consume(clustering_row)
    // ----------------------------------------------------------------------------------------

    pub fn consume_clustering_row<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        mut row: ClusteringRow,
        main: &mut C,
        gc: &mut G,
    ) -> StopIteration {
        debug_assert!(!self.stop, "fragment fed after a latched stop without start_new_page");
        debug_assert!(
            row.position() >= self.last_pos,
            "clustering row out of ascending PositionInPartition order"
        );

        self.seen_clustering_row = true;
        self.last_pos = row.position();

        let ctomb = Tombstone::max(self.partition_tombstone, self.effective_range_tombstone);
        let original_row_tombstone = row.row_tombstone;
        let combined = Tombstone::max(original_row_tombstone.dominant(), ctomb);

        if let Some(gc_buffer) = self.gc_buffer.as_mut() {
            gc_buffer.start_collecting_clustering_row(row.key.clone());
        }

        let mut emitted_row_tombstone = original_row_tombstone;
        if original_row_tombstone.dominant() <= ctomb {
            // Already shadowed by an enclosing tombstone; nothing new to report.
            emitted_row_tombstone = RowTombstone::none();
        } else if self.can_purge_tombstone(original_row_tombstone.dominant()) {
            if let Some(gc_buffer) = self.gc_buffer.as_mut() {
                gc_buffer.collect_row_tombstone(original_row_tombstone);
            }
            emitted_row_tombstone = RowTombstone::none();
        }
        row.row_tombstone = emitted_row_tombstone;

        // A marker's own liveness is judged against `regular` only, not
        // `shadowable` — `shadowable` is itself dominated by a newer row
        // marker, so folding it in here via `dominant()` would make a
        // marker's liveness circular.
        let marker_ctomb = Tombstone::max(original_row_tombstone.regular, ctomb);
        let now = self.now();
        let marker_alive = row.marker.is_live(marker_ctomb, now);
        if !marker_alive {
            if let Some(gc_buffer) = self.gc_buffer.as_mut() {
                gc_buffer.collect_marker(row.marker);
            }
            row.marker = RowMarker::missing();
        }

        let any_cell_live = self.compact_row(&mut row.cells, combined, now);
        let is_live = marker_alive || any_cell_live;
        self.stats.clustering_rows.record(is_live);

        if let Some(gc_buffer) = self.gc_buffer.as_mut() {
            if let Some(dead_row) = gc_buffer.take_clustering_row() {
                self.announce_to_gc(gc);
                gc.consume_clustering_row(dead_row, RowTombstone::from_combined(combined), false);
            }
        }

        let purged = self.can_purge_tombstone(combined);
        if purged {
            row.row_tombstone = RowTombstone::none();
        }

        let mut stop = StopIteration::No;
        if !row.is_empty() {
            self.announce_to_main(main);
            let emitted = row.row_tombstone;
            stop = main.consume_clustering_row(row, emitted, is_live);
        }

        if !self.mode.is_sstable_rewrite() {
            if is_live {
                self.rows_in_partition += 1;
                if self.rows_in_partition == self.current_partition_limit {
                    self.stop = true;
                }
            }
        }

        stop | StopIteration::from(self.stop)
    }

    // ----------------------------------------------------------------------------------------
    // consume(range_tombstone_change)
    // ----------------------------------------------------------------------------------------

    pub fn consume_range_tombstone_change<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        mut change: RangeTombstoneChange,
        main: &mut C,
        gc: &mut G,
    ) -> StopIteration {
        debug_assert!(!self.stop, "fragment fed after a latched stop without start_new_page");
        debug_assert!(
            change.position() >= self.last_pos,
            "range tombstone change out of ascending PositionInPartition order"
        );

        self.stats.range_tombstones += 1;
        self.last_pos = change.position();

        if change.tombstone <= self.partition_tombstone {
            change.tombstone = Tombstone::empty();
        }
        self.effective_range_tombstone = change.tombstone;

        let can_purge = !change.tombstone.is_empty() && self.can_purge_tombstone(change.tombstone);

        let mut stop = StopIteration::No;

        // GC consumer path.
        if can_purge || !self.current_emitted_gc_tombstone.is_empty() {
            self.announce_to_gc(gc);
            let forwarded = if can_purge { change.tombstone } else { Tombstone::empty() };
            let gc_change = RangeTombstoneChange {
                position: change.position.clone(),
                tombstone: forwarded,
            };
            gc.consume_range_tombstone_change(gc_change);
            self.current_emitted_gc_tombstone = forwarded;
            if can_purge {
                change.tombstone = Tombstone::empty();
            }
        }

        // Main consumer path.
        if !self.current_emitted_tombstone.is_empty() || !change.tombstone.is_empty() {
            self.announce_to_main(main);
            self.current_emitted_tombstone = change.tombstone;
            stop = main.consume_range_tombstone_change(change);
        }

        stop
    }

    // ----------------------------------------------------------------------------------------
    // consume_end_of_partition
    // ----------------------------------------------------------------------------------------

    pub fn consume_end_of_partition<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        main: &mut C,
        gc: &mut G,
    ) -> StopIteration {
        if !self.effective_range_tombstone.is_empty() {
            let closing = RangeTombstoneChange {
                position: PositionInPartition::after_key(self.last_clustering_key()),
                tombstone: Tombstone::empty(),
            };
            let preserved = self.effective_range_tombstone;
            self.consume_range_tombstone_change(closing, main, gc);
            self.effective_range_tombstone = preserved;
        }

        if !self.empty_for_gc {
            gc.consume_end_of_partition();
        }

        // This partition's fragment sequence is fully consumed — whatever
        // `stop` ends up meaning below, it is never "resume mid-partition".
        self.current_partition_key = None;

        if self.empty {
            self.stop = false;
            return StopIteration::No;
        }

        if self.rows_in_partition == 0 && self.static_row_live && self.return_static_content_on_empty_rows
        {
            self.rows_in_partition = 1;
        }

        self.row_limit = self.row_limit.saturating_sub(self.rows_in_partition);
        if self.rows_in_partition > 0 {
            self.partition_limit = self.partition_limit.saturating_sub(1);
        }

        let consumer_stop = main.consume_end_of_partition();

        if self.mode.is_sstable_rewrite() {
            self.stop = false;
            return StopIteration::No;
        }

        let limit_stop =
            self.row_limit == 0 || self.partition_limit == 0 || consumer_stop.is_stop();

        self.stop = limit_stop;
        StopIteration::from(limit_stop)
    }

    fn last_clustering_key(&self) -> ClusteringKey {
        match &self.last_pos {
            PositionInPartition::Clustering(k) | PositionInPartition::AfterKey(k) => k.clone(),
            _ => ClusteringKey::new(Vec::new()),
        }
    }

    // ----------------------------------------------------------------------------------------
    // consume_end_of_stream
    // ----------------------------------------------------------------------------------------

    pub fn consume_end_of_stream<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        main: &mut C,
        gc: &mut G,
    ) -> (C::EndOfStream, G::EndOfStream) {
        self.last_dk = self.current_partition_key.take();
        let main_result = main.consume_end_of_stream();
        let gc_result = gc.consume_end_of_stream();
        (main_result, gc_result)
    }

    // ----------------------------------------------------------------------------------------
    // Pagination (§4.1 "Pagination")
    // ----------------------------------------------------------------------------------------

    pub fn start_new_page(&mut self, row_limit: u64, partition_limit: u64, query_time: WallTime) {
        self.row_limit = row_limit;
        self.partition_limit = partition_limit;
        if let Mode::Query { query_time: qt } = &mut self.mode {
            *qt = query_time;
        }
        self.stats.reset();
        self.empty = true;
        self.empty_for_gc = true;
        self.rows_in_partition = 0;
        self.current_partition_limit = self.row_limit.min(self.partition_row_limit);
        self.stop = false;
    }

    /// Replays cached state (a static row, an open range tombstone) into
    /// the fresh page's consumer once the page driver knows where the
    /// next fragment region begins. Call after [`Self::start_new_page`]
    /// and before feeding the page's own fragments.
    pub fn replay_into_page<C: FragmentConsumer, G: FragmentConsumer>(
        &mut self,
        next_region_is_clustered: bool,
        main: &mut C,
        gc: &mut G,
    ) {
        if next_region_is_clustered {
            if let Some(sr) = self.last_static_row.clone() {
                self.consume_static_row(sr, main, gc);
            }
        }

        if !self.effective_range_tombstone.is_empty() {
            let reopen = RangeTombstoneChange {
                position: PositionInPartition::after_key(self.last_clustering_key()),
                tombstone: self.effective_range_tombstone,
            };
            self.consume_range_tombstone_change(reopen, main, gc);
        }
    }

    // ----------------------------------------------------------------------------------------
    // Detach (§4.1 "Detach")
    // ----------------------------------------------------------------------------------------

    /// Returns the minimal set of fragments needed to resume compaction
    /// of this partition at the next page, or `None` if the partition
    /// was exhausted (no `stop` latched).
    pub fn detach_state(&self) -> Option<DetachedState> {
        if !self.stop {
            return None;
        }

        let key = self.last_dk.clone().or_else(|| self.current_partition_key.clone())?;

        let open_range = if self.effective_range_tombstone.is_empty() {
            None
        } else {
            Some(RangeTombstoneChange {
                position: PositionInPartition::after_key(self.last_clustering_key()),
                tombstone: self.effective_range_tombstone,
            })
        };

        Some(DetachedState {
            partition_key: key,
            partition_tombstone: self.partition_tombstone,
            static_row: self.last_static_row.clone(),
            open_range,
        })
    }

    // ----------------------------------------------------------------------------------------
    // Cell / row compaction
    // ----------------------------------------------------------------------------------------

    /// Strips dead (shadowed or TTL-expired) cells from `row` under
    /// `tombstone`, handing them to the GC buffer when one is attached.
    /// Returns whether any cell survived.
    fn compact_row(&mut self, row: &mut Row, tombstone: Tombstone, now: WallTime) -> bool {
        let collecting = self.gc_buffer.is_some();
        let mut any_live = false;
        let mut dead_cells: Vec<(ColumnId, Cell)> = Vec::new();
        let mut dead_collections: Vec<(ColumnId, CollectionMutation)> = Vec::new();

        row.retain(|id, value| match value {
            ColumnValue::Cell(cell) => {
                let dead = cell.is_shadowed_by(tombstone) || cell.is_expired(now);
                if dead {
                    if collecting {
                        dead_cells.push((id, cell.clone()));
                    }
                    false
                } else {
                    any_live = true;
                    true
                }
            }
            ColumnValue::Collection(coll) => {
                let mut kept = Vec::with_capacity(coll.cells.len());
                let mut dropped = Vec::new();
                for (subkey, cell) in coll.cells.drain(..) {
                    let dead = cell.is_shadowed_by(tombstone)
                        || cell.is_shadowed_by(coll.tombstone)
                        || cell.is_expired(now);
                    if dead {
                        dropped.push((subkey, cell));
                    } else {
                        kept.push((subkey, cell));
                    }
                }
                let tombstone_spent = !coll.tombstone.is_empty() && coll.tombstone.timestamp <= tombstone.timestamp;

                if collecting && (!dropped.is_empty() || tombstone_spent) {
                    dead_collections.push((
                        id,
                        CollectionMutation {
                            tombstone: if tombstone_spent { coll.tombstone } else { Tombstone::empty() },
                            cells: dropped,
                        },
                    ));
                }

                coll.cells = kept;
                if tombstone_spent {
                    coll.tombstone = Tombstone::empty();
                }

                if coll.is_empty() {
                    false
                } else {
                    any_live = true;
                    true
                }
            }
        });

        if let Some(gc_buffer) = self.gc_buffer.as_mut() {
            for (id, cell) in dead_cells {
                trace!(id, "compactor: collecting expired/shadowed cell");
                gc_buffer.collect_cell(id, cell);
            }
            for (id, coll) in dead_collections {
                gc_buffer.collect_collection(id, coll);
            }
        }

        any_live
    }
}

impl RowTombstone {
    /// An empty row tombstone tagged with the combined tombstone it was
    /// computed against, for GC-sink emissions where the shape expected
    /// is a `RowTombstone` but only a single combined `Tombstone` is in
    /// hand.
    fn from_combined(combined: Tombstone) -> RowTombstone {
        RowTombstone {
            regular: combined,
            shadowable: Tombstone::empty(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Detached state
// ------------------------------------------------------------------------------------------------

/// The minimal set of fragments needed to resume compaction of a
/// partition at the next page (§4.1 "Detach").
///
/// Replaying `partition_start(partition_key, partition_tombstone)`,
/// then `static_row` (if any), then `open_range` (if any) through a
/// fresh compactor brings it to an equivalent state.
#[derive(Debug, Clone)]
pub struct DetachedState {
    pub partition_key: DecoratedKey,
    pub partition_tombstone: Tombstone,
    pub static_row: Option<StaticRow>,
    pub open_range: Option<RangeTombstoneChange>,
}
