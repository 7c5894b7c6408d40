//! # aeternusdb-compactor
//!
//! The mutation compactor: a streaming state machine that consumes the
//! fragmented representation of a database partition — partition
//! header, partition-level tombstone, static row, clustering rows,
//! range-tombstone changes, partition end — and emits a *compacted*
//! stream to one or two downstream consumers.
//!
//! Compaction here means: applying tombstones to shadowed data,
//! expiring TTL'd cells, purging tombstones past their grace period,
//! and enforcing per-query row/partition limits with mid-partition
//! resumability.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 CompactorFacade<C, G>                    │
//! │   owns a shared CompactorState + a (main, gc) consumer    │
//! │   pair, and forwards the fragment protocol to it.         │
//! └───────────────────────┬──────────────────────────────────┘
//!                         │ consume(Fragment) -> StopIteration
//!                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                    CompactorState                        │
//! │  per-partition bookkeeping: active range tombstone,       │
//! │  emission history, row/partition limits, stats            │
//! │                                                            │
//! │   shadowing/expiry  ──────────────►  live fragments  ──► C │
//! │   (tombstones, TTL)                                        │
//! │                       ╲                                   │
//! │                        ╲──► GarbageCollectorBuffer ──► G   │
//! │                             (SSTable-rewrite mode only)     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`mutation_compactor::fragment`] | Data model: tombstones, rows, cells, the fragment cursor |
//! | [`mutation_compactor::state`] | `CompactorState` — the compaction engine |
//! | [`mutation_compactor::facade`] | `CompactorFacade` / `QueryCompactor` / `CompactionCompactor` |
//! | [`mutation_compactor::gc_buffer`] | Per-row scratch space for garbage collected during SSTable rewrite |
//! | [`mutation_compactor::consumer`] | The `FragmentConsumer` capability trait both sinks implement |
//! | [`mutation_compactor::schema`] | Schema / grace-period-policy collaborator seams |
//! | [`mutation_compactor::oracle`] | Purgeable-timestamp oracle collaborator seam |
//! | [`mutation_compactor::clock`] | Wall-clock collaborator seam |
//!
//! ## Key properties
//!
//! - **Two operating modes sharing one engine** — query-time compaction
//!   (limits enforced, garbage never emitted) and SSTable-rewrite
//!   compaction (no limits, garbage forwarded to a second consumer).
//! - **Dual-consumer fan-out** — live fragments go to the main consumer,
//!   purged fragments go to a GC consumer, each with independently
//!   closed range-tombstone spans.
//! - **Detach/resume** — a paused, mid-partition iteration can be
//!   resumed at the next page from a handful of replayed fragments
//!   without losing tombstone context.
//! - **Single-threaded, non-suspending** — every `consume_*` call runs
//!   to completion; there is no internal locking or cross-thread state.
//!
//! ## Quick start
//!
//! ```
//! use aeternusdb_compactor::mutation_compactor::{
//!     ClusteringKey, ClusteringRow, DecoratedKey, Fragment, FixedGracePeriod,
//!     PartitionSlice, QueryCompactor, RowMarker, RowTombstone, Row, SimpleSchema,
//!     StopIteration, Tombstone, WallTime,
//! };
//! use std::rc::Rc;
//!
//! # #[derive(Default)]
//! # struct CountingConsumer { rows: usize }
//! # impl aeternusdb_compactor::mutation_compactor::FragmentConsumer for CountingConsumer {
//! #     type EndOfStream = usize;
//! #     fn consume_new_partition(&mut self, _key: &DecoratedKey) {}
//! #     fn consume_partition_tombstone(&mut self, _t: Tombstone) {}
//! #     fn consume_static_row(&mut self, _r: aeternusdb_compactor::mutation_compactor::StaticRow, _t: RowTombstone, _live: bool) -> StopIteration { StopIteration::No }
//! #     fn consume_clustering_row(&mut self, _r: ClusteringRow, _t: RowTombstone, is_live: bool) -> StopIteration {
//! #         if is_live { self.rows += 1; }
//! #         StopIteration::No
//! #     }
//! #     fn consume_range_tombstone_change(&mut self, _c: aeternusdb_compactor::mutation_compactor::RangeTombstoneChange) -> StopIteration { StopIteration::No }
//! #     fn consume_end_of_partition(&mut self) -> StopIteration { StopIteration::No }
//! #     fn consume_end_of_stream(&mut self) -> Self::EndOfStream { self.rows }
//! # }
//! let schema = SimpleSchema::new(vec![], PartitionSlice::ALL);
//! let gc_policy = Rc::new(FixedGracePeriod { grace_nanos: 0 });
//!
//! let mut compactor = QueryCompactor::new(
//!     schema,
//!     gc_policy,
//!     WallTime(1_000),
//!     PartitionSlice::ALL,
//!     /* row_limit */ 100,
//!     /* partition_limit */ 10,
//!     CountingConsumer::default(),
//! );
//!
//! compactor.consume(Fragment::PartitionStart {
//!     key: DecoratedKey::new(b"user42".to_vec()),
//!     partition_tombstone: Tombstone::empty(),
//! });
//! compactor.consume(Fragment::ClusteringRow(ClusteringRow {
//!     key: ClusteringKey::new(b"2024-01-01".to_vec()),
//!     row_tombstone: RowTombstone::none(),
//!     marker: RowMarker::live(1),
//!     cells: Row::new(),
//! }));
//! compactor.consume(Fragment::PartitionEnd);
//! let live_rows = compactor.consume_end_of_stream();
//! assert_eq!(live_rows, 1);
//! ```

#![allow(dead_code)]

pub mod mutation_compactor;
