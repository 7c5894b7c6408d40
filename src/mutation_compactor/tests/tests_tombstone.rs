//! Tombstone shadowing and purge-grace-period tests.

use crate::mutation_compactor::state::CompactorState;
use crate::mutation_compactor::{NullConsumer, PartitionSlice, Row, WallTime};

use super::helpers::*;

/// # Scenario
/// A clustering row's own deletion is dominated by an enclosing
/// partition tombstone.
///
/// # Starting environment
/// Query-mode compactor, no grace period configured to matter (query
/// time is far from both deletions).
///
/// # Actions
/// 1. `consume_new_partition`
/// 2. `consume_partition_tombstone` at timestamp 100.
/// 3. `consume_clustering_row` carrying its own row tombstone at
///    timestamp 50 (older than the partition tombstone).
///
/// # Expected behavior
/// The row carries nothing an enclosing partition tombstone does not
/// already say, and has no marker or cells of its own — it is dropped
/// entirely rather than re-announced as a distinct (and now empty)
/// deletion downstream.
#[test]
fn row_tombstone_dominated_by_partition_tombstone_is_not_reemitted() {
    let mut state = CompactorState::for_query(
        simple_schema(),
        no_grace_period(),
        WallTime(1_000_000),
        PartitionSlice::ALL,
        u64::MAX,
        u64::MAX,
    );
    let mut main = RecordingConsumer::new();
    let mut gc = NullConsumer;

    state.consume_new_partition(dk("p1"));
    state.consume_partition_tombstone(t(100, 10), &mut main, &mut gc);
    state.consume_clustering_row(deleted_clustering_row("c1", t(50, 5)), &mut main, &mut gc);
    state.consume_end_of_partition(&mut main, &mut gc);

    assert!(
        !main.events.iter().any(|e| matches!(e, Event::ClusteringRow { .. })),
        "row subsumed by the partition tombstone should not be re-emitted: {:?}",
        main.events
    );
}

/// # Scenario
/// A partition tombstone old enough to be past its grace period is
/// forwarded to the GC consumer instead of the main consumer.
///
/// # Starting environment
/// SSTable-rewrite mode, a 100ns grace period, query time far enough
/// ahead of the deletion that it has expired.
///
/// # Actions
/// 1. `consume_partition_tombstone` with `deletion_time = 0`.
/// 2. `consume_end_of_partition` / `consume_end_of_stream`.
///
/// # Expected behavior
/// The main consumer never sees a `PartitionTombstone` event; the GC
/// consumer does (and is the one that gets the lazily-announced
/// `NewPartition`, since the main side never received anything).
#[test]
fn expired_partition_tombstone_is_forwarded_to_gc_not_main() {
    use crate::mutation_compactor::AlwaysPurgeableOracle;
    use std::rc::Rc;

    let mut state = CompactorState::for_sstable_rewrite(
        simple_schema(),
        grace_period(100),
        WallTime(1_000),
        Rc::new(AlwaysPurgeableOracle),
    );
    let mut main = RecordingConsumer::new();
    let mut gc = RecordingConsumer::new();

    state.consume_new_partition(dk("p1"));
    state.consume_partition_tombstone(t(1, 0), &mut main, &mut gc);
    state.consume_end_of_partition(&mut main, &mut gc);
    state.consume_end_of_stream(&mut main, &mut gc);

    assert!(
        main.events.is_empty(),
        "main consumer should see nothing for a fully-purged partition: {:?}",
        main.events
    );
    assert!(matches!(gc.events.first(), Some(Event::NewPartition(_))));
    assert!(gc
        .events
        .iter()
        .any(|e| matches!(e, Event::PartitionTombstone(_))));
}

/// # Scenario
/// A partition tombstone within its grace period is still shown to
/// readers even in SSTable-rewrite mode.
///
/// # Starting environment
/// A 1000ns grace period; deletion time is only 1ns before query time.
///
/// # Actions
/// `consume_partition_tombstone` then end the partition.
///
/// # Expected behavior
/// Main consumer receives the tombstone; GC consumer receives nothing.
#[test]
fn fresh_partition_tombstone_stays_with_main_consumer() {
    use crate::mutation_compactor::NeverPurgeableOracle;
    use std::rc::Rc;

    let mut state = CompactorState::for_sstable_rewrite(
        simple_schema(),
        grace_period(1000),
        WallTime(1_000),
        Rc::new(NeverPurgeableOracle),
    );
    let mut main = RecordingConsumer::new();
    let mut gc = RecordingConsumer::new();

    state.consume_new_partition(dk("p1"));
    state.consume_partition_tombstone(t(1, 999), &mut main, &mut gc);
    state.consume_end_of_partition(&mut main, &mut gc);

    assert!(gc.events.is_empty());
    assert!(main
        .events
        .iter()
        .any(|e| matches!(e, Event::PartitionTombstone(_))));
}

/// # Scenario
/// A range tombstone shadows a clustering row that falls inside its
/// span but not one that falls outside it.
///
/// # Actions
/// Open a range tombstone at timestamp 100 before clustering key
/// "b", feed rows "a" (before the range), "b" (inside), close the
/// range after "b", then feed "c" (after the range is closed).
///
/// # Expected behavior
/// Row "a" and "c" keep their live marker; row "b" is dropped (its
/// marker predates the covering range tombstone).
#[test]
fn range_tombstone_shadows_only_rows_inside_its_span() {
    let mut state = CompactorState::for_query(
        simple_schema(),
        never_purge_grace(),
        WallTime(1_000_000),
        PartitionSlice::ALL,
        u64::MAX,
        u64::MAX,
    );
    let mut main = RecordingConsumer::new();
    let mut gc = NullConsumer;

    state.consume_new_partition(dk("p1"));
    state.consume_clustering_row(live_clustering_row("a", 50, &[]), &mut main, &mut gc);
    state.consume_range_tombstone_change(
        crate::mutation_compactor::RangeTombstoneChange {
            position: crate::mutation_compactor::PositionInPartition::Clustering(ck("b")),
            tombstone: t(100, 10),
        },
        &mut main,
        &mut gc,
    );
    state.consume_clustering_row(live_clustering_row("b", 60, &[]), &mut main, &mut gc);
    state.consume_range_tombstone_change(
        crate::mutation_compactor::RangeTombstoneChange {
            position: crate::mutation_compactor::PositionInPartition::AfterKey(ck("b")),
            tombstone: crate::mutation_compactor::Tombstone::empty(),
        },
        &mut main,
        &mut gc,
    );
    state.consume_clustering_row(live_clustering_row("c", 70, &[]), &mut main, &mut gc);
    state.consume_end_of_partition(&mut main, &mut gc);

    let liveness: Vec<(String, bool)> = main
        .events
        .iter()
        .filter_map(|e| match e {
            Event::ClusteringRow { row, is_live, .. } => {
                Some((String::from_utf8(row.key.0.clone()).unwrap(), *is_live))
            }
            _ => None,
        })
        .collect();

    assert_eq!(
        liveness,
        vec![
            ("a".to_string(), true),
            ("b".to_string(), false),
            ("c".to_string(), true),
        ]
    );
}

/// # Scenario
/// A row marker's own liveness is judged against the row's *regular*
/// tombstone, not the `shadowable` one — `shadowable` exists to be
/// dominated by a later row marker, so folding it into the marker's
/// own liveness check would be circular.
///
/// # Starting environment
/// A clustering row carries a `shadowable` tombstone newer than its
/// own marker but older than its `regular` tombstone.
///
/// # Actions
/// `consume_clustering_row` with `marker_ts` between `shadowable.timestamp`
/// and `regular.timestamp`.
///
/// # Expected behavior
/// The marker is judged dead (it is older than `regular`), matching
/// what a `regular`-only check would say; the old buggy check (which
/// folded in `shadowable` via `dominant()`) would have agreed here too,
/// so the row is also fed a second time with `regular` older than the
/// marker and `shadowable` newer than the marker — there the marker
/// must be judged alive, which only the `regular`-only check gets
/// right (the buggy check would have judged it dead).
#[test]
fn marker_liveness_is_judged_against_regular_tombstone_only() {
    let mut state = CompactorState::for_query(
        simple_schema(),
        never_purge_grace(),
        WallTime(1_000_000),
        PartitionSlice::ALL,
        u64::MAX,
        u64::MAX,
    );
    let mut main = RecordingConsumer::new();
    let mut gc = NullConsumer;

    state.consume_new_partition(dk("p1"));
    state.consume_clustering_row(
        crate::mutation_compactor::ClusteringRow {
            key: ck("a"),
            row_tombstone: crate::mutation_compactor::RowTombstone {
                regular: t(10, 0),
                shadowable: t(200, 0),
            },
            marker: crate::mutation_compactor::RowMarker::live(100),
            cells: Row::new(),
        },
        &mut main,
        &mut gc,
    );
    state.consume_end_of_partition(&mut main, &mut gc);

    match main.events.iter().find(|e| matches!(e, Event::ClusteringRow { .. })) {
        Some(Event::ClusteringRow { is_live, .. }) => {
            assert!(
                *is_live,
                "marker at ts 100 outlives `regular` at ts 10 and must be judged alive, \
                 even though `shadowable` at ts 200 would make it look dead if folded in"
            );
        }
        other => panic!("expected a clustering row event, got {other:?}"),
    }
}

/// # Scenario
/// A cell whose TTL has already elapsed at `query_time` is dropped
/// even with no tombstone in play at all.
#[test]
fn expired_cell_is_dropped_without_any_tombstone() {
    let mut state = CompactorState::for_query(
        simple_schema(),
        no_grace_period(),
        WallTime(100),
        PartitionSlice::ALL,
        u64::MAX,
        u64::MAX,
    );
    let mut main = RecordingConsumer::new();
    let mut gc = NullConsumer;

    let mut row = live_clustering_row("a", 1, &[]);
    row.cells
        .set_cell(1, crate::mutation_compactor::Cell::with_ttl(b"v".to_vec(), 1, WallTime(50)));

    state.consume_new_partition(dk("p1"));
    state.consume_clustering_row(row, &mut main, &mut gc);
    state.consume_end_of_partition(&mut main, &mut gc);

    match main.events.iter().find(|e| matches!(e, Event::ClusteringRow { .. })) {
        Some(Event::ClusteringRow { row, is_live, .. }) => {
            assert!(row.cells.get(1).is_none(), "expired cell should have been stripped");
            assert!(*is_live, "the row marker is still live even though the cell expired");
        }
        other => panic!("expected a clustering row event, got {other:?}"),
    }
}
