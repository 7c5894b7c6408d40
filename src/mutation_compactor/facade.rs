//! Entry point tying a [`state::CompactorState`] to a pair of
//! [`FragmentConsumer`]s, plus the two call-site specializations (§4
//! "Query-mode vs. compaction-mode specializations").
//!
//! The state lives behind `Rc<RefCell<_>>` rather than a lock: the
//! compactor is driven synchronously within one task, there is no
//! cross-thread sharing, so an atomic-free single-threaded cell is the
//! right tool (unlike [`crate::engine::Engine`]'s `Arc<RwLock<_>>`,
//! which does need to cross thread boundaries).

use std::cell::RefCell;
use std::rc::Rc;

use super::consumer::{FragmentConsumer, NullConsumer};
use super::fragment::{DecoratedKey, Fragment, StopIteration, WallTime};
use super::oracle::PurgeableOracle;
use super::schema::{GcPolicy, PartitionSlice, Schema};
use super::state::{CompactorState, DetachedState};

/// Drives one `CompactorState` through a fragment stream, dispatching
/// each [`Fragment`] to the right `consume_*` call and fanning the
/// result out to `main` and `gc`.
pub struct CompactorFacade<C, G = NullConsumer> {
    state: Rc<RefCell<CompactorState>>,
    main: C,
    gc: G,
}

impl<C: FragmentConsumer, G: FragmentConsumer> CompactorFacade<C, G> {
    pub fn new(state: Rc<RefCell<CompactorState>>, main: C, gc: G) -> Self {
        Self { state, main, gc }
    }

    /// A shared handle onto this facade's state, so callers can inspect
    /// stats or position without driving a fragment through it, and so
    /// the handle can be reused across [`Self::start_new_page`] calls.
    pub fn get_state(&self) -> Rc<RefCell<CompactorState>> {
        Rc::clone(&self.state)
    }

    /// Feeds one fragment through the compactor. Returns
    /// [`StopIteration::Yes`] when the fragment source should stop
    /// producing more input for this page.
    pub fn consume(&mut self, fragment: Fragment) -> StopIteration {
        let mut state = self.state.borrow_mut();
        match fragment {
            Fragment::PartitionStart {
                key,
                partition_tombstone,
            } => {
                state.consume_new_partition(key);
                if !partition_tombstone.is_empty() {
                    state.consume_partition_tombstone(partition_tombstone, &mut self.main, &mut self.gc);
                }
                StopIteration::No
            }
            Fragment::StaticRow(row) => state.consume_static_row(row, &mut self.main, &mut self.gc),
            Fragment::ClusteringRow(row) => {
                state.consume_clustering_row(row, &mut self.main, &mut self.gc)
            }
            Fragment::RangeTombstoneChange(change) => {
                state.consume_range_tombstone_change(change, &mut self.main, &mut self.gc)
            }
            Fragment::PartitionEnd => state.consume_end_of_partition(&mut self.main, &mut self.gc),
        }
    }

    /// Drains a fragment stream, stopping early if a consumer asks to.
    pub fn consume_all(&mut self, fragments: impl IntoIterator<Item = Fragment>) -> StopIteration {
        for fragment in fragments {
            if self.consume(fragment).is_stop() {
                return StopIteration::Yes;
            }
        }
        StopIteration::No
    }

    pub fn consume_end_of_stream(&mut self) -> (C::EndOfStream, G::EndOfStream) {
        self.state
            .borrow_mut()
            .consume_end_of_stream(&mut self.main, &mut self.gc)
    }

    /// Resets limits and emission bookkeeping for a fresh page while
    /// keeping the partition-local cursor (active range tombstone,
    /// cached static row) so the next page can replay it.
    pub fn start_new_page(&mut self, row_limit: u64, partition_limit: u64, query_time: WallTime) {
        self.state
            .borrow_mut()
            .start_new_page(row_limit, partition_limit, query_time);
    }

    /// Replays any cached static row / open range tombstone into this
    /// page's consumers. `next_region_is_clustered` should be `true`
    /// when the page's first fragment after `PartitionStart` will be a
    /// clustering row (so the cached static row, if any, still needs
    /// to be shown).
    pub fn replay_into_page(&mut self, next_region_is_clustered: bool) {
        self.state
            .borrow_mut()
            .replay_into_page(next_region_is_clustered, &mut self.main, &mut self.gc);
    }

    pub fn detach_state(&self) -> Option<DetachedState> {
        self.state.borrow().detach_state()
    }

    pub fn main(&self) -> &C {
        &self.main
    }

    pub fn main_mut(&mut self) -> &mut C {
        &mut self.main
    }

    pub fn into_consumers(self) -> (C, G) {
        (self.main, self.gc)
    }
}

/// Query-time compaction: limits enforced, mid-partition pagination
/// supported, garbage collection disabled (the GC consumer is a
/// [`NullConsumer`]).
pub struct QueryCompactor<C: FragmentConsumer> {
    inner: CompactorFacade<C, NullConsumer>,
}

impl<C: FragmentConsumer> QueryCompactor<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema: Rc<dyn Schema>,
        gc_policy: Rc<dyn GcPolicy>,
        query_time: WallTime,
        slice: PartitionSlice,
        row_limit: u64,
        partition_limit: u64,
        main: C,
    ) -> Self {
        let state = CompactorState::for_query(schema, gc_policy, query_time, slice, row_limit, partition_limit);
        Self {
            inner: CompactorFacade::new(Rc::new(RefCell::new(state)), main, NullConsumer),
        }
    }

    pub fn consume(&mut self, fragment: Fragment) -> StopIteration {
        self.inner.consume(fragment)
    }

    pub fn consume_all(&mut self, fragments: impl IntoIterator<Item = Fragment>) -> StopIteration {
        self.inner.consume_all(fragments)
    }

    pub fn consume_end_of_stream(&mut self) -> C::EndOfStream {
        self.inner.consume_end_of_stream().0
    }

    pub fn start_new_page(&mut self, row_limit: u64, partition_limit: u64, query_time: WallTime) {
        self.inner.start_new_page(row_limit, partition_limit, query_time);
    }

    pub fn replay_into_page(&mut self, next_region_is_clustered: bool) {
        self.inner.replay_into_page(next_region_is_clustered);
    }

    pub fn detach_state(&self) -> Option<DetachedState> {
        self.inner.detach_state()
    }

    pub fn get_state(&self) -> Rc<RefCell<CompactorState>> {
        self.inner.get_state()
    }

    pub fn into_main(self) -> C {
        self.inner.into_consumers().0
    }
}

/// SSTable-rewrite compaction: no limits, no pagination, garbage
/// collected data forwarded to `gc`.
pub struct CompactionCompactor<C: FragmentConsumer, G: FragmentConsumer> {
    inner: CompactorFacade<C, G>,
}

impl<C: FragmentConsumer, G: FragmentConsumer> CompactionCompactor<C, G> {
    pub fn new(
        schema: Rc<dyn Schema>,
        gc_policy: Rc<dyn GcPolicy>,
        compaction_time: WallTime,
        oracle: Rc<dyn PurgeableOracle>,
        main: C,
        gc: G,
    ) -> Self {
        let state = CompactorState::for_sstable_rewrite(schema, gc_policy, compaction_time, oracle);
        Self {
            inner: CompactorFacade::new(Rc::new(RefCell::new(state)), main, gc),
        }
    }

    pub fn consume(&mut self, fragment: Fragment) -> StopIteration {
        self.inner.consume(fragment)
    }

    pub fn consume_all(&mut self, fragments: impl IntoIterator<Item = Fragment>) -> StopIteration {
        self.inner.consume_all(fragments)
    }

    pub fn consume_end_of_stream(&mut self) -> (C::EndOfStream, G::EndOfStream) {
        self.inner.consume_end_of_stream()
    }

    pub fn get_state(&self) -> Rc<RefCell<CompactorState>> {
        self.inner.get_state()
    }

    pub fn into_consumers(self) -> (C, G) {
        self.inner.into_consumers()
    }

    pub fn decorated_key_hint(&self) -> Option<DecoratedKey> {
        self.inner.state.borrow().current_partition().cloned()
    }
}
