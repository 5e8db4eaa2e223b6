//! [Prometheus][prometheus]用のメトリクス.
//!
//! [prometheus]: https://prometheus.io/
use prometrics::metrics::{Counter, MetricBuilder};

/// [`Arena`]のメトリクス.
///
/// [`Arena`]: ../struct.Arena.html
#[derive(Debug, Clone)]
pub struct ArenaMetrics {
    pub(crate) allocated_blocks: Counter,
    pub(crate) allocated_bytes: Counter,
    pub(crate) released_blocks: Counter,
    pub(crate) released_bytes: Counter,
    pub(crate) nospace_failures: Counter,
    pub(crate) splits: Counter,
    pub(crate) backward_merges: Counter,
    pub(crate) forward_merges: Counter,
    pub(crate) rejected_releases: Counter,
    pub(crate) resets: Counter,
    pub(crate) capacity_bytes: u64,
}
impl ArenaMetrics {
    /// ブロックの割当回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_allocated_blocks_total <COUNTER>
    /// ```
    pub fn allocated_blocks(&self) -> u64 {
        self.allocated_blocks.value() as u64
    }

    /// これまでに割り当てたブロックのバイト数(タグを含む).
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_allocated_bytes_total <COUNTER>
    /// ```
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.value() as u64
    }

    /// ブロックの解放回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_released_blocks_total <COUNTER>
    /// ```
    pub fn released_blocks(&self) -> u64 {
        self.released_blocks.value() as u64
    }

    /// これまでに解放されたブロックのバイト数(タグを含む).
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_released_bytes_total <COUNTER>
    /// ```
    pub fn released_bytes(&self) -> u64 {
        self.released_bytes.value() as u64
    }

    /// 空き領域不足による割当失敗回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_nospace_failures_total <COUNTER>
    /// ```
    pub fn nospace_failures(&self) -> u64 {
        self.nospace_failures.value() as u64
    }

    /// 割当時に空きブロックが分割された回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_splits_total <COUNTER>
    /// ```
    pub fn splits(&self) -> u64 {
        self.splits.value() as u64
    }

    /// 解放時に隣接する空きブロック同士が結合された回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_merges_total { direction="backward|forward" } <COUNTER>
    /// ```
    pub fn merges(&self) -> u64 {
        self.backward_merges.value() as u64 + self.forward_merges.value() as u64
    }

    /// 不正なポインタが指定されたために拒否された解放要求の数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_rejected_releases_total <COUNTER>
    /// ```
    pub fn rejected_releases(&self) -> u64 {
        self.rejected_releases.value() as u64
    }

    /// アリーナがリセットされた回数.
    ///
    /// # Prometheus
    ///
    /// ```prometheus
    /// tagarena_arena_resets_total <COUNTER>
    /// ```
    pub fn resets(&self) -> u64 {
        self.resets.value() as u64
    }

    /// アリーナの容量(バイト単位).
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub(crate) fn new(builder: &MetricBuilder, capacity_bytes: u64) -> Self {
        let mut builder = builder.clone();
        builder.namespace("tagarena").subsystem("arena");
        ArenaMetrics {
            allocated_blocks: builder
                .counter("allocated_blocks_total")
                .help("Number of allocated blocks")
                .finish()
                .expect("Never fails"),
            allocated_bytes: builder
                .counter("allocated_bytes_total")
                .help("Number of allocated bytes")
                .finish()
                .expect("Never fails"),
            released_blocks: builder
                .counter("released_blocks_total")
                .help("Number of released blocks")
                .finish()
                .expect("Never fails"),
            released_bytes: builder
                .counter("released_bytes_total")
                .help("Number of released bytes")
                .finish()
                .expect("Never fails"),
            nospace_failures: builder
                .counter("nospace_failures_total")
                .help("Number of allocation failures caused by no available space")
                .finish()
                .expect("Never fails"),
            splits: builder
                .counter("splits_total")
                .help("Number of free blocks split by allocation")
                .finish()
                .expect("Never fails"),
            backward_merges: builder
                .counter("merges_total")
                .help("Number of free block merges")
                .label("direction", "backward")
                .finish()
                .expect("Never fails"),
            forward_merges: builder
                .counter("merges_total")
                .help("Number of free block merges")
                .label("direction", "forward")
                .finish()
                .expect("Never fails"),
            rejected_releases: builder
                .counter("rejected_releases_total")
                .help("Number of releases rejected because of an invalid pointer")
                .finish()
                .expect("Never fails"),
            resets: builder
                .counter("resets_total")
                .help("Number of arena resets")
                .finish()
                .expect("Never fails"),
            capacity_bytes,
        }
    }

    #[cfg(test)]
    pub(crate) fn usage_bytes(&self) -> u64 {
        self.allocated_bytes() - self.released_bytes()
    }

    pub(crate) fn count_allocation(&self, size: u64, split: bool) {
        self.allocated_blocks.increment();
        self.allocated_bytes.add_u64(size);
        if split {
            self.splits.increment();
        }
    }

    pub(crate) fn count_release(&self, size: u64) {
        self.released_blocks.increment();
        self.released_bytes.add_u64(size);
    }
}
