use prometrics::metrics::MetricBuilder;
use slog::{Discard, Logger};

use super::Arena;
use crate::metrics::ArenaMetrics;
use crate::tag::{MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, TAG_SIZE, WORD_SIZE};
use crate::{ErrorKind, Result};

/// 分割を行わずにそのまま割り当てる空きブロックの、要求サイズからの超過分の上限のデフォルト値(タグ数単位).
pub const DEFAULT_FIT_TOLERANCE: usize = 4;

/// `Arena`のビルダ.
#[derive(Debug, Clone)]
pub struct ArenaBuilder {
    fit_tolerance: usize,
    logger: Logger,
    metrics: MetricBuilder,
}
impl ArenaBuilder {
    /// デフォルト設定で`ArenaBuilder`インスタンスを生成する.
    pub fn new() -> Self {
        ArenaBuilder {
            fit_tolerance: DEFAULT_FIT_TOLERANCE,
            logger: Logger::root(Discard, o!()),
            metrics: MetricBuilder::new(),
        }
    }

    /// 割当時に空きブロックを分割せずにそのまま使う範囲を、タグ数単位で設定する.
    ///
    /// 割当要求に必要なブロックサイズを`total`とした場合に、
    /// サイズが`total`以上`total + fit_tolerance * TAG_SIZE`以下の空きブロックは、
    /// 分割されずに丸ごと割り当てられる.
    /// それより大きな空きブロックは分割され、その末尾側が割り当てられる.
    ///
    /// 分割後の空きブロックにタグを格納する余地を残すために、`1`以上の値を指定する必要がある.
    /// それ未満の値が指定された場合には、アリーナの構築時にエラーが返される.
    ///
    /// デフォルト値は`DEFAULT_FIT_TOLERANCE`.
    pub fn fit_tolerance(&mut self, tags: usize) -> &mut Self {
        self.fit_tolerance = tags;
        self
    }

    /// アリーナ用の logger を登録する.
    pub fn logger(&mut self, logger: Logger) -> &mut Self {
        self.logger = logger;
        self
    }

    /// メトリクス用の共通設定を登録する.
    ///
    /// デフォルト値は`MetricBuilder::new()`.
    pub fn metrics(&mut self, metrics: MetricBuilder) -> &mut Self {
        self.metrics = metrics;
        self
    }

    /// 指定されたバッファ全体を、一つの空きブロックとして初期化したアリーナを生成する.
    ///
    /// # Errors
    ///
    /// 以下の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される:
    ///
    /// - バッファ長が`MIN_BLOCK_SIZE`未満
    /// - バッファ長が`WORD_SIZE`の倍数ではない
    /// - バッファ長がタグで表現可能な範囲を超えている
    /// - `fit_tolerance`が`0`、もしくはバイト数に換算すると`usize`の範囲を超える
    ///
    /// # Examples
    ///
    /// ```
    /// use tagarena::{ArenaBuilder, ErrorKind};
    ///
    /// let arena = ArenaBuilder::new().fit_tolerance(2).initialize(vec![0u8; 256]).unwrap();
    /// assert_eq!(arena.capacity(), 256);
    /// assert_eq!(arena.fit_tolerance(), 2);
    ///
    /// let e = ArenaBuilder::new().initialize(vec![0u8; 100]).err();
    /// assert_eq!(e.map(|e| *e.kind()), Some(ErrorKind::InvalidInput));
    /// ```
    pub fn initialize<B>(&self, buffer: B) -> Result<Arena<B>>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
    {
        track_assert!(self.fit_tolerance >= 1, ErrorKind::InvalidInput);
        let fit_tolerance_bytes = track_assert_some!(
            self.fit_tolerance.checked_mul(TAG_SIZE),
            ErrorKind::InvalidInput; self.fit_tolerance
        );

        let capacity = buffer.as_ref().len();
        track_assert!(
            capacity >= MIN_BLOCK_SIZE,
            ErrorKind::InvalidInput; capacity, MIN_BLOCK_SIZE
        );
        track_assert_eq!(capacity % WORD_SIZE, 0, ErrorKind::InvalidInput; capacity);
        track_assert!(
            capacity as u64 <= MAX_BLOCK_SIZE,
            ErrorKind::InvalidInput; capacity
        );

        let metrics = ArenaMetrics::new(&self.metrics, capacity as u64);
        let arena = Arena::new_unchecked(
            buffer,
            fit_tolerance_bytes,
            self.logger.clone(),
            metrics,
        );
        info!(
            arena.logger,
            "Arena initialized";
            "capacity" => capacity,
            "fit_tolerance" => self.fit_tolerance
        );
        Ok(arena)
    }
}
impl Default for ArenaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
