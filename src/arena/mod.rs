//! 固定長バッファ上のアロケータ.
//!
//! アリーナは、利用者から渡された一つの連続したバイト列を、可変長のブロック群に区切って管理する.
//! 各ブロックの両端には同一内容のタグ(サイズと使用状況)が格納されており、
//! ブロック間の移動は全てタグ内のサイズを用いたアドレス計算で行われる.
//!
//! # 割当戦略
//!
//! このアロケータは"FirstFit"戦略を採用している.
//!
//! 新規割当要求が発行された際には、アリーナの先頭からブロックを順に走査し、
//! 要求を満たす最初の空きブロックが選択される.
//!
//! - 空きブロックのサイズと要求サイズの差が許容範囲(`fit_tolerance`)内なら、分割せずに丸ごと割り当てる
//! - それより大きい場合には、空きブロックの末尾側を切り出して割り当てる
//!   (残りの空きブロックは先頭側に残るので、次回の走査で早く見つかる)
//!
//! 解放されたブロックは、前後に隣接する空きブロックが存在する場合には、それらと結合される.
use slog::Logger;

pub use self::address::{Address, Pointer};
pub use self::builder::{ArenaBuilder, DEFAULT_FIT_TOLERANCE};
pub use self::dump::{ArenaUsage, BlockInfo, Blocks};

use crate::metrics::ArenaMetrics;
use crate::tag::{Tag, MIN_BLOCK_SIZE, TAG_SIZE, WORD_SIZE};
use crate::{ErrorKind, Result};

mod address;
mod block;
mod builder;
mod dump;

/// 利用者が要求したサイズ`size`を格納するのに必要な、ブロック全体のサイズを返す.
///
/// 両端のタグ分を加算した上で、`WORD_SIZE`の倍数に切り上げた値となる.
/// 計算結果が`usize`の範囲を超える場合には`None`が返される.
///
/// # Examples
///
/// ```
/// use tagarena::block_size_for;
///
/// assert_eq!(block_size_for(1), Some(24));
/// assert_eq!(block_size_for(16), Some(32));
/// assert_eq!(block_size_for(12), Some(32));
/// assert_eq!(block_size_for(usize::max_value()), None);
/// ```
pub fn block_size_for(size: usize) -> Option<usize> {
    size.checked_add(MIN_BLOCK_SIZE + WORD_SIZE - 1)
        .map(|n| n / WORD_SIZE * WORD_SIZE)
}

/// 固定長バッファ上で動作するアロケータ.
///
/// バッファは利用者が用意したものであり、アリーナ自体が追加のメモリを確保することはない.
///
/// 割当結果の`Pointer`はバッファ先頭からのオフセットであり、
/// 割り当てた領域の読み書きには`payload`ないし`payload_mut`を使用する.
///
/// # 注意
///
/// 内部で排他制御は行っていないので、複数のスレッドから利用する場合には、
/// 利用者側で`Mutex`等を用いて直列化する必要がある.
///
/// # Examples
///
/// ```
/// use tagarena::Arena;
///
/// let mut arena = Arena::new(vec![0u8; 1024]).unwrap();
///
/// let p = arena.allocate(16).unwrap();
/// arena.payload_mut(p).unwrap()[..5].copy_from_slice(b"hello");
/// assert_eq!(&arena.payload(p).unwrap()[..5], b"hello");
///
/// assert_eq!(arena.allocate(1024), None);
///
/// arena.release(Some(p)).unwrap();
/// assert_eq!(arena.dump().count(), 1);
/// ```
#[derive(Debug)]
pub struct Arena<B> {
    buffer: B,
    fit_tolerance: usize,
    logger: Logger,
    metrics: ArenaMetrics,
}
impl<B> Arena<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// デフォルト設定でアリーナを生成する.
    ///
    /// `ArenaBuilder::new().initialize(buffer)`と等価.
    pub fn new(buffer: B) -> Result<Self> {
        track!(ArenaBuilder::new().initialize(buffer))
    }

    pub(crate) fn new_unchecked(
        buffer: B,
        fit_tolerance: usize,
        logger: Logger,
        metrics: ArenaMetrics,
    ) -> Self {
        let mut arena = Arena {
            buffer,
            fit_tolerance,
            logger,
            metrics,
        };
        arena.format();
        arena
    }

    /// アリーナを初期状態(全体が一つの空きブロック)に戻す.
    ///
    /// それまでに割り当てられていた全てのポインタは無効となる.
    pub fn reset(&mut self) {
        self.format();
        self.metrics.resets.increment();
        info!(self.logger, "Arena reset"; "capacity" => self.capacity());
    }

    /// アリーナを破棄して、内部のバッファを返す.
    pub fn into_inner(self) -> B {
        self.buffer
    }

    /// アリーナの容量(バイト単位)を返す.
    pub fn capacity(&self) -> usize {
        self.memory().len()
    }

    /// 分割せずにそのまま割り当てる空きブロックの許容範囲(タグ数単位)を返す.
    pub fn fit_tolerance(&self) -> usize {
        self.fit_tolerance / TAG_SIZE
    }

    /// アリーナ用のメトリクスを返す.
    pub fn metrics(&self) -> &ArenaMetrics {
        &self.metrics
    }

    /// `size`バイト分の領域の割当を行う.
    ///
    /// `size`が`0`の場合、あるいは十分な空きブロックが存在しない場合には`None`が返される.
    ///
    /// 返された領域の長さは`size`以上となる(タグのアライメント分だけ大きくなることがある).
    pub fn allocate(&mut self, size: usize) -> Option<Pointer> {
        if size == 0 {
            return None;
        }
        let allocated = block_size_for(size).and_then(|total| self.allocate_block(total));
        if allocated.is_none() {
            self.metrics.nospace_failures.increment();
        }
        allocated
    }

    /// `allocate`と同様だが、割当に失敗した理由をエラーとして返す.
    ///
    /// # Errors
    ///
    /// - `size`が`0`の場合には、種類が`ErrorKind::InvalidInput`のエラーが返される
    /// - 十分な空きブロックが存在しない場合には、種類が`ErrorKind::ArenaFull`のエラーが返される
    pub fn try_allocate(&mut self, size: usize) -> Result<Pointer> {
        track_assert!(size != 0, ErrorKind::InvalidInput);
        if let Some(ptr) = self.allocate(size) {
            return Ok(ptr);
        }
        track_panic!(
            ErrorKind::ArenaFull,
            "No free block for {} bytes (largest free block: {} bytes)",
            size,
            self.usage().largest_free_block
        );
    }

    /// 割当済みの領域の解放を行う.
    ///
    /// `ptr`が`None`の場合には何も行わない.
    ///
    /// 解放されたブロックの前後に空きブロックが存在する場合には、それらと結合される.
    ///
    /// # Errors
    ///
    /// `ptr`がアリーナの範囲外を指している場合や、割当済みのブロックを指していない場合には、
    /// 種類が`ErrorKind::InvalidInput`のエラーが返される.
    /// この場合には、アリーナの状態は変更されない.
    pub fn release(&mut self, ptr: Option<Pointer>) -> Result<()> {
        let ptr = if let Some(ptr) = ptr {
            ptr
        } else {
            return Ok(());
        };
        let (mut block, tag) = match track!(self.busy_block(ptr)) {
            Ok(found) => found,
            Err(e) => {
                self.metrics.rejected_releases.increment();
                warn!(self.logger, "Rejected release: {}", e; "pointer" => ptr.as_usize());
                return Err(e);
            }
        };
        self.metrics.count_release(tag.size);

        let end = Address::from(self.capacity());
        let mut size = tag.size;
        block::write_tags(self.memory_mut(), block, Tag::free(size));

        if let Some(prev) = block::prev(self.memory(), block) {
            let prev_tag = block::head_tag(self.memory(), prev);
            if !prev_tag.busy {
                size += prev_tag.size;
                block::write_tags(self.memory_mut(), prev, Tag::free(size));
                debug!(self.logger, "Merged with the previous free block";
                       "block" => block.as_usize(), "prev" => prev.as_usize(), "size" => size);
                self.metrics.backward_merges.increment();
                block = prev;
            }
        }

        let next = block::next(self.memory(), block);
        if next != end {
            let next_tag = block::head_tag(self.memory(), next);
            if !next_tag.busy {
                size += next_tag.size;
                block::write_tags(self.memory_mut(), block, Tag::free(size));
                debug!(self.logger, "Merged with the next free block";
                       "block" => block.as_usize(), "next" => next.as_usize(), "size" => size);
                self.metrics.forward_merges.increment();
            }
        }
        Ok(())
    }

    /// `ptr`が指す割当済み領域を返す.
    ///
    /// # Errors
    ///
    /// `ptr`が割当済みのブロックを指していない場合には、種類が`ErrorKind::InvalidInput`のエラーが返される.
    pub fn payload(&self, ptr: Pointer) -> Result<&[u8]> {
        let (block, tag) = track!(self.payload_block(ptr))?;
        let start = block::user_memory(block).as_usize();
        Ok(&self.memory()[start..start + block::user_memory_len(tag)])
    }

    /// `ptr`が指す割当済み領域を、書き込み可能な形式で返す.
    ///
    /// # Errors
    ///
    /// `ptr`が割当済みのブロックを指していない場合には、種類が`ErrorKind::InvalidInput`のエラーが返される.
    pub fn payload_mut(&mut self, ptr: Pointer) -> Result<&mut [u8]> {
        let (block, tag) = track!(self.payload_block(ptr))?;
        let start = block::user_memory(block).as_usize();
        Ok(&mut self.memory_mut()[start..start + block::user_memory_len(tag)])
    }

    /// アリーナ内の全てのブロックを、先頭から順に列挙する.
    ///
    /// デバッグ用途を意図したもので、アリーナの状態は変更しない.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagarena::Arena;
    ///
    /// let mut arena = Arena::new(vec![0u8; 1024]).unwrap();
    /// arena.allocate(16).unwrap();
    ///
    /// let blocks = arena.dump().map(|b| (b.size, b.busy)).collect::<Vec<_>>();
    /// assert_eq!(blocks, vec![(992, false), (32, true)]);
    /// ```
    pub fn dump(&self) -> Blocks {
        Blocks::new(self.memory())
    }

    /// アリーナの使用状況を返す.
    pub fn usage(&self) -> ArenaUsage {
        ArenaUsage::collect(self.capacity() as u64, self.dump())
    }

    /// アリーナ内のタグ群の整合性を検証する.
    ///
    /// 以下が全て成り立っていることを確認する:
    ///
    /// - ブロック群がアリーナ全体を隙間なく覆っている
    /// - 各ブロックのヘッダタグとフッタタグが一致している
    /// - 空きブロック同士が隣接していない
    ///
    /// # Errors
    ///
    /// 不整合が検出された場合には、種類が`ErrorKind::InconsistentState`のエラーが返される.
    pub fn validate(&self) -> Result<()> {
        let memory = self.memory();
        let end = self.capacity();
        let mut block = Address::from(0);
        let mut prev_is_free = false;
        while block.as_usize() != end {
            let remaining = end - block.as_usize();
            track_assert!(
                remaining >= MIN_BLOCK_SIZE,
                ErrorKind::InconsistentState; block, remaining
            );

            let tag = block::head_tag(memory, block);
            track_assert!(
                tag.size >= MIN_BLOCK_SIZE as u64 && tag.size <= remaining as u64,
                ErrorKind::InconsistentState; block, tag, remaining
            );
            track_assert_eq!(
                tag.size % WORD_SIZE as u64,
                0,
                ErrorKind::InconsistentState; block, tag
            );

            let tail = block::tail(memory, block);
            track_assert_eq!(
                Tag::read_from(&memory[tail.as_usize()..]),
                tag,
                ErrorKind::InconsistentState; block
            );
            track_assert!(
                tag.busy || !prev_is_free,
                ErrorKind::InconsistentState,
                "Adjacent free blocks: {}",
                block
            );

            prev_is_free = !tag.busy;
            block = block + tag.size as usize;
        }
        Ok(())
    }

    fn memory(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut()
    }

    fn format(&mut self) {
        let capacity = self.capacity() as u64;
        block::write_tags(self.memory_mut(), Address::from(0), Tag::free(capacity));
    }

    fn allocate_block(&mut self, total: usize) -> Option<Pointer> {
        let end = Address::from(self.capacity());
        let fit_limit = total.saturating_add(self.fit_tolerance);
        let mut block = Address::from(0);
        while block != end {
            let tag = block::head_tag(self.memory(), block);
            if !tag.busy {
                let size = tag.size as usize;
                if size >= total && size <= fit_limit {
                    block::write_tags(self.memory_mut(), block, Tag::busy(tag.size));
                    self.metrics.count_allocation(tag.size, false);
                    return Some(block::user_memory(block));
                } else if size > total {
                    // 空きブロックは先頭側に残して、末尾側を割り当てる
                    let rest = size - total;
                    block::write_tags(self.memory_mut(), block, Tag::free(rest as u64));
                    let allocated = block + rest;
                    block::write_tags(self.memory_mut(), allocated, Tag::busy(total as u64));
                    debug!(self.logger, "Split free block";
                           "block" => block.as_usize(), "rest" => rest, "allocated" => total);
                    self.metrics.count_allocation(total as u64, true);
                    return Some(block::user_memory(allocated));
                }
            }
            block = block::next(self.memory(), block);
        }
        None
    }

    fn payload_block(&self, ptr: Pointer) -> Result<(Address, Tag)> {
        let result = track!(self.busy_block(ptr));
        if let Err(ref e) = result {
            warn!(self.logger, "Rejected payload access: {}", e; "pointer" => ptr.as_usize());
        }
        result
    }

    fn busy_block(&self, ptr: Pointer) -> Result<(Address, Tag)> {
        let memory = self.memory();
        let offset = ptr.as_usize();
        track_assert!(
            offset >= TAG_SIZE && offset < memory.len(),
            ErrorKind::InvalidInput,
            "Out of the arena: {}",
            ptr
        );
        track_assert_eq!(offset % WORD_SIZE, 0, ErrorKind::InvalidInput; ptr);

        let block = Address::from(offset - TAG_SIZE);
        let tag = block::head_tag(memory, block);
        let remaining = (memory.len() - block.as_usize()) as u64;
        track_assert!(
            tag.size >= MIN_BLOCK_SIZE as u64
                && tag.size <= remaining
                && tag.size % WORD_SIZE as u64 == 0,
            ErrorKind::InvalidInput,
            "Not a block: {}",
            ptr
        );

        let tail = block::tail(memory, block);
        track_assert_eq!(
            Tag::read_from(&memory[tail.as_usize()..]),
            tag,
            ErrorKind::InvalidInput; ptr
        );
        track_assert!(tag.busy, ErrorKind::InvalidInput, "Not allocated: {}", ptr);
        Ok((block, tag))
    }
}
