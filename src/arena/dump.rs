//! アリーナ内のブロック一覧の取得.
use std::fmt;

use super::address::{Address, Pointer};
use super::block;
use crate::tag::{MIN_BLOCK_SIZE, TAG_SIZE};

/// `Arena::dump`が列挙する、個々のブロックの情報.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInfo {
    /// ブロックの開始位置(ヘッダタグの位置).
    pub address: Address,

    /// ブロック全体のサイズ(両端のタグを含むバイト数).
    pub size: u64,

    /// ブロックが割当済みかどうか.
    pub busy: bool,
}
impl BlockInfo {
    /// ブロックの終端位置を返す.
    ///
    /// **注意**: ブロックは`[address, end)`の領域を占める.
    pub fn end(&self) -> Address {
        self.address + self.size as usize
    }

    /// このブロックの利用者向けメモリ領域を指すポインタを返す.
    pub fn pointer(&self) -> Pointer {
        block::user_memory(self.address)
    }
}
impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}  {:>10}   {}",
            self.address,
            self.size,
            if self.busy { '+' } else { '-' }
        )
    }
}

/// アリーナ内のブロック群を先頭から順に列挙するイテレータ.
///
/// `Arena::dump`によって生成される.
/// 列挙はアリーナの状態を一切変更せず、`clone`することで同じ位置から列挙をやり直せる.
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    memory: &'a [u8],
    cursor: Address,
}
impl<'a> Blocks<'a> {
    pub(crate) fn new(memory: &'a [u8]) -> Self {
        Blocks {
            memory,
            cursor: Address::from(0),
        }
    }
}
impl<'a> Iterator for Blocks<'a> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.memory.len().saturating_sub(self.cursor.as_usize());
        if remaining < TAG_SIZE {
            return None;
        }
        let tag = block::head_tag(self.memory, self.cursor);
        let info = BlockInfo {
            address: self.cursor,
            size: tag.size,
            busy: tag.busy,
        };
        if tag.size < MIN_BLOCK_SIZE as u64 || tag.size > remaining as u64 {
            // タグが破壊されている場合には、そこで列挙を打ち切る
            self.cursor = Address::from(self.memory.len());
        } else {
            self.cursor = self.cursor + tag.size as usize;
        }
        Some(info)
    }
}

/// アリーナの使用状況.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaUsage {
    /// アリーナの容量(バイト単位).
    pub capacity_bytes: u64,

    /// 割当済みブロックの合計サイズ(タグを含む).
    pub busy_bytes: u64,

    /// 空きブロックの合計サイズ(タグを含む).
    pub free_bytes: u64,

    /// 割当済みブロックの数.
    pub busy_blocks: usize,

    /// 空きブロックの数.
    pub free_blocks: usize,

    /// 最大の空きブロックのサイズ(タグを含む).
    pub largest_free_block: u64,
}
impl ArenaUsage {
    pub(crate) fn collect(capacity_bytes: u64, blocks: Blocks) -> Self {
        let mut usage = ArenaUsage {
            capacity_bytes,
            ..ArenaUsage::default()
        };
        for b in blocks {
            if b.busy {
                usage.busy_bytes += b.size;
                usage.busy_blocks += 1;
            } else {
                usage.free_bytes += b.size;
                usage.free_blocks += 1;
                usage.largest_free_block = usage.largest_free_block.max(b.size);
            }
        }
        usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;

    #[test]
    fn blocks_works() {
        let mut memory = vec![0u8; 64];
        block::write_tags(&mut memory, Address::from(0), Tag::free(16));
        block::write_tags(&mut memory, Address::from(16), Tag::busy(48));

        let blocks = Blocks::new(&memory);
        let infos = blocks.clone().collect::<Vec<_>>();
        assert_eq!(
            infos,
            vec![
                BlockInfo {
                    address: Address::from(0),
                    size: 16,
                    busy: false
                },
                BlockInfo {
                    address: Address::from(16),
                    size: 48,
                    busy: true
                },
            ]
        );
        assert_eq!(infos[1].end(), Address::from(64));
        assert_eq!(infos[1].pointer().as_usize(), 24);

        // 同じイテレータから何度でも列挙し直せる
        assert_eq!(blocks.clone().count(), 2);
        assert_eq!(blocks.count(), 2);
    }

    #[test]
    fn broken_tag_terminates() {
        let memory = vec![0u8; 32];
        assert_eq!(Blocks::new(&memory).count(), 1);

        let mut memory = vec![0u8; 32];
        Tag::free(1 << 40).write_to(&mut memory);
        assert_eq!(Blocks::new(&memory).count(), 1);
    }

    #[test]
    fn display_works() {
        let info = BlockInfo {
            address: Address::from(0x40),
            size: 1024,
            busy: true,
        };
        assert_eq!(info.to_string(), "0x00000040        1024   +");

        let info = BlockInfo { busy: false, ..info };
        assert_eq!(info.to_string(), "0x00000040        1024   -");
    }

    #[test]
    fn usage_works() {
        let mut memory = vec![0u8; 96];
        block::write_tags(&mut memory, Address::from(0), Tag::free(32));
        block::write_tags(&mut memory, Address::from(32), Tag::busy(48));
        block::write_tags(&mut memory, Address::from(80), Tag::free(16));

        let usage = ArenaUsage::collect(96, Blocks::new(&memory));
        assert_eq!(usage.capacity_bytes, 96);
        assert_eq!(usage.busy_bytes, 48);
        assert_eq!(usage.free_bytes, 48);
        assert_eq!(usage.busy_blocks, 1);
        assert_eq!(usage.free_blocks, 2);
        assert_eq!(usage.largest_free_block, 32);
    }
}
