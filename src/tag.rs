//! ブロックの境界タグ.
//!
//! 各ブロックの先頭と末尾には、同一内容のタグが一つずつ格納されている.
//!
//! ```text
//! +----------+---------------------------+----------+
//! | head tag |        user memory        | tail tag |
//! +----------+---------------------------+----------+
//! ^                                                  ^
//! block start                                        block start + size
//! ```
//!
//! 末尾のタグが存在するため、任意のブロックの先頭位置から、
//! 直前のブロックの先頭位置を定数時間で求めることができる.
use byteorder::{ByteOrder, LittleEndian};

/// タグのバイト数.
pub const TAG_SIZE: usize = 8;

/// ブロックサイズのアライメント単位(バイト数).
///
/// 全てのブロックのサイズおよび開始位置は、この値の倍数となる.
pub const WORD_SIZE: usize = 8;

/// ブロックの最小サイズ(ヘッダタグとフッタタグ分).
pub const MIN_BLOCK_SIZE: usize = TAG_SIZE * 2;

/// タグで表現可能なブロックサイズの最大値.
pub const MAX_BLOCK_SIZE: u64 = BUSY_BIT - 1;

const BUSY_BIT: u64 = 1 << 63;

/// ブロックのサイズと使用状況を保持するタグ.
///
/// メモリ上では64bit整数一つにエンコードされる.
/// 下位63bitがブロックサイズ(両端のタグを含むバイト数)で、最上位bitが使用中フラグ.
///
/// # Examples
///
/// ```
/// use tagarena::Tag;
///
/// let mut buf = [0; 8];
/// let tag = Tag::busy(1024);
/// tag.write_to(&mut buf);
/// assert_eq!(Tag::read_from(&buf), tag);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    /// ブロック全体のサイズ(バイト単位).
    pub size: u64,

    /// ブロックが割当済みかどうか.
    pub busy: bool,
}
impl Tag {
    /// 空きブロックを表すタグを生成する.
    pub fn free(size: u64) -> Self {
        Tag { size, busy: false }
    }

    /// 割当済みブロックを表すタグを生成する.
    pub fn busy(size: u64) -> Self {
        Tag { size, busy: true }
    }

    /// `buf`の先頭`TAG_SIZE`バイトからタグを読み込む.
    ///
    /// # Panics
    ///
    /// `buf`の長さが`TAG_SIZE`未満の場合には、現在のスレッドがパニックする.
    pub fn read_from(buf: &[u8]) -> Self {
        Self::decode(LittleEndian::read_u64(&buf[..TAG_SIZE]))
    }

    /// `buf`の先頭`TAG_SIZE`バイトにタグを書き込む.
    ///
    /// # Panics
    ///
    /// `buf`の長さが`TAG_SIZE`未満の場合には、現在のスレッドがパニックする.
    pub fn write_to(self, buf: &mut [u8]) {
        LittleEndian::write_u64(&mut buf[..TAG_SIZE], self.encode());
    }

    fn encode(self) -> u64 {
        debug_assert!(self.size <= MAX_BLOCK_SIZE);
        if self.busy {
            self.size | BUSY_BIT
        } else {
            self.size
        }
    }

    fn decode(value: u64) -> Self {
        Tag {
            size: value & MAX_BLOCK_SIZE,
            busy: (value & BUSY_BIT) != 0,
        }
    }
}
