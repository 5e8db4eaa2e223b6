//! ブロックのアドレス計算用の補助関数群.
//!
//! ブロック間に明示的なリンクは存在せず、隣接ブロックの位置は全てタグ内のサイズから求められる.
//!
//! ここの関数群は、引数のアドレスが正しいブロックの先頭(ないし末尾)を指していることを前提としている.
//! 利用者から渡された値の検証は`Arena`側で行うこと.
use super::address::{Address, Pointer};
use crate::tag::{Tag, TAG_SIZE};

/// `block`のヘッダタグを読み込む.
pub fn head_tag(memory: &[u8], block: Address) -> Tag {
    Tag::read_from(&memory[block.as_usize()..])
}

/// `block`のフッタタグの位置を返す.
pub fn tail(memory: &[u8], block: Address) -> Address {
    block + head_tag(memory, block).size as usize - TAG_SIZE
}

/// フッタタグの位置`tail`から、そのブロックの先頭位置を返す.
pub fn head(memory: &[u8], tail: Address) -> Address {
    let tag = Tag::read_from(&memory[tail.as_usize()..]);
    tail + TAG_SIZE - tag.size as usize
}

/// `block`の直後のブロックの位置を返す.
///
/// `block`が最後のブロックの場合には、アリーナの終端位置が返される.
pub fn next(memory: &[u8], block: Address) -> Address {
    block + head_tag(memory, block).size as usize
}

/// `block`の直前のブロックの位置を返す.
///
/// `block`が先頭のブロックの場合には`None`が返される.
pub fn prev(memory: &[u8], block: Address) -> Option<Address> {
    if block.as_usize() == 0 {
        None
    } else {
        Some(head(memory, block - TAG_SIZE))
    }
}

/// `block`の両端に`tag`を書き込む.
///
/// フッタタグの位置は`tag.size`から決定される.
pub fn write_tags(memory: &mut [u8], block: Address, tag: Tag) {
    let tail = block.as_usize() + tag.size as usize - TAG_SIZE;
    tag.write_to(&mut memory[block.as_usize()..]);
    tag.write_to(&mut memory[tail..]);
}

/// `block`の利用者向けメモリ領域の位置を返す.
pub fn user_memory(block: Address) -> Pointer {
    block.to_pointer()
}

/// `block`の利用者向けメモリ領域のバイト数を返す.
pub fn user_memory_len(tag: Tag) -> usize {
    tag.size as usize - TAG_SIZE * 2
}
