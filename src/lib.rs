//! Tagged Arena.
//!
//! `tagarena`は、利用者が用意した一つの連続したバイト列(アリーナ)の内部で、
//! 可変長の部分領域の割当と解放を行うアロケータ.
//!
//! # 特徴
//!
//! - アリーナ以外のメモリを確保することは一切ない
//!   - 空き領域の枯渇は、エラーではなく通常の結果(`None`)として扱われる
//! - 各ブロックの両端に同一内容の[タグ](./struct.Tag.html)(サイズ + 使用中フラグ)を格納する
//!   - ブロック間のリンクは持たず、隣接ブロックの位置はタグ内のサイズから計算する
//!   - 末尾のタグにより、直前のブロックの位置も定数時間で求められる
//! - 割当は先頭からの"FirstFit"で、空きブロックが要求より十分に大きい場合には分割される
//! - 解放時には、前後の空きブロックと結合される
//! - スレッドセーフではない(必要なら利用者側で排他制御を行う)
//!
//! # モジュールの依存関係
//!
//! ```text
//! arena => tag
//! ```
//!
//! - [arena]モジュール:
//!   - 主に[Arena]構造体を提供
//!   - 割当・解放・ブロック列挙を担当する
//! - [tag]モジュール:
//!   - ブロックの境界タグのエンコード方法を定義する
//!
//! # Examples
//!
//! ```
//! use tagarena::{Arena, TAG_SIZE};
//!
//! let mut arena = Arena::new(vec![0u8; 1024]).unwrap();
//!
//! let p1 = arena.allocate(16);
//! let p2 = arena.allocate(512);
//! assert!(p1.is_some() && p2.is_some());
//! assert_eq!(arena.allocate(1024), None);
//!
//! arena.release(p1).unwrap();
//! arena.release(p2).unwrap();
//! assert!(arena.allocate(1024 - TAG_SIZE * 2).is_some());
//! ```
//!
//! [arena]: ./arena/index.html
//! [Arena]: ./arena/struct.Arena.html
//! [tag]: ./tag/index.html
#![warn(missing_docs)]
extern crate byteorder;
extern crate prometrics;
#[cfg(test)]
extern crate proptest;
#[macro_use]
extern crate trackable;
#[macro_use]
extern crate slog;

pub use crate::arena::{
    block_size_for, Address, Arena, ArenaBuilder, ArenaUsage, BlockInfo, Blocks, Pointer,
    DEFAULT_FIT_TOLERANCE,
};
pub use crate::error::{Error, ErrorKind};
pub use crate::tag::{Tag, MIN_BLOCK_SIZE, TAG_SIZE, WORD_SIZE};

pub mod arena;
pub mod metrics;
pub mod tag;

mod error;

/// crate固有の`Result`型.
pub type Result<T> = std::result::Result<T, Error>;
