use std::fmt;
use std::ops::{Add, Sub};

use crate::tag::TAG_SIZE;

/// アリーナ内のブロックの位置を示すアドレス.
///
/// 値はアリーナの先頭からのバイトオフセットで、ブロックのヘッダタグの位置を指す.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Address(usize);
impl Address {
    /// アドレスの値を返す.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// このアドレスから始まるブロックの、利用者向けメモリ領域を指すポインタを返す.
    pub fn to_pointer(self) -> Pointer {
        Pointer(self.0 + TAG_SIZE)
    }
}
impl From<usize> for Address {
    fn from(from: usize) -> Self {
        Address(from)
    }
}
impl Add<usize> for Address {
    type Output = Self;
    fn add(self, rhs: usize) -> Self {
        Address(self.0.checked_add(rhs).expect("address overflow"))
    }
}
impl Sub<usize> for Address {
    type Output = Self;
    fn sub(self, rhs: usize) -> Self {
        Address(self.0.checked_sub(rhs).expect("address underflow"))
    }
}
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// `Arena::allocate`が返す、利用者向けメモリ領域へのポインタ.
///
/// 値はアリーナの先頭からのバイトオフセット.
/// 生ポインタではないので、実際の読み書きは`Arena::payload`等を経由して行う.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Pointer(usize);
impl Pointer {
    /// ポインタの値を返す.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// ポインタが指すブロックのアドレスを返す.
    ///
    /// ポインタがアリーナの先頭タグに重なっている場合には`None`が返される.
    pub fn to_address(self) -> Option<Address> {
        self.0.checked_sub(TAG_SIZE).map(Address)
    }
}
impl From<usize> for Pointer {
    fn from(from: usize) -> Self {
        Pointer(from)
    }
}
impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
