/// crate固有のエラー型.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(trackable::error::TrackableError<ErrorKind>);

/// 発生し得るエラーの種別.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// アリーナに要求サイズを満たす空きブロックが存在しない.
    ///
    /// 枯渇は通常の運用でも起こり得る結果であり、アリーナの状態は変更されない.
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者が不要なブロックを解放した上でリトライする
    /// - より大きなバッファでアリーナを構築し直す
    ArenaFull,

    /// 入力が不正.
    ///
    /// 以下のような場合に返される:
    ///
    /// - アリーナ構築時のバッファ長や設定値が不正
    /// - 解放対象のポインタがアリーナの範囲外、あるいは割当済みブロックを指していない
    ///
    /// # 典型的な対応策
    ///
    /// - 利用者側のプログラムを修正して入力を正しくする
    InvalidInput,

    /// アリーナ内のタグ群が不整合に陥っている.
    ///
    /// 割当済み領域の範囲外への書き込み等により、ブロックのタグが破壊された場合に返される.
    ///
    /// # 典型的な対応策
    ///
    /// - バグ修正を行ってプログラムを更新する
    /// - アリーナをリセットする
    InconsistentState,
}
impl trackable::error::ErrorKind for ErrorKind {}
