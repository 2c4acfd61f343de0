//! Domain identifiers (strongly-typed IDs).
//!
//! Glacier が払い出す ID（job id, archive id）はどちらも不透明な文字列です。
//! 中身は解釈せず、そのまま保持して送り返すだけ。
//!
//! ## Phantom Type パターン
//! `Id<T>` で共通実装を持ち、`T` はマーカー型としてコンパイル時にだけ使います。
//! JobId と ArchiveId は同じ `String` を包んでいても混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// ログやエラーメッセージで使う種別名（"job", "archive"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn kind() -> &'static str;
}

/// ジェネリック ID 型
///
/// ```ignore
/// let job_id = JobId::new("HkF9p6...");
/// let archive_id = ArchiveId::new("NkbByEej...");
/// // job_id と archive_id は異なる型なので、混同できない
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Leading `len` characters, for table cells and menu labels.
    pub fn short(&self, len: usize) -> &str {
        match self.value.char_indices().nth(len) {
            Some((idx, _)) => &self.value[..idx],
            None => &self.value,
        }
    }

    pub fn kind(&self) -> &'static str {
        T::kind()
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Job {}

impl IdMarker for Job {
    fn kind() -> &'static str {
        "job"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Archive {}

impl IdMarker for Archive {
    fn kind() -> &'static str {
        "archive"
    }
}

/// Identifier of an asynchronous Glacier job (inventory retrieval, ...).
pub type JobId = Id<Job>;

/// Identifier of an archive stored in a vault.
pub type ArchiveId = Id<Archive>;

/// Vault name. Unique within an account; the only identity a vault has.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultName(String);

impl VaultName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VaultName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for VaultName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_keep_the_opaque_value() {
        let job = JobId::new("HkF9p6o7yjhFx-K3CGl6fuSm6VzW9T7esGQfco8nUXVYwS0jlb5gq1JZ55yHgt5vP54ZShjoQzQVVh7vEXAMPLEjobID");
        let archive = ArchiveId::new("NkbByEejwEggmBz2fTHgJrg0XBoDfjP4q6iu87-TjhqG6eGoOY9Z8i1_AUyUsuhPAdTqLHy8pTl5nfCFJmDl2yEZONi5L26Omw12vcs01MNGntHEQL8MBfGlqrEXAMPLEArchiveId");

        assert_eq!(job.kind(), "job");
        assert_eq!(archive.kind(), "archive");
        assert!(job.to_string().starts_with("HkF9p6"));

        // The whole point: you can't accidentally mix these types.
        // let _: JobId = archive; // <- does not compile
    }

    #[test]
    fn short_truncates_on_char_boundaries() {
        let job = JobId::new("abcdefghij");
        assert_eq!(job.short(4), "abcd");
        assert_eq!(job.short(25), "abcdefghij");

        let wide = JobId::new("ジョブ識別子");
        assert_eq!(wide.short(2), "ジョ");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let job = JobId::new("job-1");
        let s = serde_json::to_string(&job).unwrap();
        assert_eq!(s, "\"job-1\"");

        let back: JobId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, job);

        let vault = VaultName::new("photos-2019");
        assert_eq!(serde_json::to_string(&vault).unwrap(), "\"photos-2019\"");
    }
}
