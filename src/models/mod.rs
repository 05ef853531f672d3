//! Data models for booklist.

mod fetch_log;
mod ranking;
mod site;

pub use fetch_log::{FetchLog, FetchStatus};
pub use ranking::{
    decode_extra, encode_extra, BookRecord, ExtraFields, RankingEntry, RankingType,
    SnapshotPolicy,
};
pub use site::{FetchType, Site};
