// mfr_core/src/domain.rs
use serde::Serialize;

use crate::read::layout::Layout;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct EntryRow {
    pub index: usize,
    pub path: String,
    pub size: u64,
    pub start: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatReport {
    pub entries: Vec<EntryRow>,
    pub total_size: u64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PositionRow {
    pub offset: u64,
    pub index: usize,
    pub path: String,
    pub file_offset: u64,
}

pub fn entry_rows(entries: &[String], layout: &Layout) -> Vec<EntryRow> {
    let mut start = 0u64;
    entries
        .iter()
        .zip(layout.sizes())
        .enumerate()
        .map(|(index, (path, &size))| {
            let row = EntryRow {
                index,
                path: path.clone(),
                size,
                start,
            };
            start += size;
            row
        })
        .collect()
}

pub fn stat_report(entries: &[String], layout: &Layout) -> StatReport {
    StatReport {
        entries: entry_rows(entries, layout),
        total_size: layout.total(),
    }
}

/// `None` when `offset` is at or past the end of the stream.
pub fn position_row(entries: &[String], layout: &Layout, offset: u64) -> Option<PositionRow> {
    let (index, file_offset) = layout.locate(offset)?;
    Some(PositionRow {
        offset,
        index,
        path: entries[index].clone(),
        file_offset,
    })
}
