//! Projection of the World Bank country meta-data table.

use crate::io_utils::StringTable;

const RENAMES: [(&str, &str); 3] = [
    ("Country Code", "code"),
    ("Region", "region"),
    ("IncomeGroup", "income"),
];
const DROPPED: [&str; 2] = ["SpecialNotes", "TableName"];

pub fn clean_meta_data(table: &StringTable) -> StringTable {
    let kept = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty() && !h.starts_with("Unnamed") && !DROPPED.contains(&h.as_str()))
        .map(|(idx, h)| {
            let renamed = RENAMES
                .iter()
                .find(|(from, _)| *from == h.as_str())
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| h.clone());
            (idx, renamed)
        })
        .collect::<Vec<_>>();

    StringTable {
        headers: kept.iter().map(|(_, h)| h.clone()).collect(),
        rows: table
            .rows
            .iter()
            .map(|row| {
                kept.iter()
                    .map(|(idx, _)| row.get(*idx).cloned().unwrap_or_default())
                    .collect()
            })
            .collect(),
    }
}
