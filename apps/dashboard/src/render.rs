//! Plain-text tables for the terminal.

use client_core::{InboxStats, RelabelSession};
use shared::{
    domain::{InboxItem, LibraryRow},
    protocol::TakeList,
};

const MISSING: &str = "-";

pub fn inbox_table(items: &[&InboxItem], stats: InboxStats) -> String {
    let mut out = format!(
        "total {}  needs review {}  archived {}\n",
        stats.total, stats.review, stats.archived
    );
    out.push_str(&format!(
        "{:<36}  {:<9}  {:>5}  {:<32}  {:>5}  {:<6}  {:<19}\n",
        "ID", "TYPE", "INDEX", "TITLE", "CONF", "REVIEW", "CREATED"
    ));
    for item in items {
        let created = item
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| MISSING.to_string());
        let review = if item.needs_review { "yes" } else { "no" };
        out.push_str(&format!(
            "{:<36}  {:<9}  {:>5}  {:<32}  {:>5.2}  {:<6}  {:<19}\n",
            item.id,
            item.tag.item_type,
            item.tag.index,
            item.tag.display_title(),
            item.tag.confidence,
            review,
            created
        ));
        if let Some(asr) = item.asr.as_ref().filter(|asr| !asr.text.is_empty()) {
            out.push_str(&format!("    asr[{}]: {}\n", asr.engine, asr.text));
        }
    }
    out
}

pub fn library_table(rows: &[&LibraryRow]) -> String {
    let mut out = format!(
        "{:<9}  {:>5}  {:<32}  {:>5}  {:<28}\n",
        "TYPE", "INDEX", "TITLE", "TAKES", "LATEST"
    );
    for row in rows {
        let title = format!("{} / {}", row.title_zh, row.title_en);
        let latest = row
            .latest_taken_at()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .or_else(|| row.latest_time.clone())
            .unwrap_or_else(|| MISSING.to_string());
        out.push_str(&format!(
            "{:<9}  {:>5}  {:<32}  {:>5}  {:<28}\n",
            row.item_type,
            row.index,
            title,
            row.take_count,
            latest
        ));
    }
    out
}

pub fn take_list(takes: &TakeList) -> String {
    if takes.takes.is_empty() {
        return format!(
            "no playable takes for {}\n",
            takes.item_type.format_code(takes.index)
        );
    }
    takes
        .takes
        .iter()
        .map(|take| format!("{}  ({})\n", take.name, take.path))
        .collect()
}

pub fn relabel_form(session: &RelabelSession) -> String {
    let range = session.index_range();
    let titles = session.titles();
    format!(
        "item {}  type {}  index {} ({}..={})\ntitle_zh {}\ntitle_en {}\n",
        session.item_id().unwrap_or(MISSING),
        session.item_type(),
        session.index(),
        range.start(),
        range.end(),
        titles.zh,
        titles.en
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
