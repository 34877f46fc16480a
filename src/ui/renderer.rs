//! Dashboard rendering: table rows, manual-link option lists, and template
//! substitution.
//!
//! Template placeholders are `{{name}}` tokens. `VIEW_MODE_MARKER` is left in
//! place for the server to fill per request.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::models::{LinkedPair, MatchEntity};
use crate::engine::linker::LinkOutcome;

use super::snapshot::{Snapshot, SnapshotCounts, TableRow};

pub const VIEW_MODE_MARKER: &str = "__VIEW_MODE__";

const MAX_LINE_CHARS: usize = 200;
const NO_LINKED_MESSAGE: &str = "No linked matches yet.";
const NO_PENDING_MESSAGE: &str = "No matches waiting to be linked.";

// =============================================================================
// Formatting helpers
// =============================================================================

pub fn format_minute(minute: Option<u32>) -> String {
    match minute {
        Some(m) => format!("{m}'"),
        None => "??".to_string(),
    }
}

/// Cut to `max_chars` characters, ending in an ellipsis when shortened.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn format_match_line(entity: &MatchEntity) -> String {
    truncate_text(&entity.to_string(), MAX_LINE_CHARS)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Descending minute, unknown minute last.
fn minute_order(minute: Option<u32>) -> (bool, Reverse<u32>) {
    (minute.is_none(), Reverse(minute.unwrap_or(0)))
}

// =============================================================================
// Rows
// =============================================================================

/// Pending rows: both sides bucketed by minute and paired positionally
/// inside each bucket. Only the first row of a bucket shows the minute.
pub fn build_rows_by_minute(
    a_matches: &[MatchEntity],
    b_matches: &[MatchEntity],
    empty_message: &str,
) -> Vec<TableRow> {
    let mut buckets: BTreeMap<(bool, Reverse<u32>), (Vec<&MatchEntity>, Vec<&MatchEntity>)> =
        BTreeMap::new();
    for entity in a_matches {
        buckets.entry(minute_order(entity.minute)).or_default().0.push(entity);
    }
    for entity in b_matches {
        buckets.entry(minute_order(entity.minute)).or_default().1.push(entity);
    }

    if buckets.is_empty() {
        return vec![TableRow::new("--", empty_message, empty_message)];
    }

    let mut rows = Vec::new();
    for ((unknown, Reverse(minute)), (a_side, b_side)) in buckets {
        let minute_text = format_minute((!unknown).then_some(minute));
        let height = a_side.len().max(b_side.len()).max(1);
        for i in 0..height {
            rows.push(TableRow {
                minute: if i == 0 { minute_text.clone() } else { String::new() },
                a: a_side.get(i).map(|e| format_match_line(e)).unwrap_or_default(),
                b: b_side.get(i).map(|e| format_match_line(e)).unwrap_or_default(),
            });
        }
    }
    rows
}

/// Linked rows, one per pair, latest minute first.
pub fn build_rows_by_linked_pairs(pairs: &[LinkedPair], empty_message: &str) -> Vec<TableRow> {
    if pairs.is_empty() {
        return vec![TableRow::new("--", empty_message, empty_message)];
    }

    let mut sorted: Vec<&LinkedPair> = pairs.iter().collect();
    sorted.sort_by_key(|pair| minute_order(pair.reference_minute()));

    sorted
        .into_iter()
        .map(|pair| TableRow {
            minute: format_minute(pair.reference_minute()),
            a: format_match_line(&pair.a),
            b: format_match_line(&pair.b),
        })
        .collect()
}

// =============================================================================
// HTML fragments
// =============================================================================

fn render_table_rows(rows: &[TableRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td class='minute'>{}</td><td>{}</td></tr>",
                escape_html(&row.a),
                escape_html(&row.minute),
                escape_html(&row.b)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn option_label(entity: &MatchEntity) -> String {
    format!("{} · {}", format_minute(entity.minute), entity)
}

fn render_options(matches: &[MatchEntity]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(i, entity)| {
            format!(
                "<option value='{i}'>{}</option>",
                escape_html(&option_label(entity))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct TeamNames<'a> {
    home_team: &'a str,
    away_team: &'a str,
}

/// JSON array of `{home_team, away_team}` safe to embed in a `<script>` tag.
fn serialize_team_names(matches: &[MatchEntity]) -> String {
    let names: Vec<TeamNames<'_>> = matches
        .iter()
        .map(|m| TeamNames {
            home_team: &m.home_team,
            away_team: &m.away_team,
        })
        .collect();
    serde_json::to_string(&names)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}

/// Single-pass `{{name}}` substitution. Unknown tokens are left untouched and
/// substituted values are never re-scanned.
pub fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Renderer
// =============================================================================

/// Turns a link outcome into a published `Snapshot`.
#[derive(Debug, Clone)]
pub struct DashboardRenderer {
    template: String,
    refresh_seconds: u64,
    a_label: String,
    b_label: String,
}

impl DashboardRenderer {
    pub fn new(template: &str, refresh_seconds: u64, a_label: &str, b_label: &str) -> Self {
        Self {
            template: template.to_string(),
            refresh_seconds,
            a_label: a_label.to_string(),
            b_label: b_label.to_string(),
        }
    }

    /// Snapshot of one completed cycle.
    pub fn render(
        &self,
        outcome: &LinkOutcome,
        a_total: usize,
        b_total: usize,
        last_update: &str,
    ) -> Snapshot {
        let counts = SnapshotCounts {
            a_total,
            b_total,
            linked_total: outcome.linked_total(),
            pending_total: outcome.pending_total(),
        };
        let linked_rows = build_rows_by_linked_pairs(&outcome.linked, NO_LINKED_MESSAGE);
        let pending_rows =
            build_rows_by_minute(&outcome.pending_a, &outcome.pending_b, NO_PENDING_MESSAGE);

        self.assemble(
            last_update,
            counts,
            linked_rows,
            pending_rows,
            outcome.pending_a_raw.clone(),
            outcome.pending_b.clone(),
        )
    }

    /// Placeholder shown until the first cycle completes.
    pub fn initial(&self) -> Snapshot {
        let loading_a = format!("Loading {}...", self.a_label);
        let loading_b = format!("Loading {}...", self.b_label);
        self.assemble(
            "starting",
            SnapshotCounts::default(),
            vec![TableRow::new("--", NO_LINKED_MESSAGE, NO_LINKED_MESSAGE)],
            vec![TableRow::new("--", &loading_a, &loading_b)],
            Vec::new(),
            Vec::new(),
        )
    }

    fn assemble(
        &self,
        last_update: &str,
        counts: SnapshotCounts,
        linked_rows: Vec<TableRow>,
        pending_rows: Vec<TableRow>,
        a_pending: Vec<MatchEntity>,
        b_pending: Vec<MatchEntity>,
    ) -> Snapshot {
        let values = [
            ("refresh_seconds", self.refresh_seconds.to_string()),
            ("last_update", escape_html(last_update)),
            ("a_label", escape_html(&self.a_label)),
            ("b_label", escape_html(&self.b_label)),
            ("a_total", counts.a_total.to_string()),
            ("b_total", counts.b_total.to_string()),
            ("linked_total", counts.linked_total.to_string()),
            ("pending_total", counts.pending_total.to_string()),
            ("linked_table_rows", render_table_rows(&linked_rows)),
            ("pending_table_rows", render_table_rows(&pending_rows)),
            ("a_options", render_options(&a_pending)),
            ("b_options", render_options(&b_pending)),
            ("a_matches_json", serialize_team_names(&a_pending)),
            ("b_matches_json", serialize_team_names(&b_pending)),
        ];
        let html = fill_template(&self.template, &values).trim().to_string();

        Snapshot {
            last_update: last_update.to_string(),
            counts,
            linked_rows,
            pending_rows,
            a_pending,
            b_pending,
            html,
        }
    }
}
