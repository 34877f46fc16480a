//! Team-name normalization against the persisted alias table.
//!
//! Source B is canonical; source A names are rewritten through
//! `aliases[source_a]` before linking.

use crate::data::models::MatchEntity;
use crate::state::mapping_store::AliasMap;

/// Rewrite `home_team`/`away_team` to their canonical spelling.
///
/// Unmapped names pass through unchanged. A source with no table (or an
/// empty one) returns the input as-is.
pub fn normalize(source_id: &str, matches: Vec<MatchEntity>, aliases: &AliasMap) -> Vec<MatchEntity> {
    let Some(table) = aliases.get(&source_id.to_lowercase()) else {
        return matches;
    };
    if table.is_empty() {
        return matches;
    }

    matches
        .into_iter()
        .map(|mut m| {
            if let Some(canonical) = table.get(&m.home_team) {
                m.home_team = canonical.clone();
            }
            if let Some(canonical) = table.get(&m.away_team) {
                m.away_team = canonical.clone();
            }
            m
        })
        .collect()
}
