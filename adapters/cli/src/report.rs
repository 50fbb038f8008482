//! Plain-text rendering of tables, step logs and search results.

use std::fmt::Write as _;

use gacha_route_core::{CellLabel, Configuration, RollResult, SeedStream, Track};
use gacha_route_roll::RollTable;
use gacha_route_simulator::{PullKind, RollStep, RouteOutcome};
use serde::Serialize;

/// Describes a roll result using the configuration's entry names.
pub(crate) fn describe(result: &RollResult, configuration: &Configuration) -> String {
    match result {
        RollResult::Unavailable => "(stream exhausted)".to_owned(),
        RollResult::NoMatch { rarity, .. } => format!("{rarity}: (empty pool)"),
        RollResult::Drawn(drawn) => {
            let name = configuration
                .entry(drawn.item())
                .map_or("?", |(_, entry)| entry.name());
            let mut text = format!("{}: {name}", drawn.rarity());
            if drawn.is_rerolled() {
                let original = configuration
                    .entry(drawn.original())
                    .map_or("?", |(_, entry)| entry.name());
                let cause = if drawn.is_route_induced() {
                    "route"
                } else {
                    "table"
                };
                let _ = write!(text, " (re-rolled from {original}, {cause})");
            }
            text
        }
    }
}

/// Renders `rows` rows of the two-track table side by side.
pub(crate) fn table(table: &RollTable, configuration: &Configuration, rows: usize) -> String {
    let mut out = format!("# {} ({})\n", configuration.name(), configuration.id());
    let mut current_row = 0;
    for (label, cell) in table.labelled() {
        if label.row() > rows {
            break;
        }
        if label.row() != current_row {
            if current_row != 0 {
                out.push('\n');
            }
            current_row = label.row();
        } else {
            out.push_str(" | ");
        }
        let _ = write!(
            out,
            "{:>5} {:<40}",
            label.to_string(),
            describe(cell, configuration)
        );
        if label.track() == Track::B {
            let trimmed = out.trim_end().len();
            out.truncate(trimmed);
        }
    }
    out.push('\n');
    out
}

/// Renders every pull of a replayed route.
pub(crate) fn steps<'a>(
    outcome: &RouteOutcome,
    stream: &SeedStream,
    configuration_of: impl Fn(&RollStep) -> Option<&'a Configuration>,
) -> String {
    let mut out = String::new();
    for step in outcome.steps() {
        let kind = match step.kind() {
            PullKind::Ordinary => "pull",
            PullKind::Guaranteed => "guaranteed",
        };
        let description = configuration_of(step).map_or_else(
            || "(unknown gacha)".to_owned(),
            |configuration| describe(step.result(), configuration),
        );
        let _ = writeln!(
            out,
            "{:>5} gacha {:<4} {kind:<10} {description} {:?}",
            step.label().to_string(),
            step.gacha().to_string(),
            step.seeds(stream),
        );
    }
    let _ = writeln!(
        out,
        "end {} ({}){}",
        CellLabel::from_cursor(outcome.end()),
        outcome.end(),
        if outcome.is_exhausted() {
            ", stream exhausted"
        } else {
            ""
        }
    );
    out
}

/// Machine-readable summary of a successful search.
#[derive(Debug, Serialize)]
pub(crate) struct FoundReport {
    pub(crate) seed: u32,
    pub(crate) target: usize,
    pub(crate) route: String,
    pub(crate) score: i64,
    pub(crate) steps: usize,
    pub(crate) prefix_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_route_core::{Drawn, GachaId, ItemId, Rarity, RewardEntry};

    #[test]
    fn rerolled_draw_names_both_entries() {
        let configuration = Configuration::builder(GachaId::new(1), "normal")
            .pool(
                Rarity::Rare,
                [
                    RewardEntry::new(ItemId::new(1), "A"),
                    RewardEntry::new(ItemId::new(2), "B"),
                ],
            )
            .build()
            .expect("valid configuration");
        let drawn =
            Drawn::new(Rarity::Rare, ItemId::new(1), 2).rerolled_to(ItemId::new(2), true, 3);

        assert_eq!(
            describe(&RollResult::Drawn(drawn), &configuration),
            "rare: B (re-rolled from A, route)"
        );
    }
}
