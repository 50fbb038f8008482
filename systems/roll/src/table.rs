//! Static two-track roll table used to derive layout adjacency.

use std::collections::BTreeMap;

use gacha_route_core::{
    CellLabel, Configuration, ConfigurationSet, DrawContext, GachaId, PriorDraw, RollResult,
    SeedStream,
};

use crate::roll;

/// Every cell of one gacha's table, rolled without any route context.
///
/// Cell `i` is rolled with the cell two positions earlier (the cell above it
/// in the same track) as its layout predecessor. The table therefore mirrors
/// what a player sees before choosing a route, and provides the `above`
/// input for route-dependent rolls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollTable {
    gacha: GachaId,
    cells: Vec<RollResult>,
}

impl RollTable {
    /// Rolls every cursor of the stream for the provided configuration.
    #[must_use]
    pub fn build(configuration: &Configuration, stream: &SeedStream) -> Self {
        let mut cells: Vec<RollResult> = Vec::with_capacity(stream.len());
        for cursor in 0..stream.len() {
            let above = cursor
                .checked_sub(2)
                .and_then(|previous| cells[previous].as_prior());
            let context = DrawContext::new(above, None);
            cells.push(roll(cursor, configuration, stream, &context));
        }

        Self {
            gacha: configuration.id(),
            cells,
        }
    }

    /// Gacha the table was rolled for.
    #[must_use]
    pub const fn gacha(&self) -> GachaId {
        self.gacha
    }

    /// Number of cells in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the table has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Result displayed in the cell at `cursor`.
    #[must_use]
    pub fn cell(&self, cursor: usize) -> Option<&RollResult> {
        self.cells.get(cursor)
    }

    /// Draw of the cell physically above `cursor` in the same track.
    #[must_use]
    pub fn above(&self, cursor: usize) -> Option<PriorDraw> {
        cursor
            .checked_sub(2)
            .and_then(|previous| self.cells.get(previous))
            .and_then(RollResult::as_prior)
    }

    /// Duplicate-avoidance context for a pull at `cursor` along a route.
    #[must_use]
    pub fn context_at(&self, cursor: usize, source: Option<PriorDraw>) -> DrawContext {
        DrawContext::new(self.above(cursor), source)
    }

    /// Cells paired with their table labels, in cursor order.
    pub fn labelled(&self) -> impl Iterator<Item = (CellLabel, &RollResult)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(cursor, cell)| (CellLabel::from_cursor(cursor), cell))
    }
}

/// One [`RollTable`] per configuration, all over the same stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollTables {
    tables: BTreeMap<GachaId, RollTable>,
}

impl RollTables {
    /// Builds tables for every configuration of the set.
    #[must_use]
    pub fn build(configurations: &ConfigurationSet, stream: &SeedStream) -> Self {
        let tables = configurations
            .iter()
            .map(|configuration| {
                (
                    configuration.id(),
                    RollTable::build(configuration, stream),
                )
            })
            .collect();
        Self { tables }
    }

    /// Table of the requested gacha.
    #[must_use]
    pub fn get(&self, gacha: GachaId) -> Option<&RollTable> {
        self.tables.get(&gacha)
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no tables were built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
