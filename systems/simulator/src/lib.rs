#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sequential simulator that replays segments and routes over the seed stream.
//!
//! Each ordinary pull receives two duplicate-avoidance inputs: the draw of
//! the previous pull along the route, threaded forward by the simulator, and
//! the draw of the physically preceding table cell, read from the gacha's
//! [`RollTable`]. A guaranteed bundle finishes with one forced uber pull whose
//! draw becomes the trailing draw handed to the next segment.

use gacha_route_core::{
    CellLabel, Configuration, ConfigurationSet, GachaId, PriorDraw, RollResult, Route,
    SeedStream, Segment,
};
use gacha_route_roll::{roll, roll_guaranteed, RollTable, RollTables};
use thiserror::Error;

/// Errors that prevent a segment from being simulated at all.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The segment names a gacha that is not configured.
    #[error("gacha {0} is not configured")]
    UnknownGacha(GachaId),
    /// No roll table was built for the gacha.
    #[error("no roll table was built for gacha {0}")]
    MissingTable(GachaId),
    /// The gacha does not offer a guaranteed bundle of the requested size.
    #[error("gacha {gacha} does not offer a guaranteed bundle of {size}")]
    UnsupportedBundle {
        /// Gacha named by the segment.
        gacha: GachaId,
        /// Requested bundle size.
        size: usize,
    },
}

/// Kind of pull performed by a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PullKind {
    /// Ordinary pull subject to duplicate avoidance.
    Ordinary,
    /// Forced uber pull closing a bundle.
    Guaranteed,
}

/// Log entry describing one resolved pull.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RollStep {
    cursor: usize,
    gacha: GachaId,
    kind: PullKind,
    result: RollResult,
}

impl RollStep {
    /// Cursor the pull started at.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Table label of the starting cursor.
    #[must_use]
    pub const fn label(&self) -> CellLabel {
        CellLabel::from_cursor(self.cursor)
    }

    /// Gacha the pull was made on.
    #[must_use]
    pub const fn gacha(&self) -> GachaId {
        self.gacha
    }

    /// Kind of pull.
    #[must_use]
    pub const fn kind(&self) -> PullKind {
        self.kind
    }

    /// Result of the pull.
    #[must_use]
    pub const fn result(&self) -> &RollResult {
        &self.result
    }

    /// Stream values the pull consumed.
    #[must_use]
    pub fn seeds<'stream>(&self, stream: &'stream SeedStream) -> &'stream [u32] {
        stream.window(self.cursor, self.result.consumed())
    }
}

/// Cursor and duplicate-avoidance state after a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentOutcome {
    start: usize,
    end: usize,
    trailing: Option<PriorDraw>,
    pulls: usize,
    exhausted: bool,
}

impl SegmentOutcome {
    /// Cursor the segment started at.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Cursor after the last resolved pull.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Stream values consumed by the segment.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.end - self.start
    }

    /// Draw handed to the next pull as its route predecessor.
    #[must_use]
    pub const fn trailing(&self) -> Option<PriorDraw> {
        self.trailing
    }

    /// Number of pulls that were resolved.
    #[must_use]
    pub const fn pulls(&self) -> usize {
        self.pulls
    }

    /// Whether the stream ran out before every pull was resolved.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Segment together with its outcome and step log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentReport {
    segment: Segment,
    outcome: SegmentOutcome,
    steps: Vec<RollStep>,
}

impl SegmentReport {
    /// Segment that was simulated.
    #[must_use]
    pub const fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Outcome of the segment.
    #[must_use]
    pub const fn outcome(&self) -> &SegmentOutcome {
        &self.outcome
    }

    /// Pulls in execution order.
    #[must_use]
    pub fn steps(&self) -> &[RollStep] {
        &self.steps
    }
}

/// Result of replaying a whole route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteOutcome {
    start: usize,
    end: usize,
    trailing: Option<PriorDraw>,
    segments: Vec<SegmentReport>,
}

impl RouteOutcome {
    /// Cursor the route started at.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Cursor after the last resolved pull.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Trailing draw after the route.
    #[must_use]
    pub const fn trailing(&self) -> Option<PriorDraw> {
        self.trailing
    }

    /// Per-segment reports in execution order.
    #[must_use]
    pub fn segments(&self) -> &[SegmentReport] {
        &self.segments
    }

    /// Whether any segment ran out of stream values.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.segments
            .iter()
            .any(|report| report.outcome.is_exhausted())
    }

    /// All pulls of the route in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &RollStep> {
        self.segments.iter().flat_map(|report| report.steps.iter())
    }
}

/// Replays segments against a fixed stream, configuration set and table set.
#[derive(Clone, Copy, Debug)]
pub struct Simulator<'a> {
    configurations: &'a ConfigurationSet,
    tables: &'a RollTables,
    stream: &'a SeedStream,
}

impl<'a> Simulator<'a> {
    /// Creates a simulator over the provided read-only inputs.
    #[must_use]
    pub const fn new(
        configurations: &'a ConfigurationSet,
        tables: &'a RollTables,
        stream: &'a SeedStream,
    ) -> Self {
        Self {
            configurations,
            tables,
            stream,
        }
    }

    /// Stream the simulator reads from.
    #[must_use]
    pub const fn stream(&self) -> &'a SeedStream {
        self.stream
    }

    /// Configurations the simulator resolves gacha identifiers against.
    #[must_use]
    pub const fn configurations(&self) -> &'a ConfigurationSet {
        self.configurations
    }

    /// Roll tables providing the layout predecessors.
    #[must_use]
    pub const fn tables(&self) -> &'a RollTables {
        self.tables
    }

    /// Simulates one segment starting at `start`.
    ///
    /// Resolved pulls are appended to `out`; callers that only need the
    /// outcome can pass a reusable scratch buffer.
    pub fn segment(
        &self,
        start: usize,
        segment: &Segment,
        trailing: Option<PriorDraw>,
        out: &mut Vec<RollStep>,
    ) -> Result<SegmentOutcome, SimulationError> {
        let gacha = segment.gacha();
        let configuration = self
            .configurations
            .get(gacha)
            .ok_or(SimulationError::UnknownGacha(gacha))?;
        let table = self
            .tables
            .get(gacha)
            .ok_or(SimulationError::MissingTable(gacha))?;
        if segment.is_bundle() && !configuration.supports_bundle(segment.count()) {
            return Err(SimulationError::UnsupportedBundle {
                gacha,
                size: segment.count(),
            });
        }

        Ok(run_segment(
            start,
            segment,
            configuration,
            table,
            self.stream,
            trailing,
            out,
        ))
    }

    /// Replays every segment of `route` in order, threading the trailing draw.
    pub fn route(
        &self,
        start: usize,
        route: &Route,
        trailing: Option<PriorDraw>,
    ) -> Result<RouteOutcome, SimulationError> {
        let mut cursor = start;
        let mut trailing = trailing;
        let mut segments = Vec::with_capacity(route.len());

        for segment in route.segments() {
            let mut steps = Vec::new();
            let outcome = self.segment(cursor, segment, trailing, &mut steps)?;
            cursor = outcome.end();
            trailing = outcome.trailing();
            let exhausted = outcome.is_exhausted();
            segments.push(SegmentReport {
                segment: *segment,
                outcome,
                steps,
            });
            if exhausted {
                break;
            }
        }

        Ok(RouteOutcome {
            start,
            end: cursor,
            trailing,
            segments,
        })
    }
}

fn run_segment(
    start: usize,
    segment: &Segment,
    configuration: &Configuration,
    table: &RollTable,
    stream: &SeedStream,
    trailing: Option<PriorDraw>,
    out: &mut Vec<RollStep>,
) -> SegmentOutcome {
    let gacha = configuration.id();
    let mut cursor = start;
    let mut trailing = trailing;
    let mut pulls = 0;

    for _ in 0..segment.ordinary_pulls() {
        let context = table.context_at(cursor, trailing);
        let result = roll(cursor, configuration, stream, &context);
        if result.is_unavailable() {
            tracing::debug!(gacha = gacha.get(), cursor, "stream exhausted mid-segment");
            return SegmentOutcome {
                start,
                end: cursor,
                trailing,
                pulls,
                exhausted: true,
            };
        }
        out.push(RollStep {
            cursor,
            gacha,
            kind: PullKind::Ordinary,
            result,
        });
        cursor += result.consumed();
        trailing = result.as_prior();
        pulls += 1;
    }

    if segment.is_bundle() {
        let result = roll_guaranteed(cursor, configuration, stream);
        if result.is_unavailable() {
            tracing::debug!(
                gacha = gacha.get(),
                cursor,
                "stream exhausted before guaranteed pull"
            );
            return SegmentOutcome {
                start,
                end: cursor,
                trailing,
                pulls,
                exhausted: true,
            };
        }
        out.push(RollStep {
            cursor,
            gacha,
            kind: PullKind::Guaranteed,
            result,
        });
        cursor += result.consumed();
        trailing = result.as_prior();
        pulls += 1;
    }

    SegmentOutcome {
        start,
        end: cursor,
        trailing,
        pulls,
        exhausted: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_route_core::{ItemId, Rarity, RarityThresholds, RewardEntry, RATE_SCALE};

    fn fixture() -> (ConfigurationSet, SeedStream) {
        let configuration = Configuration::builder(GachaId::new(1), "fixture")
            .thresholds(RarityThresholds::new(
                0, RATE_SCALE, RATE_SCALE, RATE_SCALE, RATE_SCALE,
            ))
            .pool(
                Rarity::Rare,
                [
                    RewardEntry::new(ItemId::new(1), "one"),
                    RewardEntry::new(ItemId::new(2), "two"),
                ],
            )
            .pool(Rarity::Uber, [RewardEntry::new(ItemId::new(9), "uber")])
            .bundle_sizes([3])
            .build()
            .expect("valid configuration");
        let set = ConfigurationSet::from_configurations([configuration]).expect("set");
        // 0,0 -> id 1; 0,0 -> duplicate of id 1, re-roll value 5 -> id 2.
        let stream = SeedStream::from_values(vec![0, 0, 0, 0, 5, 7, 1]);
        (set, stream)
    }

    #[test]
    fn threads_route_predecessor_between_pulls() {
        let (set, stream) = fixture();
        let tables = RollTables::build(&set, &stream);
        let simulator = Simulator::new(&set, &tables, &stream);

        let mut steps = Vec::new();
        let outcome = simulator
            .segment(0, &Segment::ordinary(GachaId::new(1), 2), None, &mut steps)
            .expect("simulated");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].result().item(), Some(ItemId::new(1)));
        assert!(steps[1].result().is_rerolled());
        assert_eq!(steps[1].result().item(), Some(ItemId::new(2)));
        assert_eq!(steps[1].seeds(&stream), &[0, 0, 5]);
        assert_eq!(outcome.end(), 5);
        assert_eq!(
            outcome.trailing(),
            Some(PriorDraw::new(Rarity::Rare, ItemId::new(2)))
        );
    }

    #[test]
    fn bundle_ends_with_guaranteed_pull() {
        let (set, stream) = fixture();
        let tables = RollTables::build(&set, &stream);
        let simulator = Simulator::new(&set, &tables, &stream);

        let mut steps = Vec::new();
        let outcome = simulator
            .segment(0, &Segment::bundle(GachaId::new(1), 3), None, &mut steps)
            .expect("simulated");

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].kind(), PullKind::Guaranteed);
        assert_eq!(steps[2].cursor(), 5);
        assert_eq!(outcome.end(), 6);
        assert_eq!(outcome.pulls(), 3);
    }

    #[test]
    fn unsupported_bundle_is_rejected() {
        let (set, stream) = fixture();
        let tables = RollTables::build(&set, &stream);
        let simulator = Simulator::new(&set, &tables, &stream);

        let bundle = Segment::bundle(GachaId::new(1), 11);
        let result = simulator.segment(0, &bundle, None, &mut Vec::new());
        assert_eq!(
            result,
            Err(SimulationError::UnsupportedBundle {
                gacha: GachaId::new(1),
                size: 11
            })
        );
    }
}
