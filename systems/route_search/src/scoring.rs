//! Additive heuristic used to rank beam candidates.

use gacha_route_core::{Configuration, Drawn, GachaId, Rarity, Segment};
use gacha_route_simulator::{RollStep, SegmentOutcome};

use crate::RouteQuery;

/// Tunable constants of the candidate heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreWeights {
    /// Awarded when the resulting cursor shares the target's track.
    pub on_track: i64,
    /// Applied when the resulting cursor sits on the other track.
    pub off_track: i64,
    /// Awarded for drawing the caller's primary target.
    pub primary_target: i64,
    /// Awarded per legend draw.
    pub legend: i64,
    /// Awarded per draw of a limited entry.
    pub limited: i64,
    /// Awarded per uber draw.
    pub uber: i64,
    /// Awarded per draw of a caller-designated interesting item.
    pub interesting: i64,
    /// Awarded for staying on the previous move's gacha.
    pub same_gacha: i64,
    /// Applied per guaranteed bundle; negative to conserve bundles.
    pub bundle: i64,
    /// Multiplied by the number of stream values a move consumed.
    pub per_consumed: i64,
    /// Scale of the `cursor / target` progress term.
    pub progress: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            on_track: 500,
            off_track: -50,
            primary_target: 5_000,
            legend: 1_000,
            limited: 300,
            uber: 200,
            interesting: 100,
            same_gacha: 150,
            bundle: -800,
            per_consumed: 1,
            progress: 100,
        }
    }
}

impl ScoreWeights {
    pub(crate) fn score_move(
        &self,
        previous: Option<GachaId>,
        segment: &Segment,
        outcome: &SegmentOutcome,
        steps: &[RollStep],
        configuration: &Configuration,
        query: &RouteQuery,
    ) -> i64 {
        let mut score = self.track_score(outcome.end(), query.target());

        score += steps
            .iter()
            .filter_map(|step| step.result().drawn())
            .map(|drawn| self.draw_bonus(drawn, configuration, query))
            .sum::<i64>();

        if previous == Some(segment.gacha()) {
            score += self.same_gacha;
        }
        if segment.is_bundle() {
            score += self.bundle;
        }

        score += self.per_consumed * to_score(outcome.consumed());
        if query.target() > 0 {
            score += self.progress * to_score(outcome.end()) / to_score(query.target());
        }
        score
    }

    /// Only cursors on the target's track can reach it through two-value pulls.
    const fn track_score(&self, end: usize, target: usize) -> i64 {
        if end % 2 == target % 2 {
            self.on_track
        } else {
            self.off_track
        }
    }

    fn draw_bonus(&self, drawn: &Drawn, configuration: &Configuration, query: &RouteQuery) -> i64 {
        let item = drawn.item();
        let mut bonus = match drawn.rarity() {
            Rarity::Legend => self.legend,
            Rarity::Uber => self.uber,
            _ => 0,
        };
        if query.primary_target() == Some(item) {
            bonus += self.primary_target;
        }
        if configuration
            .entry(item)
            .is_some_and(|(_, entry)| entry.is_limited())
        {
            bonus += self.limited;
        }
        if query.is_interesting(item) {
            bonus += self.interesting;
        }
        bonus
    }
}

fn to_score(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_route_core::{ItemId, RarityThresholds, RewardEntry};

    #[test]
    fn limited_primary_uber_stacks_bonuses() {
        let configuration = Configuration::builder(GachaId::new(1), "event")
            .thresholds(RarityThresholds::new(0, 0, 0, 10_000, 10_000))
            .pool(
                Rarity::Uber,
                [RewardEntry::new(ItemId::new(5), "limited").with_limited(true)],
            )
            .build()
            .expect("valid configuration");
        let query = RouteQuery::new(0, 4, GachaId::new(1))
            .with_primary_target(ItemId::new(5))
            .with_interesting([ItemId::new(5)]);
        let weights = ScoreWeights::default();

        let drawn = Drawn::new(Rarity::Uber, ItemId::new(5), 2);
        assert_eq!(
            weights.draw_bonus(&drawn, &configuration, &query),
            200 + 5_000 + 300 + 100
        );
    }

    #[test]
    fn track_score_follows_the_resulting_cursor() {
        let weights = ScoreWeights::default();

        assert_eq!(weights.track_score(7, 41), 500);
        assert_eq!(weights.track_score(8, 41), -50);
        assert_eq!(weights.track_score(40, 40), 500);
        assert_eq!(weights.track_score(0, 3), -50);
    }
}
