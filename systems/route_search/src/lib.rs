#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Beam search for pull routes that land exactly on a target cursor.
//!
//! Candidates advance by single ordinary pulls or whole guaranteed bundles,
//! evaluated through the [`Simulator`] so duplicate avoidance shifts the
//! cursor exactly as a replay would. Survivors are deduplicated, split by
//! track parity and truncated to the beam width after every step.

use std::collections::{btree_map::Entry, BTreeMap};

use gacha_route_core::{Configuration, GachaId, ItemId, PriorDraw, Route, Segment};
use gacha_route_simulator::{RollStep, SegmentOutcome, Simulator};

mod query;
mod scoring;

pub use query::{FinalAction, RouteQuery};
pub use scoring::ScoreWeights;

/// Default number of candidates retained per step.
pub const DEFAULT_BEAM_WIDTH: usize = 96;

/// Default number of beam steps before giving up.
pub const DEFAULT_MAX_STEPS: usize = 2_000;

/// Bounds of the beam search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    beam_width: usize,
    max_steps: usize,
}

impl Config {
    /// Creates a configuration with the provided beam width and step ceiling.
    #[must_use]
    pub const fn new(beam_width: usize, max_steps: usize) -> Self {
        Self {
            beam_width,
            max_steps,
        }
    }

    /// Candidates retained per step.
    #[must_use]
    pub const fn beam_width(&self) -> usize {
        self.beam_width
    }

    /// Step ceiling guaranteeing termination.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.max_steps
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BEAM_WIDTH, DEFAULT_MAX_STEPS)
    }
}

/// Successful search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundRoute {
    route: Route,
    score: i64,
    steps: usize,
    prefix_len: usize,
}

impl FoundRoute {
    /// Compressed route including the replayed prefix and the final action.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Heuristic score of the winning candidate.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.score
    }

    /// Beam steps taken before landing.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Number of prefix segments kept before the searched remainder.
    #[must_use]
    pub const fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Consumes the result and returns the route.
    #[must_use]
    pub fn into_route(self) -> Route {
        self.route
    }
}

/// Searches with the default bounds and weights.
#[must_use]
pub fn find_route(simulator: Simulator<'_>, query: &RouteQuery) -> Option<FoundRoute> {
    RouteSearch::new(simulator, Config::default(), ScoreWeights::default()).find_route(query)
}

/// Beam search over a simulator's configurations and stream.
#[derive(Clone, Copy, Debug)]
pub struct RouteSearch<'a> {
    simulator: Simulator<'a>,
    config: Config,
    weights: ScoreWeights,
}

type CandidateKey = (usize, Option<ItemId>, usize, usize);

#[derive(Clone, Debug)]
struct Candidate {
    cursor: usize,
    trailing: Option<PriorDraw>,
    segments: Vec<Segment>,
    score: i64,
    premium_uses: usize,
    bundle_uses: usize,
    last_gacha: Option<GachaId>,
}

impl Candidate {
    fn root(cursor: usize, trailing: Option<PriorDraw>) -> Self {
        Self {
            cursor,
            trailing,
            segments: Vec::new(),
            score: 0,
            premium_uses: 0,
            bundle_uses: 0,
            last_gacha: None,
        }
    }

    fn key(&self) -> CandidateKey {
        (
            self.cursor,
            self.trailing.map(|draw| draw.item()),
            self.premium_uses,
            self.bundle_uses,
        )
    }

    fn advance(&mut self, segment: Segment, outcome: &SegmentOutcome, premium: bool, delta: i64) {
        self.cursor = outcome.end();
        self.trailing = outcome.trailing();
        self.score += delta;
        if premium {
            self.premium_uses += segment.count();
        }
        if segment.is_bundle() {
            self.bundle_uses += 1;
        }
        self.last_gacha = Some(segment.gacha());
        self.segments.push(segment);
    }
}

impl<'a> RouteSearch<'a> {
    /// Creates a search over the simulator's inputs.
    #[must_use]
    pub const fn new(simulator: Simulator<'a>, config: Config, weights: ScoreWeights) -> Self {
        Self {
            simulator,
            config,
            weights,
        }
    }

    /// Bounds of the search.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Heuristic weights of the search.
    #[must_use]
    pub const fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Finds a route landing exactly on the query's target cursor.
    ///
    /// Returns `None` when the target gacha is unavailable, the prefix cannot
    /// be replayed, or the frontier empties or the step ceiling is reached
    /// before any candidate lands.
    #[must_use]
    pub fn find_route(&self, query: &RouteQuery) -> Option<FoundRoute> {
        let available = self.available(query);
        if !available
            .iter()
            .any(|configuration| configuration.id() == query.target_gacha())
        {
            tracing::info!(
                gacha = query.target_gacha().get(),
                "target gacha is not available"
            );
            return None;
        }
        if !self.final_action_is_valid(query.final_action()) {
            tracing::info!(action = ?query.final_action(), "final action is not offered");
            return None;
        }

        let root = self.replay_prefix(query)?;
        if root.cursor > query.target() {
            tracing::info!(
                start = root.cursor,
                target = query.target(),
                "start lies beyond the target"
            );
            return None;
        }
        let prefix_len = root.segments.len();

        let mut frontier = vec![root];
        let mut scratch = Vec::new();
        for step in 0..=self.config.max_steps {
            if let Some(landed) = frontier
                .iter()
                .filter(|candidate| candidate.cursor == query.target())
                .max_by_key(|candidate| candidate.score)
            {
                tracing::info!(
                    target = query.target(),
                    steps = step,
                    score = landed.score,
                    "route found"
                );
                return Some(self.finish(landed, query, prefix_len, step));
            }
            if step == self.config.max_steps {
                break;
            }

            frontier = self.expand(&frontier, &available, query, &mut scratch);
            tracing::debug!(step, frontier = frontier.len(), "beam step");
            if frontier.is_empty() {
                break;
            }
        }

        tracing::info!(
            start = query.start(),
            target = query.target(),
            "no route lands on the target"
        );
        None
    }

    fn available(&self, query: &RouteQuery) -> Vec<&'a Configuration> {
        let configurations = self.simulator.configurations();
        if query.available().is_empty() {
            return configurations.iter().collect();
        }
        query
            .available()
            .iter()
            .filter_map(|&gacha| {
                let configuration = configurations.get(gacha);
                if configuration.is_none() {
                    tracing::debug!(gacha = gacha.get(), "ignoring unknown available gacha");
                }
                configuration
            })
            .collect()
    }

    fn final_action_is_valid(&self, action: FinalAction) -> bool {
        let configurations = self.simulator.configurations();
        match action {
            FinalAction::Skip => true,
            FinalAction::Pull(gacha) => configurations.contains(gacha),
            FinalAction::Bundle { gacha, size } => configurations
                .get(gacha)
                .is_some_and(|configuration| configuration.supports_bundle(size)),
        }
    }

    fn replay_prefix(&self, query: &RouteQuery) -> Option<Candidate> {
        let configurations = self.simulator.configurations();
        let segments = query.prefix().segments();
        let mut root = Candidate::root(query.start(), query.trailing());
        let mut steps = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            steps.clear();
            let outcome = match self
                .simulator
                .segment(root.cursor, segment, root.trailing, &mut steps)
            {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(%error, "route prefix cannot be replayed");
                    return None;
                }
            };
            if outcome.is_exhausted() || outcome.end() > query.target() {
                tracing::debug!(
                    kept = index,
                    dropped = segments.len() - index,
                    "truncated route prefix at the target"
                );
                break;
            }
            let premium = configurations
                .get(segment.gacha())
                .is_some_and(Configuration::is_premium);
            root.advance(*segment, &outcome, premium, 0);
        }

        Some(root)
    }

    fn expand(
        &self,
        frontier: &[Candidate],
        available: &[&Configuration],
        query: &RouteQuery,
        scratch: &mut Vec<RollStep>,
    ) -> Vec<Candidate> {
        let mut survivors: BTreeMap<CandidateKey, Candidate> = BTreeMap::new();

        for candidate in frontier
            .iter()
            .filter(|candidate| candidate.cursor < query.target())
        {
            for configuration in available {
                let gacha = configuration.id();
                self.propose(
                    candidate,
                    configuration,
                    Segment::ordinary(gacha, 1),
                    query,
                    scratch,
                    &mut survivors,
                );

                if query
                    .bundle_cap()
                    .is_some_and(|cap| candidate.bundle_uses >= cap)
                {
                    continue;
                }
                for &size in configuration.bundle_sizes() {
                    self.propose(
                        candidate,
                        configuration,
                        Segment::bundle(gacha, size),
                        query,
                        scratch,
                        &mut survivors,
                    );
                }
            }
        }

        self.select(survivors.into_values(), query.target())
    }

    fn propose(
        &self,
        candidate: &Candidate,
        configuration: &Configuration,
        segment: Segment,
        query: &RouteQuery,
        scratch: &mut Vec<RollStep>,
        survivors: &mut BTreeMap<CandidateKey, Candidate>,
    ) {
        let premium = configuration.is_premium();
        if premium
            && query
                .premium_cap()
                .is_some_and(|cap| candidate.premium_uses + segment.count() > cap)
        {
            return;
        }

        scratch.clear();
        let Ok(outcome) =
            self.simulator
                .segment(candidate.cursor, &segment, candidate.trailing, scratch)
        else {
            return;
        };
        if outcome.is_exhausted() || outcome.end() > query.target() {
            return;
        }

        let delta = self.weights.score_move(
            candidate.last_gacha,
            &segment,
            &outcome,
            scratch,
            configuration,
            query,
        );
        let mut next = candidate.clone();
        next.advance(segment, &outcome, premium, delta);

        match survivors.entry(next.key()) {
            Entry::Occupied(mut entry) => {
                if next.score > entry.get().score {
                    let _ = entry.insert(next);
                }
            }
            Entry::Vacant(entry) => {
                let _ = entry.insert(next);
            }
        }
    }

    /// Keeps every landed candidate and the best of the rest per track.
    fn select(
        &self,
        candidates: impl Iterator<Item = Candidate>,
        target: usize,
    ) -> Vec<Candidate> {
        let width = self.config.beam_width;
        let half = (width + 1) / 2;
        let (mut landed, open): (Vec<Candidate>, Vec<Candidate>) =
            candidates.partition(|candidate| candidate.cursor == target);
        let (mut even, mut odd): (Vec<Candidate>, Vec<Candidate>) =
            open.into_iter().partition(|candidate| candidate.cursor % 2 == 0);

        for track in [&mut even, &mut odd] {
            track.sort_by(|left, right| right.score.cmp(&left.score));
            track.truncate(half);
        }

        let mut merged = even;
        merged.append(&mut odd);
        merged.sort_by(|left, right| right.score.cmp(&left.score));
        merged.truncate(width);
        merged.append(&mut landed);
        merged
    }

    fn finish(
        &self,
        landed: &Candidate,
        query: &RouteQuery,
        prefix_len: usize,
        steps: usize,
    ) -> FoundRoute {
        let mut segments = landed.segments.clone();
        segments.extend(query.final_action().segment());
        FoundRoute {
            route: Route::from_segments(segments).compress(),
            score: landed.score,
            steps,
            prefix_len,
        }
    }
}
