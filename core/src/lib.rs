#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gacha route engine.
//!
//! This crate defines the value types that connect the pure systems and the
//! adapters. The PRNG system fills a [`SeedStream`], the roll system resolves
//! single pulls against a [`Configuration`] into [`RollResult`] values, the
//! simulator threads [`DrawContext`] values through a [`Route`], and the
//! route search composes all of them. Every type here is an immutable value;
//! no system keeps ambient state between calls.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod configuration;
mod route;

pub use configuration::{
    ConfigError, Configuration, ConfigurationBuilder, ConfigurationFile, ConfigurationSet,
    ConfigurationSpec, PoolSpec, RarityPools, RarityThresholds, RewardEntry,
};
pub use route::{Route, Segment, SegmentMode, SegmentParseError};

/// Denominator of the rarity thresholds; rarity values are `seed % RATE_SCALE`.
pub const RATE_SCALE: u32 = 10_000;

/// Number of stream values consumed by an ordinary pull without a re-roll.
pub const ORDINARY_PULL_WIDTH: usize = 2;

/// Number of stream values consumed by an ordinary pull that re-rolled.
pub const REROLLED_PULL_WIDTH: usize = 3;

/// Number of stream values consumed by a guaranteed uber pull.
pub const GUARANTEED_PULL_WIDTH: usize = 1;

/// Unique identifier of a gacha configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GachaId(u32);

impl GachaId {
    /// Creates a new gacha identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for GachaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a reward (character or item) within the master data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rarity tiers resolved from the first stream value of a pull.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// Lowest tier, rarely populated in practice.
    Common,
    /// Tier subject to duplicate avoidance.
    Rare,
    /// Super rare tier.
    Super,
    /// Uber rare tier; also the tier forced by guaranteed pulls.
    Uber,
    /// Legend rare tier.
    Legend,
}

impl Rarity {
    /// All tiers in ascending threshold order.
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Super,
        Rarity::Uber,
        Rarity::Legend,
    ];

    /// Short human readable label of the tier.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Super => "super",
            Self::Uber => "uber",
            Self::Legend => "legend",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of an earlier pull used as duplicate-avoidance input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PriorDraw {
    rarity: Rarity,
    item: ItemId,
}

impl PriorDraw {
    /// Captures the rarity and final item of a pull.
    #[must_use]
    pub const fn new(rarity: Rarity, item: ItemId) -> Self {
        Self { rarity, item }
    }

    /// Rarity the earlier pull resolved to.
    #[must_use]
    pub const fn rarity(&self) -> Rarity {
        self.rarity
    }

    /// Final item the earlier pull produced.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Reports whether a rare candidate equal to `candidate` duplicates this draw.
    ///
    /// Only rare draws participate in duplicate avoidance.
    #[must_use]
    pub fn collides_with(&self, candidate: ItemId) -> bool {
        self.rarity == Rarity::Rare && self.item == candidate
    }
}

/// Duplicate-avoidance inputs for a single ordinary pull.
///
/// `above` is the draw of the cell physically preceding the pull in the fixed
/// two-track table, independent of the route. `source` is the draw that
/// actually precedes the pull along the route being evaluated. The two differ
/// whenever a route switches tracks or gachas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DrawContext {
    above: Option<PriorDraw>,
    source: Option<PriorDraw>,
}

impl DrawContext {
    /// Creates a context from the provided layout and route predecessors.
    #[must_use]
    pub const fn new(above: Option<PriorDraw>, source: Option<PriorDraw>) -> Self {
        Self { above, source }
    }

    /// Context that imposes no duplicate constraint.
    #[must_use]
    pub const fn unconstrained() -> Self {
        Self {
            above: None,
            source: None,
        }
    }

    /// Draw of the physically preceding table cell, if any.
    #[must_use]
    pub const fn above(&self) -> Option<PriorDraw> {
        self.above
    }

    /// Draw of the preceding pull along the route, if any.
    #[must_use]
    pub const fn source(&self) -> Option<PriorDraw> {
        self.source
    }
}

/// Item produced by a pull that resolved to a populated pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Drawn {
    rarity: Rarity,
    original: ItemId,
    item: ItemId,
    rerolled: bool,
    route_induced: bool,
    consumed: usize,
}

impl Drawn {
    /// Creates a draw that kept its original slot pick.
    #[must_use]
    pub const fn new(rarity: Rarity, original: ItemId, consumed: usize) -> Self {
        Self {
            rarity,
            original,
            item: original,
            rerolled: false,
            route_induced: false,
            consumed,
        }
    }

    /// Marks the draw as re-rolled into `item`.
    ///
    /// `item` may equal the original pick when no re-roll value or no
    /// alternative entry was available.
    #[must_use]
    pub const fn rerolled_to(self, item: ItemId, route_induced: bool, consumed: usize) -> Self {
        Self {
            item,
            rerolled: true,
            route_induced,
            consumed,
            ..self
        }
    }

    /// Rarity tier of the draw.
    #[must_use]
    pub const fn rarity(&self) -> Rarity {
        self.rarity
    }

    /// Item indexed by the slot value before any re-roll.
    #[must_use]
    pub const fn original(&self) -> ItemId {
        self.original
    }

    /// Item the pull finally produced.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Whether a duplicate was detected and a re-roll attempted.
    #[must_use]
    pub const fn is_rerolled(&self) -> bool {
        self.rerolled
    }

    /// Whether the duplicate exists only because of the chosen route.
    #[must_use]
    pub const fn is_route_induced(&self) -> bool {
        self.route_induced
    }

    /// Number of stream values the pull consumed.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }
}

/// Result of resolving a single pull.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RollResult {
    /// Not enough stream values remained; nothing was consumed.
    Unavailable,
    /// The resolved tier has no configured rewards.
    NoMatch {
        /// Tier the rarity value resolved to.
        rarity: Rarity,
        /// Stream values consumed so cursor arithmetic stays aligned.
        consumed: usize,
    },
    /// A reward was produced.
    Drawn(Drawn),
}

impl RollResult {
    /// Number of stream values consumed by the pull.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        match self {
            Self::Unavailable => 0,
            Self::NoMatch { consumed, .. } => *consumed,
            Self::Drawn(drawn) => drawn.consumed,
        }
    }

    /// Rarity of the pull, if the stream was long enough to resolve one.
    #[must_use]
    pub const fn rarity(&self) -> Option<Rarity> {
        match self {
            Self::Unavailable => None,
            Self::NoMatch { rarity, .. } => Some(*rarity),
            Self::Drawn(drawn) => Some(drawn.rarity),
        }
    }

    /// Final item of the pull, if one was produced.
    #[must_use]
    pub const fn item(&self) -> Option<ItemId> {
        match self {
            Self::Drawn(drawn) => Some(drawn.item),
            _ => None,
        }
    }

    /// Draw details, if a reward was produced.
    #[must_use]
    pub const fn drawn(&self) -> Option<&Drawn> {
        match self {
            Self::Drawn(drawn) => Some(drawn),
            _ => None,
        }
    }

    /// Whether the pull detected a duplicate and attempted a re-roll.
    #[must_use]
    pub const fn is_rerolled(&self) -> bool {
        match self {
            Self::Drawn(drawn) => drawn.rerolled,
            _ => false,
        }
    }

    /// Whether the stream ran out before the pull could be resolved.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Converts the result into duplicate-avoidance input for the next pull.
    #[must_use]
    pub const fn as_prior(&self) -> Option<PriorDraw> {
        match self {
            Self::Drawn(drawn) => Some(PriorDraw::new(drawn.rarity, drawn.item)),
            _ => None,
        }
    }
}

/// One of the two interleaved columns of the roll table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Track {
    /// Even cursors.
    A,
    /// Odd cursors.
    B,
}

impl Track {
    /// Track containing the provided cursor.
    #[must_use]
    pub const fn of(cursor: usize) -> Self {
        if cursor % 2 == 0 {
            Self::A
        } else {
            Self::B
        }
    }
}

/// Largest row whose cells still address a representable cursor.
const MAX_LABEL_ROW: usize = usize::MAX / 2 + 1;

/// Human readable position of a cursor in the two-track table, e.g. `12B`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellLabel {
    row: usize,
    track: Track,
}

impl CellLabel {
    /// Label of the cell the provided cursor addresses.
    #[must_use]
    pub const fn from_cursor(cursor: usize) -> Self {
        Self {
            row: cursor / 2 + 1,
            track: Track::of(cursor),
        }
    }

    /// One-based table row.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Track of the cell.
    #[must_use]
    pub const fn track(&self) -> Track {
        self.track
    }

    /// Stream cursor addressed by the label.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        let base = (self.row - 1) * 2;
        match self.track {
            Track::A => base,
            Track::B => base + 1,
        }
    }
}

impl fmt::Display for CellLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let track = match self.track {
            Track::A => 'A',
            Track::B => 'B',
        };
        write!(f, "{}{track}", self.row)
    }
}

/// Errors produced while parsing a [`CellLabel`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CellLabelParseError {
    /// The label did not end in `A` or `B`.
    #[error("cell label '{0}' must end with track A or B")]
    MissingTrack(String),
    /// The row part was not a positive integer.
    #[error("cell label '{0}' has an invalid row")]
    InvalidRow(String),
}

impl FromStr for CellLabel {
    type Err = CellLabelParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (row, track) = match trimmed.char_indices().last() {
            Some((index, 'A' | 'a')) => (&trimmed[..index], Track::A),
            Some((index, 'B' | 'b')) => (&trimmed[..index], Track::B),
            _ => return Err(CellLabelParseError::MissingTrack(trimmed.to_owned())),
        };
        let row = row
            .parse::<usize>()
            .map_err(|_| CellLabelParseError::InvalidRow(trimmed.to_owned()))?;
        if row == 0 || row > MAX_LABEL_ROW {
            return Err(CellLabelParseError::InvalidRow(trimmed.to_owned()));
        }
        Ok(Self { row, track })
    }
}

/// Finite, read-only prefix of the seed stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedStream {
    values: Vec<u32>,
}

impl SeedStream {
    /// Wraps already generated stream values.
    #[must_use]
    pub fn from_values(values: Vec<u32>) -> Self {
        Self { values }
    }

    /// Value at the provided cursor, if generated.
    #[must_use]
    pub fn get(&self, cursor: usize) -> Option<u32> {
        self.values.get(cursor).copied()
    }

    /// Number of generated values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values available from `cursor` onwards.
    #[must_use]
    pub fn remaining(&self, cursor: usize) -> usize {
        self.values.len().saturating_sub(cursor)
    }

    /// Values starting at `cursor`, at most `count` of them.
    #[must_use]
    pub fn window(&self, cursor: usize, count: usize) -> &[u32] {
        let start = cursor.min(self.values.len());
        let end = cursor.saturating_add(count).min(self.values.len());
        &self.values[start..end]
    }
}
