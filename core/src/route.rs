//! Route segments and their whitespace-separated text encoding.
//!
//! A route is written as tokens of the form `<gacha>:<count><suffix>`, for
//! example `105:10 106:11g`. The two-word form `105 10` is accepted as well,
//! and tokens may be separated by spaces, hyphens or commas. The `g` suffix
//! marks a guaranteed bundle whose count is the total bundle size.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::GachaId;

/// Delimiter between the gacha identifier and the count of a token.
const FIELD_DELIMITER: char = ':';
/// Suffix marking a guaranteed bundle.
const BUNDLE_SUFFIX: &str = "g";

/// How the pulls of a segment are performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentMode {
    /// Independent ordinary pulls.
    Ordinary,
    /// Bundle whose last pull is a forced uber.
    Guaranteed,
}

/// One step of a route: a number of pulls on a single gacha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    gacha: GachaId,
    count: usize,
    mode: SegmentMode,
}

impl Segment {
    /// Creates a segment of `count` ordinary pulls.
    #[must_use]
    pub const fn ordinary(gacha: GachaId, count: usize) -> Self {
        Self {
            gacha,
            count,
            mode: SegmentMode::Ordinary,
        }
    }

    /// Creates a guaranteed bundle of `size` total pulls.
    #[must_use]
    pub const fn bundle(gacha: GachaId, size: usize) -> Self {
        Self {
            gacha,
            count: size,
            mode: SegmentMode::Guaranteed,
        }
    }

    /// Gacha the pulls are made on.
    #[must_use]
    pub const fn gacha(&self) -> GachaId {
        self.gacha
    }

    /// Total number of pulls, including a bundle's guaranteed pull.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Mode of the pulls.
    #[must_use]
    pub const fn mode(&self) -> SegmentMode {
        self.mode
    }

    /// Whether the segment is a guaranteed bundle.
    #[must_use]
    pub const fn is_bundle(&self) -> bool {
        matches!(self.mode, SegmentMode::Guaranteed)
    }

    /// Number of ordinary pulls preceding any guaranteed pull.
    #[must_use]
    pub const fn ordinary_pulls(&self) -> usize {
        match self.mode {
            SegmentMode::Ordinary => self.count,
            SegmentMode::Guaranteed => self.count.saturating_sub(1),
        }
    }

    fn merges_with(&self, other: &Segment) -> bool {
        self.mode == SegmentMode::Ordinary
            && other.mode == SegmentMode::Ordinary
            && self.gacha == other.gacha
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.mode {
            SegmentMode::Ordinary => "",
            SegmentMode::Guaranteed => BUNDLE_SUFFIX,
        };
        write!(f, "{}{FIELD_DELIMITER}{}{suffix}", self.gacha, self.count)
    }
}

/// Errors produced while parsing a single route token.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SegmentParseError {
    /// The token did not contain a `:` delimiter.
    #[error("token '{0}' is missing the ':' delimiter")]
    MissingDelimiter(String),
    /// The gacha identifier was not a number.
    #[error("token '{0}' has an invalid gacha id")]
    InvalidGacha(String),
    /// The count was missing or not a number.
    #[error("token '{0}' has an invalid count")]
    InvalidCount(String),
    /// The count was zero.
    #[error("token '{0}' requests zero pulls")]
    ZeroCount(String),
    /// The count carried an unknown suffix.
    #[error("token '{0}' has an unknown bundle marker")]
    UnknownSuffix(String),
}

impl FromStr for Segment {
    type Err = SegmentParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let (gacha, count) = token
            .split_once(FIELD_DELIMITER)
            .ok_or_else(|| SegmentParseError::MissingDelimiter(token.to_owned()))?;

        let gacha = gacha
            .trim()
            .parse::<u32>()
            .map(GachaId::new)
            .map_err(|_| SegmentParseError::InvalidGacha(token.to_owned()))?;

        let count = count.trim();
        let digits_end = count
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(count.len());
        let (digits, suffix) = count.split_at(digits_end);
        let value = digits
            .parse::<usize>()
            .map_err(|_| SegmentParseError::InvalidCount(token.to_owned()))?;
        if value == 0 {
            return Err(SegmentParseError::ZeroCount(token.to_owned()));
        }

        if suffix.is_empty() {
            Ok(Segment::ordinary(gacha, value))
        } else if suffix.eq_ignore_ascii_case(BUNDLE_SUFFIX) {
            Ok(Segment::bundle(gacha, value))
        } else {
            Err(SegmentParseError::UnknownSuffix(token.to_owned()))
        }
    }
}

/// Ordered sequence of segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    segments: Vec<Segment>,
}

impl Route {
    /// Creates an empty route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the provided segments without merging them.
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parses a route, silently skipping malformed tokens.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self::parse_with_report(input).0
    }

    /// Parses a route and reports the tokens that were skipped.
    #[must_use]
    pub fn parse_with_report(input: &str) -> (Self, Vec<String>) {
        let words: Vec<&str> = input
            .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
            .filter(|word| !word.is_empty())
            .collect();

        let mut segments = Vec::new();
        let mut skipped = Vec::new();
        let mut index = 0;
        while index < words.len() {
            let word = words[index];
            if word.contains(FIELD_DELIMITER) {
                match word.parse::<Segment>() {
                    Ok(segment) => segments.push(segment),
                    Err(_) => skipped.push(word.to_owned()),
                }
                index += 1;
                continue;
            }

            if let Some(next) = words.get(index + 1) {
                if !next.contains(FIELD_DELIMITER) {
                    let joined = format!("{word}{FIELD_DELIMITER}{next}");
                    if let Ok(segment) = joined.parse::<Segment>() {
                        segments.push(segment);
                        index += 2;
                        continue;
                    }
                }
            }

            skipped.push(word.to_owned());
            index += 1;
        }

        (Self { segments }, skipped)
    }

    /// Segments in execution order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the route has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a segment without merging.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Total number of pulls across all segments, saturating at `usize::MAX`.
    #[must_use]
    pub fn total_pulls(&self) -> usize {
        self.segments
            .iter()
            .fold(0, |total, segment| total.saturating_add(segment.count))
    }

    /// Number of guaranteed bundles in the route.
    #[must_use]
    pub fn bundle_count(&self) -> usize {
        self.segments.iter().filter(|segment| segment.is_bundle()).count()
    }

    /// Merges adjacent ordinary segments of the same gacha.
    ///
    /// Bundles are never merged because each carries its own guaranteed pull.
    #[must_use]
    pub fn compress(&self) -> Self {
        let mut merged: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match merged.last_mut() {
                Some(last) if last.merges_with(segment) => {
                    last.count = last.count.saturating_add(segment.count);
                }
                _ => merged.push(*segment),
            }
        }
        Self { segments: merged }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compressed = self.compress();
        for (index, segment) in compressed.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<Segment> for Route {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
