//! Caller-facing description of a route search.

use gacha_route_core::{GachaId, ItemId, PriorDraw, Route, Segment};

/// Action appended to a route once the search lands on the target cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FinalAction {
    /// Append nothing; the route ends exactly at the target.
    Skip,
    /// Append one ordinary pull on the provided gacha.
    Pull(GachaId),
    /// Append a guaranteed bundle of the provided size.
    Bundle {
        /// Gacha offering the bundle.
        gacha: GachaId,
        /// Total bundle size including the guaranteed pull.
        size: usize,
    },
}

impl FinalAction {
    /// Segment appended for this action, if any.
    #[must_use]
    pub const fn segment(self) -> Option<Segment> {
        match self {
            Self::Skip => None,
            Self::Pull(gacha) => Some(Segment::ordinary(gacha, 1)),
            Self::Bundle { gacha, size } => Some(Segment::bundle(gacha, size)),
        }
    }
}

/// Parameters of one route search.
///
/// Only the start cursor, target cursor and target gacha are required; every
/// other field has a permissive default. An empty availability list means
/// every configured gacha may be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteQuery {
    start: usize,
    target: usize,
    target_gacha: GachaId,
    available: Vec<GachaId>,
    trailing: Option<PriorDraw>,
    prefix: Route,
    final_action: Option<FinalAction>,
    primary_target: Option<ItemId>,
    interesting: Vec<ItemId>,
    premium_cap: Option<usize>,
    bundle_cap: Option<usize>,
}

impl RouteQuery {
    /// Creates a query landing on `target` before pulling on `target_gacha`.
    #[must_use]
    pub fn new(start: usize, target: usize, target_gacha: GachaId) -> Self {
        Self {
            start,
            target,
            target_gacha,
            available: Vec::new(),
            trailing: None,
            prefix: Route::new(),
            final_action: None,
            primary_target: None,
            interesting: Vec::new(),
            premium_cap: None,
            bundle_cap: None,
        }
    }

    /// Restricts the search to the provided gachas.
    #[must_use]
    pub fn with_available(mut self, available: impl IntoIterator<Item = GachaId>) -> Self {
        self.available = available.into_iter().collect();
        self
    }

    /// Seeds the route predecessor of the first pull.
    #[must_use]
    pub fn with_trailing(mut self, trailing: Option<PriorDraw>) -> Self {
        self.trailing = trailing;
        self
    }

    /// Replays `prefix` before searching the remainder.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Route) -> Self {
        self.prefix = prefix;
        self
    }

    /// Overrides the action appended after landing.
    #[must_use]
    pub fn with_final_action(mut self, action: FinalAction) -> Self {
        self.final_action = Some(action);
        self
    }

    /// Rewards routes that draw `item` along the way.
    #[must_use]
    pub fn with_primary_target(mut self, item: ItemId) -> Self {
        self.primary_target = Some(item);
        self
    }

    /// Adds a small bonus for drawing any of the provided items.
    #[must_use]
    pub fn with_interesting(mut self, items: impl IntoIterator<Item = ItemId>) -> Self {
        self.interesting = items.into_iter().collect();
        self
    }

    /// Caps the number of pulls made on premium gachas.
    #[must_use]
    pub fn with_premium_cap(mut self, cap: usize) -> Self {
        self.premium_cap = Some(cap);
        self
    }

    /// Caps the number of guaranteed bundles.
    #[must_use]
    pub fn with_bundle_cap(mut self, cap: usize) -> Self {
        self.bundle_cap = Some(cap);
        self
    }

    /// Cursor the search starts from.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Cursor the route must land on exactly.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Gacha the caller intends to pull on at the target.
    #[must_use]
    pub const fn target_gacha(&self) -> GachaId {
        self.target_gacha
    }

    /// Gachas the search may use; empty means all.
    #[must_use]
    pub fn available(&self) -> &[GachaId] {
        &self.available
    }

    /// Route predecessor of the first pull.
    #[must_use]
    pub const fn trailing(&self) -> Option<PriorDraw> {
        self.trailing
    }

    /// Route replayed before the search.
    #[must_use]
    pub const fn prefix(&self) -> &Route {
        &self.prefix
    }

    /// Action appended after landing, defaulting to one pull on the target gacha.
    #[must_use]
    pub fn final_action(&self) -> FinalAction {
        self.final_action
            .unwrap_or(FinalAction::Pull(self.target_gacha))
    }

    /// Item whose draw earns the largest bonus.
    #[must_use]
    pub const fn primary_target(&self) -> Option<ItemId> {
        self.primary_target
    }

    /// Whether `item` was designated as interesting.
    #[must_use]
    pub fn is_interesting(&self, item: ItemId) -> bool {
        self.interesting.contains(&item)
    }

    /// Maximum number of premium pulls.
    #[must_use]
    pub const fn premium_cap(&self) -> Option<usize> {
        self.premium_cap
    }

    /// Maximum number of guaranteed bundles.
    #[must_use]
    pub const fn bundle_cap(&self) -> Option<usize> {
        self.bundle_cap
    }
}
