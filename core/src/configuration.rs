//! Immutable gacha configurations and the master-data shapes they load from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GachaId, ItemId, Rarity, RATE_SCALE};

/// First identifier reserved for synthetic duplicate-count bonus entries.
const SYNTHETIC_ITEM_BASE: u32 = 0xffff_0000;
/// Upper bound on synthetic entries carried by a single configuration.
const MAX_BONUS_UBERS: u32 = 0xffff;

/// Errors raised while assembling configurations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Thresholds were not ordered common ≤ rare ≤ super ≤ uber ≤ legend.
    #[error("gacha {gacha}: rarity thresholds must be non-decreasing")]
    ThresholdsNotMonotonic {
        /// Offending gacha.
        gacha: GachaId,
    },
    /// A threshold exceeded the rate scale.
    #[error("gacha {gacha}: threshold {value} exceeds 10000")]
    ThresholdOutOfRange {
        /// Offending gacha.
        gacha: GachaId,
        /// Threshold that was out of range.
        value: u32,
    },
    /// A guaranteed bundle size of zero was configured.
    #[error("gacha {gacha}: bundle size {size} is not supported")]
    InvalidBundleSize {
        /// Offending gacha.
        gacha: GachaId,
        /// Rejected bundle size.
        size: usize,
    },
    /// Two configurations shared an identifier.
    #[error("gacha {0} is defined more than once")]
    DuplicateGacha(GachaId),
    /// Too many synthetic bonus entries were requested.
    #[error("gacha {gacha}: {requested} bonus ubers exceed the supported maximum")]
    BonusOverflow {
        /// Offending gacha.
        gacha: GachaId,
        /// Total number of bonus entries requested.
        requested: u32,
    },
}

/// Reward that can be produced by a pull.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewardEntry {
    id: ItemId,
    name: String,
    #[serde(default)]
    limited: bool,
}

impl RewardEntry {
    /// Creates a non-limited reward entry.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            limited: false,
        }
    }

    /// Returns a copy of the entry flagged as limited (or not).
    #[must_use]
    pub fn with_limited(mut self, limited: bool) -> Self {
        self.limited = limited;
        self
    }

    /// Identifier of the reward.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Display name of the reward.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the reward is only available for a limited time.
    #[must_use]
    pub const fn is_limited(&self) -> bool {
        self.limited
    }

    /// Whether the entry is a synthetic duplicate-count bonus.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.id.get() >= SYNTHETIC_ITEM_BASE
    }

    fn synthetic(ordinal: u32) -> Self {
        Self::new(
            ItemId::new(SYNTHETIC_ITEM_BASE + ordinal),
            format!("Bonus uber #{}", ordinal + 1),
        )
    }
}

/// Cumulative rarity thresholds out of [`RATE_SCALE`].
///
/// A rarity value `v` resolves to the first tier whose threshold exceeds it;
/// values at or above the uber threshold resolve to legend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RarityThresholds {
    /// Upper bound (exclusive) of the common tier.
    #[serde(default)]
    pub common: u32,
    /// Upper bound (exclusive) of the rare tier.
    pub rare: u32,
    /// Upper bound (exclusive) of the super tier.
    #[serde(rename = "super")]
    pub super_rare: u32,
    /// Upper bound (exclusive) of the uber tier.
    pub uber: u32,
    /// Upper bound of the legend tier; normally [`RATE_SCALE`].
    #[serde(default = "default_legend_threshold")]
    pub legend: u32,
}

fn default_legend_threshold() -> u32 {
    RATE_SCALE
}

impl RarityThresholds {
    /// Creates thresholds from cumulative bounds.
    #[must_use]
    pub const fn new(common: u32, rare: u32, super_rare: u32, uber: u32, legend: u32) -> Self {
        Self {
            common,
            rare,
            super_rare,
            uber,
            legend,
        }
    }

    /// Resolves a raw stream value to its rarity tier.
    #[must_use]
    pub const fn classify(&self, value: u32) -> Rarity {
        let scaled = value % RATE_SCALE;
        if scaled < self.common {
            Rarity::Common
        } else if scaled < self.rare {
            Rarity::Rare
        } else if scaled < self.super_rare {
            Rarity::Super
        } else if scaled < self.uber {
            Rarity::Uber
        } else {
            Rarity::Legend
        }
    }

    fn validate(&self, gacha: GachaId) -> Result<(), ConfigError> {
        let ordered = [
            self.common,
            self.rare,
            self.super_rare,
            self.uber,
            self.legend,
        ];
        if let Some(&value) = ordered.iter().find(|&&value| value > RATE_SCALE) {
            return Err(ConfigError::ThresholdOutOfRange { gacha, value });
        }
        if ordered.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ConfigError::ThresholdsNotMonotonic { gacha });
        }
        Ok(())
    }
}

/// Ordered reward pools keyed by rarity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RarityPools {
    pools: [Vec<RewardEntry>; 5],
}

impl RarityPools {
    /// Ordered entries of the requested tier.
    #[must_use]
    pub fn get(&self, rarity: Rarity) -> &[RewardEntry] {
        &self.pools[tier_index(rarity)]
    }

    fn get_mut(&mut self, rarity: Rarity) -> &mut Vec<RewardEntry> {
        &mut self.pools[tier_index(rarity)]
    }

    fn find(&self, item: ItemId) -> Option<(Rarity, &RewardEntry)> {
        Rarity::ALL.into_iter().find_map(|rarity| {
            self.get(rarity)
                .iter()
                .find(|entry| entry.id() == item)
                .map(|entry| (rarity, entry))
        })
    }
}

const fn tier_index(rarity: Rarity) -> usize {
    match rarity {
        Rarity::Common => 0,
        Rarity::Rare => 1,
        Rarity::Super => 2,
        Rarity::Uber => 3,
        Rarity::Legend => 4,
    }
}

/// Immutable description of one gacha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    id: GachaId,
    name: String,
    thresholds: RarityThresholds,
    pools: RarityPools,
    bundle_sizes: Vec<usize>,
    premium: bool,
    bonus_ubers: u32,
}

impl Configuration {
    /// Starts building a configuration with the provided identity.
    #[must_use]
    pub fn builder(id: GachaId, name: impl Into<String>) -> ConfigurationBuilder {
        ConfigurationBuilder {
            id,
            name: name.into(),
            thresholds: RarityThresholds::new(0, RATE_SCALE, RATE_SCALE, RATE_SCALE, RATE_SCALE),
            pools: RarityPools::default(),
            bundle_sizes: Vec::new(),
            premium: false,
            bonus_ubers: 0,
        }
    }

    /// Identifier of the gacha.
    #[must_use]
    pub const fn id(&self) -> GachaId {
        self.id
    }

    /// Display name of the gacha.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cumulative rarity thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &RarityThresholds {
        &self.thresholds
    }

    /// Ordered reward pool of the requested tier, synthetic entries first.
    #[must_use]
    pub fn pool(&self, rarity: Rarity) -> &[RewardEntry] {
        self.pools.get(rarity)
    }

    /// Guaranteed bundle sizes the gacha offers, in ascending order.
    #[must_use]
    pub fn bundle_sizes(&self) -> &[usize] {
        &self.bundle_sizes
    }

    /// Whether the gacha offers a guaranteed bundle of `size` pulls.
    #[must_use]
    pub fn supports_bundle(&self, size: usize) -> bool {
        self.bundle_sizes.contains(&size)
    }

    /// Whether pulls on this gacha draw on a scarce premium currency.
    #[must_use]
    pub const fn is_premium(&self) -> bool {
        self.premium
    }

    /// Number of synthetic bonus entries prepended to the uber pool.
    #[must_use]
    pub const fn bonus_ubers(&self) -> u32 {
        self.bonus_ubers
    }

    /// Looks up an entry by identifier across all tiers.
    #[must_use]
    pub fn entry(&self, item: ItemId) -> Option<(Rarity, &RewardEntry)> {
        self.pools.find(item)
    }

    /// Returns a new configuration carrying `additional` more bonus ubers.
    ///
    /// The receiver is left untouched, so a shared master configuration can
    /// be augmented per analysis without affecting other users.
    pub fn with_bonus_ubers(&self, additional: u32) -> Result<Self, ConfigError> {
        let requested = self.bonus_ubers.saturating_add(additional);
        let mut augmented = self.clone();
        apply_bonus_ubers(&mut augmented.pools, self.id, requested)?;
        augmented.bonus_ubers = requested;
        Ok(augmented)
    }
}

fn apply_bonus_ubers(
    pools: &mut RarityPools,
    gacha: GachaId,
    requested: u32,
) -> Result<(), ConfigError> {
    if requested > MAX_BONUS_UBERS {
        return Err(ConfigError::BonusOverflow { gacha, requested });
    }

    let uber = pools.get_mut(Rarity::Uber);
    uber.retain(|entry| !entry.is_synthetic());
    let base = std::mem::take(uber);
    uber.extend((0..requested).map(RewardEntry::synthetic));
    uber.extend(base);
    Ok(())
}

/// Builder that validates and assembles a [`Configuration`].
#[derive(Clone, Debug)]
pub struct ConfigurationBuilder {
    id: GachaId,
    name: String,
    thresholds: RarityThresholds,
    pools: RarityPools,
    bundle_sizes: Vec<usize>,
    premium: bool,
    bonus_ubers: u32,
}

impl ConfigurationBuilder {
    /// Sets the cumulative rarity thresholds.
    #[must_use]
    pub fn thresholds(mut self, thresholds: RarityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replaces the pool of one tier.
    #[must_use]
    pub fn pool(mut self, rarity: Rarity, entries: impl IntoIterator<Item = RewardEntry>) -> Self {
        *self.pools.get_mut(rarity) = entries.into_iter().collect();
        self
    }

    /// Sets the guaranteed bundle sizes offered by the gacha.
    #[must_use]
    pub fn bundle_sizes(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.bundle_sizes = sizes.into_iter().collect();
        self
    }

    /// Flags the gacha as consuming premium currency.
    #[must_use]
    pub fn premium(mut self, premium: bool) -> Self {
        self.premium = premium;
        self
    }

    /// Sets the number of synthetic bonus ubers to prepend.
    #[must_use]
    pub fn bonus_ubers(mut self, count: u32) -> Self {
        self.bonus_ubers = count;
        self
    }

    /// Validates the inputs and produces the configuration.
    pub fn build(self) -> Result<Configuration, ConfigError> {
        self.thresholds.validate(self.id)?;

        let mut bundle_sizes = self.bundle_sizes;
        if let Some(&size) = bundle_sizes.iter().find(|&&size| size == 0) {
            return Err(ConfigError::InvalidBundleSize {
                gacha: self.id,
                size,
            });
        }
        bundle_sizes.sort_unstable();
        bundle_sizes.dedup();

        let mut pools = self.pools;
        apply_bonus_ubers(&mut pools, self.id, self.bonus_ubers)?;

        Ok(Configuration {
            id: self.id,
            name: self.name,
            thresholds: self.thresholds,
            pools,
            bundle_sizes,
            premium: self.premium,
            bonus_ubers: self.bonus_ubers,
        })
    }
}

/// Collection of configurations keyed by gacha identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigurationSet {
    configurations: BTreeMap<GachaId, Configuration>,
}

impl ConfigurationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects configurations, rejecting duplicate identifiers.
    pub fn from_configurations(
        configurations: impl IntoIterator<Item = Configuration>,
    ) -> Result<Self, ConfigError> {
        let mut set = Self::new();
        for configuration in configurations {
            set.insert(configuration)?;
        }
        Ok(set)
    }

    /// Validates every entry of a master-data file.
    pub fn from_file(file: ConfigurationFile) -> Result<Self, ConfigError> {
        let configurations = file
            .gacha
            .into_iter()
            .map(ConfigurationSpec::into_configuration)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_configurations(configurations)
    }

    /// Adds a configuration, rejecting duplicate identifiers.
    pub fn insert(&mut self, configuration: Configuration) -> Result<(), ConfigError> {
        let id = configuration.id();
        if self.configurations.contains_key(&id) {
            return Err(ConfigError::DuplicateGacha(id));
        }
        let _ = self.configurations.insert(id, configuration);
        Ok(())
    }

    /// Configuration registered under `id`.
    #[must_use]
    pub fn get(&self, id: GachaId) -> Option<&Configuration> {
        self.configurations.get(&id)
    }

    /// Whether a configuration is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: GachaId) -> bool {
        self.configurations.contains_key(&id)
    }

    /// Configurations in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.configurations.values()
    }

    /// Registered identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = GachaId> + '_ {
        self.configurations.keys().copied()
    }

    /// Number of registered configurations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

/// Master-data document listing every gacha.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationFile {
    /// Gacha definitions.
    #[serde(default)]
    pub gacha: Vec<ConfigurationSpec>,
}

/// Serialized form of a single gacha.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSpec {
    /// Identifier of the gacha.
    pub id: GachaId,
    /// Display name of the gacha.
    #[serde(default)]
    pub name: String,
    /// Whether pulls draw on premium currency.
    #[serde(default)]
    pub premium: bool,
    /// Guaranteed bundle sizes on offer.
    #[serde(default)]
    pub bundle_sizes: Vec<usize>,
    /// Cumulative rarity thresholds.
    pub thresholds: RarityThresholds,
    /// Reward pools per tier.
    #[serde(default)]
    pub pools: PoolSpec,
    /// Synthetic bonus ubers to prepend.
    #[serde(default)]
    pub bonus_ubers: u32,
}

impl ConfigurationSpec {
    /// Validates the entry and converts it into a [`Configuration`].
    pub fn into_configuration(self) -> Result<Configuration, ConfigError> {
        let PoolSpec {
            common,
            rare,
            super_rare,
            uber,
            legend,
        } = self.pools;
        Configuration::builder(self.id, self.name)
            .thresholds(self.thresholds)
            .pool(Rarity::Common, common)
            .pool(Rarity::Rare, rare)
            .pool(Rarity::Super, super_rare)
            .pool(Rarity::Uber, uber)
            .pool(Rarity::Legend, legend)
            .bundle_sizes(self.bundle_sizes)
            .premium(self.premium)
            .bonus_ubers(self.bonus_ubers)
            .build()
    }
}

/// Serialized reward pools keyed by tier name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Common tier entries.
    #[serde(default)]
    pub common: Vec<RewardEntry>,
    /// Rare tier entries.
    #[serde(default)]
    pub rare: Vec<RewardEntry>,
    /// Super tier entries.
    #[serde(default, rename = "super")]
    pub super_rare: Vec<RewardEntry>,
    /// Uber tier entries.
    #[serde(default)]
    pub uber: Vec<RewardEntry>,
    /// Legend tier entries.
    #[serde(default)]
    pub legend: Vec<RewardEntry>,
}
