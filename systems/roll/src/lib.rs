#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure roll engines that resolve single pulls against the seed stream.
//!
//! [`roll`] resolves an ordinary pull from two consecutive stream values and
//! applies duplicate avoidance to the rare tier. [`roll_guaranteed`] resolves
//! the forced uber pull that closes a guaranteed bundle. Neither function
//! keeps state; identical inputs always produce identical results.

use gacha_route_core::{
    Configuration, DrawContext, Drawn, ItemId, Rarity, RollResult, SeedStream,
    GUARANTEED_PULL_WIDTH, ORDINARY_PULL_WIDTH, REROLLED_PULL_WIDTH,
};

mod table;

pub use table::{RollTable, RollTables};

/// Resolves one ordinary pull starting at `cursor`.
///
/// The first value selects the rarity tier, the second the slot within the
/// tier's pool. Rare pulls whose slot pick duplicates the route predecessor
/// (`source`) or the physically preceding table cell (`above`) consume a
/// third value to re-roll among the remaining rare entries.
#[must_use]
pub fn roll(
    cursor: usize,
    configuration: &Configuration,
    stream: &SeedStream,
    context: &DrawContext,
) -> RollResult {
    let (Some(rarity_seed), Some(slot_seed)) = (stream.get(cursor), stream.get(cursor + 1)) else {
        return RollResult::Unavailable;
    };

    let rarity = configuration.thresholds().classify(rarity_seed);
    let pool = configuration.pool(rarity);
    if pool.is_empty() {
        return RollResult::NoMatch {
            rarity,
            consumed: ORDINARY_PULL_WIDTH,
        };
    }

    let original = pool[slot_index(slot_seed, pool.len())].id();
    let drawn = Drawn::new(rarity, original, ORDINARY_PULL_WIDTH);
    if rarity != Rarity::Rare {
        return RollResult::Drawn(drawn);
    }

    let Some(collision) = detect_collision(original, context) else {
        return RollResult::Drawn(drawn);
    };

    let alternatives = pool.iter().filter(|entry| entry.id() != original).count();
    let rerolled = match stream.get(cursor + 2) {
        Some(reroll_seed) if alternatives > 0 => {
            let index = slot_index(reroll_seed, alternatives);
            let item = pool
                .iter()
                .filter(|entry| entry.id() != original)
                .nth(index)
                .map_or(original, |entry| entry.id());
            drawn.rerolled_to(item, collision.route_induced, REROLLED_PULL_WIDTH)
        }
        _ => drawn.rerolled_to(original, collision.route_induced, ORDINARY_PULL_WIDTH),
    };
    RollResult::Drawn(rerolled)
}

/// Resolves the forced uber pull at `cursor`, consuming a single value.
#[must_use]
pub fn roll_guaranteed(
    cursor: usize,
    configuration: &Configuration,
    stream: &SeedStream,
) -> RollResult {
    let Some(seed) = stream.get(cursor) else {
        return RollResult::Unavailable;
    };

    let pool = configuration.pool(Rarity::Uber);
    if pool.is_empty() {
        return RollResult::NoMatch {
            rarity: Rarity::Uber,
            consumed: GUARANTEED_PULL_WIDTH,
        };
    }

    let item = pool[slot_index(seed, pool.len())].id();
    RollResult::Drawn(Drawn::new(Rarity::Uber, item, GUARANTEED_PULL_WIDTH))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Collision {
    route_induced: bool,
}

fn detect_collision(candidate: ItemId, context: &DrawContext) -> Option<Collision> {
    let above_collides = context
        .above()
        .is_some_and(|above| above.collides_with(candidate));

    if context
        .source()
        .is_some_and(|source| source.collides_with(candidate))
    {
        // Route-induced only when the layout itself would not have collided.
        let route_induced = context.above().is_some() && !above_collides;
        return Some(Collision { route_induced });
    }

    above_collides.then_some(Collision {
        route_induced: false,
    })
}

fn slot_index(seed: u32, len: usize) -> usize {
    debug_assert!(len > 0, "slot_index requires a populated pool");
    (u64::from(seed) % len as u64) as usize
}
