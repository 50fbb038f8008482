use gacha_route_core::{
    Configuration, ConfigurationSet, GachaId, ItemId, Rarity, RarityThresholds, RewardEntry,
    Route, SeedStream, RATE_SCALE,
};
use gacha_route_prng::generate_stream;
use gacha_route_roll::RollTables;
use gacha_route_search::{find_route, Config, FinalAction, RouteQuery, RouteSearch, ScoreWeights};
use gacha_route_simulator::Simulator;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const PLAIN: GachaId = GachaId::new(1);
const PREMIUM: GachaId = GachaId::new(2);
const SAFETY_MARGIN: usize = 64;

/// Two gachas that only ever draw commons, so every ordinary pull consumes
/// exactly two values and an 11-bundle consumes twenty-one.
fn even_steppers() -> ConfigurationSet {
    let commons = RarityThresholds::new(RATE_SCALE, RATE_SCALE, RATE_SCALE, RATE_SCALE, RATE_SCALE);
    let plain = Configuration::builder(PLAIN, "plain")
        .thresholds(commons)
        .pool(Rarity::Common, [RewardEntry::new(ItemId::new(1), "common")])
        .build()
        .expect("valid plain configuration");
    let premium = Configuration::builder(PREMIUM, "premium")
        .thresholds(commons)
        .pool(Rarity::Common, [RewardEntry::new(ItemId::new(2), "common")])
        .pool(Rarity::Uber, [RewardEntry::new(ItemId::new(900), "uber")])
        .bundle_sizes([11])
        .premium(true)
        .build()
        .expect("valid premium configuration");
    ConfigurationSet::from_configurations([plain, premium]).expect("distinct ids")
}

fn replay_end(set: &ConfigurationSet, stream: &SeedStream, start: usize, route: &Route) -> usize {
    let tables = RollTables::build(set, stream);
    Simulator::new(set, &tables, stream)
        .route(start, route, None)
        .expect("route replays")
        .end()
}

#[test]
fn found_route_lands_exactly_under_replay() {
    let set = even_steppers();
    let target = 41;
    let stream = generate_stream(7, target + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let query = RouteQuery::new(0, target, PLAIN).with_final_action(FinalAction::Skip);
    let found = find_route(simulator, &query).expect("odd target reachable through a bundle");

    assert_eq!(found.route().bundle_count(), 1);
    assert_eq!(replay_end(&set, &stream, 0, found.route()), target);
}

#[test]
fn default_final_action_pulls_the_target_gacha_at_the_target() {
    let set = even_steppers();
    let target = 20;
    let stream = generate_stream(11, target + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let found = find_route(simulator, &RouteQuery::new(0, target, PREMIUM)).expect("route");
    let outcome = simulator
        .route(0, found.route(), None)
        .expect("route replays");
    let last = outcome.steps().last().expect("final pull");

    assert_eq!(last.gacha(), PREMIUM);
    assert_eq!(last.cursor(), target);
    assert_eq!(outcome.end(), target + 2);
}

#[test]
fn unavailable_target_gacha_yields_none() {
    let set = even_steppers();
    let stream = generate_stream(3, 80);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let restricted = RouteQuery::new(0, 10, PLAIN).with_available([PREMIUM]);
    assert_eq!(find_route(simulator, &restricted), None);

    let unknown = RouteQuery::new(0, 10, GachaId::new(9));
    assert_eq!(find_route(simulator, &unknown), None);
}

#[test]
fn unreachable_target_yields_none() {
    let set = even_steppers();
    let stream = generate_stream(5, 120);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let beyond_stream = RouteQuery::new(0, 400, PLAIN);
    assert_eq!(find_route(simulator, &beyond_stream), None);

    let behind_start = RouteQuery::new(30, 10, PLAIN);
    assert_eq!(find_route(simulator, &behind_start), None);
}

#[test]
fn bundle_cap_blocks_the_only_parity_switch() {
    let set = even_steppers();
    let target = 41;
    let stream = generate_stream(13, target + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let capped = RouteQuery::new(0, target, PLAIN).with_bundle_cap(0);
    assert_eq!(find_route(simulator, &capped), None);

    let allowed = RouteQuery::new(0, target, PLAIN).with_bundle_cap(1);
    assert!(find_route(simulator, &allowed).is_some());
}

#[test]
fn premium_cap_counts_every_pull_of_a_bundle() {
    let set = even_steppers();
    let target = 41;
    let stream = generate_stream(17, target + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let too_small = RouteQuery::new(0, target, PLAIN).with_premium_cap(10);
    assert_eq!(find_route(simulator, &too_small), None);

    let exact = RouteQuery::new(0, target, PLAIN)
        .with_premium_cap(11)
        .with_final_action(FinalAction::Skip);
    let found = find_route(simulator, &exact).expect("one bundle fits the cap");
    let premium_pulls: usize = found
        .route()
        .segments()
        .iter()
        .filter(|segment| segment.gacha() == PREMIUM)
        .map(|segment| segment.count())
        .sum();
    assert_eq!(premium_pulls, 11);
}

#[test]
fn prefix_is_replayed_and_kept() {
    let set = even_steppers();
    let target = 30;
    let stream = generate_stream(19, target + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let query = RouteQuery::new(0, target, PLAIN)
        .with_prefix(Route::parse("2:3"))
        .with_final_action(FinalAction::Skip);
    let found = find_route(simulator, &query).expect("route");

    assert_eq!(found.prefix_len(), 1);
    assert_eq!(found.route().segments()[0].gacha(), PREMIUM);
    assert_eq!(replay_end(&set, &stream, 0, found.route()), target);

    let overshooting = RouteQuery::new(0, target, PLAIN)
        .with_prefix(Route::parse("1:2 1:40"))
        .with_final_action(FinalAction::Skip);
    let truncated = find_route(simulator, &overshooting).expect("route");
    assert_eq!(truncated.prefix_len(), 1);
    assert_eq!(replay_end(&set, &stream, 0, truncated.route()), target);
}

#[test]
fn prefix_bundles_count_toward_the_bundle_cap() {
    let set = even_steppers();
    let target = 62;
    let stream = generate_stream(23, target + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    // One bundle in the prefix leaves the cursor odd; the even target needs a second.
    let query = RouteQuery::new(0, target, PLAIN)
        .with_prefix(Route::parse("2:11g"))
        .with_bundle_cap(1);
    assert_eq!(find_route(simulator, &query), None);
}

#[test]
fn narrow_beam_still_terminates() {
    let set = even_steppers();
    let stream = generate_stream(29, 200);
    let tables = RollTables::build(&set, &stream);
    let search = RouteSearch::new(
        Simulator::new(&set, &tables, &stream),
        Config::new(1, 3),
        ScoreWeights::default(),
    );

    assert_eq!(search.find_route(&RouteQuery::new(0, 100, PLAIN)), None);
}

#[test]
fn landing_bundle_survives_a_single_candidate_beam() {
    let commons = RarityThresholds::new(RATE_SCALE, RATE_SCALE, RATE_SCALE, RATE_SCALE, RATE_SCALE);
    let pairs = Configuration::builder(PLAIN, "pairs")
        .thresholds(commons)
        .pool(Rarity::Common, [RewardEntry::new(ItemId::new(1), "common")])
        .pool(Rarity::Uber, [RewardEntry::new(ItemId::new(900), "uber")])
        .bundle_sizes([2])
        .build()
        .expect("valid configuration");
    let set = ConfigurationSet::from_configurations([pairs]).expect("single gacha");
    let stream = generate_stream(5, 3 + SAFETY_MARGIN);
    let tables = RollTables::build(&set, &stream);
    let search = RouteSearch::new(
        Simulator::new(&set, &tables, &stream),
        Config::new(1, 100),
        ScoreWeights::default(),
    );

    let query = RouteQuery::new(0, 3, PLAIN).with_final_action(FinalAction::Skip);
    let found = search.find_route(&query).expect("the bundle lands on 3");

    assert_eq!(found.route().to_string(), "1:2g");
    assert_eq!(replay_end(&set, &stream, 0, found.route()), 3);
}

fn random_configuration(rng: &mut ChaCha8Rng, id: u32) -> Configuration {
    let rare_rate = rng.gen_range(2_000..8_000);
    let rare_count = rng.gen_range(1..5u32);
    Configuration::builder(GachaId::new(id), "random")
        .thresholds(RarityThresholds::new(
            rng.gen_range(0..rare_rate),
            rare_rate,
            9_000,
            9_900,
            RATE_SCALE,
        ))
        .pool(Rarity::Common, [RewardEntry::new(ItemId::new(1), "common")])
        .pool(
            Rarity::Rare,
            (0..rare_count).map(|offset| RewardEntry::new(ItemId::new(10 + offset), "rare")),
        )
        .pool(Rarity::Super, [RewardEntry::new(ItemId::new(20), "super")])
        .pool(Rarity::Uber, [RewardEntry::new(ItemId::new(30), "uber")])
        .bundle_sizes([11])
        .build()
        .expect("random configuration is valid")
}

#[test]
fn randomized_searches_replay_to_their_targets() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x0b0e);
    let mut found_count = 0;

    for _ in 0..16 {
        let set = ConfigurationSet::from_configurations([
            random_configuration(&mut rng, 1),
            random_configuration(&mut rng, 2),
        ])
        .expect("distinct ids");
        let start = rng.gen_range(0..6);
        let target = start + rng.gen_range(20..80);
        let stream = generate_stream(rng.gen(), target + SAFETY_MARGIN);
        let tables = RollTables::build(&set, &stream);
        let simulator = Simulator::new(&set, &tables, &stream);

        let query = RouteQuery::new(start, target, GachaId::new(rng.gen_range(1..=2)))
            .with_final_action(FinalAction::Skip);
        let Some(found) = find_route(simulator, &query) else {
            continue;
        };
        found_count += 1;
        assert_eq!(
            replay_end(&set, &stream, start, found.route()),
            target,
            "route {} missed {target}",
            found.route()
        );
    }

    assert!(found_count > 0, "no randomized search succeeded");
}
