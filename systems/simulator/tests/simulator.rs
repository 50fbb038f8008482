use gacha_route_core::{
    Configuration, ConfigurationSet, GachaId, ItemId, PriorDraw, Rarity, RarityThresholds,
    RewardEntry, Route, Segment,
};
use gacha_route_prng::generate_stream;
use gacha_route_roll::RollTables;
use gacha_route_simulator::{PullKind, SimulationError, Simulator};

const SEED: u32 = 123_456_789;
const NORMAL: GachaId = GachaId::new(1);
const EVENT: GachaId = GachaId::new(2);

fn configurations() -> ConfigurationSet {
    let rare = (1..=4).map(|id| RewardEntry::new(ItemId::new(id), format!("rare {id}")));
    let normal = Configuration::builder(NORMAL, "normal")
        .thresholds(RarityThresholds::new(3_000, 8_000, 9_500, 9_980, 10_000))
        .pool(Rarity::Common, [RewardEntry::new(ItemId::new(100), "common")])
        .pool(Rarity::Rare, rare.clone())
        .pool(Rarity::Super, [RewardEntry::new(ItemId::new(200), "super")])
        .pool(Rarity::Uber, [RewardEntry::new(ItemId::new(300), "uber")])
        .bundle_sizes([11])
        .build()
        .expect("valid normal configuration");
    let event = Configuration::builder(EVENT, "event")
        .thresholds(RarityThresholds::new(0, 6_500, 9_000, 10_000, 10_000))
        .pool(Rarity::Rare, rare)
        .pool(
            Rarity::Uber,
            [
                RewardEntry::new(ItemId::new(301), "limited").with_limited(true),
                RewardEntry::new(ItemId::new(302), "uber"),
            ],
        )
        .build()
        .expect("valid event configuration");
    ConfigurationSet::from_configurations([normal, event]).expect("distinct ids")
}

#[test]
fn eleven_bundle_is_ten_ordinary_pulls_plus_one_guaranteed_value() {
    let set = configurations();
    let stream = generate_stream(SEED, 200);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let mut ordinary_steps = Vec::new();
    let ordinary = simulator
        .segment(4, &Segment::ordinary(NORMAL, 10), None, &mut ordinary_steps)
        .expect("ordinary pulls");
    let mut bundle_steps = Vec::new();
    let bundle = simulator
        .segment(4, &Segment::bundle(NORMAL, 11), None, &mut bundle_steps)
        .expect("bundle pulls");

    assert!(!bundle.is_exhausted());
    assert_eq!(bundle.pulls(), 11);
    assert_eq!(bundle.end(), ordinary.end() + 1);
    assert_eq!(&bundle_steps[..10], &ordinary_steps[..]);

    let last = bundle_steps.last().expect("guaranteed step");
    assert_eq!(last.kind(), PullKind::Guaranteed);
    assert_eq!(last.cursor(), ordinary.end());
    assert_eq!(last.result().rarity(), Some(Rarity::Uber));
    assert_eq!(last.result().consumed(), 1);
    assert_eq!(
        bundle.trailing(),
        Some(PriorDraw::new(Rarity::Uber, ItemId::new(300)))
    );
}

#[test]
fn consecutive_steps_are_contiguous() {
    let set = configurations();
    let stream = generate_stream(SEED, 200);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let route = Route::parse("1:5 2:3 1:11g 2:2");
    let outcome = simulator.route(0, &route, None).expect("route replays");

    let mut cursor = 0;
    for step in outcome.steps() {
        assert_eq!(step.cursor(), cursor);
        assert_eq!(step.label().cursor(), cursor);
        assert_eq!(step.seeds(&stream).len(), step.result().consumed());
        cursor += step.result().consumed();
    }
    assert_eq!(cursor, outcome.end());
    assert_eq!(outcome.segments().len(), 4);
    assert_eq!(outcome.steps().count(), route.total_pulls());
}

#[test]
fn rare_repeat_of_route_predecessor_is_always_rerolled() {
    let set = configurations();
    let stream = generate_stream(SEED, 400);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let outcome = simulator
        .route(0, &Route::parse("2:40 1:40"), None)
        .expect("route replays");

    let mut previous: Option<PriorDraw> = None;
    let mut rerolls = 0;
    for step in outcome.steps() {
        if let Some(drawn) = step.result().drawn() {
            if previous.is_some_and(|prior| prior.collides_with(drawn.original())) {
                assert!(drawn.is_rerolled(), "step at {} kept a duplicate", step.label());
                assert_ne!(drawn.item(), drawn.original());
            }
            if drawn.is_rerolled() {
                rerolls += 1;
            }
        }
        previous = step.result().as_prior();
    }
    assert!(rerolls > 0, "expected the route to trigger duplicate avoidance");
}

#[test]
fn trailing_draw_crosses_segment_boundaries() {
    let set = configurations();
    let stream = generate_stream(SEED, 200);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let whole = simulator
        .route(0, &Route::parse("2:6"), None)
        .expect("single segment");
    let split = simulator
        .route(0, &Route::parse("2:2 2:1 2:3"), None)
        .expect("split segments");

    assert_eq!(whole.end(), split.end());
    assert_eq!(whole.trailing(), split.trailing());
    assert!(whole.steps().eq(split.steps()));
}

#[test]
fn exhaustion_stops_the_route() {
    let set = configurations();
    let stream = generate_stream(SEED, 9);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let outcome = simulator
        .route(0, &Route::parse("1:20 2:1"), None)
        .expect("route replays");

    assert!(outcome.is_exhausted());
    assert_eq!(outcome.segments().len(), 1);
    assert!(outcome.end() <= stream.len());
    assert!(stream.remaining(outcome.end()) < 3);
}

#[test]
fn unknown_gacha_is_an_error() {
    let set = configurations();
    let stream = generate_stream(SEED, 16);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let result = simulator.route(0, &Route::parse("1:1 9:1"), None);
    assert_eq!(result, Err(SimulationError::UnknownGacha(GachaId::new(9))));

    let missing = RollTables::default();
    let without_tables = Simulator::new(&set, &missing, &stream);
    assert_eq!(
        without_tables.route(0, &Route::parse("1:1"), None),
        Err(SimulationError::MissingTable(NORMAL))
    );
}

#[test]
fn oversized_segment_stops_at_the_end_of_the_stream() {
    let set = configurations();
    let stream = generate_stream(SEED, 24);
    let tables = RollTables::build(&set, &stream);
    let simulator = Simulator::new(&set, &tables, &stream);

    let route = Route::parse("1:1000000000000000000 2:1");
    assert_eq!(route.len(), 2);
    let outcome = simulator.route(0, &route, None).expect("route replays");

    assert!(outcome.is_exhausted());
    assert_eq!(outcome.segments().len(), 1);
    assert!(outcome.steps().count() <= stream.len() / 2);
    assert!(stream.remaining(outcome.end()) < 2);
}
