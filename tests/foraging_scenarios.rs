use antsim::pheromones::{evaporation_factor, Evaporation, REMOVAL_THRESHOLD};
use antsim::{PheromoneKind, Position, SimConfig, Simulation};

fn empty_world(size: usize) -> Simulation {
    Simulation::empty(SimConfig {
        width: size,
        height: size,
        ants: 0,
        food_piles: 0,
        ..SimConfig::default()
    })
    .unwrap()
}

#[test]
fn lone_ant_finds_and_picks_up_food() {
    let mut sim = empty_world(20);
    assert_eq!(sim.nest(), Position::new(10, 10));
    let site = Position::new(10, 15);
    let unit = sim.place_food(site);
    let ant_id = sim.spawn_ant(Position::new(10, 11));

    let mut picked_up = false;
    for _ in 0..5000 {
        sim.tick();
        if sim.food().is_empty() {
            picked_up = true;
            break;
        }
    }
    assert!(picked_up, "ant never reached the food");

    let ant = sim.ant(ant_id).unwrap();
    assert!(ant.carrying_food);
    assert_eq!(ant.last_food_position, Some(site));
    assert!(!sim.food().contains(unit));
    assert_eq!(sim.stats().ants_carrying_food, 1);
    assert_eq!(sim.food_delivered(), 0);
}

#[test]
fn loaded_ant_lays_home_trail_while_stepping_home() {
    let mut sim = empty_world(20);
    let start = Position::new(10, 16);
    sim.place_food(start);
    let ant_id = sim.spawn_ant(start);

    sim.tick();

    let ant = sim.ant(ant_id).unwrap();
    assert!(ant.carrying_food);
    assert_eq!(ant.position, Position::new(10, 15));

    // 1.5 scaled by distance 6 / 10, neighbours at 30%, then one decay
    let factor = evaporation_factor(10.0, 10.0, 1);
    let centre = sim
        .pheromones()
        .strength_at(start, PheromoneKind::ToNest)
        .unwrap();
    assert!((centre - 0.9 * factor).abs() < 1e-9);
    for cell in sim.grid().neighborhood(start, 1, false) {
        let s = sim
            .pheromones()
            .strength_at(cell, PheromoneKind::ToNest)
            .unwrap();
        assert!((s - 0.27 * factor).abs() < 1e-9, "{cell:?} has {s}");
    }
    assert_eq!(sim.stats().to_nest_pheromones, 9);
    assert_eq!(sim.stats().to_food_pheromones, 0);
}

#[test]
fn speed_change_applies_before_next_decay() {
    let mut sim = empty_world(20);
    let start = Position::new(10, 16);
    sim.place_food(start);
    sim.spawn_ant(start);

    sim.tick();
    let probe = Position::new(9, 17);
    let before = sim
        .pheromones()
        .strength_at(probe, PheromoneKind::ToNest)
        .unwrap();
    assert_eq!(
        sim.pheromones().evaporation(),
        Evaporation::from_lifespans(10.0, 6.0, 1)
    );

    sim.set_speed(5).unwrap();
    sim.tick();

    assert_eq!(
        sim.pheromones().evaporation(),
        Evaporation::from_lifespans(10.0, 6.0, 5)
    );
    assert_eq!(sim.steps(), 6);
    let fast = evaporation_factor(10.0, 10.0, 5);
    let after = sim
        .pheromones()
        .strength_at(probe, PheromoneKind::ToNest)
        .unwrap();
    assert!((after - before * fast.powi(5)).abs() < 1e-9);
}

#[test]
fn delivered_food_is_counted_once() {
    let mut sim = empty_world(30);
    let start = Position::new(15, 20);
    sim.place_food(start);
    let ant_id = sim.spawn_ant(start);

    let mut delivered_at = None;
    for tick in 0..20 {
        sim.tick();
        if sim.food_delivered() == 1 {
            delivered_at = Some(tick);
            break;
        }
    }
    assert!(delivered_at.is_some());
    let ant = sim.ant(ant_id).unwrap();
    assert!(!ant.carrying_food);
    assert!(ant.returning_to_food);
    assert_eq!(ant.post_delivery_cooldown, 5);

    for _ in 0..50 {
        sim.tick();
    }
    assert_eq!(sim.food_delivered(), 1);
}

#[test]
fn food_is_conserved() {
    let mut sim = Simulation::new(SimConfig {
        width: 50,
        height: 50,
        ants: 40,
        food_piles: 4,
        food_per_pile: 100,
        seed: 11,
        ..SimConfig::default()
    })
    .unwrap();
    let total = sim.food().total_placed();
    assert_eq!(total, 4 * 13 * 5);

    for _ in 0..400 {
        sim.tick();
        let stats = sim.stats();
        let carried = stats.ants_carrying_food;
        assert_eq!(
            stats.food_remaining + carried + stats.food_delivered as usize,
            total
        );
        assert_eq!(stats.ants_following_trail + stats.ants_random_walking, 40);
    }
}

#[test]
fn live_pheromones_stay_within_bounds() {
    let mut sim = Simulation::new(SimConfig {
        width: 50,
        height: 50,
        ants: 40,
        food_piles: 4,
        seed: 5,
        ..SimConfig::default()
    })
    .unwrap();
    for _ in 0..300 {
        sim.tick();
        for (_, p) in sim.pheromones().iter() {
            assert!(p.strength >= REMOVAL_THRESHOLD && p.strength <= 3.0);
            assert!(p.position.distance(sim.nest()) >= 2.0);
        }
        let stats = sim.stats();
        assert_eq!(
            stats.active_pheromones,
            stats.to_nest_pheromones + stats.to_food_pheromones
        );
    }
}

#[test]
fn zero_lifespan_leaves_no_trails() {
    let mut sim = Simulation::new(SimConfig {
        width: 40,
        height: 40,
        ants: 20,
        to_nest_lifespan: 0.0,
        to_food_lifespan: 0.0,
        ..SimConfig::default()
    })
    .unwrap();
    for _ in 0..100 {
        sim.tick();
        assert!(sim.pheromones().is_empty());
    }
}
