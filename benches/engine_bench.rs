use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::Duration;

use warlord::board::{Adjacency, Location};
use warlord::engine::{Game, GameConfig};
use warlord::player::PlayerToken;
use warlord::resolve::resolve_battle;

/// A started 10x10 game with two players, nothing deployed yet.
fn fresh_game(starting_armies: u32) -> (Game, PlayerToken, PlayerToken) {
    let mut game = Game::new(GameConfig {
        height: 10,
        width: 10,
        starting_armies,
        adjacency: Adjacency::Orthogonal,
        seed: 7,
    })
    .unwrap();
    game.start_joining().unwrap();
    let red = game.add_player("red", "http://red").unwrap().token;
    let blue = game.add_player("blue", "http://blue").unwrap().token;
    game.start_game().unwrap();
    (game, red, blue)
}

fn bench_deploy_full_board(c: &mut Criterion) {
    c.bench_function("deploy_100_armies", |b| {
        b.iter(|| {
            let (mut game, red, blue) = fresh_game(50);
            for i in 0..50 {
                let row = i / 10;
                let col = i % 10;
                game.try_place_army(red, Location::new(row, col));
                game.try_place_army(blue, Location::new(row + 5, col));
            }
            black_box(game.is_all_armies_placed())
        })
    });
}

fn bench_attack_until_stop(c: &mut Criterion) {
    c.bench_function("attack_until_stop", |b| {
        b.iter(|| {
            let (mut game, red, blue) = fresh_game(20);
            for _ in 0..20 {
                game.try_place_army(red, Location::new(0, 0));
                game.try_place_army(blue, Location::new(0, 1));
            }
            let from = Location::new(0, 0);
            let to = Location::new(0, 1);
            while let Ok(report) = game.try_attack(red, from, to) {
                if !report.can_continue {
                    break;
                }
            }
            black_box(game.get_num_territories(red))
        })
    });
}

fn bench_resolve_battle(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    c.bench_function("resolve_battle_3v2", |b| {
        b.iter(|| resolve_battle(black_box(10), black_box(10), &mut rng))
    });
}

fn bench_status_snapshot(c: &mut Criterion) {
    let (mut game, red, blue) = fresh_game(50);
    for i in 0..50 {
        game.try_place_army(red, Location::new(i / 10, i % 10));
        game.try_place_army(blue, Location::new(i / 10 + 5, i % 10));
    }
    c.bench_function("game_status_snapshot", |b| {
        b.iter(|| black_box(game.get_game_status()))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_deploy_full_board, bench_attack_until_stop, bench_resolve_battle, bench_status_snapshot
}
criterion_main!(benches);
