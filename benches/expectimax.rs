use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use tfe::engine::{self, Board, Move};
use tfe::expectimax::{Expectimax, ExpectimaxConfig};
use tfe::game::{Game, GameConfig};

fn corpus() -> Vec<Board> {
    let t = engine::init();
    let mut game = Game::with_rng(t, GameConfig::default(), StdRng::seed_from_u64(7777));
    let mut boards = vec![game.board()];
    for i in 0..64 {
        game.make_move(Move::ALL[i % 4]);
        boards.push(game.board());
    }
    boards
}

fn capped(depth: u32) -> ExpectimaxConfig {
    ExpectimaxConfig { min_depth: depth, max_depth: depth, time_budget_ms: u64::MAX, ..Default::default() }
}

fn bench_decide(c: &mut Criterion) {
    let boards = corpus();

    c.bench_function("expectimax/decide_depth3_cold", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                let mut ex = Expectimax::with_config(engine::init(), capped(3));
                for be in ex.decide(bd).branches {
                    if be.legal {
                        acc += be.ev;
                    }
                }
            }
            black_box(acc)
        })
    });

    let mut warm = Expectimax::with_config(engine::init(), capped(3));
    c.bench_function("expectimax/decide_depth3_warm", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards {
                acc ^= warm.best_move(bd).map_or(0, |m| m.index() as u64);
            }
            black_box(acc)
        })
    });
}

fn bench_e2e(c: &mut Criterion) {
    c.bench_function("e2e/64_moves", |bch| {
        bch.iter(|| {
            let t = engine::init();
            let mut ex = Expectimax::with_config(t, ExpectimaxConfig { max_depth: 4, ..Default::default() });
            let mut game = Game::with_rng(t, GameConfig::default(), StdRng::seed_from_u64(13));
            let mut steps = 0;
            while steps < 64 && !game.is_game_over() {
                let Some(dir) = ex.best_move(game.board()) else { break };
                game.make_move(dir);
                steps += 1;
            }
            black_box((game.board().raw(), steps))
        })
    });
}

criterion_group!(expectimax, bench_decide, bench_e2e);
criterion_main!(expectimax);
