use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use tfe::engine::{self, Board, Move, RowTables};

fn spawn(b: Board, rng: &mut StdRng) -> Board {
    b.with_random_tile(rng, 0.9).map_or(b, |(nb, _)| nb)
}

fn corpus(t: &RowTables) -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(1337);
    let mut boards = vec![Board::EMPTY];
    let mut b = spawn(spawn(Board::EMPTY, &mut rng), &mut rng);
    boards.push(b);
    for i in 0..62 {
        let nb = t.shift(b, Move::ALL[i % 4]);
        if nb != b {
            b = spawn(nb, &mut rng);
        }
        boards.push(b);
    }
    boards
}

fn bench_moves(c: &mut Criterion) {
    let t = engine::init();
    let boards = corpus(t);
    c.bench_function("engine/execute_move", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards {
                for dir in Move::ALL {
                    let (nb, s) = t.execute_move(bd, dir);
                    acc ^= nb.raw().wrapping_add(s);
                }
            }
            black_box(acc)
        })
    });
    c.bench_function("engine/transpose", |bch| {
        bch.iter(|| boards.iter().fold(0u64, |acc, &bd| acc ^ black_box(bd).transpose().raw()))
    });
    c.bench_function("engine/has_legal_move", |bch| {
        bch.iter(|| boards.iter().filter(|&&bd| t.has_legal_move(black_box(bd))).count())
    });
}

fn bench_heuristic(c: &mut Criterion) {
    let t = engine::init();
    let boards = corpus(t);
    c.bench_function("heuristic/evaluate", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for &bd in &boards {
                acc = acc.mul_add(1.000_000_1, t.evaluate(bd));
            }
            black_box(acc)
        })
    });
    c.bench_function("heuristic/count_distinct", |bch| {
        bch.iter(|| boards.iter().map(|&bd| black_box(bd).count_distinct_tiles()).sum::<u32>())
    });
}

criterion_group!(engine_ops, bench_moves, bench_heuristic);
criterion_main!(engine_ops);
