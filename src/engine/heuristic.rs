//! Row-local heuristic used to fill [`RowTables`](super::RowTables).
//!
//! The value depends on the four exponents of a single line only, so the
//! board score is the sum over rows plus the sum over transposed rows.

use super::state::Tile;

// Credit to Nneonneo for heuristic structure and weights
const LOST_PENALTY: f64 = 200_000.0;
const MONOTONICITY_POWER: f64 = 4.0;
const MONOTONICITY_WEIGHT: f64 = 47.0;
const SUM_POWER: f64 = 3.5;
const SUM_WEIGHT: f64 = 11.0;
const MERGES_WEIGHT: f64 = 700.0;
const EMPTY_WEIGHT: f64 = 270.0;

pub(crate) fn line_heuristic(line: &[Tile; 4]) -> f64 {
    LOST_PENALTY + calc_empty(line) + calc_merges(line) - calc_monotonicity(line) - calc_sum(line)
}

fn calc_sum(line: &[Tile; 4]) -> f64 {
    line.iter().fold(0., |acc, &t| acc + (t as f64).powf(SUM_POWER)) * SUM_WEIGHT
}

fn calc_empty(line: &[Tile; 4]) -> f64 {
    line.iter().filter(|&&t| t == 0).count() as f64 * EMPTY_WEIGHT
}

fn calc_merges(line: &[Tile; 4]) -> f64 {
    let mut prev = 0;
    let mut counter = 0.;
    let mut merges = 0.;
    // empty cells are skipped: tiles separated by gaps still merge
    for &t in line.iter().filter(|&&t| t != 0) {
        if prev == t {
            counter += 1.;
        } else if counter > 0. {
            merges += 1. + counter;
            counter = 0.;
        }
        prev = t;
    }
    if counter > 0. {
        merges += 1. + counter;
    }
    merges * MERGES_WEIGHT
}

fn calc_monotonicity(line: &[Tile; 4]) -> f64 {
    let mut left = 0.;
    let mut right = 0.;
    for i in 1..4 {
        let a = (line[i - 1] as f64).powf(MONOTONICITY_POWER);
        let b = (line[i] as f64).powf(MONOTONICITY_POWER);
        if a > b {
            left += a - b;
        } else {
            right += b - a;
        }
    }
    f64::min(left, right) * MONOTONICITY_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_scores_penalty_plus_empties() {
        assert_eq!(line_heuristic(&[0, 0, 0, 0]), LOST_PENALTY + 4.0 * EMPTY_WEIGHT);
    }

    #[test]
    fn merges_count_runs_of_equal_tiles() {
        assert_eq!(calc_merges(&[1, 1, 0, 0]), 2.0 * MERGES_WEIGHT);
        assert_eq!(calc_merges(&[2, 2, 2, 0]), 3.0 * MERGES_WEIGHT);
        assert_eq!(calc_merges(&[1, 0, 1, 0]), 2.0 * MERGES_WEIGHT);
        assert_eq!(calc_merges(&[3, 0, 0, 3]), 2.0 * MERGES_WEIGHT);
        assert_eq!(calc_merges(&[1, 0, 2, 1]), 0.0);
        assert_eq!(calc_merges(&[3, 3, 4, 4]), 4.0 * MERGES_WEIGHT);
    }

    #[test]
    fn monotone_lines_are_not_penalised() {
        assert_eq!(calc_monotonicity(&[4, 3, 2, 1]), 0.0);
        assert_eq!(calc_monotonicity(&[1, 2, 3, 4]), 0.0);
        assert!(calc_monotonicity(&[1, 4, 1, 4]) > 0.0);
    }

    #[test]
    fn heuristic_is_symmetric_under_reversal() {
        for raw in (0u32..0x1_0000).step_by(7) {
            let line = [(raw >> 12) as u8 & 0xf, (raw >> 8) as u8 & 0xf, (raw >> 4) as u8 & 0xf, raw as u8 & 0xf];
            let rev = [line[3], line[2], line[1], line[0]];
            assert!((line_heuristic(&line) - line_heuristic(&rev)).abs() < 1e-6);
        }
    }
}
