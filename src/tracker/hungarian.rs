//! Optimal rectangular assignment (Hungarian method, shortest augmenting path form).
//!
//! Rows are inserted one at a time in ascending index order. Each insertion
//! grows a shortest augmenting path over the columns using dual potentials,
//! which gives an exact minimum-cost assignment in O(n² m).
//!
//! Tie-break: among all minimum-cost assignments the lexicographically
//! smallest one by row is returned. Row 0 gets the lowest column that any
//! optimum allows, then row 1 the lowest column left open by that choice,
//! and so on. When rows outnumber columns, being assigned ranks before
//! staying unassigned. Costs closer than `TIE_EPSILON` count as equal.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2, s};

const TIE_EPSILON: f64 = 1e-9;

/// Solve the minimum-cost assignment for a rectangular cost matrix.
///
/// Returns, for every row, the column assigned to it. Exactly
/// `min(rows, cols)` rows receive a column. Costs must be finite.
pub fn linear_sum_assignment(cost_matrix: &Array2<f64>) -> Vec<Option<usize>> {
    let (num_rows, num_cols) = cost_matrix.dim();
    if num_rows == 0 || num_cols == 0 {
        return vec![None; num_rows];
    }

    if num_rows <= num_cols {
        lowest_optimum(cost_matrix.view())
    } else {
        // Zero-cost padding columns stand for "unassigned". They sort after
        // every real column, so lower rows are served first.
        let mut padded = Array2::<f64>::zeros((num_rows, num_rows));
        padded.slice_mut(s![.., ..num_cols]).assign(cost_matrix);
        lowest_optimum(padded.view())
            .into_iter()
            .map(|col| col.filter(|&col| col < num_cols))
            .collect()
    }
}

/// Total cost of an assignment produced by [`linear_sum_assignment`].
pub fn assignment_cost(cost_matrix: &Array2<f64>, row_to_col: &[Option<usize>]) -> f64 {
    row_to_col
        .iter()
        .enumerate()
        .filter_map(|(row, col)| col.map(|col| cost_matrix[[row, col]]))
        .sum()
}

struct DualSolution {
    row_to_col: Vec<Option<usize>>,
    row_potential: Vec<f64>,
    col_potential: Vec<f64>,
}

/// Minimum-cost assignment with the lowest columns on the lowest rows.
/// Requires `rows <= cols`.
fn lowest_optimum(cost: ArrayView2<f64>) -> Vec<Option<usize>> {
    let solution = solve_wide(cost);
    let complete: Option<Vec<usize>> = solution.row_to_col.iter().copied().collect();
    let Some(mut row_to_col) = complete else {
        return solution.row_to_col;
    };

    prefer_lower_columns(
        cost,
        &mut row_to_col,
        &solution.row_potential,
        &solution.col_potential,
    );
    row_to_col.into_iter().map(Some).collect()
}

/// Core solver, requires `rows <= cols`. Indices are 1-based internally;
/// column 0 and row 0 are sentinels.
fn solve_wide(cost: ArrayView2<f64>) -> DualSolution {
    let (n, m) = cost.dim();
    debug_assert!(n <= m);

    // Row/column potentials.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    // col_owner[j]: row currently assigned to column j (0 = free).
    let mut col_owner = vec![0usize; m + 1];
    // way[j]: previous column on the shortest path to column j.
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        col_owner[0] = row;
        let mut j0 = 0usize;
        let mut min_v = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = col_owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                if reduced < min_v[j] {
                    min_v[j] = reduced;
                    way[j] = j0;
                }
                if min_v[j] < delta {
                    delta = min_v[j];
                    j1 = j;
                }
            }

            // Unreachable with finite costs since a free column always exists.
            if j1 == 0 {
                break;
            }

            for j in 0..=m {
                if used[j] {
                    u[col_owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_v[j] -= delta;
                }
            }

            j0 = j1;
            if col_owner[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path.
        while j0 != 0 {
            let prev = way[j0];
            col_owner[j0] = col_owner[prev];
            j0 = prev;
        }
    }

    let mut row_to_col = vec![None; n];
    for j in 1..=m {
        if col_owner[j] != 0 {
            row_to_col[col_owner[j] - 1] = Some(j - 1);
        }
    }
    DualSolution {
        row_to_col,
        row_potential: u[1..].to_vec(),
        col_potential: v[1..].to_vec(),
    }
}

/// Move each row, in ascending order, to the lowest column that still admits
/// a minimum-cost completion of the rows after it.
///
/// With optimal potentials, an assignment is minimum-cost exactly when it
/// uses only tight pairs (zero reduced cost) and covers every column whose
/// potential is negative. Rerouting stays inside that set.
fn prefer_lower_columns(
    cost: ArrayView2<f64>,
    row_to_col: &mut [usize],
    row_potential: &[f64],
    col_potential: &[f64],
) {
    let tight = |row: usize, col: usize| {
        cost[[row, col]] - row_potential[row] - col_potential[col] <= TIE_EPSILON
    };
    let must_cover: Vec<bool> = col_potential.iter().map(|&p| p < -TIE_EPSILON).collect();

    for row in 0..row_to_col.len() {
        for col in 0..row_to_col[row] {
            if !tight(row, col) {
                continue;
            }
            if let Some(moves) = reroute(row, col, row_to_col, &tight, &must_cover) {
                for (moved_row, new_col) in moves {
                    row_to_col[moved_row] = new_col;
                }
                break;
            }
        }
    }
}

/// Find the row moves that let `row` take `target` while the assignment
/// stays minimum-cost. Rows before `row` keep their columns.
///
/// Returns `(row, new_col)` pairs, or `None` when no such rerouting exists.
fn reroute(
    row: usize,
    target: usize,
    row_to_col: &[usize],
    tight: &impl Fn(usize, usize) -> bool,
    must_cover: &[bool],
) -> Option<Vec<(usize, usize)>> {
    let num_cols = must_cover.len();
    let vacated = row_to_col[row];
    let mut owner = vec![None; num_cols];
    for (r, &c) in row_to_col.iter().enumerate() {
        owner[c] = Some(r);
    }
    let open = |col: usize| owner[col].is_none_or(|r| r >= row);
    if !open(target) {
        return None;
    }

    let mut moves = vec![(row, target)];

    // Forward: the occupant of `target` moves on, and so on, until the chain
    // reaches the vacated column or a free one.
    // came_from[col] = (previous column, row that moves onto col)
    let mut came_from: Vec<Option<(usize, usize)>> = vec![None; num_cols];
    let mut reached = vec![false; num_cols];
    reached[target] = true;
    let mut free_end = None;
    let mut queue = VecDeque::from([target]);
    while let Some(col) = queue.pop_front() {
        let Some(occupant) = owner[col] else {
            free_end.get_or_insert(col);
            continue;
        };
        if occupant == row {
            continue;
        }
        for next in 0..num_cols {
            if reached[next] || !open(next) || !tight(occupant, next) {
                continue;
            }
            reached[next] = true;
            came_from[next] = Some((col, occupant));
            queue.push_back(next);
        }
    }

    let end = if reached[vacated] { vacated } else { free_end? };
    let mut col = end;
    while let Some((prev, occupant)) = came_from[col] {
        moves.push((occupant, col));
        col = prev;
    }
    if end == vacated || !must_cover[vacated] {
        return Some(moves);
    }

    // Backward: the vacated column must be covered again by a later row,
    // whose own column may then stay empty.
    // leads_to[col] = (next column, row that leaves col for it)
    let mut leads_to: Vec<Option<(usize, usize)>> = vec![None; num_cols];
    let mut seen = vec![false; num_cols];
    seen[vacated] = true;
    let mut queue = VecDeque::from([vacated]);
    while let Some(col) = queue.pop_front() {
        for prev in 0..num_cols {
            if seen[prev] || reached[prev] {
                continue;
            }
            let Some(occupant) = owner[prev] else {
                continue;
            };
            if occupant <= row || !tight(occupant, col) {
                continue;
            }
            seen[prev] = true;
            leads_to[prev] = Some((col, occupant));
            if !must_cover[prev] {
                let mut col = prev;
                while let Some((next, occupant)) = leads_to[col] {
                    moves.push((occupant, next));
                    col = next;
                }
                return Some(moves);
            }
            queue.push_back(prev);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// Exhaustive minimum over all injective row -> column maps.
    fn brute_force_min(cost: &Array2<f64>) -> f64 {
        fn recurse(cost: &Array2<f64>, row: usize, used: &mut [bool], acc: f64) -> f64 {
            let (rows, cols) = cost.dim();
            if row == rows {
                return acc;
            }
            let mut best = f64::INFINITY;
            let free_cols = used.iter().filter(|u| !**u).count();
            // A row may stay unassigned only if there are more rows left than columns.
            if rows - row > free_cols {
                best = best.min(recurse(cost, row + 1, used, acc));
            }
            for col in 0..cols {
                if !used[col] {
                    used[col] = true;
                    best = best.min(recurse(cost, row + 1, used, acc + cost[[row, col]]));
                    used[col] = false;
                }
            }
            best
        }
        let mut used = vec![false; cost.ncols()];
        recurse(cost, 0, &mut used, 0.0)
    }

    fn assert_valid(assignment: &[Option<usize>], rows: usize, cols: usize) {
        assert_eq!(assignment.len(), rows);
        let cols_used: Vec<usize> = assignment.iter().flatten().copied().collect();
        assert_eq!(cols_used.len(), rows.min(cols));
        let mut dedup = cols_used.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), cols_used.len());
        assert!(cols_used.iter().all(|&c| c < cols));
    }

    #[test]
    fn test_empty() {
        assert!(linear_sum_assignment(&Array2::zeros((0, 3))).is_empty());
        assert_eq!(linear_sum_assignment(&Array2::zeros((2, 0))), vec![None, None]);
    }

    #[test]
    fn test_square() {
        let cost = array![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
        let assignment = linear_sum_assignment(&cost);
        assert_eq!(assignment, vec![Some(1), Some(0), Some(2)]);
        assert_abs_diff_eq!(assignment_cost(&cost, &assignment), 5.0);
    }

    #[test]
    fn test_avoids_greedy_trap() {
        // Greedy would take (0, 0) = 0.1 and then pay 10 for (1, 1).
        let cost = array![[0.1, 0.2], [0.3, 10.0]];
        let assignment = linear_sum_assignment(&cost);
        assert_eq!(assignment, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_wide_and_tall() {
        let wide = array![[5.0, 1.0, 9.0, 4.0], [2.0, 8.0, 1.5, 7.0]];
        let assignment = linear_sum_assignment(&wide);
        assert_eq!(assignment, vec![Some(1), Some(2)]);

        let tall = wide.t().to_owned();
        let assignment = linear_sum_assignment(&tall);
        assert_eq!(assignment, vec![None, Some(0), Some(1), None]);
    }

    #[test]
    fn test_ties_prefer_lowest_indices() {
        let cost = Array2::from_elem((3, 3), 1.0);
        assert_eq!(linear_sum_assignment(&cost), vec![Some(0), Some(1), Some(2)]);

        let cost = Array2::from_elem((2, 4), 0.5);
        assert_eq!(linear_sum_assignment(&cost), vec![Some(0), Some(1)]);

        // Both rows prefer column 1; either pairing costs 3, row 0 keeps column 0.
        let cost = array![[2.0, 1.0], [2.0, 1.0]];
        assert_eq!(linear_sum_assignment(&cost), vec![Some(0), Some(1)]);

        // More rows than columns: lower rows are assigned first.
        let cost = Array2::from_elem((3, 1), 1.0);
        assert_eq!(linear_sum_assignment(&cost), vec![Some(0), None, None]);
    }

    /// Lexicographically smallest minimum-cost assignment by exhaustive
    /// search. Unassigned ranks after every column.
    fn brute_force_lowest(cost: &Array2<f64>) -> Vec<Option<usize>> {
        fn recurse(
            cost: &Array2<f64>,
            row: usize,
            used: &mut [bool],
            current: &mut Vec<Option<usize>>,
            best: &mut Option<(f64, Vec<Option<usize>>)>,
        ) {
            let (rows, cols) = cost.dim();
            if row == rows {
                if current.iter().flatten().count() != rows.min(cols) {
                    return;
                }
                let total = assignment_cost(cost, current);
                let rank = |a: &[Option<usize>]| -> Vec<usize> {
                    a.iter().map(|c| c.unwrap_or(usize::MAX)).collect()
                };
                let better = match best {
                    None => true,
                    Some((best_cost, best_assignment)) => {
                        total < *best_cost - 1e-9
                            || (total <= *best_cost + 1e-9
                                && rank(current.as_slice()) < rank(best_assignment.as_slice()))
                    }
                };
                if better {
                    *best = Some((total, current.clone()));
                }
                return;
            }
            for col in 0..cols {
                if !used[col] {
                    used[col] = true;
                    current.push(Some(col));
                    recurse(cost, row + 1, used, current, best);
                    current.pop();
                    used[col] = false;
                }
            }
            current.push(None);
            recurse(cost, row + 1, used, current, best);
            current.pop();
        }

        let mut best = None;
        let mut used = vec![false; cost.ncols()];
        recurse(cost, 0, &mut used, &mut Vec::new(), &mut best);
        best.map(|(_, assignment)| assignment).unwrap()
    }

    #[test]
    fn test_ties_match_lexicographic_brute_force() {
        // Costs drawn from {0, 1, 2} so that equal-cost optima are common.
        let mut state = 0x1234_5678_9abc_def1u64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 3) as f64
        };

        let shapes = [(2, 2), (2, 3), (3, 2), (3, 3), (3, 4), (4, 3), (4, 4), (2, 5), (5, 2)];
        for &(rows, cols) in &shapes {
            for _ in 0..60 {
                let cost = Array2::from_shape_fn((rows, cols), |_| next());
                assert_eq!(
                    linear_sum_assignment(&cost),
                    brute_force_lowest(&cost),
                    "cost = {cost:?}"
                );
            }
        }
    }

    #[test]
    fn test_matches_brute_force() {
        // Deterministic pseudo-random matrices of mixed shapes.
        let mut state = 0x2545_f491_4f6c_dd1du64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1000) as f64 / 1000.0
        };

        for &(rows, cols) in &[(1, 1), (2, 3), (3, 2), (4, 4), (5, 3), (3, 6), (6, 6)] {
            for _ in 0..20 {
                let cost = Array2::from_shape_fn((rows, cols), |_| next());
                let assignment = linear_sum_assignment(&cost);
                assert_valid(&assignment, rows, cols);
                assert_abs_diff_eq!(
                    assignment_cost(&cost, &assignment),
                    brute_force_min(&cost),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_agrees_with_lapjv() {
        let mut state = 0x9e37_79b9_7f4a_7c15u64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 10_000) as f64 / 10_000.0
        };

        for size in [2usize, 5, 8, 16, 32] {
            let cost = Array2::from_shape_fn((size, size), |_| next());
            let ours = assignment_cost(&cost, &linear_sum_assignment(&cost));

            let (row_to_col, _) = lapjv::lapjv(&cost).unwrap();
            let reference: f64 = row_to_col
                .iter()
                .enumerate()
                .map(|(row, &col)| cost[[row, col]])
                .sum();

            assert_abs_diff_eq!(ours, reference, epsilon = 1e-9);
        }
    }
}
