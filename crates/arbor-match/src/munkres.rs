//! Minimum-cost bipartite assignment (Hungarian algorithm, Munkres variant).
//!
//! [`solve`] takes a rectangular [`CostMatrix`] whose cells are either a
//! finite cost or [`Cell::Disallowed`], pads it to a square with zero-cost
//! cells, and runs the classic six-step state machine:
//!
//! 1. Reduce every row by its minimum selectable cost.
//! 2. Star one zero per row and column, greedily.
//! 3. Cover every column holding a star; if all columns are covered, stop.
//! 4. Prime an uncovered zero. If its row has no star, augment (step 5);
//!    otherwise cover the row, uncover the star's column, and repeat.
//! 5. Walk the alternating prime/star path from that prime, flip it, clear
//!    covers and primes, and return to step 3.
//! 6. With no uncovered zero left, add the minimum uncovered cost to covered
//!    rows and subtract it from uncovered columns, then return to step 4.
//!
//! Pairs that land on padding are trimmed from the result.

use tracing::debug;

use crate::error::{SolveError, SolveResult};

/// One cell of a cost matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cell {
    /// Cost of pairing this row with this column.
    Cost(f64),
    /// The pairing may never be selected.
    Disallowed,
}

/// A dense, row-major cost matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl CostMatrix {
    /// A `rows × cols` matrix of zero costs.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Cost(0.0); rows * cols],
        }
    }

    /// Build a matrix by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Cell) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Self { rows, cols, cells }
    }

    /// Build a matrix of plain costs from row vectors.
    ///
    /// The column count is taken from the first row; cells missing from
    /// shorter rows are disallowed.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        Self::from_fn(rows.len(), cols, |r, c| {
            rows[r].get(c).map_or(Cell::Disallowed, |&v| Cell::Cost(v))
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    /// Replace the cell at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row * self.cols + col] = cell;
    }

    /// Sum of the costs at the given pairs. Disallowed cells count as infinite.
    pub fn total(&self, pairs: &[(usize, usize)]) -> f64 {
        pairs
            .iter()
            .map(|&(r, c)| match self.get(r, c) {
                Cell::Cost(v) => v,
                Cell::Disallowed => f64::INFINITY,
            })
            .sum()
    }
}

/// Solve the minimum-cost assignment for `matrix`.
///
/// Returns `(row, col)` pairs sorted by row. When `rows <= cols` every row is
/// assigned; when `rows > cols` every column is assigned and the surplus rows
/// are left out.
pub fn solve(matrix: &CostMatrix) -> SolveResult<Vec<(usize, usize)>> {
    if matrix.rows == 0 || matrix.cols == 0 {
        return Ok(Vec::new());
    }
    for r in 0..matrix.rows {
        for c in 0..matrix.cols {
            if let Cell::Cost(v) = matrix.get(r, c) {
                if !v.is_finite() {
                    return Err(SolveError::NonFiniteCost { row: r, col: c });
                }
            }
        }
    }

    let mut state = Munkres::padded(matrix);
    state.run()?;

    let mut pairs = Vec::with_capacity(matrix.rows.min(matrix.cols));
    for r in 0..matrix.rows {
        if let Some(c) = state.star_in_row(r) {
            if c < matrix.cols {
                pairs.push((r, c));
            }
        }
    }
    debug!(
        rows = matrix.rows,
        cols = matrix.cols,
        assigned = pairs.len(),
        "assignment solved"
    );
    Ok(pairs)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    None,
    Star,
    Prime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    ReduceRows,
    StarZeros,
    CoverColumns,
    PrimeZeros,
    Augment { row: usize, col: usize },
    AdjustCosts,
    Done,
}

struct Munkres {
    n: usize,
    /// `None` marks a disallowed cell.
    cost: Vec<Option<f64>>,
    marks: Vec<Mark>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
}

impl Munkres {
    fn padded(matrix: &CostMatrix) -> Self {
        let n = matrix.rows.max(matrix.cols);
        let mut cost = vec![Some(0.0); n * n];
        for r in 0..matrix.rows {
            for c in 0..matrix.cols {
                cost[r * n + c] = match matrix.get(r, c) {
                    Cell::Cost(v) => Some(v),
                    Cell::Disallowed => None,
                };
            }
        }
        Self {
            n,
            cost,
            marks: vec![Mark::None; n * n],
            row_covered: vec![false; n],
            col_covered: vec![false; n],
        }
    }

    fn run(&mut self) -> SolveResult<()> {
        let mut step = Step::ReduceRows;
        loop {
            step = match step {
                Step::ReduceRows => {
                    self.reduce_rows()?;
                    Step::StarZeros
                }
                Step::StarZeros => {
                    self.star_zeros();
                    Step::CoverColumns
                }
                Step::CoverColumns => {
                    if self.cover_starred_columns() >= self.n {
                        Step::Done
                    } else {
                        Step::PrimeZeros
                    }
                }
                Step::PrimeZeros => self.prime_zeros(),
                Step::Augment { row, col } => {
                    self.augment(row, col)?;
                    Step::CoverColumns
                }
                Step::AdjustCosts => {
                    self.adjust_costs()?;
                    Step::PrimeZeros
                }
                Step::Done => return Ok(()),
            };
        }
    }

    fn idx(&self, r: usize, c: usize) -> usize {
        r * self.n + c
    }

    fn is_zero(&self, r: usize, c: usize) -> bool {
        self.cost[self.idx(r, c)] == Some(0.0)
    }

    fn reduce_rows(&mut self) -> SolveResult<()> {
        let n = self.n;
        for r in 0..n {
            let row = &mut self.cost[r * n..(r + 1) * n];
            let min = row
                .iter()
                .flatten()
                .copied()
                .fold(f64::INFINITY, f64::min);
            if !min.is_finite() {
                return Err(SolveError::InfeasibleRow { row: r });
            }
            for v in row.iter_mut().flatten() {
                *v -= min;
            }
        }
        Ok(())
    }

    fn star_zeros(&mut self) {
        for r in 0..self.n {
            for c in 0..self.n {
                if self.is_zero(r, c) && !self.row_covered[r] && !self.col_covered[c] {
                    let i = self.idx(r, c);
                    self.marks[i] = Mark::Star;
                    self.row_covered[r] = true;
                    self.col_covered[c] = true;
                }
            }
        }
        self.clear_covers();
    }

    fn cover_starred_columns(&mut self) -> usize {
        for c in 0..self.n {
            if self.star_in_col(c).is_some() {
                self.col_covered[c] = true;
            }
        }
        self.col_covered.iter().filter(|&&covered| covered).count()
    }

    fn prime_zeros(&mut self) -> Step {
        loop {
            let Some((r, c)) = self.find_uncovered_zero() else {
                return Step::AdjustCosts;
            };
            let i = self.idx(r, c);
            self.marks[i] = Mark::Prime;
            match self.star_in_row(r) {
                Some(star_col) => {
                    self.row_covered[r] = true;
                    self.col_covered[star_col] = false;
                }
                None => return Step::Augment { row: r, col: c },
            }
        }
    }

    fn augment(&mut self, row: usize, col: usize) -> SolveResult<()> {
        let mut path = vec![(row, col)];
        loop {
            let (_, c) = path[path.len() - 1];
            let Some(star_row) = self.star_in_col(c) else {
                break;
            };
            path.push((star_row, c));
            // Every star on the path has a prime in its row (step 4 invariant).
            let prime_col = self.prime_in_row(star_row).ok_or(SolveError::NoProgress)?;
            path.push((star_row, prime_col));
        }

        for (r, c) in path {
            let i = self.idx(r, c);
            self.marks[i] = match self.marks[i] {
                Mark::Star => Mark::None,
                Mark::Prime => Mark::Star,
                Mark::None => Mark::None,
            };
        }
        self.clear_covers();
        for mark in &mut self.marks {
            if *mark == Mark::Prime {
                *mark = Mark::None;
            }
        }
        Ok(())
    }

    fn adjust_costs(&mut self) -> SolveResult<()> {
        let mut min = f64::INFINITY;
        for r in (0..self.n).filter(|&r| !self.row_covered[r]) {
            for c in (0..self.n).filter(|&c| !self.col_covered[c]) {
                if let Some(v) = self.cost[self.idx(r, c)] {
                    min = min.min(v);
                }
            }
        }
        if !min.is_finite() {
            return Err(SolveError::NoProgress);
        }

        for r in 0..self.n {
            for c in 0..self.n {
                let i = self.idx(r, c);
                let Some(v) = self.cost[i].as_mut() else {
                    continue;
                };
                match (self.row_covered[r], self.col_covered[c]) {
                    (true, true) => *v += min,
                    (false, false) => *v -= min,
                    // Covered row with uncovered column: +min -min, left as is.
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        for r in (0..self.n).filter(|&r| !self.row_covered[r]) {
            for c in (0..self.n).filter(|&c| !self.col_covered[c]) {
                if self.is_zero(r, c) {
                    return Some((r, c));
                }
            }
        }
        None
    }

    fn star_in_row(&self, r: usize) -> Option<usize> {
        (0..self.n).find(|&c| self.marks[self.idx(r, c)] == Mark::Star)
    }

    fn star_in_col(&self, c: usize) -> Option<usize> {
        (0..self.n).find(|&r| self.marks[self.idx(r, c)] == Mark::Star)
    }

    fn prime_in_row(&self, r: usize) -> Option<usize> {
        (0..self.n).find(|&c| self.marks[self.idx(r, c)] == Mark::Prime)
    }

    fn clear_covers(&mut self) {
        self.row_covered.fill(false);
        self.col_covered.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute_force_min(matrix: &CostMatrix) -> f64 {
        fn permute(
            matrix: &CostMatrix,
            row: usize,
            used: &mut Vec<bool>,
            acc: f64,
            best: &mut f64,
        ) {
            if row == matrix.rows() {
                *best = best.min(acc);
                return;
            }
            for c in 0..matrix.cols() {
                if used[c] {
                    continue;
                }
                if let Cell::Cost(v) = matrix.get(row, c) {
                    used[c] = true;
                    permute(matrix, row + 1, used, acc + v, best);
                    used[c] = false;
                }
            }
        }
        let mut best = f64::INFINITY;
        permute(matrix, 0, &mut vec![false; matrix.cols()], 0.0, &mut best);
        best
    }

    #[test]
    fn classic_three_by_three() {
        let m = CostMatrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![3.0, 6.0, 9.0],
        ]);
        let pairs = solve(&m).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(m.total(&pairs), 10.0);
    }

    #[test]
    fn picks_anti_diagonal_when_cheaper() {
        let m = CostMatrix::from_rows(&[vec![10.0, 1.0], vec![1.0, 10.0]]);
        assert_eq!(solve(&m).unwrap(), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn wide_matrix_assigns_every_row() {
        let m = CostMatrix::from_rows(&[vec![5.0, 1.0, 9.0], vec![4.0, 8.0, 2.0]]);
        let pairs = solve(&m).unwrap();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn tall_matrix_trims_padding() {
        let m = CostMatrix::from_rows(&[vec![7.0], vec![1.0], vec![3.0]]);
        let pairs = solve(&m).unwrap();
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn disallowed_cells_are_never_selected() {
        let mut m = CostMatrix::from_rows(&[vec![0.0, 5.0], vec![5.0, 0.0]]);
        m.set(0, 0, Cell::Disallowed);
        let pairs = solve(&m).unwrap();
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
        assert_eq!(m.total(&pairs), 10.0);
    }

    #[test]
    fn all_disallowed_row_is_unsolvable() {
        let m = CostMatrix::from_fn(2, 2, |r, _| {
            if r == 1 {
                Cell::Disallowed
            } else {
                Cell::Cost(1.0)
            }
        });
        assert_eq!(solve(&m), Err(SolveError::InfeasibleRow { row: 1 }));
    }

    #[test]
    fn disallowed_column_cannot_progress() {
        let m = CostMatrix::from_fn(2, 2, |_, c| {
            if c == 0 {
                Cell::Disallowed
            } else {
                Cell::Cost(1.0)
            }
        });
        assert_eq!(solve(&m), Err(SolveError::NoProgress));
    }

    #[test]
    fn non_finite_cost_is_rejected() {
        let m = CostMatrix::from_rows(&[vec![1.0, f64::NAN]]);
        assert_eq!(solve(&m), Err(SolveError::NonFiniteCost { row: 0, col: 1 }));
    }

    #[test]
    fn empty_matrix_yields_nothing() {
        assert!(solve(&CostMatrix::new(0, 3)).unwrap().is_empty());
        assert!(solve(&CostMatrix::new(2, 0)).unwrap().is_empty());
    }

    #[test]
    fn ties_are_resolved_without_duplicates() {
        let m = CostMatrix::new(4, 4);
        let pairs = solve(&m).unwrap();
        assert_eq!(pairs.len(), 4);
        let mut cols: Vec<usize> = pairs.iter().map(|&(_, c)| c).collect();
        cols.sort_unstable();
        assert_eq!(cols, vec![0, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn matches_brute_force_minimum(
            n in 1usize..=6,
            seed in proptest::collection::vec(0u32..100, 36),
        ) {
            let m = CostMatrix::from_fn(n, n, |r, c| Cell::Cost(f64::from(seed[r * n + c])));
            let pairs = solve(&m).unwrap();
            prop_assert_eq!(pairs.len(), n);
            let mut cols: Vec<usize> = pairs.iter().map(|&(_, c)| c).collect();
            cols.sort_unstable();
            cols.dedup();
            prop_assert_eq!(cols.len(), n);
            prop_assert_eq!(m.total(&pairs), brute_force_min(&m));
        }

        #[test]
        fn rectangular_matches_brute_force(
            rows in 1usize..=4,
            extra in 0usize..=2,
            seed in proptest::collection::vec(0u32..50, 24),
        ) {
            let cols = rows + extra;
            let m = CostMatrix::from_fn(rows, cols, |r, c| Cell::Cost(f64::from(seed[r * cols + c])));
            let pairs = solve(&m).unwrap();
            prop_assert_eq!(pairs.len(), rows);
            prop_assert_eq!(m.total(&pairs), brute_force_min(&m));
        }
    }
}
