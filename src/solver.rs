//! Iterative-deepening search for every minimal solution.
//!
//! The driver retries `solve_at` with a growing depth bound until
//! something commits. Each bound dispatches into one of three recursion
//! modes over a common expansion kernel: table-pruned recursion near the
//! leaves, plain trial recursion above it, and work-list generation at
//! the root of deep searches, which worker threads then drain with the
//! trial recursion. Search never stops at the first hit within a depth;
//! the whole depth is enumerated so the caller sees every minimal
//! solution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{Config, Metric};
use crate::constants::{N_FACE_TWISTS, N_QUARTER_TWISTS, THREAD_DEPTH};
use crate::coord::{CubeDepth, CubeIndex};
use crate::cubie::FullCube;
use crate::moves::MoveTables;
use crate::pruning::DepthTable;
use crate::worklist::{Solution, WorkItem, WorkList};

/// Cube state as the search threads carry it: the three Janus indices
/// and their exact distances from home.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JanusCube {
    pub index: CubeIndex,
    pub depth: CubeDepth,
}

impl JanusCube {
    pub(crate) fn home(tables: &MoveTables) -> Self {
        Self {
            index: tables.home_cube(),
            depth: CubeDepth::home(),
        }
    }

    /// Twist the indices and refresh the distances from the depth table.
    pub(crate) fn advance(
        &self,
        tables: &MoveTables,
        table: &DepthTable,
        horizon: u8,
        twist: u8,
    ) -> Self {
        let index = tables.cube_twist(&self.index, twist);
        let depth = self.depth.redepth(
            table.class(index.x.corners, index.x.edges),
            table.class(index.y.corners, index.y.edges),
            table.class(index.z.corners, index.z.edges),
            horizon,
        );
        Self { index, depth }
    }
}

/// Outcome of a blocking solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub solutions: Vec<Solution>,
    pub solve_time: Duration,
}

/// Host callbacks observed during a search. Solution callbacks are
/// serialized under the solution lock.
#[derive(Clone)]
pub struct SearchCallbacks {
    pub on_depth: Arc<dyn Fn(u8) + Send + Sync>,
    pub on_solution: Arc<dyn Fn(usize, &[u8]) + Send + Sync>,
    pub on_terminated: Arc<dyn Fn(bool) + Send + Sync>,
}

fn hardware_concurrency() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(18)
}

/// Don't twist the face twisted last, and order consecutive twists of
/// opposing faces: no F, R or U directly after a B, L or D respectively.
fn admits(last: Option<u8>, twist: u8) -> bool {
    match last {
        None => true,
        Some(last) => last % 6 != twist % 6 && last % 3 != twist % 6,
    }
}

/// Enumerate the admissible successor twists with their move cost. Under
/// the quarter-turn metric half twists cost two and only appear while at
/// least two moves remain.
fn successors(
    metric: Metric,
    depth: u8,
    last: Option<u8>,
    out: &mut [(u8, u8); N_FACE_TWISTS as usize],
) -> usize {
    let mut n = 0;

    match metric {
        Metric::FaceTurn => {
            for twist in 0..N_FACE_TWISTS {
                if admits(last, twist) {
                    out[n] = (twist, 1);
                    n += 1;
                }
            }
        }
        Metric::QuarterTurn => {
            for twist in 0..N_QUARTER_TWISTS {
                if admits(last, twist) {
                    out[n] = (twist, 1);
                    n += 1;
                }
            }
            if depth > 1 {
                for twist in N_QUARTER_TWISTS..N_FACE_TWISTS {
                    if admits(last, twist) {
                        out[n] = (twist, 2);
                        n += 1;
                    }
                }
            }
        }
    }

    n
}

/// The three recursion modes sharing the expansion kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// Prune through the depth table; commits solutions at depth zero.
    Table,
    /// No pruning; hands over to `Table` below the useful depth.
    Trial,
    /// Collect frontier nodes for the worker threads.
    WorkList,
}

pub(crate) struct Solver {
    tables: Arc<MoveTables>,
    depth_table: Arc<DepthTable>,
    config: Config,
    useful_depth: u8,
    horizon: u8,
    solutions: Arc<Mutex<Vec<Solution>>>,
    canceling: Arc<AtomicBool>,
    work_list: WorkList,
    start_full: FullCube,
    callbacks: SearchCallbacks,
}

impl Solver {
    pub(crate) fn new(
        tables: Arc<MoveTables>,
        depth_table: Arc<DepthTable>,
        config: Config,
        solutions: Arc<Mutex<Vec<Solution>>>,
        canceling: Arc<AtomicBool>,
        start_full: FullCube,
        callbacks: SearchCallbacks,
    ) -> Self {
        Self {
            tables,
            depth_table,
            useful_depth: config.useful_depth(),
            horizon: config.final_depth() + 1,
            config,
            solutions,
            canceling,
            work_list: WorkList::new(),
            start_full,
            callbacks,
        }
    }

    fn canceled(&self) -> bool {
        self.canceling.load(Ordering::Relaxed)
    }

    /// Deepen until a depth yields solutions, the search is canceled, or
    /// the bound passes God's number.
    pub(crate) fn run(&self, start: JanusCube, parity: u8) {
        self.solutions.lock().unwrap().clear();
        self.work_list.clear();

        let mut depth = parity;
        (self.callbacks.on_depth)(depth);
        while !self.solve_at(&start, depth) && !self.canceled() && depth <= self.config.gods_number()
        {
            depth += self.config.depth_increment();
            (self.callbacks.on_depth)(depth);
        }

        (self.callbacks.on_terminated)(!self.canceled());
    }

    fn solve_at(&self, cube: &JanusCube, depth: u8) -> bool {
        if depth == 0 {
            return self.check_work(&cube.index, &[]);
        }

        let mut work = Solution::new();
        if depth <= self.useful_depth {
            self.table_solve(cube, depth, &mut work)
        } else if depth < THREAD_DEPTH {
            self.trial_solve(cube, depth, &mut work)
        } else {
            self.thread_solve(cube, depth)
        }
    }

    /// A depth-zero candidate commits only if the indices are home and
    /// replaying its twists on the full starting cube actually solves it.
    /// The replay rejects the four-spot mirages the noseless table cannot
    /// tell from home.
    fn check_work(&self, index: &CubeIndex, work: &[u8]) -> bool {
        if !self.tables.is_solved(index) {
            return false;
        }

        let mut full = self.start_full;
        for &twist in work {
            full = full.twist(twist);
        }
        if !full.is_solved() {
            return false;
        }

        let mut solutions = self.solutions.lock().unwrap();
        solutions.push(work.to_vec());
        (self.callbacks.on_solution)(solutions.len(), work);
        true
    }

    fn child(&self, kind: Kind, cube: &JanusCube, depth: u8, work: &mut Solution) -> bool {
        match kind {
            Kind::Table => self.table_solve(cube, depth, work),
            Kind::Trial => self.trial_solve(cube, depth, work),
            Kind::WorkList => self.make_work_list(cube, depth, work),
        }
    }

    /// Apply one twist, recurse, backtrack.
    fn step(
        &self,
        kind: Kind,
        cube: &JanusCube,
        depth: u8,
        work: &mut Solution,
        twist: u8,
        cost: u8,
    ) -> bool {
        let next = cube.advance(&self.tables, &self.depth_table, self.horizon, twist);
        work.push(twist);
        let found = self.child(kind, &next, depth - cost, work);
        work.pop();
        found
    }

    /// Expansion kernel shared by all three modes. An empty working
    /// solution marks the root, which expands unfiltered.
    fn expand(&self, kind: Kind, cube: &JanusCube, depth: u8, work: &mut Solution) -> bool {
        let last = work.last().copied();
        let mut moves = [(0u8, 0u8); N_FACE_TWISTS as usize];
        let n = successors(self.config.metric, depth, last, &mut moves);

        let mut found = false;
        for &(twist, cost) in &moves[..n] {
            found |= self.step(kind, cube, depth, work, twist, cost);
        }
        found
    }

    fn table_solve(&self, cube: &JanusCube, depth: u8, work: &mut Solution) -> bool {
        if cube.depth.too_far(depth) {
            return false;
        }
        if depth == 0 {
            return self.check_work(&cube.index, work);
        }
        self.expand(Kind::Table, cube, depth, work)
    }

    fn trial_solve(&self, cube: &JanusCube, depth: u8, work: &mut Solution) -> bool {
        if depth < self.useful_depth {
            return self.table_solve(cube, depth, work);
        }
        if self.canceled() {
            return false;
        }
        self.expand(Kind::Trial, cube, depth, work)
    }

    /// Grow the tree until the thread depth, parking each frontier node
    /// on the work-list. Always reports no solution; the workers decide.
    fn make_work_list(&self, cube: &JanusCube, depth: u8, work: &mut Solution) -> bool {
        if depth <= THREAD_DEPTH {
            self.work_list.push(WorkItem {
                index: cube.index,
                depth: cube.depth,
                work: work.clone(),
                remaining: depth,
            });
            return false;
        }
        self.expand(Kind::WorkList, cube, depth, work)
    }

    /// Root dispatch for deep searches: fill the work-list, then drain it
    /// from as many workers as the host offers.
    fn thread_solve(&self, cube: &JanusCube, depth: u8) -> bool {
        self.work_list.clear();
        let mut work = Solution::new();
        self.make_work_list(cube, depth, &mut work);

        let workers = hardware_concurrency();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| scope.spawn(|| self.drain_work_list()))
                .collect();
            let mut found = false;
            for handle in handles {
                found |= handle.join().unwrap();
            }
            found
        })
    }

    fn drain_work_list(&self) -> bool {
        let mut found = false;
        while let Some(mut item) = self.work_list.pop() {
            if self.canceled() {
                break;
            }
            let cube = JanusCube {
                index: item.index,
                depth: item.depth,
            };
            found |= self.trial_solve(&cube, item.remaining, &mut item.work);
        }
        found
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn count(metric: Metric, depth: u8, last: Option<u8>) -> usize {
        let mut moves = [(0u8, 0u8); 18];
        successors(metric, depth, last, &mut moves)
    }

    #[test]
    fn test_root_expands_every_twist() {
        assert_eq!(count(Metric::FaceTurn, 10, None), 18);
        assert_eq!(count(Metric::QuarterTurn, 10, None), 18);
        // a single remaining quarter move rules the half twists out
        assert_eq!(count(Metric::QuarterTurn, 1, None), 12);
    }

    #[test]
    fn test_same_face_never_twice() {
        // after F every F-family twist is gone
        for last in [0u8, 6, 12] {
            let mut moves = [(0u8, 0u8); 18];
            let n = successors(Metric::FaceTurn, 10, Some(last), &mut moves);
            assert_eq!(n, 15);
            assert!(moves[..n].iter().all(|&(t, _)| t % 6 != 0));
        }
    }

    #[test]
    fn test_opposing_faces_are_ordered() {
        // after B the F family is also barred, so B F and F B pairs are
        // generated once
        for last in [3u8, 9, 15] {
            let mut moves = [(0u8, 0u8); 18];
            let n = successors(Metric::FaceTurn, 10, Some(last), &mut moves);
            assert_eq!(n, 12);
            assert!(moves[..n].iter().all(|&(t, _)| t % 6 != 0 && t % 6 != 3));
        }
        // the ordering never bars B after F
        let mut moves = [(0u8, 0u8); 18];
        let n = successors(Metric::FaceTurn, 10, Some(0), &mut moves);
        assert!(moves[..n].iter().any(|&(t, _)| t == 3));
    }

    #[test]
    fn test_quarter_metric_costs() {
        let mut moves = [(0u8, 0u8); 18];
        let n = successors(Metric::QuarterTurn, 5, Some(4), &mut moves);
        for &(twist, cost) in &moves[..n] {
            assert_eq!(cost, if twist < 12 { 1 } else { 2 });
        }
        // L was last: L and R families excluded from both ranges
        assert!(moves[..n]
            .iter()
            .all(|&(t, _)| t % 6 != 4 && t % 6 != 1));
        assert_eq!(n, 12);
    }

    #[test]
    fn test_half_twists_need_two_remaining_moves() {
        let mut moves = [(0u8, 0u8); 18];
        let n = successors(Metric::QuarterTurn, 1, Some(0), &mut moves);
        assert!(moves[..n].iter().all(|&(t, _)| t < 12));
        let n2 = successors(Metric::QuarterTurn, 2, Some(0), &mut moves);
        assert!(n2 > n);
    }
}
