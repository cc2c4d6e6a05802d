//! The solver facade: one scrambled cube plus its tables.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::Config;
use crate::constants::N_QUARTER_TWISTS;
use crate::coord::{CubeDepth, CubeIndex};
use crate::cubie::FullCube;
use crate::error::Error;
use crate::moves::MoveTables;
use crate::pruning::DepthTable;
use crate::scramble::scramble_from_str;
use crate::solver::{JanusCube, SearchCallbacks, SolveResult, Solver};
use crate::worklist::Solution;

/// A cube being scrambled and solved.
///
/// Construction builds the move tables and acquires the depth table,
/// loading it through the host's byte-blob callback or flooding it from
/// scratch. Afterwards the cube is at home; `twist` scrambles it and
/// `solve` enumerates every minimal solution under the configured metric.
pub struct Cube {
    config: Config,
    tables: Arc<MoveTables>,
    depth_table: Arc<DepthTable>,
    index: CubeIndex,
    depth: CubeDepth,
    full: FullCube,
    parity: u8,
    solutions: Arc<Mutex<Vec<Solution>>>,
    canceling: Arc<AtomicBool>,
    supervisor: Option<JoinHandle<()>>,
}

impl Cube {
    /// Build a solver instance.
    ///
    /// `console` receives one line of progress text per call while the
    /// tables come up. `load` is offered the raw table buffer and reports
    /// whether it filled it; on refusal the table is built and handed to
    /// `save`.
    pub fn new(
        config: Config,
        console: impl Fn(&str),
        mut load: impl FnMut(&mut [u8]) -> bool,
        save: impl Fn(&[u8]) -> bool,
    ) -> Result<Self, Error> {
        let tables = Arc::new(MoveTables::new(config.naso));
        let mut depth_table = DepthTable::new(&tables, &config)?;
        depth_table.init(&tables, &mut load, &save, &console);

        let index = tables.home_cube();
        Ok(Self {
            config,
            tables,
            depth_table: Arc::new(depth_table),
            index,
            depth: CubeDepth::home(),
            full: FullCube::home(),
            parity: 0,
            solutions: Arc::new(Mutex::new(Vec::new())),
            canceling: Arc::new(AtomicBool::new(false)),
            supervisor: None,
        })
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Cancel any running search and return to the home state.
    pub fn reset(&mut self) {
        self.cancel();
        let home = JanusCube::home(&self.tables);
        self.index = home.index;
        self.depth = home.depth;
        self.full = FullCube::home();
        self.parity = 0;
    }

    /// Apply a twist (0..18) to the cube.
    pub fn twist(&mut self, twist: u8) {
        let cube = JanusCube {
            index: self.index,
            depth: self.depth,
        };
        let next = cube.advance(
            &self.tables,
            &self.depth_table,
            self.config.final_depth() + 1,
            twist,
        );
        self.index = next.index;
        self.depth = next.depth;
        self.full = self.full.twist(twist);
        self.parity ^= (twist < N_QUARTER_TWISTS) as u8;
    }

    /// Reset, then apply a whitespace-separated Singmaster scramble.
    pub fn apply_scramble(&mut self, moves: &str) -> Result<(), Error> {
        self.reset();
        for twist in scramble_from_str(moves)? {
            self.twist(twist);
        }
        Ok(())
    }

    /// Launch the search for every minimal solution.
    ///
    /// Any previous search is canceled first. With `run_async` the call
    /// returns immediately and the callbacks fire from the supervisor
    /// thread; otherwise it blocks until termination. The termination
    /// callback receives `false` when the search was canceled.
    pub fn solve<FD, FS, FT>(
        &mut self,
        on_depth: FD,
        on_solution: FS,
        on_terminated: FT,
        run_async: bool,
    ) where
        FD: Fn(u8) + Send + Sync + 'static,
        FS: Fn(usize, &[u8]) + Send + Sync + 'static,
        FT: Fn(bool) + Send + Sync + 'static,
    {
        self.cancel();

        let solver = Solver::new(
            Arc::clone(&self.tables),
            Arc::clone(&self.depth_table),
            self.config,
            Arc::clone(&self.solutions),
            Arc::clone(&self.canceling),
            self.full,
            SearchCallbacks {
                on_depth: Arc::new(on_depth),
                on_solution: Arc::new(on_solution),
                on_terminated: Arc::new(on_terminated),
            },
        );

        let start = JanusCube {
            index: self.index,
            depth: self.depth,
        };
        let parity = self.parity;
        let handle = thread::spawn(move || solver.run(start, parity));

        if run_async {
            self.supervisor = Some(handle);
        } else {
            handle.join().unwrap();
        }
    }

    /// Solve synchronously with no observers and collect the outcome.
    pub fn solve_all(&mut self) -> SolveResult {
        let started = Instant::now();
        self.solve(|_| {}, |_, _| {}, |_| {}, false);
        SolveResult {
            solutions: self.solutions(),
            solve_time: started.elapsed(),
        }
    }

    /// Reset, apply a scramble string and solve it synchronously.
    pub fn solve_scramble(&mut self, moves: &str) -> Result<SolveResult, Error> {
        self.apply_scramble(moves)?;
        Ok(self.solve_all())
    }

    /// The solutions committed by the most recent search.
    pub fn solutions(&self) -> Vec<Solution> {
        self.solutions.lock().unwrap().clone()
    }

    fn cancel(&mut self) {
        self.canceling.store(true, Ordering::SeqCst);
        if let Some(handle) = self.supervisor.take() {
            handle.join().unwrap();
        }
        self.canceling.store(false, Ordering::SeqCst);
    }
}

impl Drop for Cube {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{Metric, Naso};

    // These exercise the full stack including the multi-gigabyte depth
    // table, so they only run when asked for explicitly.

    fn test_cube() -> Cube {
        Cube::new(
            Config {
                metric: Metric::FaceTurn,
                naso: Naso::Aequivalens,
            },
            |line| eprintln!("{}", line),
            |_buf| false,
            |_bytes| true,
        )
        .unwrap()
    }

    #[test]
    #[ignore = "builds the aequivalens depth table (~22 GB, hours)"]
    fn test_home_solves_to_the_empty_maneuver() {
        let mut cube = test_cube();
        let result = cube.solve_all();
        assert_eq!(result.solutions, vec![Vec::<u8>::new()]);
    }

    #[test]
    #[ignore = "builds the aequivalens depth table (~22 GB, hours)"]
    fn test_solve_single_twist() {
        let mut cube = test_cube();
        cube.apply_scramble("F").unwrap();
        let result = cube.solve_all();
        assert_eq!(result.solutions, vec![vec![6]]);
    }

    #[test]
    #[ignore = "builds the aequivalens depth table (~22 GB, hours)"]
    fn test_solve_sune_is_seven_moves() {
        let mut cube = test_cube();
        cube.apply_scramble("R U R' U R U2 R'").unwrap();
        let result = cube.solve_all();
        assert!(!result.solutions.is_empty());
        assert!(result.solutions.iter().all(|s| s.len() == 7));
        // the inverse maneuver is among the minimal solutions
        let inverse = crate::scramble::scramble_from_str("R U2 R' U' R U' R'").unwrap();
        assert!(result.solutions.contains(&inverse));
    }

    #[test]
    #[ignore = "builds the depth table and searches to depth 20 (days)"]
    fn test_superflip_needs_twenty_face_turns() {
        let mut cube = test_cube();
        cube.apply_scramble("U R2 F B R B2 R U2 L B2 R U' D' R2 F R' L B2 U2 F2")
            .unwrap();
        let result = cube.solve_all();
        assert!(!result.solutions.is_empty());
        assert!(result.solutions.iter().all(|s| s.len() == 20));
    }

    #[test]
    #[ignore = "builds the depth table and runs a deep search (days)"]
    fn test_benbotto_scramble_replays_to_solved() {
        let mut cube = test_cube();
        let scramble =
            crate::scramble::scramble_from_str("L B' L' F2 U F R2 U2 F U' F2 R2 F2 U' L2 U2 B' R'")
                .unwrap();
        for &twist in &scramble {
            cube.twist(twist);
        }
        let result = cube.solve_all();
        assert!(!result.solutions.is_empty());

        // every reported solution must solve the physical cube
        for solution in &result.solutions {
            let mut full = FullCube::home();
            for &twist in scramble.iter().chain(solution.iter()) {
                full = full.twist(twist);
            }
            assert!(full.is_solved());
        }
    }
}
