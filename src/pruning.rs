//! The Janus depth table.
//!
//! One 2-bit cell per (corner, symmetric edge) coordinate pair holding the
//! exact solved-distance modulo 3, four cells per byte, low bits first.
//! Class 3 marks a cell not yet reached; after a finished build it means
//! the coordinate is farther than the final build depth from home.
//!
//! The table is huge (roughly 22 GB aequivalens, 44 GB disparilis) and is
//! flooded in three phases: a recursive single-threaded seed to depth 7,
//! parallel forward passes that expand every cell of the previous depth,
//! and three backward cleanup passes that only inspect the remaining
//! unreached cells. Forward passes write through a byte-wide atomic AND so
//! racing threads cannot clobber sibling cells; cleanup passes own
//! byte-aligned slabs outright.

use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;

use crate::bits::odd_inverse;
use crate::config::Config;
use crate::constants::{JANUS_MAGIC_NUMBER, N_SYM_CORNER_COORDS, SEED_DEPTH};
use crate::coord::UNREACHED_CLASS;
use crate::error::Error;
use crate::moves::MoveTables;

/// Render a count with thousands separators for the console.
fn commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn build_threads() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(16)
}

pub struct DepthTable {
    data: Box<[AtomicU8]>,
    n_cells: usize,
    config: Config,
}

impl DepthTable {
    /// Allocate the table, every cell unreached. The allocation is tens of
    /// gigabytes; failure is fatal to the solver and surfaced as an error.
    pub fn new(tables: &MoveTables, config: &Config) -> Result<Self, Error> {
        let n_cells = N_SYM_CORNER_COORDS as usize * tables.n_sym_edge_coords();
        let n_bytes = n_cells / 4;

        let mut data: Vec<AtomicU8> = Vec::new();
        data.try_reserve_exact(n_bytes)
            .map_err(|_| Error::Allocation { bytes: n_bytes })?;
        data.resize_with(n_bytes, || AtomicU8::new(0xFF));

        Ok(Self {
            data: data.into_boxed_slice(),
            n_cells,
            config: *config,
        })
    }

    #[cfg(test)]
    fn with_cells(n_cells: usize, config: Config) -> Self {
        let mut data = Vec::new();
        data.resize_with(n_cells / 4, || AtomicU8::new(0xFF));
        Self {
            data: data.into_boxed_slice(),
            n_cells,
            config,
        }
    }

    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    fn full_idx(cidx: u32, eidx: u32) -> usize {
        eidx as usize * N_SYM_CORNER_COORDS as usize + cidx as usize
    }

    /// The depth class of a coordinate pair: 0, 1 or 2, or 3 when beyond
    /// the table's final build depth.
    pub fn class(&self, cidx: u32, eidx: u32) -> u8 {
        self.class_at(Self::full_idx(cidx, eidx))
    }

    fn class_at(&self, idx: usize) -> u8 {
        let byte = self.data[idx >> 2].load(Ordering::Relaxed);
        (byte >> ((idx & 3) << 1)) & 0x3
    }

    /// Thread-safe downgrade of one unreached cell. Every value ever
    /// written only clears bits within the target cell, so a byte-wide
    /// AND leaves sibling cells intact even under write races.
    fn set(&self, idx: usize, class: u8) {
        let shift = (idx & 3) << 1;
        let mask = !((!class & 0x3) << shift);
        self.data[idx >> 2].fetch_and(mask, Ordering::Relaxed);
    }

    /// Plain write for cleanup passes, where the calling thread owns the
    /// whole byte.
    fn set_owned(&self, idx: usize, class: u8) {
        let shift = (idx & 3) << 1;
        let mask = !((!class & 0x3) << shift);
        let slot = &self.data[idx >> 2];
        slot.store(slot.load(Ordering::Relaxed) & mask, Ordering::Relaxed);
    }

    /// View the table as raw bytes for the persistence callbacks.
    ///
    /// `AtomicU8` is guaranteed to have the same size and alignment as
    /// `u8`, and the shared view is only handed out while no build is
    /// running.
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr() as *const u8, self.data.len()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe {
            std::slice::from_raw_parts_mut(self.data.as_mut_ptr() as *mut u8, self.data.len())
        }
    }

    /// Load the table through the host callback, or build, validate and
    /// save it. A failed load falls through to the build; a failed save
    /// is reported and otherwise ignored.
    pub fn init(
        &mut self,
        tables: &MoveTables,
        load: &mut dyn FnMut(&mut [u8]) -> bool,
        save: &dyn Fn(&[u8]) -> bool,
        console: &dyn Fn(&str),
    ) {
        if load(self.as_bytes_mut()) {
            return;
        }

        self.build(tables, console);

        if !self.validate(console) {
            console("CHECKSUM FAILED!");
            console("RESULTS NOT GUARANTEED.");
            self.certify(console);
        }

        if !save(self.as_bytes()) {
            console("couldn't save depth table; continuing without it");
        }
    }

    fn clear(&self) {
        for byte in self.data.iter() {
            byte.store(0xFF, Ordering::Relaxed);
        }
    }

    /// Flood the table from the home coordinate.
    pub fn build(&self, tables: &MoveTables, console: &dyn Fn(&str)) {
        let n_twists = self.config.build_twists();
        let build_depth = self.config.build_depth();
        let final_depth = self.config.final_depth();

        console("clearing table...");
        self.clear();

        console("start table build!");
        let home_cidx = tables.home_corner_index();
        let home_eidx = tables.home_edge_index();
        self.set(Self::full_idx(home_cidx, home_eidx), 0);

        // phase A: recursive seed, single-threaded
        for pass in 1..=SEED_DEPTH {
            let count = self.seed(tables, home_cidx, home_eidx, pass, pass, n_twists);
            console(&format!(
                "seed pass {:2}: {:>15} positions generated",
                pass,
                commas(count)
            ));
        }

        let n_edge = tables.n_sym_edge_coords();
        let n_threads = build_threads();

        // phase B: forward breadth-first passes over edge-coordinate slabs
        for pass in SEED_DEPTH + 1..=build_depth {
            let per_thread = n_edge.div_ceil(n_threads);
            let count: u64 = thread::scope(|scope| {
                let workers: Vec<_> = (0..n_threads)
                    .map(|t| {
                        let e0 = (t * per_thread).min(n_edge) as u32;
                        let e1 = ((t + 1) * per_thread).min(n_edge) as u32;
                        scope.spawn(move || self.forward_pass(tables, pass, n_twists, e0, e1))
                    })
                    .collect();
                workers.into_iter().map(|w| w.join().unwrap()).sum()
            });
            console(&format!(
                "forward pass {:2}: {:>15} positions generated (unpruned)",
                pass,
                commas(count)
            ));
        }

        // phase C: backward cleanup over byte-aligned slabs
        for pass in build_depth + 1..=final_depth {
            let n_bytes = self.data.len();
            let per_thread = n_bytes.div_ceil(n_threads);
            let count: u64 = thread::scope(|scope| {
                let workers: Vec<_> = (0..n_threads)
                    .map(|t| {
                        let b0 = (t * per_thread).min(n_bytes);
                        let b1 = ((t + 1) * per_thread).min(n_bytes);
                        scope.spawn(move || self.cleanup_pass(tables, pass, n_twists, b0, b1))
                    })
                    .collect();
                workers.into_iter().map(|w| w.join().unwrap()).sum()
            });
            console(&format!(
                "cleanup pass {:2}: {:>15} positions generated",
                pass,
                commas(count)
            ));
        }
    }

    /// Recursively walk every minimal path of length `pass` from home,
    /// marking newly reached cells. Symmetric edge positions fan out to
    /// their equivalent permutations so corner and flip combinations that
    /// do not share the position's symmetry are reached too.
    fn seed(
        &self,
        tables: &MoveTables,
        cidx: u32,
        eidx: u32,
        pass: u8,
        remaining: u8,
        n_twists: u8,
    ) -> u64 {
        let idx = Self::full_idx(cidx, eidx);

        if remaining == 0 {
            if self.class_at(idx) == UNREACHED_CLASS {
                self.set(idx, pass % 3);
                return 1;
            }
            return 0;
        }

        if self.class_at(idx) != (pass - remaining) % 3 {
            return 0;
        }

        let mut count = 0;
        for twist in 0..n_twists {
            let (pcidx, peidx) = tables.expand_twist(cidx, eidx, twist);
            count += self.seed(tables, pcidx, peidx, pass, remaining - 1, n_twists);

            for &perm in tables.equivalent_perms(peidx >> 8) {
                let (ecidx, eeidx) = tables.permute_pair(perm, pcidx, peidx);
                count += self.seed(tables, ecidx, eeidx, pass, remaining - 1, n_twists);
            }
        }
        count
    }

    /// Expand every cell holding the previous pass' class; unreached
    /// neighbours get the current class. Threads may race on a cell, but
    /// both write the same value. The count misses writes observed late
    /// and is reported as approximate.
    fn forward_pass(&self, tables: &MoveTables, pass: u8, n_twists: u8, e0: u32, e1: u32) -> u64 {
        let prev = (pass - 1) % 3;
        let current = pass % 3;
        let mut count = 0;

        for eidx in e0..e1 {
            for cidx in 0..N_SYM_CORNER_COORDS {
                if self.class(cidx, eidx) != prev {
                    continue;
                }

                for twist in 0..n_twists {
                    let (pcidx, peidx) = tables.expand_twist(cidx, eidx, twist);
                    let pidx = Self::full_idx(pcidx, peidx);
                    if self.class_at(pidx) == UNREACHED_CLASS {
                        count += 1;
                        self.set(pidx, current);
                    }

                    for &perm in tables.equivalent_perms(peidx >> 8) {
                        let (ecidx, eeidx) = tables.permute_pair(perm, pcidx, peidx);
                        let eqidx = Self::full_idx(ecidx, eeidx);
                        if self.class_at(eqidx) == UNREACHED_CLASS {
                            count += 1;
                            self.set(eqidx, current);
                        }
                    }
                }
            }
        }
        count
    }

    /// Sweep the still-unreached cells of an owned byte range; any cell
    /// with a neighbour at the previous class joins the current one.
    fn cleanup_pass(
        &self,
        tables: &MoveTables,
        pass: u8,
        n_twists: u8,
        b0: usize,
        b1: usize,
    ) -> u64 {
        let prev = (pass - 1) % 3;
        let current = pass % 3;
        let n_corner = N_SYM_CORNER_COORDS as usize;
        let mut count = 0;

        for byte in b0..b1 {
            for cell in 0..4 {
                let idx = (byte << 2) | cell;
                if idx >= self.n_cells || self.class_at(idx) != UNREACHED_CLASS {
                    continue;
                }

                let cidx = (idx % n_corner) as u32;
                let eidx = (idx / n_corner) as u32;

                for twist in 0..n_twists {
                    let (pcidx, peidx) = tables.expand_twist(cidx, eidx, twist);
                    if self.class(pcidx, peidx) == prev {
                        self.set_owned(idx, current);
                        count += 1;
                        break;
                    }
                }
            }
        }
        count
    }

    /// One pass over the whole table: per-class counts, the running
    /// product of odd-mapped classes and the chained sum both reduced
    /// modulo 2^32. The two check values are seed-independent; `validate`
    /// and `certify` fold the per-flavour seeds in afterwards.
    fn scan(&self) -> ([u64; 4], u32, u32) {
        let mut counts = [0u64; 4];
        let mut product: u32 = 1;
        let mut chain: u32 = 0;

        for idx in 0..self.n_cells {
            let class = self.class_at(idx);
            counts[class as usize] += 1;
            product = product.wrapping_mul(((class as u32) << 1) | 1);
            chain = chain.wrapping_add(product);
        }

        (counts, product, chain)
    }

    /// Check the table against its recorded seeds. Without recorded seeds
    /// only the position count is decisive and the observed seeds are
    /// printed for pinning.
    pub fn validate(&self, console: &dyn Fn(&str)) -> bool {
        console("validating...");
        let (counts, product, chain) = self.scan();

        for (class, count) in counts.iter().enumerate() {
            console(&format!("class {}: {:>15} positions", class, commas(*count)));
        }

        let total: u64 = counts.iter().sum();
        let count_passed = total == self.n_cells as u64;
        console(&format!(
            "total positions: {} ({})",
            commas(total),
            if count_passed { "passed" } else { "failed" }
        ));

        match self.config.table_checks() {
            Some(checks) => {
                let check_product = checks.init_check_product.wrapping_mul(product);
                let check_sum = checks
                    .init_check_sum
                    .wrapping_add(checks.init_check_product.wrapping_mul(chain));

                let sum_passed = check_sum == JANUS_MAGIC_NUMBER;
                let product_passed = check_product == JANUS_MAGIC_NUMBER;
                console(&format!(
                    "checkSum:     {:08X} ({})",
                    check_sum,
                    if sum_passed { "passed" } else { "failed" }
                ));
                console(&format!(
                    "checkProduct: {:08X} ({})",
                    check_product,
                    if product_passed { "passed" } else { "failed" }
                ));

                count_passed && sum_passed && product_passed
            }
            None => {
                console("no reference checks recorded for this table flavour");
                self.report_seeds(product, chain, console);
                count_passed
            }
        }
    }

    /// Derive and print the validation seeds a freshly built table would
    /// need to land on the magic number.
    pub fn certify(&self, console: &dyn Fn(&str)) {
        console("generating initial depth checks...");
        let (_, product, chain) = self.scan();
        self.report_seeds(product, chain, console);
    }

    fn report_seeds(&self, product: u32, chain: u32, console: &dyn Fn(&str)) {
        // the product of odd classes is invertible modulo 2^32, so the
        // seeds follow in closed form
        let init_product = odd_inverse(JANUS_MAGIC_NUMBER, product);
        let init_sum = JANUS_MAGIC_NUMBER.wrapping_sub(init_product.wrapping_mul(chain));
        console(&format!("initCheckSum:     {:08X}", init_sum));
        console(&format!("initCheckProduct: {:08X}", init_product));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small_table() -> DepthTable {
        DepthTable::with_cells(64, Config::default())
    }

    #[test]
    fn test_cells_start_unreached() {
        let table = small_table();
        for idx in 0..64 {
            assert_eq!(table.class_at(idx), UNREACHED_CLASS);
        }
    }

    #[test]
    fn test_set_leaves_siblings_alone() {
        let table = small_table();
        table.set(5, 1);
        assert_eq!(table.class_at(5), 1);
        for idx in [4, 6, 7] {
            assert_eq!(table.class_at(idx), UNREACHED_CLASS);
        }

        table.set(4, 0);
        table.set(6, 2);
        table.set(7, 0);
        assert_eq!(table.class_at(4), 0);
        assert_eq!(table.class_at(5), 1);
        assert_eq!(table.class_at(6), 2);
        assert_eq!(table.class_at(7), 0);
    }

    #[test]
    fn test_set_owned_matches_set() {
        let atomic = small_table();
        let owned = small_table();
        for idx in 0..64 {
            let class = (idx % 3) as u8;
            atomic.set(idx, class);
            owned.set_owned(idx, class);
        }
        assert_eq!(atomic.as_bytes(), owned.as_bytes());
    }

    #[test]
    fn test_byte_view_round_trip() {
        let mut table = small_table();
        table.set(0, 0);
        table.set(1, 1);
        table.set(2, 2);
        // cells pack low to high: 0b11_10_01_00
        assert_eq!(table.as_bytes()[0], 0xE4);

        table.as_bytes_mut()[1] = 0x1B;
        assert_eq!(table.class_at(4), 3);
        assert_eq!(table.class_at(5), 2);
        assert_eq!(table.class_at(6), 1);
        assert_eq!(table.class_at(7), 0);
    }

    #[test]
    fn test_scan_counts() {
        let table = small_table();
        for idx in 0..32 {
            table.set(idx, (idx % 3) as u8);
        }
        let (counts, _, _) = table.scan();
        assert_eq!(counts[0], 11);
        assert_eq!(counts[1], 11);
        assert_eq!(counts[2], 10);
        assert_eq!(counts[3], 32);
    }

    #[test]
    fn test_certified_seeds_reach_the_magic_number() {
        let table = small_table();
        for idx in 0..64 {
            table.set(idx, ((idx * 7) % 4).min(2) as u8);
        }
        let (_, product, chain) = table.scan();

        let init_product = odd_inverse(JANUS_MAGIC_NUMBER, product);
        let init_sum = JANUS_MAGIC_NUMBER.wrapping_sub(init_product.wrapping_mul(chain));

        // replay validate's accumulation from the derived seeds
        let mut check_product = init_product;
        let mut check_sum = init_sum;
        for idx in 0..64 {
            let class = table.class_at(idx) as u32;
            check_product = check_product.wrapping_mul((class << 1) | 1);
            check_sum = check_sum.wrapping_add(check_product);
        }
        assert_eq!(check_product, JANUS_MAGIC_NUMBER);
        assert_eq!(check_sum, JANUS_MAGIC_NUMBER);
    }

    #[test]
    fn test_validate_without_seeds_checks_counts() {
        let table = small_table();
        assert!(table.validate(&|_line| {}));
    }
}
