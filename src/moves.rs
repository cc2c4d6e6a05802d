//! Twists and the precomputed transition tables that apply them.
//!
//! Twists are numbered `direction * 6 + face` with faces F R U B L D:
//! 0..6 clockwise, 6..12 counter-clockwise, 12..18 half turns.
//!
//! The tables are built once at startup by sweeping every coordinate
//! through the mask operations, and are read-only afterwards. A twist on
//! a Janus index is then three lookups: re-express the twist in the
//! Janus' frame, twist corners and edges, and apply whatever whole-cube
//! permutation the edge canonicalization demanded.

use std::fmt;
use std::str::FromStr;

use crate::bits::{remove_mask, restore_mask};
use crate::choose::ChooseTable;
use crate::config::Naso;
use crate::constants::*;
use crate::coord::{CornerCoordinate, CubeIndex, EdgeCoordinate, Index};
use crate::error::Error;
use crate::mask::{home_corner_mask, home_edge_mask, CornerMask, EdgeMask};
use crate::symmetries::{build_symmetry_permute_table, build_twist_symmetry_table};

/// A face twist in Singmaster notation. `F3` is the counter-clockwise
/// quarter turn usually written F'.
#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum Twist {
    F, R, U, B, L, D,
    F3, R3, U3, B3, L3, D3,
    F2, R2, U2, B2, L2, D2,
}

impl Twist {
    pub const ALL: [Twist; 18] = [
        Twist::F, Twist::R, Twist::U, Twist::B, Twist::L, Twist::D,
        Twist::F3, Twist::R3, Twist::U3, Twist::B3, Twist::L3, Twist::D3,
        Twist::F2, Twist::R2, Twist::U2, Twist::B2, Twist::L2, Twist::D2,
    ];
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Twist::*;
        match self {
            F3 => write!(f, "F'"),
            R3 => write!(f, "R'"),
            U3 => write!(f, "U'"),
            B3 => write!(f, "B'"),
            L3 => write!(f, "L'"),
            D3 => write!(f, "D'"),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl FromStr for Twist {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Twist::*;
        match s {
            "F" => Ok(F),
            "F'" => Ok(F3),
            "F2" => Ok(F2),
            "R" => Ok(R),
            "R'" => Ok(R3),
            "R2" => Ok(R2),
            "U" => Ok(U),
            "U'" => Ok(U3),
            "U2" => Ok(U2),
            "B" => Ok(B),
            "B'" => Ok(B3),
            "B2" => Ok(B2),
            "L" => Ok(L),
            "L'" => Ok(L3),
            "L2" => Ok(L2),
            "D" => Ok(D),
            "D'" => Ok(D3),
            "D2" => Ok(D2),
            _ => Err(Error::InvalidScramble),
        }
    }
}

impl TryFrom<u8> for Twist {
    type Error = Error;

    fn try_from(twist: u8) -> Result<Self, Error> {
        Twist::ALL
            .get(twist as usize)
            .copied()
            .ok_or(Error::InvalidTwist(twist))
    }
}

const POW3: [u16; 8] = [1, 3, 9, 27, 81, 243, 729, 2187];

/// Corner coordinates store seven spins; rebuild the eighth so the sum is
/// zero modulo 3.
fn restore_spin_parity(spin: u16) -> u16 {
    let mut spin = spin;
    let mut out = 0;
    let mut sum = 0;

    for p in POW3.iter().take(7) {
        let s = spin % 3;
        sum += s;
        out += s * p;
        spin /= 3;
    }

    out + ((3 - sum % 3) % 3) * POW3[7]
}

/// Drop the eighth corner spin when going from mask to coordinate.
fn remove_spin_parity(spin: u16) -> u16 {
    spin % POW3[7]
}

/// Temporary tables relating "regular" edge positions (the raw
/// C(12,4)*C(8,4) ordinals) to their symmetricized classes.
///
/// `rec2sec[reg]` holds the class in the lower 12 or 13 bits and the
/// permutation index that reaches the class representative above them.
/// `sec2rec[class]` returns the representative's regular position.
pub(crate) struct EdgePositionTables {
    naso: Naso,
    c12_4: ChooseTable,
    c8_4: ChooseTable,
    rec2sec: Vec<u16>,
    sec2rec: Vec<u16>,
    sym_position_bits: u8,
}

impl EdgePositionTables {
    pub(crate) fn new(naso: Naso) -> Self {
        let c12_4 = ChooseTable::new(12, 4);
        let c8_4 = ChooseTable::new(8, 4);
        let sym_position_bits = naso.sym_position_bits();

        let mut rec2sec = vec![0u16; N_REG_EDGE_POSITIONS as usize];
        let mut sec2rec = Vec::new();

        for reg in 0..N_REG_EDGE_POSITIONS {
            let jem = pos2jem(&c12_4, &c8_4, reg);

            // the class representative is the orbit's lowest position
            let mut best_perm = 0u8;
            let mut best_reg = reg;
            for perm in 1..naso.janus_perms() {
                let pem = jem.permute(naso.physical_perm(perm));
                let preg = jem2pos(&c12_4, &c8_4, &pem);
                if preg < best_reg {
                    best_perm = perm;
                    best_reg = preg;
                }
            }

            if best_perm == 0 {
                rec2sec[reg as usize] = sec2rec.len() as u16;
                sec2rec.push(reg as u16);
            } else {
                rec2sec[reg as usize] =
                    rec2sec[best_reg as usize] | ((best_perm as u16) << sym_position_bits);
            }
        }

        Self {
            naso,
            c12_4,
            c8_4,
            rec2sec,
            sec2rec,
            sym_position_bits,
        }
    }

    pub(crate) fn n_sym_edge_positions(&self) -> usize {
        self.sec2rec.len()
    }

    fn jcc2jcm(&self, jcc: &CornerCoordinate) -> CornerMask {
        CornerMask {
            face: self.c8_4.position_to_mask[jcc.position as usize],
            spin: restore_spin_parity(jcc.spin),
        }
    }

    fn jcm2jcc(&self, jcm: &CornerMask) -> CornerCoordinate {
        CornerCoordinate {
            position: self.c8_4.mask_to_position[jcm.face as usize] as u8,
            spin: remove_spin_parity(jcm.spin),
        }
    }

    fn jec2jem(&self, jec: &EdgeCoordinate) -> EdgeMask {
        let reg = self.sec2rec[jec.position as usize] as u32;
        let mask0 = self.c12_4.position_to_mask[(reg / C_8_4 as u32) as usize];
        let mask1 = self.c8_4.position_to_mask[(reg % C_8_4 as u32) as usize];

        EdgeMask {
            valid: !mask0 & 0xFFF,
            face: restore_mask(mask0, mask1),
            flip: restore_mask(mask0, jec.flip),
        }
    }

    /// Canonicalize an edge mask. Returns the symmetric coordinate and
    /// the permutation index the rest of the cube must follow.
    fn jem2jec(&self, jem: &EdgeMask) -> (EdgeCoordinate, u8) {
        let position = jem2pos(&self.c12_4, &self.c8_4, jem);
        let entry = self.rec2sec[position as usize];
        let perm_needed = (entry >> self.sym_position_bits) as u8;

        let pem = jem.permute(self.naso.physical_perm(perm_needed));
        let pmask0 = 0xFFF & !pem.valid;
        let pflip = remove_mask(pmask0, pem.flip);
        let pposition = jem2pos(&self.c12_4, &self.c8_4, &pem);
        let pentry = self.rec2sec[pposition as usize];
        let sym_position = pentry & ((1 << self.sym_position_bits) - 1);

        (
            EdgeCoordinate {
                position: sym_position,
                flip: pflip,
            },
            perm_needed,
        )
    }

    pub(crate) fn home_corner_index(&self) -> u32 {
        self.jcm2jcc(&home_corner_mask()).table_index()
    }

    pub(crate) fn home_edge_index(&self) -> u32 {
        self.jem2jec(&home_edge_mask()).0.table_index()
    }
}

/// An edge mask with the given regular position and no flips.
fn pos2jem(c12_4: &ChooseTable, c8_4: &ChooseTable, reg: u32) -> EdgeMask {
    let mask0 = c12_4.position_to_mask[(reg / C_8_4 as u32) as usize];
    let mask1 = c8_4.position_to_mask[(reg % C_8_4 as u32) as usize];

    EdgeMask {
        valid: !mask0 & 0xFFF,
        face: restore_mask(mask0, mask1),
        flip: 0,
    }
}

/// The regular position of an edge mask; flips are ignored.
fn jem2pos(c12_4: &ChooseTable, c8_4: &ChooseTable, jem: &EdgeMask) -> u32 {
    let mask0 = 0xFFF & !jem.valid;
    let mask1 = remove_mask(mask0, jem.face);

    c12_4.mask_to_position[mask0 as usize] as u32 * C_8_4 as u32
        + c8_4.mask_to_position[mask1 as usize] as u32
}

/// The frozen transition tables.
pub struct MoveTables {
    naso: Naso,
    n_sym_edge_positions: usize,
    n_sym_edge_coords: usize,
    edge_perm_bits: u8,
    edge_perm_mask: u32,
    home_corner_index: u32,
    home_edge_index: u32,

    /// `[twist][corner index]` -> corner index after the twist.
    corner_twist: Vec<u32>,
    /// `[twist][edge index]` -> `(edge index << edge_perm_bits) | permNeeded`.
    edge_twist: Vec<u32>,
    /// `[perm][corner index]` -> corner index after the permutation.
    corner_permute: Vec<u32>,
    /// `[perm][edge index]` -> edge index after the permutation.
    edge_permute: Vec<u32>,
    /// `[perm][symmetry]` -> symmetry after the permutation.
    symmetry_permute: Vec<u8>,
    /// `[symmetry][twist]` -> the twist in that symmetry's local frame.
    twist_symmetry: Vec<u8>,
    /// Non-identity permutations fixing each symmetric edge position.
    /// Needed so the depth table flood reaches corner and flip
    /// combinations that do not share the position's symmetry.
    equivalent_edge_perms: Vec<Vec<u8>>,
}

impl MoveTables {
    pub fn new(naso: Naso) -> Self {
        let positions = EdgePositionTables::new(naso);

        let n_perms = naso.janus_perms() as usize;
        let n_corner = N_SYM_CORNER_COORDS as usize;
        let n_sym_edge_positions = positions.n_sym_edge_positions();
        let n_sym_edge_coords = n_sym_edge_positions * N_EDGE_FLIPS as usize;
        let edge_perm_bits = naso.edge_perm_bits();

        let mut corner_twist = vec![0u32; N_FACE_TWISTS as usize * n_corner];
        let mut corner_permute = vec![0u32; n_perms * n_corner];

        for position in 0..N_SYM_CORNER_POSITIONS as u8 {
            for spin in 0..N_SYM_CORNER_SPINS {
                let jcc = CornerCoordinate { position, spin };
                let jcm = positions.jcc2jcm(&jcc);
                let cidx = jcc.table_index() as usize;

                for twist in 0..N_FACE_TWISTS {
                    corner_twist[twist as usize * n_corner + cidx] =
                        positions.jcm2jcc(&jcm.twist(twist)).table_index();
                }

                for perm in 0..n_perms {
                    let pjcm = jcm.permute(naso.physical_perm(perm as u8));
                    corner_permute[perm * n_corner + cidx] =
                        positions.jcm2jcc(&pjcm).table_index();
                }
            }
        }

        let mut edge_twist = vec![0u32; N_FACE_TWISTS as usize * n_sym_edge_coords];
        let mut edge_permute = vec![0u32; n_perms * n_sym_edge_coords];

        for position in 0..n_sym_edge_positions as u16 {
            for flip in 0..N_EDGE_FLIPS {
                let jec = EdgeCoordinate { position, flip };
                let jem = positions.jec2jem(&jec);
                let eidx = jec.table_index() as usize;

                for twist in 0..N_FACE_TWISTS {
                    let (mjec, perm_needed) = positions.jem2jec(&jem.twist(twist));
                    edge_twist[twist as usize * n_sym_edge_coords + eidx] =
                        (mjec.table_index() << edge_perm_bits) | perm_needed as u32;
                }

                for perm in 0..n_perms {
                    let pjem = jem.permute(naso.physical_perm(perm as u8));
                    edge_permute[perm * n_sym_edge_coords + eidx] =
                        positions.jem2jec(&pjem).0.table_index();
                }
            }
        }

        let mut equivalent_edge_perms = Vec::with_capacity(n_sym_edge_positions);
        for sym in 0..n_sym_edge_positions {
            let reg = positions.sec2rec[sym] as u32;
            let jem = pos2jem(&positions.c12_4, &positions.c8_4, reg);

            let mut fixing = Vec::new();
            for perm in 1..naso.janus_perms() {
                let pem = jem.permute(naso.physical_perm(perm));
                if jem2pos(&positions.c12_4, &positions.c8_4, &pem) == reg {
                    fixing.push(perm);
                }
            }
            equivalent_edge_perms.push(fixing);
        }

        Self {
            naso,
            n_sym_edge_positions,
            n_sym_edge_coords,
            edge_perm_bits,
            edge_perm_mask: (1 << edge_perm_bits) - 1,
            home_corner_index: positions.home_corner_index(),
            home_edge_index: positions.home_edge_index(),
            corner_twist,
            edge_twist,
            corner_permute,
            edge_permute,
            symmetry_permute: build_symmetry_permute_table(naso),
            twist_symmetry: build_twist_symmetry_table(),
            equivalent_edge_perms,
        }
    }

    pub fn naso(&self) -> Naso {
        self.naso
    }

    pub fn n_sym_edge_positions(&self) -> usize {
        self.n_sym_edge_positions
    }

    pub fn n_sym_edge_coords(&self) -> usize {
        self.n_sym_edge_coords
    }

    pub fn home_corner_index(&self) -> u32 {
        self.home_corner_index
    }

    pub fn home_edge_index(&self) -> u32 {
        self.home_edge_index
    }

    /// The solved cube.
    pub fn home_cube(&self) -> CubeIndex {
        CubeIndex::home(self.home_corner_index, self.home_edge_index)
    }

    pub fn is_solved(&self, cube: &CubeIndex) -> bool {
        cube.is_solved(self.home_corner_index, self.home_edge_index)
    }

    /// Perform a twist on one Janus.
    pub fn index_twist(&self, janus: &Index, twist: u8) -> Index {
        // the twist in the Janus' local frame
        let twist =
            self.twist_symmetry[janus.symmetry as usize * N_FACE_TWISTS as usize + twist as usize];

        let n_corner = N_SYM_CORNER_COORDS as usize;
        let cvalue = self.corner_twist[twist as usize * n_corner + janus.corners as usize];
        let evalue =
            self.edge_twist[twist as usize * self.n_sym_edge_coords + janus.edges as usize];

        // the edge twist may have re-canonicalized the position; corners
        // and symmetry must follow the same permutation
        let perm = (evalue & self.edge_perm_mask) as usize;
        Index {
            corners: self.corner_permute[perm * n_corner + cvalue as usize],
            edges: evalue >> self.edge_perm_bits,
            symmetry: self.symmetry_permute[perm * N_CUBE_SYMS as usize + janus.symmetry as usize],
        }
    }

    /// Perform a twist on all three Jani.
    pub fn cube_twist(&self, cube: &CubeIndex, twist: u8) -> CubeIndex {
        CubeIndex {
            x: self.index_twist(&cube.x, twist),
            y: self.index_twist(&cube.y, twist),
            z: self.index_twist(&cube.z, twist),
        }
    }

    /// Canonical-frame twist on a bare (corner, edge) coordinate pair,
    /// used while flooding the depth table.
    pub fn expand_twist(&self, cidx: u32, eidx: u32, twist: u8) -> (u32, u32) {
        let n_corner = N_SYM_CORNER_COORDS as usize;
        let cvalue = self.corner_twist[twist as usize * n_corner + cidx as usize];
        let evalue = self.edge_twist[twist as usize * self.n_sym_edge_coords + eidx as usize];

        let perm = (evalue & self.edge_perm_mask) as usize;
        (
            self.corner_permute[perm * n_corner + cvalue as usize],
            evalue >> self.edge_perm_bits,
        )
    }

    /// Apply a permutation to a bare (corner, edge) coordinate pair.
    pub fn permute_pair(&self, perm: u8, cidx: u32, eidx: u32) -> (u32, u32) {
        let n_corner = N_SYM_CORNER_COORDS as usize;
        (
            self.corner_permute[perm as usize * n_corner + cidx as usize],
            self.edge_permute[perm as usize * self.n_sym_edge_coords + eidx as usize],
        )
    }

    /// Non-identity permutations fixing the given symmetric edge position.
    pub fn equivalent_perms(&self, position: u32) -> &[u8] {
        &self.equivalent_edge_perms[position as usize]
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        /// Shared across the test binary; the build takes a while.
        pub(crate) static ref AEQUIVALENS_TABLES: MoveTables = MoveTables::new(Naso::Aequivalens);
    }
}

#[cfg(test)]
mod test {
    use super::testutil::AEQUIVALENS_TABLES;
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_twist_parse_and_display() {
        for (i, twist) in Twist::ALL.iter().enumerate() {
            assert_eq!(*twist as u8, i as u8);
            assert_eq!(Twist::try_from(i as u8).unwrap(), *twist);
            assert_eq!(twist.to_string().parse::<Twist>().unwrap(), *twist);
        }
        assert!("X".parse::<Twist>().is_err());
        assert!(Twist::try_from(18).is_err());
    }

    #[test]
    fn test_edge_position_class_counts() {
        let aequivalens = EdgePositionTables::new(Naso::Aequivalens);
        assert_eq!(aequivalens.n_sym_edge_positions(), 2256);
        assert_eq!(aequivalens.home_corner_index(), 20);
        assert_eq!(aequivalens.home_edge_index(), 2224 << 8);

        let disparilis = EdgePositionTables::new(Naso::Disparilis);
        assert_eq!(disparilis.n_sym_edge_positions(), 4425);
        assert_eq!(disparilis.home_corner_index(), 20);
        assert_eq!(disparilis.home_edge_index(), 3496 << 8);
    }

    #[test]
    fn test_noseless_classes_collapse_the_reflected_home() {
        // reflecting home across the tracked axis parks every pigment on
        // the opposing face: the four-spot image. The noseless
        // canonicalization folds it onto the home class; the full one
        // keeps the two apart, which is why only aequivalens needs the
        // full-cube guard
        let reflected = home_edge_mask().permute(0x10);

        let aequivalens = EdgePositionTables::new(Naso::Aequivalens);
        let (jec, _) = aequivalens.jem2jec(&reflected);
        assert_eq!(jec.position as u32, aequivalens.home_edge_index() >> 8);

        let disparilis = EdgePositionTables::new(Naso::Disparilis);
        let (jec, _) = disparilis.jem2jec(&reflected);
        assert_ne!(jec.position as u32, disparilis.home_edge_index() >> 8);
    }

    #[test]
    fn test_table_dimensions() {
        let tables = &*AEQUIVALENS_TABLES;
        assert_eq!(tables.n_sym_edge_positions(), 2256);
        assert_eq!(tables.n_sym_edge_coords(), 2256 * 256);
        assert_eq!(tables.home_corner_index(), 20);
        assert_eq!(tables.home_edge_index(), 2224 << 8);
        assert!(tables.is_solved(&tables.home_cube()));
    }

    fn inverse(twist: u8) -> u8 {
        match twist {
            0..=5 => twist + 6,
            6..=11 => twist - 6,
            _ => twist,
        }
    }

    fn random_state(tables: &MoveTables, rng: &mut StdRng, moves: usize) -> CubeIndex {
        let mut cube = tables.home_cube();
        for _ in 0..moves {
            cube = tables.cube_twist(&cube, rng.gen_range(0..18));
        }
        cube
    }

    /// The coordinate pair of a Janus is unique only up to the
    /// permutations fixing its symmetric edge position, so round trips
    /// compare modulo that stabilizer.
    fn same_janus(tables: &MoveTables, a: &Index, b: &Index) -> bool {
        if a.corners == b.corners && a.edges == b.edges {
            return true;
        }
        if a.edges >> 8 != b.edges >> 8 {
            return false;
        }
        tables
            .equivalent_perms(a.edges >> 8)
            .iter()
            .any(|&p| tables.permute_pair(p, a.corners, a.edges) == (b.corners, b.edges))
    }

    fn same_cube(tables: &MoveTables, a: &CubeIndex, b: &CubeIndex) -> bool {
        same_janus(tables, &a.x, &b.x)
            && same_janus(tables, &a.y, &b.y)
            && same_janus(tables, &a.z, &b.z)
    }

    #[test]
    fn test_quarter_twist_inverse() {
        let tables = &*AEQUIVALENS_TABLES;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let cube = random_state(tables, &mut rng, 12);
            for twist in 0..6u8 {
                let there = tables.cube_twist(&cube, twist);
                let back = tables.cube_twist(&there, twist + 6);
                assert!(same_cube(tables, &back, &cube), "twist {}", twist);
            }
        }
    }

    #[test]
    fn test_quarter_twist_period_four() {
        let tables = &*AEQUIVALENS_TABLES;
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let cube = random_state(tables, &mut rng, 15);
            for twist in 0..12u8 {
                let mut turned = cube;
                for _ in 0..4 {
                    turned = tables.cube_twist(&turned, twist);
                }
                assert!(same_cube(tables, &turned, &cube), "twist {}", twist);
            }
        }
    }

    #[test]
    fn test_half_twist_period_two() {
        let tables = &*AEQUIVALENS_TABLES;
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..10 {
            let cube = random_state(tables, &mut rng, 15);
            for twist in 12..18u8 {
                let turned = tables.cube_twist(&tables.cube_twist(&cube, twist), twist);
                assert!(same_cube(tables, &turned, &cube), "twist {}", twist);
            }
        }
    }

    #[test]
    fn test_scramble_then_inverse_returns_home() {
        let tables = &*AEQUIVALENS_TABLES;
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..10 {
            let scramble: Vec<u8> = (0..25).map(|_| rng.gen_range(0..18)).collect();
            let mut cube = tables.home_cube();
            for &t in &scramble {
                cube = tables.cube_twist(&cube, t);
            }
            for &t in scramble.iter().rev() {
                cube = tables.cube_twist(&cube, inverse(t));
            }
            // the home masks are fixed by their whole stabilizer, so the
            // coordinates come back exactly; only the frame may wander
            assert!(tables.is_solved(&cube));
            for janus in [cube.x, cube.y, cube.z] {
                assert_eq!(janus.corners, tables.home_corner_index());
                assert_eq!(janus.edges, tables.home_edge_index());
                assert_eq!(janus.symmetry & 1, 0);
            }
        }
    }

    #[test]
    fn test_edge_twist_entries_are_in_range() {
        let tables = &*AEQUIVALENS_TABLES;
        let n_perms = tables.naso().janus_perms() as u32;
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..2000 {
            let twist = rng.gen_range(0..18usize);
            let eidx = rng.gen_range(0..tables.n_sym_edge_coords());
            let entry = tables.edge_twist[twist * tables.n_sym_edge_coords() + eidx];
            assert!((entry & tables.edge_perm_mask) < n_perms);
            assert!(((entry >> tables.edge_perm_bits) as usize) < tables.n_sym_edge_coords());
        }
    }

    #[test]
    fn test_equivalent_perms_fix_home_position() {
        // the home edge position is symmetric under the whole Z-frame
        // subgroup, so seven non-identity permutations fix it
        let tables = &*AEQUIVALENS_TABLES;
        let home_position = tables.home_edge_index() >> 8;
        assert_eq!(tables.equivalent_perms(home_position).len(), 7);
    }
}
