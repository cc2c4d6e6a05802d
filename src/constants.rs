//! Fixed numeric constants of the Janus coordinate system.

/// C(12,4): ways to choose the four untracked edge slots.
pub const C_12_4: u16 = 12 * 11 * 10 * 9 / (4 * 3 * 2);

/// C(8,4): ways to choose the four upper slots among the remaining eight.
pub const C_8_4: u16 = 8 * 7 * 6 * 5 / (4 * 3 * 2);

/// 8C4 ways to position four identical lower and four identical upper
/// corners.
pub const N_SYM_CORNER_POSITIONS: u16 = C_8_4;

/// 3^7 ways to individually spin seven corners; the eighth spin is the
/// complement of their sum modulo 3.
pub const N_SYM_CORNER_SPINS: u16 = 2187;

/// A full corner coordinate is a position and a spin.
pub const N_SYM_CORNER_COORDS: u32 =
    N_SYM_CORNER_POSITIONS as u32 * N_SYM_CORNER_SPINS as u32;

/// 12C4 * 8C4 edge positions before symmetry reduction. The four untracked
/// edges are placed first, then the four lower edges.
pub const N_REG_EDGE_POSITIONS: u32 = C_12_4 as u32 * C_8_4 as u32;

/// 2^8 ways to flip the eight tracked edges.
pub const N_EDGE_FLIPS: u16 = 256;

/// There are 48 whole-cube symmetries: six axis orderings times a 3-bit
/// reflection mask.
pub const N_CUBE_SYMS: u8 = 48;

/// Face twists 0..18: clockwise, counter-clockwise, then half turns.
pub const N_FACE_TWISTS: u8 = 18;

/// Quarter twists are 0..12; half twists follow.
pub const N_QUARTER_TWISTS: u8 = 12;

/// Corners and edges of the physical cube.
pub const N_CORNERS: u8 = 8;
pub const N_EDGES: u8 = 12;

/// Magic number for Janus depth table checks.
/// Two faces: one backward, one forward.
pub const JANUS_MAGIC_NUMBER: u32 = 0xECAF_FACE;

/// Depth at which the single-threaded recursive seed of the depth table
/// hands over to the parallel breadth-first passes.
pub const SEED_DEPTH: u8 = 7;

/// Remaining search depth at which the root expansion stops growing the
/// work-list and worker threads take over.
pub const THREAD_DEPTH: u8 = 16;
