//! The 48 whole-cube symmetries and their interaction with twists and
//! Janus permutations.
//!
//! A symmetry is stored as `lehmer << 3 | poles`, where the Lehmer code
//! ranks the six axis orderings and the pole bits mark reflected axes
//! (bit 0 is Z). The helpers here unpack that encoding, push Janus
//! permutations through it, and re-express cube-frame twists in a
//! symmetry's local frame.

use crate::config::Naso;
use crate::constants::{N_CUBE_SYMS, N_FACE_TWISTS};

/// A symmetry unpacked into which physical axis each logical axis maps to
/// and which of them are reflected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxesPole {
    pub axis: [u8; 3],
    pub pole: [u8; 3],
}

pub fn symmetry_to_axes_pole(symmetry: u8) -> AxesPole {
    let mut axis = [0u8; 3];
    axis[0] = symmetry >> 4;
    axis[1] = (symmetry >> 3) & 1;
    axis[1] += (axis[1] >= axis[0]) as u8;
    axis[2] = (axis[0] | axis[1]) ^ 0x3;

    let pole_bits = symmetry & 0x07;
    let pole = [pole_bits >> 2, (pole_bits >> 1) & 1, pole_bits & 1];

    AxesPole { axis, pole }
}

pub fn axes_pole_to_symmetry(ap: &AxesPole) -> u8 {
    let mut symmetry = 2 * ap.axis[0] + (ap.axis[2] < ap.axis[1]) as u8;
    symmetry = (symmetry << 1) | ap.pole[0];
    symmetry = (symmetry << 1) | ap.pole[1];
    symmetry = (symmetry << 1) | ap.pole[2];
    symmetry
}

/// Push one physical Janus permutation through a symmetry frame. The bit
/// order matches the mask operations.
fn permute_axes_pole(ap: &AxesPole, physical: u8) -> AxesPole {
    let mut ap = *ap;

    // both XY reflections flip the Z pole; colour handling happens at the
    // mask level
    if physical & 0x10 != 0 {
        ap.pole[2] ^= 1;
    }

    if physical & 0x08 != 0 {
        ap.pole[2] ^= 1;
    }

    // reflect across the XZ plane
    if physical & 0x04 != 0 {
        ap.pole[1] ^= 1;
    }

    // rotate 180 degrees about Z
    if physical & 0x02 != 0 {
        ap.pole[0] ^= 1;
        ap.pole[1] ^= 1;
    }

    // rotate 90 degrees about Z
    if physical & 0x01 != 0 {
        ap.axis.swap(0, 1);
        ap.pole.swap(0, 1);
        ap.pole[0] ^= 1;
    }

    ap
}

/// Table mapping `(permutation index, symmetry)` to the permuted symmetry.
pub fn build_symmetry_permute_table(naso: Naso) -> Vec<u8> {
    let n_perms = naso.janus_perms() as usize;
    let mut table = vec![0u8; n_perms * N_CUBE_SYMS as usize];

    for symmetry in 0..N_CUBE_SYMS {
        let ap = symmetry_to_axes_pole(symmetry);
        for perm in 0..n_perms {
            let permuted = permute_axes_pole(&ap, naso.physical_perm(perm as u8));
            table[perm * N_CUBE_SYMS as usize + symmetry as usize] =
                axes_pole_to_symmetry(&permuted);
        }
    }

    table
}

/// Table mapping `(symmetry, twist)` to the equivalent twist in that
/// symmetry's local frame.
pub fn build_twist_symmetry_table() -> Vec<u8> {
    let mut table = vec![0u8; N_CUBE_SYMS as usize * N_FACE_TWISTS as usize];

    for symmetry in 0..N_CUBE_SYMS {
        let ap = symmetry_to_axes_pole(symmetry);

        for twist in 0..N_FACE_TWISTS {
            let twist_pole = ((twist % 6) > 2) as u8;
            let twist_dir = twist / 6;

            let twist_axis = ((twist % 3) + 1 + ap.axis[2]) % 3;
            let new_axis = (2 - ap.axis[2] + ap.axis[twist_axis as usize]) % 3;

            let new_pole = twist_pole ^ ap.pole[new_axis as usize];
            let new_dir = if twist_dir == 2 {
                twist_dir
            } else {
                twist_dir
                    ^ (ap.axis[0] % 3 == (ap.axis[1] + 1) % 3) as u8
                    ^ ap.pole[0]
                    ^ ap.pole[1]
                    ^ ap.pole[2]
            };

            table[symmetry as usize * N_FACE_TWISTS as usize + twist as usize] =
                new_axis + new_pole * 3 + new_dir * 6;
        }
    }

    table
}
