use std::fmt;

/// Errors surfaced by the janus crate.
#[derive(Debug)]
pub enum Error {
    /// A scramble string contained a token that is not a Singmaster move.
    InvalidScramble,
    /// A twist value outside 0..18 was handed to a typed conversion.
    InvalidTwist(u8),
    /// The depth table could not be allocated. Fatal: the solver cannot
    /// run without it.
    Allocation { bytes: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidScramble => write!(f, "unrecognized move in scramble"),
            Error::InvalidTwist(t) => write!(f, "twist value {} is out of range", t),
            Error::Allocation { bytes } => {
                write!(f, "couldn't allocate {} bytes for the depth table", bytes)
            }
        }
    }
}

impl std::error::Error for Error {}
