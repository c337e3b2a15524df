use std::{error, fmt};

/// Why a feature's geometry couldn't be turned into extents.
#[derive(Clone, PartialEq)]
pub enum GeomError {
    /// The outer ring has no positions, so there's nothing to take a min or max over.
    EmptyGeometry,
    /// Something about the geometry is unusable; the message says what.
    MalformedGeometry(String),
}

impl GeomError {
    pub fn malformed<I: Into<String>>(msg: I) -> GeomError {
        GeomError::MalformedGeometry(msg.into())
    }
}

impl fmt::Display for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeomError::EmptyGeometry => write!(f, "geometry has no coordinates"),
            GeomError::MalformedGeometry(msg) => write!(f, "malformed geometry: {}", msg),
        }
    }
}

impl fmt::Debug for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Do the same thing as the Display trait
        write!(f, "{}", self)
    }
}

impl error::Error for GeomError {}
