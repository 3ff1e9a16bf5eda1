use std::sync::Arc;

use glam::{DMat3, DVec3};

pub use crate::config::{AtomLayout, Config, ErrorPolicy};
pub use crate::encoder::{Encoder, OutputBlock};
pub use crate::error::{BatchError, ConfigError, ScanError};
pub use crate::scanner::DumpScanner;
pub use crate::selection::SamplingPolicy;
pub use crate::species::TypeMap;

pub mod batch;
pub mod config;
pub mod defaults;
pub mod encoder;
pub mod error;
pub mod reader;
pub mod scanner;
pub mod selection;
pub mod species;

/// The cell matrix, with the cell vectors as its columns.
pub type Lattice = DMat3;

/// Orthogonal simulation cell bounds along x, y and z.
///
/// No ordering between `lo` and `hi` is enforced. A cell that shrank past its origin simply has
/// negative edge lengths.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub lo: DVec3,
    pub hi: DVec3,
}

impl CellBounds {
    pub fn new(x: (f64, f64), y: (f64, f64), z: (f64, f64)) -> Self {
        Self {
            lo: DVec3::new(x.0, y.0, z.0),
            hi: DVec3::new(x.1, y.1, z.1),
        }
    }

    /// Edge lengths `hi - lo` per axis.
    pub fn lengths(&self) -> DVec3 {
        self.hi - self.lo
    }

    /// The lattice spanned by the edge lengths, without any tilt.
    pub fn lattice(&self) -> Lattice {
        DMat3::from_diagonal(self.lengths())
    }
}

/// One atom in one [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub species: Arc<str>,
    pub position: DVec3,
    pub force: DVec3,
    /// Per-atom potential energy.
    pub energy: f64,
}

/// A single selected snapshot of a dump.
///
/// The atoms are kept in the order in which they appear in the dump.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    pub timestep: u64,
    pub bounds: CellBounds,
    pub atoms: Vec<AtomRecord>,
}

impl Frame {
    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    /// The sum of the per-atom energies, accumulated in atom order.
    pub fn total_energy(&self) -> f64 {
        self.atoms.iter().fold(0.0, |sum, atom| sum + atom.energy)
    }

    pub fn positions<'f>(&'f self) -> impl Iterator<Item = DVec3> + 'f {
        self.atoms.iter().map(|atom| atom.position)
    }

    pub fn forces<'f>(&'f self) -> impl Iterator<Item = DVec3> + 'f {
        self.atoms.iter().map(|atom| atom.force)
    }
}
