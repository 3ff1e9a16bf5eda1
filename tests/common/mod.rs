#![allow(dead_code)]

use std::fmt::Write;
use std::path::{Path, PathBuf};

/// An atom line in the default layout: `id type x y z vx vy vz fx fy fz c_pe`.
#[derive(Debug, Clone)]
pub struct Atom {
    pub kind: &'static str,
    pub position: [f64; 3],
    pub force: [f64; 3],
    pub energy: f64,
}

pub fn atom(kind: &'static str, x: f64, energy: f64) -> Atom {
    Atom {
        kind,
        position: [x, x + 0.5, x + 0.25],
        force: [-x, 0.125, 1.0],
        energy,
    }
}

/// Writes a single dump frame with an orthogonal periodic box.
pub fn frame(timestep: i64, bounds: [(f64, f64); 3], atoms: &[Atom]) -> String {
    let mut s = String::new();
    writeln!(s, "ITEM: TIMESTEP").unwrap();
    writeln!(s, "{timestep}").unwrap();
    writeln!(s, "ITEM: NUMBER OF ATOMS").unwrap();
    writeln!(s, "{}", atoms.len()).unwrap();
    writeln!(s, "ITEM: BOX BOUNDS pp pp pp").unwrap();
    for (lo, hi) in bounds {
        writeln!(s, "{lo:e} {hi:e}").unwrap();
    }
    writeln!(s, "ITEM: ATOMS id type x y z vx vy vz fx fy fz c_pe").unwrap();
    for (idx, a) in atoms.iter().enumerate() {
        let [x, y, z] = a.position;
        let [fx, fy, fz] = a.force;
        writeln!(
            s,
            "{} {} {x} {y} {z} 0.1 -0.2 0.3 {fx} {fy} {fz} {}",
            idx + 1,
            a.kind,
            a.energy
        )
        .unwrap();
    }
    s
}

pub const BOX: [(f64, f64); 3] = [(0.0, 10.0), (0.0, 5.0), (0.0, 2.0)];

/// A frame with `natoms` atoms of type 1 at `timestep`.
pub fn simple_frame(timestep: i64, natoms: usize) -> String {
    let atoms: Vec<Atom> = (0..natoms).map(|i| atom("1", i as f64, -1.0)).collect();
    frame(timestep, BOX, &atoms)
}

/// A dump with frames at each of `timesteps`, each with `natoms` atoms.
pub fn trajectory(timesteps: impl IntoIterator<Item = i64>, natoms: usize) -> String {
    timesteps
        .into_iter()
        .map(|t| simple_frame(t, natoms))
        .collect()
}

/// A fresh, empty scratch directory for a single test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dumpxyz-{}-{name}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
