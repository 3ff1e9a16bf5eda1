use std::fmt;
use std::path::{Component, Path};

use crate::config::Config;
use crate::Frame;

/// The per-atom properties of every block.
pub const PROPERTIES: &str = "species:S:1:pos:R:3:forces:R:3";

/// One [`Frame`] rendered as an extended xyz block.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputBlock {
    /// Source file (relative to the input directory, without extension) and timestep.
    pub category: String,
    pub timestep: u64,
    pub natoms: usize,
    pub energy: f64,
    /// The full block. Every line, including the last one, ends in a newline.
    pub text: String,
}

impl fmt::Display for OutputBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renders [`Frame`]s as extended xyz blocks.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'c> {
    input_dir: &'c Path,
    name: &'c str,
}

impl<'c> Encoder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self::with_root(&config.input_dir, &config.name)
    }

    pub fn with_root(input_dir: &'c Path, name: &'c str) -> Self {
        Self { input_dir, name }
    }

    /// Render `frame`, which was read from the dump at `path`.
    pub fn encode(&self, frame: &Frame, path: &Path) -> OutputBlock {
        let category = self.category(path, frame.timestep);
        let energy = frame.total_energy();
        let text = Block {
            frame,
            name: self.name,
            category: &category,
            energy,
        }
        .to_string();
        OutputBlock {
            category,
            timestep: frame.timestep,
            natoms: frame.natoms(),
            energy,
            text,
        }
    }

    /// The category of a frame at `timestep` from the dump at `path`.
    ///
    /// This is the path relative to the input directory, without its extension and with `/` as
    /// the separator, followed by `-{timestep}`. A path outside of the input directory only
    /// contributes its file stem.
    pub fn category(&self, path: &Path, timestep: u64) -> String {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        let dir: Vec<_> = path
            .strip_prefix(self.input_dir)
            .ok()
            .and_then(Path::parent)
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(part.to_string_lossy()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if dir.is_empty() {
            format!("{stem}-{timestep}")
        } else {
            format!("{}/{stem}-{timestep}", dir.join("/"))
        }
    }
}

struct Block<'a> {
    frame: &'a Frame,
    name: &'a str,
    category: &'a str,
    energy: f64,
}

impl fmt::Display for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lengths = self.frame.bounds.lengths();
        writeln!(f, "{}", self.frame.natoms())?;
        writeln!(
            f,
            "Lattice=\"{} 0.0 0.0 0.0 {} 0.0 0.0 0.0 {}\" Properties={PROPERTIES} name={} category={} energy={} pbc=\"T T T\"",
            lengths.x, lengths.y, lengths.z, self.name, self.category, Real(self.energy),
        )?;
        for atom in &self.frame.atoms {
            let [x, y, z] = atom.position.to_array();
            let [fx, fy, fz] = atom.force.to_array();
            writeln!(
                f,
                "{} {x:.8} {y:.8} {z:.8} {fx:.8} {fy:.8} {fz:.8}",
                atom.species
            )?;
        }
        Ok(())
    }
}

/// A real written the way extxyz readers expect a float key: always with a decimal point or an
/// exponent, so that `3.0` is not read back as the integer `3`.
///
/// Magnitudes below `1e-4` or from `1e16` up use an exponent of at least two digits.
struct Real(f64);

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = self.0;
        if x.is_nan() {
            return f.write_str("nan");
        }
        if x.is_infinite() {
            return f.write_str(if x < 0.0 { "-inf" } else { "inf" });
        }

        let sci = format!("{x:e}");
        if let Some((mantissa, exp)) = sci.split_once('e') {
            if let Ok(exp) = exp.parse::<i32>() {
                if !(-4..16).contains(&exp) {
                    let sign = if exp < 0 { '-' } else { '+' };
                    return write!(f, "{mantissa}e{sign}{:02}", exp.abs());
                }
            }
        }

        let plain = x.to_string();
        if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{plain}.0")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use glam::DVec3;

    use super::*;
    use crate::{AtomRecord, CellBounds};

    fn encoder() -> Encoder<'static> {
        Encoder::with_root(Path::new("./lammps"), "Amorphous_Bulk")
    }

    fn frame() -> Frame {
        let atom = |species: &str, x: f64, energy: f64| AtomRecord {
            species: Arc::from(species),
            position: DVec3::new(x, 0.5, -0.25),
            force: DVec3::new(-1.0, 1.0 / 3.0, 2e-9),
            energy,
        };
        Frame {
            timestep: 500,
            bounds: CellBounds::new((0.0, 10.0), (0.0, 5.0), (0.0, 2.0)),
            atoms: vec![atom("C", 1.0, 1.0), atom("Si", 2.0, 2.5), atom("C", 3.0, -0.5)],
        }
    }

    mod category {
        use super::*;

        #[test]
        fn at_root() {
            let path = PathBuf::from("./lammps/run-7.dump");
            assert_eq!(encoder().category(&path, 500), "run-7-500");
        }

        #[test]
        fn nested() {
            let path = PathBuf::from("./lammps/subdir/deeper/run-7.dump");
            assert_eq!(encoder().category(&path, 0), "subdir/deeper/run-7-0");
        }

        #[test]
        fn only_last_extension_is_stripped() {
            let path = PathBuf::from("./lammps/a/run.1.dump");
            assert_eq!(encoder().category(&path, 3), "a/run.1-3");
        }

        #[test]
        fn outside_root() {
            let path = PathBuf::from("/elsewhere/sub/run.dump");
            assert_eq!(encoder().category(&path, 100), "run-100");
        }
    }

    #[test]
    fn block_layout() {
        let path = PathBuf::from("./lammps/subdir/run-7.dump");
        let block = encoder().encode(&frame(), &path);
        assert_eq!(block.category, "subdir/run-7-500");
        assert_eq!(block.natoms, 3);
        assert_eq!(block.energy, 3.0);

        let lines: Vec<&str> = block.text.lines().collect();
        assert_eq!(lines.len(), 2 + 3);
        assert_eq!(lines[0], "3");
        assert_eq!(
            lines[1],
            "Lattice=\"10 0.0 0.0 0.0 5 0.0 0.0 0.0 2\" \
             Properties=species:S:1:pos:R:3:forces:R:3 name=Amorphous_Bulk \
             category=subdir/run-7-500 energy=3.0 pbc=\"T T T\""
        );
        assert_eq!(
            lines[2],
            "C 1.00000000 0.50000000 -0.25000000 -1.00000000 0.33333333 0.00000000"
        );
        assert!(lines[3].starts_with("Si 2.00000000 "));
        assert!(lines[4].starts_with("C 3.00000000 "));
        assert!(block.text.ends_with('\n'));
        assert_eq!(block.to_string(), block.text);
    }

    #[test]
    fn empty_frame() {
        let frame = Frame::default();
        let block = encoder().encode(&frame, Path::new("./lammps/empty.dump"));
        assert_eq!(block.text.lines().count(), 2);
        assert!(block.text.starts_with("0\nLattice=\"0 0.0 0.0 0.0 0 0.0 0.0 0.0 0\""));
        assert!(block.text.contains(" energy=0.0 "));
    }

    #[test]
    fn non_integral_values() {
        let mut frame = frame();
        frame.bounds = CellBounds::new((-1.25, 10.0), (0.0, 5.5), (1.0, 0.0));
        frame.atoms.truncate(1);
        frame.atoms[0].energy = 0.1;
        let block = encoder().encode(&frame, Path::new("./lammps/x.dump"));
        assert!(block
            .text
            .contains("Lattice=\"11.25 0.0 0.0 0.0 5.5 0.0 0.0 0.0 -1\""));
        assert!(block.text.contains(" energy=0.1 "));
    }

    #[test]
    fn energy_keeps_float_form() {
        let cases = [
            (3.0, "3.0"),
            (-0.5, "-0.5"),
            (0.0, "0.0"),
            (-0.0, "-0.0"),
            (0.0001, "0.0001"),
            (1e15, "1000000000000000.0"),
            (123456789012345.6, "123456789012345.6"),
            (1e16, "1e+16"),
            (1.5e-5, "1.5e-05"),
            (-2.5e-7, "-2.5e-07"),
            (1.2345e300, "1.2345e+300"),
            (f64::INFINITY, "inf"),
            (f64::NAN, "nan"),
        ];
        for (value, expected) in cases {
            assert_eq!(Real(value).to_string(), expected, "formatting {value:?}");
        }
    }

    #[test]
    fn large_energy_in_block() {
        let mut frame = frame();
        frame.atoms.truncate(1);
        frame.atoms[0].energy = -3.5e17;
        let block = encoder().encode(&frame, Path::new("./lammps/x.dump"));
        assert!(block.text.contains(" energy=-3.5e+17 "));
        // Lattice lengths keep their plain form.
        assert!(block.text.contains("Lattice=\"10 0.0 0.0 0.0 5 0.0 0.0 0.0 2\""));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn parse_atom_line(line: &str) -> (String, [f64; 6]) {
            let mut fields = line.split(' ');
            let species = fields.next().unwrap().to_string();
            let values: Vec<f64> = fields.map(|f| f.parse().unwrap()).collect();
            (species, values.try_into().unwrap())
        }

        proptest! {
            #[test]
            fn block_reproduces_frame(
                values in prop::collection::vec(prop::array::uniform6(-1e4f64..1e4), 0..20),
            ) {
                let frame = Frame {
                    timestep: 7,
                    bounds: CellBounds::new((0.0, 1.0), (0.0, 1.0), (0.0, 1.0)),
                    atoms: values
                        .iter()
                        .map(|v| AtomRecord {
                            species: Arc::from("O"),
                            position: DVec3::new(v[0], v[1], v[2]),
                            force: DVec3::new(v[3], v[4], v[5]),
                            energy: 0.0,
                        })
                        .collect(),
                };
                let block = encoder().encode(&frame, Path::new("./lammps/p.dump"));
                let mut lines = block.text.lines();
                let natoms: usize = lines.next().unwrap().parse().unwrap();
                prop_assert_eq!(natoms, frame.natoms());
                lines.next();
                for (line, atom) in lines.zip(&frame.atoms) {
                    let (species, parsed) = parse_atom_line(line);
                    prop_assert_eq!(species.as_str(), "O");
                    let expected = [atom.position.to_array(), atom.force.to_array()].concat();
                    for (got, want) in parsed.iter().zip(expected) {
                        prop_assert!((got - want).abs() <= 1e-8);
                    }
                }
            }
        }
    }
}
