use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glam::DVec3;

use crate::config::{AtomLayout, Config};
use crate::error::ScanError;
use crate::reader::{first_field, LineReader};
use crate::selection::SamplingPolicy;
use crate::species::TypeMap;
use crate::{AtomRecord, CellBounds, Frame};

/// Any line containing this starts a frame.
pub const TIMESTEP_MARKER: &str = "ITEM: TIMESTEP";

/// Lines in a frame between the atom count line and the first atom line: the box bounds marker,
/// three bounds lines and the atoms header.
pub const LINES_AFTER_COUNT: u64 = 5;

/// Lines in a frame besides its atom lines, counting from the timestep marker.
pub const HEADER_LINES: u64 = 4 + LINES_AFTER_COUNT;

const MAX_PREALLOCATED_ATOMS: usize = 1 << 16;

/// Where the scanner is within a dump.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Looking for the next timestep marker.
    SeekingFrame,
    /// The timestep was read. Next up are the atom count marker and the atom count.
    ReadingHeader { timestep: i64, selected: bool },
    /// The frame is selected. Next up are the box bounds marker and the three bounds lines.
    ReadingBounds { timestep: u64, natoms: usize },
    /// The frame is selected. Next up are the atoms header and the atom lines.
    ReadingAtomsFull {
        timestep: u64,
        natoms: usize,
        bounds: CellBounds,
    },
    /// The frame is not selected. The rest of it is skipped line by line.
    ReadingAtomsSkip { remaining: u64 },
    /// The end of the stream was reached cleanly, or an error was returned.
    Done,
}

/// Scans a LAMMPS dump frame by frame, yielding the [`Frame`]s selected by a
/// [`SamplingPolicy`].
///
/// Frames that are not selected are skipped without parsing any of their lines. Selected frames
/// consume exactly the same lines as skipped frames would, so the scanner is always positioned
/// at a frame boundary after either.
///
/// The scanner is also an [`Iterator`] over `Result<Frame, ScanError>`. After the first error
/// it yields nothing more.
#[derive(Debug)]
pub struct DumpScanner<'c, R> {
    reader: LineReader<R>,
    path: PathBuf,
    sampling: &'c SamplingPolicy,
    type_map: &'c TypeMap,
    layout: &'c AtomLayout,
    state: State,
    selected: usize,
    skipped: usize,
    unmapped: BTreeSet<String>,
}

impl<'c> DumpScanner<'c, BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, config: &'c Config) -> io::Result<Self> {
        let file = File::open(&path)?;
        Ok(Self::new(BufReader::new(file), path.as_ref(), config))
    }
}

impl<'c, R: BufRead> DumpScanner<'c, R> {
    /// Create a new scanner over `reader`. The `path` is only used to report errors.
    pub fn new(reader: R, path: impl Into<PathBuf>, config: &'c Config) -> Self {
        Self {
            reader: LineReader::new(reader),
            path: path.into(),
            sampling: &config.sampling,
            type_map: &config.type_map,
            layout: &config.layout,
            state: State::SeekingFrame,
            selected: 0,
            skipped: 0,
            unmapped: BTreeSet::new(),
        }
    }

    /// Scan up to and including the next selected frame and return it.
    ///
    /// Returns `Ok(None)` once the stream ends outside of a frame.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ScanError> {
        loop {
            match self.step() {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) if self.state == State::Done => return Ok(None),
                Ok(None) => {}
                Err(err) => {
                    self.state = State::Done;
                    return Err(err);
                }
            }
        }
    }

    /// Perform a single state transition.
    fn step(&mut self) -> Result<Option<Frame>, ScanError> {
        self.state = match self.state {
            State::SeekingFrame => {
                if !self.reader.read_line().map_err(|e| self.io(e))? {
                    State::Done
                } else if self.reader.current().contains(TIMESTEP_MARKER) {
                    self.expect_line("the timestep")?;
                    let timestep: i64 = self.parse_first("the timestep")?;
                    State::ReadingHeader {
                        timestep,
                        selected: self.sampling.is_selected(timestep),
                    }
                } else {
                    State::SeekingFrame
                }
            }
            State::ReadingHeader { timestep, selected } => {
                self.skip_expected(1, "the number of atoms marker")?;
                self.expect_line("the number of atoms")?;
                let natoms: usize = self.parse_first("the number of atoms")?;
                match u64::try_from(timestep) {
                    Ok(timestep) if selected => State::ReadingBounds { timestep, natoms },
                    _ => {
                        let remaining = u64::try_from(natoms)
                            .ok()
                            .and_then(|n| n.checked_add(LINES_AFTER_COUNT))
                            .ok_or_else(|| self.parse_failure("the number of atoms"))?;
                        State::ReadingAtomsSkip { remaining }
                    }
                }
            }
            State::ReadingBounds { timestep, natoms } => {
                self.skip_expected(1, "the box bounds marker")?;
                let x = self.read_bounds()?;
                let y = self.read_bounds()?;
                let z = self.read_bounds()?;
                State::ReadingAtomsFull {
                    timestep,
                    natoms,
                    bounds: CellBounds::new(x, y, z),
                }
            }
            State::ReadingAtomsFull {
                timestep,
                natoms,
                bounds,
            } => {
                self.skip_expected(1, "the atoms header")?;
                // A corrupt count must not turn into a huge allocation up front.
                let mut atoms = Vec::with_capacity(natoms.min(MAX_PREALLOCATED_ATOMS));
                for _ in 0..natoms {
                    atoms.push(self.read_atom()?);
                }
                self.state = State::SeekingFrame;
                self.selected += 1;
                return Ok(Some(Frame {
                    timestep,
                    bounds,
                    atoms,
                }));
            }
            State::ReadingAtomsSkip { remaining } => {
                self.skip_expected(remaining, "the rest of a skipped frame")?;
                self.skipped += 1;
                State::SeekingFrame
            }
            State::Done => State::Done,
        };
        Ok(None)
    }

    /// The number of frames that were selected and parsed so far.
    pub fn frames_selected(&self) -> usize {
        self.selected
    }

    /// The number of frames that were skipped so far.
    pub fn frames_skipped(&self) -> usize {
        self.skipped
    }

    /// The number of lines consumed so far.
    pub fn lines_consumed(&self) -> u64 {
        self.reader.lineno()
    }

    /// The number of bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.reader.offset()
    }

    /// Atom type tokens that were encountered in selected frames but are not in the type map.
    pub fn unmapped_types(&self) -> &BTreeSet<String> {
        &self.unmapped
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_atom(&mut self) -> Result<AtomRecord, ScanError> {
        self.expect_line("an atom line")?;
        let layout = *self.layout;
        let fields: Vec<&str> = self.reader.current().split_ascii_whitespace().collect();
        if fields.len() < layout.min_fields() {
            return Err(self.malformed(format!(
                "an atom line needs at least {} fields, found {}",
                layout.min_fields(),
                fields.len()
            )));
        }

        let token = fields[layout.type_column];
        if self.type_map.get(token).is_none() && !self.unmapped.contains(token) {
            self.unmapped.insert(token.to_string());
        }
        let species = self.type_map.species(token);

        let position = self.parse_vec3(&fields, layout.position_column, "an atom position")?;
        let force = self.parse_vec3(&fields, layout.force_column, "an atom force")?;
        let energy = self.parse_field(fields[layout.energy_column], "an atom energy")?;

        Ok(AtomRecord {
            species,
            position,
            force,
            energy,
        })
    }

    fn read_bounds(&mut self) -> Result<(f64, f64), ScanError> {
        const EXPECTED: &str = "a pair of box bounds";
        self.expect_line(EXPECTED)?;
        let mut fields = self.reader.current().split_ascii_whitespace();
        let (Some(lo), Some(hi)) = (fields.next(), fields.next()) else {
            return Err(self.parse_failure(EXPECTED));
        };
        Ok((self.parse_field(lo, EXPECTED)?, self.parse_field(hi, EXPECTED)?))
    }

    fn parse_vec3(
        &self,
        fields: &[&str],
        start: usize,
        expected: &'static str,
    ) -> Result<DVec3, ScanError> {
        Ok(DVec3::new(
            self.parse_field(fields[start], expected)?,
            self.parse_field(fields[start + 1], expected)?,
            self.parse_field(fields[start + 2], expected)?,
        ))
    }

    fn parse_field<T: FromStr>(&self, field: &str, expected: &'static str) -> Result<T, ScanError> {
        field.parse().map_err(|_| self.parse_failure(expected))
    }

    /// Parse the first field of the current line.
    fn parse_first<T: FromStr>(&self, expected: &'static str) -> Result<T, ScanError> {
        let field = first_field(self.reader.current()).ok_or_else(|| self.parse_failure(expected))?;
        self.parse_field(field, expected)
    }

    /// Read the next line, treating the end of the stream as malformed input.
    fn expect_line(&mut self, expected: &str) -> Result<(), ScanError> {
        if self.reader.read_line().map_err(|e| self.io(e))? {
            Ok(())
        } else {
            Err(self.malformed(format!("stream ended while reading {expected}")))
        }
    }

    /// Skip `count` lines, treating the end of the stream as malformed input.
    fn skip_expected(&mut self, count: u64, expected: &str) -> Result<(), ScanError> {
        let skipped = self.reader.skip_lines(count).map_err(|e| self.io(e))?;
        if skipped < count {
            return Err(self.malformed(format!(
                "stream ended while reading {expected} ({} of {count} lines present)",
                skipped
            )));
        }
        Ok(())
    }

    fn malformed(&self, reason: String) -> ScanError {
        ScanError::MalformedInput {
            path: self.path.clone(),
            line: self.reader.lineno(),
            offset: self.reader.line_offset(),
            reason,
        }
    }

    fn parse_failure(&self, expected: &'static str) -> ScanError {
        ScanError::ParseFailure {
            path: self.path.clone(),
            line: self.reader.lineno(),
            expected,
            content: self.reader.current().to_string(),
        }
    }

    fn io(&self, source: io::Error) -> ScanError {
        ScanError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<'c, R: BufRead> Iterator for DumpScanner<'c, R> {
    type Item = Result<Frame, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl<'c, R: BufRead> std::iter::FusedIterator for DumpScanner<'c, R> {}

