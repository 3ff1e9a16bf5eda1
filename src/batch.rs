//! Running the scanner and encoder over a whole directory of dumps.
//!
//! Every file is scanned on its own worker. The blocks of each file are collected in full and
//! written in discovery order once all files are done, so the output never interleaves frames of
//! different files.
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::config::{Config, ErrorPolicy};
use crate::encoder::{Encoder, OutputBlock};
use crate::error::BatchError;
use crate::scanner::DumpScanner;

/// Everything produced from a single dump.
#[derive(Debug, Clone)]
pub struct FileOutput {
    pub path: PathBuf,
    /// Rendered blocks, in the order their frames appear in the dump.
    pub blocks: Vec<OutputBlock>,
    pub frames_skipped: usize,
    /// Atom type tokens that had no species in the type map.
    pub unmapped: BTreeSet<String>,
}

/// What a finished run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub failed: usize,
    pub frames: usize,
    /// `None` if nothing was written because no dumps were found.
    pub output: Option<PathBuf>,
}

/// Recursively find all files below `root` whose name ends in `suffix`.
///
/// The paths are sorted so the order of a run does not depend on the file system.
pub fn discover(root: &Path, suffix: &str) -> Result<Vec<PathBuf>, BatchError> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| BatchError::Discover {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| BatchError::Discover {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| BatchError::Discover {
                path: path.clone(),
                source,
            })?;
            if file_type.is_dir() {
                pending.push(path);
            } else if entry.file_name().to_string_lossy().ends_with(suffix) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Scan one dump and render its selected frames.
pub fn process_file(path: &Path, config: &Config) -> Result<FileOutput, BatchError> {
    let encoder = Encoder::new(config);
    let mut scanner = DumpScanner::open(path, config).map_err(|source| BatchError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut blocks = Vec::new();
    while let Some(frame) = scanner.next_frame()? {
        blocks.push(encoder.encode(&frame, path));
    }

    debug!(
        "{}: {} frames selected, {} skipped",
        path.display(),
        scanner.frames_selected(),
        scanner.frames_skipped()
    );
    Ok(FileOutput {
        path: path.to_path_buf(),
        blocks,
        frames_skipped: scanner.frames_skipped(),
        unmapped: scanner.unmapped_types().clone(),
    })
}

/// Process `paths` in parallel, one task per file.
///
/// The results are in the same order as `paths`. A failure in one file does not affect the
/// others.
pub fn process_files(
    paths: &[PathBuf],
    config: &Config,
) -> Result<Vec<Result<FileOutput, BatchError>>, BatchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.unwrap_or(0))
        .build()?;
    Ok(pool.install(|| {
        paths
            .par_iter()
            .map(|path| process_file(path, config))
            .collect()
    }))
}

/// Write the blocks of `outputs` one after the other. Returns the number of blocks written.
pub fn write_blocks<'a, W: Write>(
    writer: &mut W,
    outputs: impl IntoIterator<Item = &'a FileOutput>,
) -> io::Result<usize> {
    let mut n = 0;
    for output in outputs {
        for block in &output.blocks {
            writer.write_all(block.text.as_bytes())?;
            n += 1;
        }
    }
    writer.flush()?;
    Ok(n)
}

/// Gather all selected frames below `config.input_dir` into `config.output`.
pub fn run(config: &Config) -> Result<Summary, BatchError> {
    if config.type_map.is_empty() {
        warn!("the type map is empty, every atom will be written as an unmapped species");
    }

    let paths = discover(&config.input_dir, &config.suffix)?;
    if paths.is_empty() {
        warn!(
            "no {} files found in {} and its subdirectories",
            config.suffix,
            config.input_dir.display()
        );
        return Ok(Summary::default());
    }
    info!("found {} {} files, starting processing", paths.len(), config.suffix);
    info!("using atom type mapping: {}", config.type_map);

    let mut outputs = Vec::with_capacity(paths.len());
    let mut failed = 0;
    for result in process_files(&paths, config)? {
        match result {
            Ok(output) => {
                if !output.unmapped.is_empty() {
                    let tokens: Vec<&str> = output.unmapped.iter().map(String::as_str).collect();
                    warn!(
                        "{}: atom types without a species: {}",
                        output.path.display(),
                        tokens.join(", ")
                    );
                }
                outputs.push(output);
            }
            Err(err) => match config.on_error {
                ErrorPolicy::Abort => return Err(err),
                ErrorPolicy::Skip => {
                    error!("skipping file: {err}");
                    failed += 1;
                }
            },
        }
    }

    let write_err = |source| BatchError::Write {
        path: config.output.clone(),
        source,
    };
    let file = File::create(&config.output).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let frames = write_blocks(&mut writer, &outputs).map_err(write_err)?;

    info!(
        "processed {} files, {} frames saved to {}",
        paths.len() - failed,
        frames,
        config.output.display()
    );
    Ok(Summary {
        files: paths.len(),
        failed,
        frames,
        output: Some(config.output.clone()),
    })
}
