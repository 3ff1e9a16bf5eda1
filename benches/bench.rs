use std::fmt::Write;
use std::num::NonZeroU64;
use std::path::Path;

use bencher::{benchmark_group, benchmark_main, Bencher};
use dumpxyz::{Config, DumpScanner, Encoder, Frame, SamplingPolicy};

benchmark_main!(scanning, encoding);
benchmark_group!(scanning, scan_sparse, scan_dense, scan_one_frame);
benchmark_group!(encoding, encode_frame);

const NFRAMES: i64 = 50;
const NATOMS: usize = 2000;
const PATH: &str = "./lammps/bench.dump";

/// A dump with frames at timesteps 0, 10, 20, ... in the default atom layout.
fn dump() -> String {
    let mut s = String::new();
    for frame in 0..NFRAMES {
        writeln!(s, "ITEM: TIMESTEP\n{}", frame * 10).unwrap();
        writeln!(s, "ITEM: NUMBER OF ATOMS\n{NATOMS}").unwrap();
        writeln!(s, "ITEM: BOX BOUNDS pp pp pp").unwrap();
        for _ in 0..3 {
            writeln!(s, "0.0000000000000000e+00 2.4000000000000000e+01").unwrap();
        }
        writeln!(s, "ITEM: ATOMS id type x y z vx vy vz fx fy fz c_pe").unwrap();
        for i in 0..NATOMS {
            let x = i as f64 * 0.01;
            writeln!(
                s,
                "{} {} {x} {:.5} 3.25 0.1 -0.2 0.3 -1.5e-2 {:.6} 0.75 -4.125",
                i + 1,
                i % 3 + 1,
                x * 0.5,
                x * 1e-3,
            )
            .unwrap();
        }
    }
    s
}

fn config(stride: u64, max_timestep: u64) -> Config {
    Config {
        sampling: SamplingPolicy::new(NonZeroU64::new(stride).unwrap(), max_timestep),
        ..Config::default()
    }
}

fn scan(b: &mut Bencher, config: &Config) {
    let text = dump();
    b.bytes = text.len() as u64;
    b.iter(|| {
        let scanner = DumpScanner::new(text.as_bytes(), PATH, config);
        scanner.map(|frame| frame.unwrap().natoms()).sum::<usize>()
    });
}

/// One in ten frames is parsed.
fn scan_sparse(b: &mut Bencher) {
    scan(b, &config(100, u64::MAX));
}

/// Every frame is parsed.
fn scan_dense(b: &mut Bencher) {
    scan(b, &config(1, u64::MAX));
}

/// Only the first frame is parsed.
fn scan_one_frame(b: &mut Bencher) {
    scan(b, &config(7, 0));
}

fn encode_frame(b: &mut Bencher) {
    let text = dump();
    let config = config(1, 0);
    let frame: Frame = DumpScanner::new(text.as_bytes(), PATH, &config)
        .next()
        .unwrap()
        .unwrap();
    let encoder = Encoder::new(&config);
    b.iter(|| encoder.encode(&frame, Path::new(PATH)).text.len());
}
