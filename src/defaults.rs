use std::num::NonZeroU64;

// config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "dumpxyz.toml";
// directory searched for dump files
pub const INPUT_DIR: &str = "./lammps";
// extended xyz file all selected frames are written to
pub const OUTPUT_FILE: &str = "all_per100.extxyz";
// suffix a file needs to be picked up as a dump
pub const DUMP_SUFFIX: &str = ".dump";
// value of the `name` key in every block
pub const DATASET_NAME: &str = "Amorphous_Bulk";
// spacing between selected timesteps
pub const TIMESTEP_STRIDE: NonZeroU64 = match NonZeroU64::new(100) {
    Some(stride) => stride,
    None => unreachable!(),
};
// last timestep that may be selected (inclusive)
pub const MAX_TIMESTEP: u64 = 100_000;
// species written for atom types missing from the type map
pub const UNMAPPED_SPECIES: &str = "X";
// type token to species, as written by the default simulation setup
pub const ATOM_TYPE_MAP: [(&str, &str); 3] = [("1", "C"), ("2", "Si"), ("3", "O")];

// ATOMS columns as in `ITEM: ATOMS id type x y z vx vy vz fx fy fz c_pe`
pub const TYPE_COLUMN: usize = 1;
pub const POSITION_COLUMN: usize = 2;
pub const FORCE_COLUMN: usize = 8;
pub const ENERGY_COLUMN: usize = 11;
