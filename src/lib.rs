//! zfscmd - typed host-side control layer over the zfs command-line tool.

pub mod dataset;
pub mod exec;
