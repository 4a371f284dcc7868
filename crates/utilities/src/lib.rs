//! Backend-independent helpers shared by the unifs crates

pub mod glob;
