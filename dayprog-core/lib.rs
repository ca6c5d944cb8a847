//! Pure building blocks shared by the dayprog crates.

pub mod timestamp;
