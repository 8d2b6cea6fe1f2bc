//! lift-emu library
//!
//! Emulation of a microprogrammed elevator controller: a sequential network
//! interpreting 16-bit instruction words, a condition selector feeding it,
//! and an emulated lift closing the loop.

pub mod config;
pub mod lift;
pub mod seqnet;
pub mod testing;
pub mod version;
