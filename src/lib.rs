#![cfg_attr(not(feature = "std"), no_std)]
//! Vectorised double-SHA-256 nonce search kernel for Bitcoin-style
//! proof-of-work mining.
//!
//! This crate is the hot-loop core only: it expects the caller to have
//! already built the block header, computed the first-round midstate, and
//! padded the second block (see [`SearchInputs`]). Given those four byte
//! buffers it exhaustively scans 32-bit nonces for one whose second-round
//! SHA-256 hash ends in a zero word — the necessary condition for a
//! mining-target match — and reports it back through a cooperative
//! progress/cancellation callback.
//!
//! Start at [`cpu::probe`] to pick a lane width, then call
//! [`search_simd128`] or [`search_simd256`].

pub mod constants;
pub mod cpu;
pub mod error;
pub mod lanes;
pub mod packer;
pub mod scalar;
pub mod search;
pub mod transform;

pub use cpu::{probe, CpuTier};
pub use error::{CoreError, Result};
pub use lanes::Lane;
pub use search::{search, search_simd128, search_simd256, Block, SearchInputs, SearchOutput, State};
