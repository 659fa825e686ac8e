//! dsprt-rs: Rust translation of DSP run-time library routines
//!
//! This crate provides idiomatic Rust implementations of the run-time
//! kernels behind a signal-processing block library, organized by the
//! original library's source families. The centerpiece is a complex
//! singular value decomposition over caller-owned, column-major
//! workspace buffers; around it sit the peer routines the same library
//! ships: block LMS adaptive filtering, two-channel polyphase filter
//! banks, in-place quicksorts, and persisted-state random sources.
//!
//! # Organization
//!
//! - `svd`: complex singular value decomposition (LINPACK-style
//!   implicit-QR iteration) plus an `ndarray` convenience wrapper
//! - `blms`: block LMS adaptive filter steps, real and complex
//! - `filterbank`: two-channel polyphase analysis/synthesis banks
//! - `qsrt`: quicksort by value and by index vector
//! - `randsrc`: uniform and Gaussian generators with caller-held state
//!
//! # Example
//!
//! ```
//! use dsprt_rs::svd::svd;
//! use ndarray::array;
//! use num_complex::Complex64;
//!
//! let a = array![
//!     [Complex64::new(3.0, 0.0)],
//!     [Complex64::new(4.0, 0.0)],
//! ];
//! let result = svd(&a, false).unwrap();
//! assert!((result.s[0] - 5.0).abs() < 1e-12);
//! ```

pub mod blms;
pub mod filterbank;
pub mod qsrt;
pub mod randsrc;
pub mod svd;
