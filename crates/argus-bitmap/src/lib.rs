//! # argus-bitmap: Append-only bitmap with run-oriented iteration
//!
//! An identifier set is a virtual sequence of bits addressed `0..size`.
//! This crate stores that sequence as packed 64-bit blocks and exposes it
//! three ways:
//!
//! - random access and rank ([`Bitmap::get`], [`Bitmap::rank`])
//! - the bitwise combinators of a Boolean algebra
//! - run-oriented iteration ([`Bitmap::runs`]): the bitmap as a stream of
//!   [`Bits`] runs, where homogeneous stretches collapse into a single run
//!   regardless of length
//!
//! The run protocol is what makes selective batch reads cheap: a consumer
//! walking a query bitmap can skip an arbitrarily long all-zero stretch in
//! one step instead of probing every bit.

mod bitmap;
mod bits;
mod word;

pub use bitmap::{Bitmap, Ones, Runs};
pub use bits::Bits;
