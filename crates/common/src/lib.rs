//! Common utilities shared across Perimeter components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (unverified header decoding, claim timestamp
/// validation, size and clock-skew constants)
pub mod jwt;
