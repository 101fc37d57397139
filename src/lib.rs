//! This crate provides an interface for configuring and operating groups of
//! multi-module pixel detectors and their data receiver.
//!
//! The facade wraps a lower-level multi-module control library, represented
//! by the traits in [`client`]. It translates stable text tokens (DAC names,
//! network parameter names, readout flags, settings, timing modes) into the
//! protocol ids of the control servers, replaces the library's
//! sentinel-argument read/write primitives with paired `get_*`/`set_*`
//! operations, and turns its cumulative error-mask register into ordinary
//! `Result` values.
//!
//! Detector systems this was written against:
//! * single-module and multi-module Eiger-class groups
//! * Jungfrau-class groups (register access, chip power)
//!
//! All operations are synchronous and block until the hardware round-trip
//! completes. One [`detector::Detector`] owns its group exclusively; callers
//! must serialize access to a group (single owning thread or an external
//! mutex), because the error-mask register is read-then-cleared state shared
//! by every call. The server and receiver locks only lock the remote side to
//! this client.
//!
//! Times cross this API as `i64` nanoseconds, temperatures as degrees
//! Celsius, module indices as 0-based `usize`.

pub mod client;
pub mod detector;
pub mod error;
pub mod ids;
mod pulse;
mod scaling;

#[cfg(test)]
mod mock_client;
