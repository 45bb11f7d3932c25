//! PlayLedger - the economy layer of a casual mini-game collection
//!
//! Playing costs energy, energy recharges over time, gems buy refills, and
//! every completed activity pays points into a running total. PlayLedger
//! keeps those balances consistent across a device cache and an
//! authoritative remote record.
//!
//! ## Entry points
//!
//! 1. **Library**: [`economy::EconomyManager`] opens a [`economy::Session`],
//!    which exposes one method per game callback (start, complete, ad watched,
//!    purchase confirmed, challenge claimed, timer tick).
//!
//! 2. **CLI**: the `playledger` binary drives the same session from a terminal.

pub mod config;
pub mod economy;
