//! Behind-the-meter microgrid simulator: PV, battery, backup generators
//! and a grid connection dispatched against a consumption profile.

pub mod cli;
pub mod config;
pub mod devices;
/// Profile loading and flow-table export.
pub mod io;
pub mod runner;
/// Dispatch engine, cost aggregation and energy summary.
pub mod sim;
pub mod synthetic;
