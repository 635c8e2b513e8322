//! Result reporting for duct flow runs.
//!
//! This crate provides the [`Reporter`] observer for the step loop of
//! [`venturi_solvers::transient`] and the pieces it is built from.
//!
//! # Modules
//!
//! - [`traits`]: Capability traits for run observers ([`CanStopEarly`])
//! - [`heatmap`]: PNG rendering of a 2D cut ([`Heatmap`], [`Colormap`])
//! - [`timer`]: Step timing, throughput and remaining time ([`Timer`])
//! - [`writer`]: CSV output of geometry and flow fields
//!
//! [`CanStopEarly`]: traits::CanStopEarly
//! [`Heatmap`]: heatmap::Heatmap
//! [`Colormap`]: heatmap::Colormap
//! [`Timer`]: timer::Timer

pub mod heatmap;
mod reporter;
pub mod timer;
pub mod traits;
pub mod writer;

pub use reporter::{Record, ReportError, Reporter};
