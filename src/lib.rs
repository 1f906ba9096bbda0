//! DMAIC: phase-gated improvement project workflow
//!
//! Projects move through Define, Measure, Analyze, Improve and Control.
//! Each phase collects structured artifacts, a gate checks them before the
//! project may advance, and quality and risk metrics are derived from what
//! has been recorded so far.

pub mod cli;
pub mod core;
pub mod entities;
