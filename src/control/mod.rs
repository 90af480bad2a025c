//! Temperature regulation: the feedback loop and the power-to-delay curve
//! it drives through the phase controller.

pub mod pid;
pub mod power_curve;
