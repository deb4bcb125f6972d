//! Gateway module - admission control in front of the accelerator

pub mod admission;

pub use admission::{AdmissionGate, AdmissionPermit, GateSnapshot};
