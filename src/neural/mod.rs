//! Neural network module for peep brains.
//!
//! Brains are small recurrent nets compiled from a genome at birth:
//! - Sensors and neurons feed neurons and actions
//! - Weights are fixed for life
//! - Neuron outputs carry over from one tick to the next

mod network;
mod wiring;

pub use network::{Connection, NeuralNet, Neuron, Sink, Source, INITIAL_NEURON_OUTPUT};
pub use wiring::{compile, WiringLimits};
