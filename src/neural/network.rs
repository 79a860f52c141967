//! Compiled neural wiring and its recurrent feed-forward pass.

use crate::genetics::gene::WEIGHT_SCALE;

/// Output every neuron starts with at birth.
pub const INITIAL_NEURON_OUTPUT: f32 = 0.5;

/// Input side of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Sensor(usize),
    Neuron(usize),
}

/// Output side of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    Neuron(usize),
    Action(usize),
}

/// A renumbered gene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub source: Source,
    pub sink: Sink,
    pub weight: i16,
}

impl Connection {
    pub fn weight_as_float(&self) -> f32 {
        self.weight as f32 / WEIGHT_SCALE
    }
}

/// Internal neuron with recurrent state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neuron {
    /// Latched output, read by connections on the next pass.
    pub output: f32,
    /// Undriven neurons keep their birth output as a constant bias.
    pub driven: bool,
}

/// A peep's brain: connections split by sink kind plus neuron state.
///
/// Keeping the two connection lists separate is what lets
/// [`NeuralNet::feed_forward`] latch neuron outputs exactly once, between
/// the neuron pass and the action pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeuralNet {
    neuron_connections: Vec<Connection>,
    action_connections: Vec<Connection>,
    neurons: Vec<Neuron>,
}

impl NeuralNet {
    /// Assembles a net from pre-partitioned connection lists.
    ///
    /// # Panics
    ///
    /// Panics if a list holds a connection of the wrong sink kind or a
    /// neuron index is out of range.
    pub fn from_parts(
        neuron_connections: Vec<Connection>,
        action_connections: Vec<Connection>,
        neurons: Vec<Neuron>,
    ) -> Self {
        let in_range = |source: Source| match source {
            Source::Neuron(n) => n < neurons.len(),
            Source::Sensor(_) => true,
        };
        for conn in &neuron_connections {
            assert!(
                matches!(conn.sink, Sink::Neuron(n) if n < neurons.len()),
                "neuron pass holds a non-neuron sink: {:?}",
                conn
            );
            assert!(in_range(conn.source), "dangling neuron source: {:?}", conn);
        }
        for conn in &action_connections {
            assert!(matches!(conn.sink, Sink::Action(_)), "action pass holds a neuron sink: {:?}", conn);
            assert!(in_range(conn.source), "dangling neuron source: {:?}", conn);
        }
        Self {
            neuron_connections,
            action_connections,
            neurons,
        }
    }

    /// All connections in evaluation order: neuron sinks, then action sinks.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.neuron_connections.iter().chain(self.action_connections.iter())
    }

    pub fn neuron_connections(&self) -> &[Connection] {
        &self.neuron_connections
    }

    pub fn action_connections(&self) -> &[Connection] {
        &self.action_connections
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn connection_count(&self) -> usize {
        self.neuron_connections.len() + self.action_connections.len()
    }

    /// True when the genome compiled to nothing usable.
    pub fn is_empty(&self) -> bool {
        self.connection_count() == 0
    }

    /// One pass through the net.
    ///
    /// Neuron inputs are summed first, using sensor readings and the
    /// previous pass's neuron outputs. Driven neurons then latch
    /// `tanh(sum)`, and the action pass reads those fresh outputs. Action
    /// levels come back unsquashed.
    pub fn feed_forward<F>(&mut self, num_actions: usize, mut sense: F) -> Vec<f32>
    where
        F: FnMut(usize) -> f32,
    {
        let mut action_levels = vec![0.0f32; num_actions];
        let mut accumulators = vec![0.0f32; self.neurons.len()];

        for conn in &self.neuron_connections {
            let input = match conn.source {
                Source::Sensor(s) => sense(s),
                Source::Neuron(n) => self.neurons[n].output,
            };
            if let Sink::Neuron(n) = conn.sink {
                accumulators[n] += input * conn.weight_as_float();
            }
        }

        if self.action_connections.is_empty() {
            return action_levels;
        }

        for (neuron, sum) in self.neurons.iter_mut().zip(&accumulators) {
            if neuron.driven {
                neuron.output = sum.tanh();
            }
        }

        for conn in &self.action_connections {
            let input = match conn.source {
                Source::Sensor(s) => sense(s),
                Source::Neuron(n) => self.neurons[n].output,
            };
            if let Sink::Action(a) = conn.sink {
                action_levels[a] += input * conn.weight_as_float();
            }
        }
        action_levels
    }
}
