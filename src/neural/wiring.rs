//! Genome to neural net compiler.
//!
//! Compilation runs in five steps:
//! 1. Reduce every gene's indices modulo the live sensor, action and
//!    neuron counts, so a genome stays meaningful whatever is enabled.
//! 2. Tally, per referenced neuron, its outputs and its inputs.
//! 3. Cull neurons that feed nothing but themselves, to a fixed point.
//! 4. Renumber the survivors densely from zero in index order.
//! 5. Emit neuron-sink and action-sink connections as two lists.

use super::network::{Connection, NeuralNet, Neuron, Sink, Source, INITIAL_NEURON_OUTPUT};
use crate::genetics::{Genome, SinkKind, SourceKind};
use std::collections::BTreeMap;

/// Cardinalities the genome indices are reduced against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WiringLimits {
    pub num_sensors: usize,
    pub num_actions: usize,
    pub max_neurons: usize,
}

/// Per-neuron tallies gathered before culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct NodeStats {
    outputs: usize,
    self_inputs: usize,
    other_inputs: usize,
}

/// Compiles `genome` into a runnable net.
///
/// # Panics
///
/// Panics if any limit is zero.
pub fn compile(genome: &Genome, limits: &WiringLimits) -> NeuralNet {
    assert!(
        limits.num_sensors > 0 && limits.num_actions > 0 && limits.max_neurons > 0,
        "wiring limits must be non-zero: {:?}",
        limits
    );

    let mut edges = renumber(genome, limits);
    let mut nodes = tally(&edges);
    cull_useless_neurons(&mut edges, &mut nodes);

    let remap: BTreeMap<usize, usize> = nodes.keys().enumerate().map(|(new, &old)| (old, new)).collect();
    let remapped = |old: usize| match remap.get(&old) {
        Some(&new) => new,
        None => unreachable!("culled neuron {} still has outgoing connections", old),
    };
    let map_source = |source: Source| match source {
        Source::Neuron(n) => Source::Neuron(remapped(n)),
        sensor => sensor,
    };

    let mut neuron_connections = Vec::new();
    let mut action_connections = Vec::new();
    for edge in &edges {
        match edge.sink {
            Sink::Neuron(n) => neuron_connections.push(Connection {
                source: map_source(edge.source),
                sink: Sink::Neuron(remapped(n)),
                weight: edge.weight,
            }),
            Sink::Action(_) => action_connections.push(Connection {
                source: map_source(edge.source),
                ..*edge
            }),
        }
    }

    let neurons = nodes
        .values()
        .map(|stats| {
            assert!(stats.outputs != 0, "neuron with no outputs survived culling");
            Neuron {
                output: INITIAL_NEURON_OUTPUT,
                driven: stats.other_inputs != 0,
            }
        })
        .collect();

    NeuralNet::from_parts(neuron_connections, action_connections, neurons)
}

fn renumber(genome: &Genome, limits: &WiringLimits) -> Vec<Connection> {
    genome
        .iter()
        .map(|gene| {
            let source_num = gene.source_num as usize;
            let sink_num = gene.sink_num as usize;
            Connection {
                source: match gene.source_kind {
                    SourceKind::Neuron => Source::Neuron(source_num % limits.max_neurons),
                    SourceKind::Sensor => Source::Sensor(source_num % limits.num_sensors),
                },
                sink: match gene.sink_kind {
                    SinkKind::Neuron => Sink::Neuron(sink_num % limits.max_neurons),
                    SinkKind::Action => Sink::Action(sink_num % limits.num_actions),
                },
                weight: gene.weight,
            }
        })
        .collect()
}

fn tally(edges: &[Connection]) -> BTreeMap<usize, NodeStats> {
    let mut nodes: BTreeMap<usize, NodeStats> = BTreeMap::new();
    for edge in edges {
        if let Sink::Neuron(sink) = edge.sink {
            let stats = nodes.entry(sink).or_default();
            if edge.source == Source::Neuron(sink) {
                stats.self_inputs += 1;
            } else {
                stats.other_inputs += 1;
            }
        }
        if let Source::Neuron(source) = edge.source {
            nodes.entry(source).or_default().outputs += 1;
        }
    }
    nodes
}

/// Removes neurons whose outputs all loop back to themselves (including
/// neurons with no outputs) along with every connection into them.
/// Removing one neuron can orphan its feeders, so this repeats until
/// nothing changes.
fn cull_useless_neurons(edges: &mut Vec<Connection>, nodes: &mut BTreeMap<usize, NodeStats>) {
    while let Some(useless) = nodes
        .iter()
        .find(|(_, stats)| stats.outputs == stats.self_inputs)
        .map(|(&n, _)| n)
    {
        edges.retain(|edge| {
            if edge.sink != Sink::Neuron(useless) {
                return true;
            }
            if let Source::Neuron(source) = edge.source {
                if let Some(stats) = nodes.get_mut(&source) {
                    stats.outputs -= 1;
                }
            }
            false
        });
        nodes.remove(&useless);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::Gene;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const LIMITS: WiringLimits = WiringLimits {
        num_sensors: 21,
        num_actions: 17,
        max_neurons: 5,
    };

    fn gene(src: SourceKind, src_num: u8, sink: SinkKind, sink_num: u8) -> Gene {
        Gene::new(src, src_num, sink, sink_num, 8192)
    }

    /// Re-encodes a compiled net as a genome whose indices are already
    /// reduced and dense.
    fn to_genome(net: &NeuralNet) -> Genome {
        net.connections()
            .map(|c| {
                let (source_kind, source_num) = match c.source {
                    Source::Sensor(s) => (SourceKind::Sensor, s as u8),
                    Source::Neuron(n) => (SourceKind::Neuron, n as u8),
                };
                let (sink_kind, sink_num) = match c.sink {
                    Sink::Neuron(n) => (SinkKind::Neuron, n as u8),
                    Sink::Action(a) => (SinkKind::Action, a as u8),
                };
                Gene::new(source_kind, source_num, sink_kind, sink_num, c.weight)
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_indices_reduced_modulo_cardinality() {
        let genome: Genome = vec![gene(SourceKind::Sensor, 21 + 3, SinkKind::Action, 17 + 9)].into();
        let net = compile(&genome, &LIMITS);
        assert_eq!(
            net.action_connections(),
            &[Connection {
                source: Source::Sensor(3),
                sink: Sink::Action(9),
                weight: 8192
            }]
        );
        assert!(net.neurons().is_empty());
    }

    #[test]
    fn test_self_feeding_neuron_is_culled() {
        let genome: Genome = vec![
            gene(SourceKind::Sensor, 0, SinkKind::Neuron, 1),
            gene(SourceKind::Neuron, 1, SinkKind::Neuron, 1),
        ]
        .into();
        let net = compile(&genome, &LIMITS);
        assert!(net.is_empty());
        assert!(net.neurons().is_empty());
    }

    #[test]
    fn test_cull_cascades() {
        // N0 feeds only N1, N1 feeds nothing: both go.
        let genome: Genome = vec![
            gene(SourceKind::Sensor, 2, SinkKind::Neuron, 0),
            gene(SourceKind::Neuron, 0, SinkKind::Neuron, 1),
            gene(SourceKind::Sensor, 4, SinkKind::Action, 2),
        ]
        .into();
        let net = compile(&genome, &LIMITS);
        assert_eq!(net.connection_count(), 1);
        assert!(net.neuron_connections().is_empty());
    }

    #[test]
    fn test_survivors_renumbered_densely() {
        let genome: Genome = vec![
            gene(SourceKind::Neuron, 4, SinkKind::Action, 0),
            gene(SourceKind::Sensor, 1, SinkKind::Neuron, 4),
            gene(SourceKind::Neuron, 2, SinkKind::Action, 1),
        ]
        .into();
        let net = compile(&genome, &LIMITS);
        assert_eq!(net.neurons().len(), 2);
        assert_eq!(net.neuron_connections()[0].sink, Sink::Neuron(1));
        assert_eq!(net.action_connections()[0].source, Source::Neuron(1));
        assert_eq!(net.action_connections()[1].source, Source::Neuron(0));
        // N2 has no inputs and becomes a constant bias; N4 is driven.
        assert!(!net.neurons()[0].driven);
        assert!(net.neurons()[1].driven);
        assert!(net.neurons().iter().all(|n| n.output == INITIAL_NEURON_OUTPUT));
    }

    #[test]
    fn test_self_input_does_not_drive() {
        let genome: Genome = vec![
            gene(SourceKind::Neuron, 3, SinkKind::Neuron, 3),
            gene(SourceKind::Neuron, 3, SinkKind::Action, 5),
        ]
        .into();
        let net = compile(&genome, &LIMITS);
        assert_eq!(net.neurons().len(), 1);
        assert!(!net.neurons()[0].driven);
    }

    #[test]
    fn test_neuron_connections_precede_action_connections() {
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        for _ in 0..200 {
            let genome = Genome::random(1, 40, &mut rng);
            let net = compile(&genome, &LIMITS);
            let first_action = net.connections().position(|c| matches!(c.sink, Sink::Action(_)));
            if let Some(boundary) = first_action {
                assert!(net.connections().skip(boundary).all(|c| matches!(c.sink, Sink::Action(_))));
            }
        }
    }

    #[test]
    fn test_culling_is_a_fixed_point() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let genome = Genome::random(1, 40, &mut rng);
            let net = compile(&genome, &LIMITS);
            let recompiled = compile(&to_genome(&net), &LIMITS);
            assert_eq!(net, recompiled);
        }
    }

    #[test]
    fn test_every_surviving_neuron_has_outputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(43);
        for _ in 0..200 {
            let genome = Genome::random(1, 40, &mut rng);
            let net = compile(&genome, &LIMITS);
            for n in 0..net.neurons().len() {
                assert!(net.connections().any(|c| c.source == Source::Neuron(n) && c.sink != Sink::Neuron(n)));
            }
        }
    }
}
