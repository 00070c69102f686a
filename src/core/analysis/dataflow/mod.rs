//! Forward dataflow over graphs with unreachable nodes.
//!
//! Only nodes reachable from the entry ever carry a state; everything else
//! stays `None`. The join therefore never sees an "unreachable" placeholder
//! and analyses need no artificial bottom element. The initialization flow in
//! `core::flow` builds on this.

use std::collections::VecDeque;

pub trait DataflowGraph {
    type Node: Copy + Eq;

    fn num_nodes(&self) -> usize;
    fn index(&self, node: Self::Node) -> usize;
    fn preds(&self, node: Self::Node) -> &[Self::Node];
    fn succs(&self, node: Self::Node) -> &[Self::Node];
}

/// Per-node states indexed by `DataflowGraph::index`. `None` marks a node no
/// path from the entry reaches.
#[derive(Debug, Clone)]
pub struct DataflowResult<T> {
    pub in_map: Vec<Option<T>>,
    pub out_map: Vec<Option<T>>,
}

impl<T> DataflowResult<T> {
    pub fn state_in(&self, idx: usize) -> Option<&T> {
        self.in_map.get(idx).and_then(Option::as_ref)
    }
}

/// Propagates `entry_state` from `entry_node` until no state changes.
///
/// A node's in-state is the `join` of its reachable predecessors' out-states;
/// the entry always starts from `entry_state`. `join` must be monotone for the
/// iteration to terminate.
pub fn solve_forward<T, G, FJoin, FTransfer>(
    graph: &G,
    entry_node: G::Node,
    entry_state: T,
    join: FJoin,
    transfer: FTransfer,
) -> DataflowResult<T>
where
    T: Clone + PartialEq,
    G: DataflowGraph,
    FJoin: Fn(&T, &T) -> T,
    FTransfer: Fn(G::Node, &T) -> T,
{
    let num_nodes = graph.num_nodes();
    let mut in_map: Vec<Option<T>> = vec![None; num_nodes];
    let mut out_map: Vec<Option<T>> = vec![None; num_nodes];
    let mut queued = vec![false; num_nodes];
    let mut worklist = VecDeque::from([entry_node]);
    queued[graph.index(entry_node)] = true;

    while let Some(node) = worklist.pop_front() {
        let idx = graph.index(node);
        queued[idx] = false;

        let in_state = if node == entry_node {
            Some(entry_state.clone())
        } else {
            graph
                .preds(node)
                .iter()
                .filter_map(|pred| out_map[graph.index(*pred)].as_ref())
                .fold(None, |acc: Option<T>, state| match acc {
                    None => Some(state.clone()),
                    Some(acc) => Some(join(&acc, state)),
                })
        };
        let Some(in_state) = in_state else {
            continue;
        };
        if in_map[idx].as_ref() == Some(&in_state) {
            continue;
        }

        out_map[idx] = Some(transfer(node, &in_state));
        in_map[idx] = Some(in_state);

        for &succ in graph.succs(node) {
            let s_idx = graph.index(succ);
            if !queued[s_idx] {
                queued[s_idx] = true;
                worklist.push_back(succ);
            }
        }
    }

    DataflowResult { in_map, out_map }
}

#[cfg(test)]
#[path = "../../../tests/t_analysis_dataflow.rs"]
mod tests;
