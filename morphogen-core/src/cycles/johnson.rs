//! Elementary circuits (Johnson).
//!
//! # Algorithm
//!
//! 1. Take the SCC holding the lowest vertex `s` of the subgraph induced by
//!    the vertices not yet used as a start ([`tarjan::lowest_component`]).
//! 2. Enumerate every circuit through `s` inside that SCC with a blocking
//!    DFS: a vertex stays blocked until a circuit is found through it, and
//!    the `B` lists record who to unblock transitively when that happens.
//! 3. Continue from `s + 1` until no cyclic component remains.
//!
//! Each circuit is reported exactly once, rooted at its lowest vertex.

use super::tarjan;

/// Mutable state for the circuit search from one start vertex.
struct SearchContext {
    start: usize,

    /// Adjacency restricted to the current component.
    adjacency: Vec<Vec<usize>>,
    blocked: Vec<bool>,
    block_map: Vec<Vec<usize>>,
    stack: Vec<usize>,
    circuits: Vec<Vec<usize>>,
}

impl SearchContext {
    fn new(start: usize, adjacency: Vec<Vec<usize>>) -> Self {
        let n = adjacency.len();
        Self {
            start,
            adjacency,
            blocked: vec![false; n],
            block_map: vec![Vec::new(); n],
            stack: Vec::new(),
            circuits: Vec::new(),
        }
    }

    fn unblock(&mut self, u: usize) {
        self.blocked[u] = false;
        let waiting = std::mem::take(&mut self.block_map[u]);
        for w in waiting {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }

    fn circuit(&mut self, v: usize) -> bool {
        let mut found = false;
        self.stack.push(v);
        self.blocked[v] = true;

        for i in 0..self.adjacency[v].len() {
            let w = self.adjacency[v][i];
            if w == self.start {
                self.circuits.push(self.stack.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for i in 0..self.adjacency[v].len() {
                let w = self.adjacency[v][i];
                if !self.block_map[w].contains(&v) {
                    self.block_map[w].push(v);
                }
            }
        }

        self.stack.pop();
        found
    }
}

/// Every elementary circuit of the graph, as vertex sequences starting at
/// the circuit's lowest vertex.
pub(crate) fn elementary_circuits(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut circuits = Vec::new();
    let mut from = 0;

    while from < n {
        let Some(component) = tarjan::lowest_component(adjacency, from) else {
            break;
        };

        let mut member = vec![false; n];
        for &v in &component {
            member[v] = true;
        }
        let restricted: Vec<Vec<usize>> = (0..n)
            .map(|v| {
                if member[v] {
                    adjacency[v].iter().copied().filter(|w| member[*w]).collect()
                } else {
                    Vec::new()
                }
            })
            .collect();

        let start = component[0];
        let mut ctx = SearchContext::new(start, restricted);
        ctx.circuit(start);
        circuits.append(&mut ctx.circuits);

        from = start + 1;
    }

    circuits
}
