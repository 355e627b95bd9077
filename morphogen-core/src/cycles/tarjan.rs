//! Strongly connected components (Tarjan).
//!
//! Johnson's search needs, at each step, the strongly connected component
//! containing the lowest vertex of the subgraph induced by `{from, .., n-1}`.
//! This module computes exactly that with a single-pass Tarjan DFS.

/// Per-search state. Indices are dense vertex numbers `0..n`.
struct TarjanState<'a> {
    adjacency: &'a [Vec<usize>],
    from: usize,

    /// DFS preorder index, `None` while unvisited.
    number: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    counter: usize,
    components: Vec<Vec<usize>>,
}

impl<'a> TarjanState<'a> {
    fn new(adjacency: &'a [Vec<usize>], from: usize) -> Self {
        let n = adjacency.len();
        Self {
            adjacency,
            from,
            number: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            counter: 0,
            components: Vec::new(),
        }
    }

    fn connect(&mut self, v: usize) {
        self.number[v] = Some(self.counter);
        self.lowlink[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;

        let adjacency = self.adjacency;
        for &w in &adjacency[v] {
            if w < self.from {
                continue;
            }
            match self.number[w] {
                None => {
                    self.connect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(number_w) if self.on_stack[w] => {
                    self.lowlink[v] = self.lowlink[v].min(number_w);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.number[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }

    /// A component is a cycle carrier if it has several vertices or a self-loop.
    fn is_nontrivial(&self, component: &[usize]) -> bool {
        match component {
            [single] => self.adjacency[*single].contains(single),
            _ => true,
        }
    }
}

/// Find the non-trivial SCC of the subgraph induced by vertices `>= from`
/// that holds the lowest vertex index among all such SCCs.
///
/// Returns the component's vertices in ascending order, or `None` when the
/// induced subgraph is acyclic.
pub(crate) fn lowest_component(adjacency: &[Vec<usize>], from: usize) -> Option<Vec<usize>> {
    let mut state = TarjanState::new(adjacency, from);
    for v in from..adjacency.len() {
        if state.number[v].is_none() {
            state.connect(v);
        }
    }

    let components = std::mem::take(&mut state.components);
    components
        .into_iter()
        .filter(|component| state.is_nontrivial(component))
        .map(|mut component| {
            component.sort_unstable();
            component
        })
        .min_by_key(|component| component[0])
}
