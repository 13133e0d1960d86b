//! Two-terminal network reliability.
//!
//! A network is an undirected multigraph whose edges are components. The
//! system works when the working components connect `source` to `sink`.
//!
//! # Algorithm
//!
//! Connectivity of one component state is decided with a disjoint-set
//! forest (union by size, path halving), O(E·α(V)).
//!
//! - **Exact**: enumerate all 2ᴱ component states and sum the
//!   probabilities of the connected ones. Limited to
//!   [`MAX_EXACT_COMPONENTS`] components.
//! - **Monte Carlo**: sample component states independently and report
//!   the success fraction with its binomial standard error.

use rand::Rng;

use super::FailureRates;
use crate::error::{ModelError, Result};

/// Largest component count accepted by [`Network::exact_reliability`].
pub const MAX_EXACT_COMPONENTS: usize = 24;

/// Disjoint-set forest over network nodes.
struct Connectivity {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl Connectivity {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn root(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn join(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.root(a), self.root(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

/// Monte-Carlo reliability estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliabilityEstimate {
    pub reliability: f64,
    /// √(r(1−r)/trials)
    pub std_error: f64,
    pub successes: usize,
    pub trials: usize,
}

/// Undirected component network between a source and a sink node.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    nodes: usize,
    source: usize,
    sink: usize,
    components: Vec<(usize, usize)>,
}

impl Network {
    /// Creates an empty network over nodes `0..nodes`.
    pub fn new(nodes: usize, source: usize, sink: usize) -> Result<Self> {
        if nodes < 2 {
            return Err(ModelError::invalid("nodes", "a network needs at least two nodes"));
        }
        if source >= nodes || sink >= nodes || source == sink {
            return Err(ModelError::invalid(
                "terminals",
                format!("source {source} and sink {sink} must be distinct nodes below {nodes}"),
            ));
        }
        Ok(Self {
            nodes,
            source,
            sink,
            components: Vec::new(),
        })
    }

    /// Adds a component between nodes `a` and `b`; returns its index.
    pub fn add_component(&mut self, a: usize, b: usize) -> Result<usize> {
        if a >= self.nodes || b >= self.nodes {
            return Err(ModelError::invalid(
                "component",
                format!("endpoint ({a}, {b}) outside 0..{}", self.nodes),
            ));
        }
        self.components.push((a, b));
        Ok(self.components.len() - 1)
    }

    /// Builds a network from a component list.
    pub fn with_components(
        nodes: usize,
        source: usize,
        sink: usize,
        components: &[(usize, usize)],
    ) -> Result<Self> {
        let mut net = Self::new(nodes, source, sink)?;
        for &(a, b) in components {
            net.add_component(a, b)?;
        }
        Ok(net)
    }

    /// The five-component bridge: nodes S=0, A=1, B=2, T=3 with components
    /// S–A, A–T, S–B, B–T and the bridge A–B, in that order.
    pub fn bridge() -> Self {
        Self {
            nodes: 4,
            source: 0,
            sink: 3,
            components: vec![(0, 1), (1, 3), (0, 2), (2, 3), (1, 2)],
        }
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[(usize, usize)] {
        &self.components
    }

    /// Whether the given component states connect source and sink.
    ///
    /// `working[i]` is the state of component `i`.
    pub fn is_connected(&self, working: &[bool]) -> bool {
        let mut dsu = Connectivity::new(self.nodes);
        for (&(a, b), &up) in self.components.iter().zip(working) {
            if up {
                dsu.join(a, b);
            }
        }
        dsu.root(self.source) == dsu.root(self.sink)
    }

    /// Exact reliability by enumerating all component states.
    ///
    /// # Errors
    /// Rate validation errors from [`FailureRates::resolve`], and
    /// `InvalidParameter` beyond [`MAX_EXACT_COMPONENTS`] components.
    ///
    /// # Examples
    /// ```
    /// use u_modelkit::reliability::{FailureRates, Network};
    ///
    /// let r = Network::bridge()
    ///     .exact_reliability(&FailureRates::Uniform(0.1))
    ///     .unwrap();
    /// // 2r² + 2r³ − 5r⁴ + 2r⁵ with r = 0.9
    /// assert!((r - 0.97848).abs() < 1e-12);
    /// ```
    pub fn exact_reliability(&self, rates: &FailureRates) -> Result<f64> {
        let e = self.components.len();
        if e > MAX_EXACT_COMPONENTS {
            return Err(ModelError::invalid(
                "components",
                format!("{e} components exceed the exact limit of {MAX_EXACT_COMPONENTS}"),
            ));
        }
        if e == 0 {
            return Ok(0.0);
        }
        let fail = rates.resolve(e)?;
        let mut working = vec![false; e];
        let mut total = 0.0;
        for mask in 0u32..(1u32 << e) {
            let mut prob = 1.0;
            for (i, state) in working.iter_mut().enumerate() {
                *state = mask & (1 << i) != 0;
                prob *= if *state { 1.0 - fail[i] } else { fail[i] };
            }
            if prob > 0.0 && self.is_connected(&working) {
                total += prob;
            }
        }
        Ok(total.min(1.0))
    }

    /// Monte-Carlo reliability estimate over `trials` independent samples.
    ///
    /// # Examples
    /// ```
    /// use u_modelkit::random::create_rng;
    /// use u_modelkit::reliability::{FailureRates, Network};
    ///
    /// let mut rng = create_rng(42);
    /// let est = Network::bridge()
    ///     .simulate_reliability(&FailureRates::Uniform(0.1), 100_000, &mut rng)
    ///     .unwrap();
    /// assert!((est.reliability - 0.97848).abs() < 5.0 * est.std_error + 1e-3);
    /// ```
    pub fn simulate_reliability<R: Rng>(
        &self,
        rates: &FailureRates,
        trials: usize,
        rng: &mut R,
    ) -> Result<ReliabilityEstimate> {
        if trials == 0 {
            return Err(ModelError::invalid("trials", "must be positive"));
        }
        let e = self.components.len();
        let fail = if e == 0 { Vec::new() } else { rates.resolve(e)? };
        let mut working = vec![false; e];
        let mut successes = 0usize;
        for _ in 0..trials {
            for (state, &p) in working.iter_mut().zip(&fail) {
                *state = rng.random::<f64>() >= p;
            }
            if self.is_connected(&working) {
                successes += 1;
            }
        }
        let r = successes as f64 / trials as f64;
        let std_error = (r * (1.0 - r) / trials as f64).sqrt();
        tracing::debug!(trials, successes, reliability = r, "network simulation finished");
        Ok(ReliabilityEstimate {
            reliability: r,
            std_error,
            successes,
            trials,
        })
    }
}
