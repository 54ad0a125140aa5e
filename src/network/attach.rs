//! Breadth-first, time-paced reveal of a network from its origin.
//!
//! [`IncrementalAttach`] is polled once per frame. Each poll runs traversal
//! steps until it inserts an edge, then waits out the pacing delay before
//! touching the network again.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::error::{NetworkError, Result};
use super::types::{EdgeRef, NetworkData, NodeRef};

/// Step budget on top of the node count.
pub const BASE_STEP_BUDGET: usize = 100;
pub const DEFAULT_ATTACH_DELAY: Duration = Duration::from_millis(100);

/// What the controller mutates while it walks the graph.
pub trait AttachTarget {
    fn attach_node(&mut self, node: &NodeRef) -> Result<()>;
    fn attach_edge(&mut self, edge: &EdgeRef) -> Result<()>;
    fn bind_node(&mut self, node_id: &str) -> Result<()>;
    fn bind_edge(&mut self, edge_id: &str) -> Result<()>;
    fn check_center(&self) -> Result<()>;
}

#[derive(Debug)]
pub enum AttachPoll {
    /// Waiting for the pacing delay or more traversal work.
    Pending,
    Complete { nodes: usize, edges: usize },
    /// Traversal stopped with nodes left unattached. What was attached stays.
    Incomplete(NetworkError),
}

enum Phase {
    Bootstrap,
    Walking,
    Done,
}

pub struct IncrementalAttach {
    origin: NodeRef,
    nodes_by_id: HashMap<String, NodeRef>,
    edges: Vec<EdgeRef>,
    total_nodes: usize,
    queue: VecDeque<String>,
    visited: HashSet<String>,
    attached: HashSet<String>,
    added_edges: HashSet<String>,
    pending_edges: VecDeque<EdgeRef>,
    steps: usize,
    step_budget: usize,
    delay: Duration,
    resume_at: Option<Instant>,
    bind_incrementally: bool,
    phase: Phase,
}

impl IncrementalAttach {
    /// Snapshots `data`; fails when it has no single origin.
    pub fn new(data: &NetworkData, delay: Duration, bind_incrementally: bool) -> Result<Self> {
        let origin = data.origin()?.clone();
        let nodes_by_id = data
            .nodes
            .iter()
            .map(|node| (node.id.clone(), node.clone()))
            .collect();

        Ok(Self {
            origin,
            nodes_by_id,
            edges: data.edges.clone(),
            total_nodes: data.nodes.len(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            attached: HashSet::new(),
            added_edges: HashSet::new(),
            pending_edges: VecDeque::new(),
            steps: 0,
            step_budget: BASE_STEP_BUDGET + data.nodes.len(),
            delay,
            resume_at: None,
            bind_incrementally,
            phase: Phase::Bootstrap,
        })
    }

    pub fn attached_nodes(&self) -> usize {
        self.attached.len()
    }

    pub fn attached_edges(&self) -> usize {
        self.added_edges.len()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Advances the traversal. Fatal errors (a second origin, the center node
    /// missing after the origin was attached) are returned as `Err`.
    pub fn poll(&mut self, target: &mut dyn AttachTarget, now: Instant) -> Result<AttachPoll> {
        loop {
            match self.phase {
                Phase::Done => return Ok(self.outcome()),
                Phase::Bootstrap => {
                    self.bootstrap(target)?;
                    self.phase = Phase::Walking;
                }
                Phase::Walking => {
                    if let Some(resume_at) = self.resume_at {
                        if now < resume_at {
                            return Ok(AttachPoll::Pending);
                        }
                        self.resume_at = None;
                    }

                    if let Some(edge) = self.pending_edges.pop_front() {
                        if self.insert_edge(target, &edge)? {
                            if self.delay.is_zero() {
                                continue;
                            }
                            self.resume_at = Some(now + self.delay);
                            return Ok(AttachPoll::Pending);
                        }
                        continue;
                    }

                    if !self.visit_next() {
                        self.phase = Phase::Done;
                        let outcome = self.outcome();
                        match &outcome {
                            AttachPoll::Complete { nodes, edges } => {
                                info!(nodes, edges, steps = self.steps, "incremental attach complete");
                            }
                            AttachPoll::Incomplete(err) => error!(%err, "incremental attach incomplete"),
                            AttachPoll::Pending => {}
                        }
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    fn bootstrap(&mut self, target: &mut dyn AttachTarget) -> Result<()> {
        let origin = self.origin.clone();
        target.attach_node(&origin)?;
        target.check_center()?;
        if self.bind_incrementally {
            target.bind_node(&origin.id)?;
        }
        self.attached.insert(origin.id.clone());
        self.queue.push_back(origin.id);
        Ok(())
    }

    /// Dequeues the next node and lines up its edges. Returns `false` when the
    /// traversal is over.
    fn visit_next(&mut self) -> bool {
        while !self.queue.is_empty() && self.visited.len() < self.total_nodes {
            self.steps += 1;
            if self.steps > self.step_budget {
                warn!(budget = self.step_budget, "attach step budget exhausted");
                return false;
            }

            let Some(current) = self.queue.pop_front() else {
                return false;
            };
            if !self.visited.insert(current.clone()) {
                continue;
            }

            self.pending_edges = self
                .edges
                .iter()
                .filter(|edge| edge.touches(&current) && !self.added_edges.contains(&edge.id))
                .cloned()
                .collect();
            debug!(node = %current, edges = self.pending_edges.len(), "visiting");
            return true;
        }
        false
    }

    /// Returns whether an edge insertion was attempted, which is what the
    /// pacing delay follows.
    fn insert_edge(&mut self, target: &mut dyn AttachTarget, edge: &EdgeRef) -> Result<bool> {
        if !self.added_edges.insert(edge.id.clone()) {
            return Ok(false);
        }

        for endpoint in [&edge.source, &edge.target] {
            if self.attached.contains(endpoint.as_str()) {
                continue;
            }
            let Some(node) = self.nodes_by_id.get(endpoint.as_str()).cloned() else {
                warn!(edge = %edge.id, node = %endpoint, "edge references unknown node");
                continue;
            };
            match target.attach_node(&node) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!(node = %node.id, %err, "failed to attach node");
                    continue;
                }
            }
            self.attached.insert(node.id.clone());
            self.queue.push_back(node.id.clone());
            if self.bind_incrementally
                && let Err(err) = target.bind_node(&node.id)
            {
                error!(node = %node.id, %err, "failed to bind node");
            }
        }

        match target.attach_edge(edge) {
            Ok(()) => {
                if self.bind_incrementally
                    && let Err(err) = target.bind_edge(&edge.id)
                {
                    error!(edge = %edge.id, %err, "failed to bind edge");
                }
            }
            Err(err) => error!(edge = %edge.id, %err, "failed to attach edge"),
        }
        Ok(true)
    }

    fn outcome(&self) -> AttachPoll {
        if self.attached.len() < self.total_nodes {
            AttachPoll::Incomplete(NetworkError::IncompleteAttachment {
                attached: self.attached.len(),
                total: self.total_nodes,
                steps: self.steps,
            })
        } else {
            AttachPoll::Complete {
                nodes: self.attached.len(),
                edges: self.added_edges.len(),
            }
        }
    }
}
