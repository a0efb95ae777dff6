use tracing::debug;

use crate::agent::AgentSet;
use crate::config::{NeighborBackend, NeighborConfig, NeighborPolicy};
use crate::math::{self, EPSILON};
use crate::neighbor_grid::NeighborGrid;

/// Flat agent-index to neighbor-indices mapping produced by one refresh.
///
/// Lists hold indices into the `AgentSet` they were computed from and stay
/// valid (if stale) until the next refresh.
#[derive(Clone, Debug, Default)]
pub struct NeighborLists {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl NeighborLists {
    pub fn empty(count: usize) -> Self {
        Self {
            offsets: vec![0; count + 1],
            indices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Neighbors of agent `i`; empty for out-of-range indices.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        match (self.offsets.get(i), self.offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => &self.indices[start..end],
            _ => &[],
        }
    }

    pub fn total(&self) -> usize {
        self.indices.len()
    }

    fn clear(&mut self) {
        self.offsets.clear();
        self.offsets.push(0);
        self.indices.clear();
    }

    fn push_list(&mut self, list: impl IntoIterator<Item = usize>) {
        self.indices.extend(list);
        self.offsets.push(self.indices.len());
    }
}

/// Per-frame spatial query with a configurable refresh cadence.
pub struct NeighborIndex {
    policy: NeighborPolicy,
    backend: NeighborBackend,
    refresh_interval: u32,
    radius: f32,
    grid: NeighborGrid,
    lists: NeighborLists,
    last_refresh_frame: Option<u64>,
    candidates: Vec<usize>,
    nearest: Vec<(f32, usize)>,
}

impl NeighborIndex {
    /// `model_radius` is used unless the config carries an override.
    pub fn new(config: &NeighborConfig, model_radius: f32, count: usize) -> Self {
        let radius = config.radius.unwrap_or(model_radius).max(0.0);
        Self {
            policy: config.policy,
            backend: config.backend,
            refresh_interval: config.refresh_interval.max(1),
            radius,
            grid: NeighborGrid::new(radius.max(EPSILON)),
            lists: NeighborLists::empty(count),
            last_refresh_frame: None,
            candidates: Vec::new(),
            nearest: Vec::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn lists(&self) -> &NeighborLists {
        &self.lists
    }

    pub fn neighbors_visited_last_refresh(&self) -> usize {
        self.lists.total()
    }

    pub fn is_due(&self, frame: u64) -> bool {
        match self.last_refresh_frame {
            None => true,
            Some(last) => frame.saturating_sub(last) >= u64::from(self.refresh_interval),
        }
    }

    /// Recomputes the lists when `frame` is a refresh frame. Returns whether
    /// a refresh happened.
    pub fn refresh_if_due(&mut self, agents: &AgentSet, frame: u64) -> bool {
        if !self.is_due(frame) {
            return false;
        }
        self.refresh(agents);
        self.last_refresh_frame = Some(frame);
        true
    }

    /// Unconditionally recomputes every agent's list from current positions.
    pub fn refresh(&mut self, agents: &AgentSet) {
        let count = agents.len();
        let radius_sq = self.radius * self.radius;

        if self.backend == NeighborBackend::Grid {
            self.grid.set_cell_size(self.radius.max(EPSILON));
            self.grid.rebuild(&agents.pos_x, &agents.pos_y);
        }

        let mut lists = std::mem::take(&mut self.lists);
        lists.clear();

        for i in 0..count {
            self.gather_candidates(agents, i);
            let origin = agents.position(i);

            match self.policy {
                NeighborPolicy::Radius => {
                    let within = self.candidates.iter().copied().filter(|&j| {
                        distance_sq(origin, agents.position(j)) <= radius_sq
                    });
                    lists.push_list(within);
                }
                NeighborPolicy::Nearest { k } => {
                    self.nearest.clear();
                    for &j in &self.candidates {
                        let dist_sq = distance_sq(origin, agents.position(j));
                        if dist_sq <= radius_sq {
                            insert_bounded(&mut self.nearest, (dist_sq, j), k);
                        }
                    }
                    lists.push_list(self.nearest.iter().map(|&(_, j)| j));
                }
            }
        }

        self.lists = lists;
        debug!(
            agents = count,
            radius = self.radius,
            entries = self.lists.total(),
            "neighbor lists refreshed"
        );
    }

    /// Fills `self.candidates` with every plausible neighbor of `i`, in
    /// ascending index order.
    fn gather_candidates(&mut self, agents: &AgentSet, i: usize) {
        self.candidates.clear();
        match self.backend {
            NeighborBackend::BruteForce => {
                self.candidates.extend((0..agents.len()).filter(|&j| j != i));
            }
            NeighborBackend::Grid => {
                let candidates = &mut self.candidates;
                self.grid.for_each_candidate(i, self.radius, |j| candidates.push(j));
                candidates.sort_unstable();
            }
        }
    }
}

fn distance_sq(a: (f32, f32, f32), b: (f32, f32, f32)) -> f32 {
    let (dx, dy, dz) = math::sub3(b, a);
    math::distance_sq_3d(dx, dy, dz)
}

fn closer(a: (f32, usize), b: (f32, usize)) -> bool {
    a.0 < b.0 || (a.0 == b.0 && a.1 < b.1)
}

/// Keeps `list` sorted nearest-first and at most `cap` long.
fn insert_bounded(list: &mut Vec<(f32, usize)>, entry: (f32, usize), cap: usize) {
    if cap == 0 {
        return;
    }
    let mut insert_at = list.len();
    while insert_at > 0 && closer(entry, list[insert_at - 1]) {
        insert_at -= 1;
    }
    if insert_at >= cap {
        return;
    }
    if list.len() == cap {
        list.pop();
    }
    list.insert(insert_at, entry);
}
