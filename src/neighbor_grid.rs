const MIN_CELL_SIZE: f32 = 1.0e-6;
const INVALID_INDEX: usize = usize::MAX;
// Keeps sparse populations with tiny radii from allocating huge grids.
// Points past the last row/column are clamped into the edge cells, which
// preserves exactness because clamping never increases cell distance.
const MAX_CELLS_PER_AGENT: usize = 4;
const MIN_CELL_BUDGET: usize = 64;

/// Uniform bucket grid over the x/y projection of the population.
///
/// The grid is a candidate prefilter: `for_each_candidate` reports every
/// agent whose projected distance is within the radius, so any agent within
/// the radius in full 3D space is always among the candidates.
pub struct NeighborGrid {
    cell_size: f32,
    origin_x: f32,
    origin_y: f32,
    cols: usize,
    rows: usize,
    particle_count: usize,
    head: Vec<usize>,
    next: Vec<usize>,
    cached_x: Vec<f32>,
    cached_y: Vec<f32>,
}

impl NeighborGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            origin_x: 0.0,
            origin_y: 0.0,
            cols: 1,
            rows: 1,
            particle_count: 0,
            head: vec![INVALID_INDEX],
            next: Vec::new(),
            cached_x: Vec::new(),
            cached_y: Vec::new(),
        }
    }

    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size.max(MIN_CELL_SIZE);
    }

    pub fn rebuild(&mut self, positions_x: &[f32], positions_y: &[f32]) {
        assert_eq!(positions_x.len(), positions_y.len());

        let count = positions_x.len();
        self.ensure_layout(positions_x, positions_y);
        self.head.fill(INVALID_INDEX);

        if count == 0 {
            return;
        }

        self.cached_x[..count].copy_from_slice(positions_x);
        self.cached_y[..count].copy_from_slice(positions_y);

        for i in 0..count {
            let cell = self.cell_index_for_position(positions_x[i], positions_y[i]);
            self.next[i] = self.head[cell];
            self.head[cell] = i;
        }
    }

    pub fn for_each_candidate<F>(&self, i: usize, radius: f32, mut callback: F)
    where
        F: FnMut(usize),
    {
        if i >= self.particle_count {
            return;
        }

        let radius = radius.max(0.0);
        let radius_sq = radius * radius;
        let cell_radius = (radius / self.cell_size).ceil() as isize;

        let x = self.cached_x[i];
        let y = self.cached_y[i];
        let base_cell_x = self.cell_x(x);
        let base_cell_y = self.cell_y(y);

        let min_y = base_cell_y.saturating_sub(cell_radius).max(0);
        let max_y = base_cell_y.saturating_add(cell_radius).min(self.rows as isize - 1);
        let min_x = base_cell_x.saturating_sub(cell_radius).max(0);
        let max_x = base_cell_x.saturating_add(cell_radius).min(self.cols as isize - 1);

        for cell_y in min_y..=max_y {
            for cell_x in min_x..=max_x {
                self.scan_cell(
                    cell_x as usize,
                    cell_y as usize,
                    i,
                    x,
                    y,
                    radius_sq,
                    &mut callback,
                );
            }
        }
    }

    fn ensure_layout(&mut self, positions_x: &[f32], positions_y: &[f32]) {
        let count = positions_x.len();
        self.particle_count = count;

        let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
        let (mut min_y, mut max_y) = (f32::MAX, f32::MIN);
        for (&x, &y) in positions_x.iter().zip(positions_y) {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        if count == 0 {
            (min_x, max_x, min_y, max_y) = (0.0, 0.0, 0.0, 0.0);
        }
        self.origin_x = min_x;
        self.origin_y = min_y;

        let budget = (count * MAX_CELLS_PER_AGENT).max(MIN_CELL_BUDGET);
        let side = (budget as f32).sqrt() as usize;
        let side = side.max(1);
        let cols = (((max_x - min_x) / self.cell_size).min(side as f32) as usize + 1).min(side);
        let rows = (((max_y - min_y) / self.cell_size).min(side as f32) as usize + 1).min(side);
        let grid_size = cols * rows;

        if cols != self.cols || rows != self.rows || self.head.len() != grid_size {
            self.cols = cols;
            self.rows = rows;
            self.head.resize(grid_size, INVALID_INDEX);
        }

        if self.next.len() != count {
            self.next.resize(count, INVALID_INDEX);
        }
        if self.cached_x.len() != count {
            self.cached_x.resize(count, 0.0);
            self.cached_y.resize(count, 0.0);
        }
    }

    fn cell_index_for_position(&self, x: f32, y: f32) -> usize {
        self.cell_y(y) as usize * self.cols + self.cell_x(x) as usize
    }

    fn cell_x(&self, x: f32) -> isize {
        (((x - self.origin_x) / self.cell_size).floor() as isize).clamp(0, self.cols as isize - 1)
    }

    fn cell_y(&self, y: f32) -> isize {
        (((y - self.origin_y) / self.cell_size).floor() as isize).clamp(0, self.rows as isize - 1)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan_cell<F>(
        &self,
        cell_x: usize,
        cell_y: usize,
        i: usize,
        x: f32,
        y: f32,
        radius_sq: f32,
        callback: &mut F,
    ) where
        F: FnMut(usize),
    {
        let cell_index = cell_y * self.cols + cell_x;
        let mut candidate = self.head[cell_index];

        while candidate != INVALID_INDEX {
            if candidate != i {
                let dx = self.cached_x[candidate] - x;
                let dy = self.cached_y[candidate] - y;
                if dx * dx + dy * dy <= radius_sq {
                    callback(candidate);
                }
            }

            candidate = self.next[candidate];
        }
    }
}
