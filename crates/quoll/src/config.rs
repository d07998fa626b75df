// Kernel configuration
//
// Rows of a layer norm are independent, so the row loop can be split across
// rayon workers with no synchronization: each worker owns whole output rows.
// Small inputs are not worth the fork/join overhead, so parallelism only
// kicks in once there are enough rows to hand every task a full batch.

/// Configuration for the quantized layer norm kernels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerNormConfig {
    /// Whether the row loop may run on the rayon thread pool.
    pub parallel: bool,
    /// Minimum number of rows per parallel task. Inputs with fewer than
    /// twice this many rows run sequentially.
    pub min_rows_per_task: usize,
    /// Reject rows long enough to overflow the i64 sum-of-squares
    /// accumulator. Turning this off is only sound when the caller has
    /// already bounded the row length.
    pub check_row_length: bool,
}

impl Default for LayerNormConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_rows_per_task: 64,
            check_row_length: true,
        }
    }
}

impl LayerNormConfig {
    /// A configuration that always runs on the calling thread.
    pub fn sequential() -> Self {
        Self::default().parallel(false)
    }

    pub fn parallel(mut self, p: bool) -> Self {
        self.parallel = p;
        self
    }

    pub fn min_rows_per_task(mut self, n: usize) -> Self {
        self.min_rows_per_task = n.max(1);
        self
    }

    pub fn check_row_length(mut self, c: bool) -> Self {
        self.check_row_length = c;
        self
    }

    /// Whether `rows` rows should be processed in parallel.
    pub fn use_parallel(&self, rows: usize) -> bool {
        self.parallel && rows >= self.min_rows_per_task.saturating_mul(2)
    }
}
