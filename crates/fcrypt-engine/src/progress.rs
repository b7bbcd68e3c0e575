//! Progress signals emitted after each chunk.

/// Fractional completion of one transform operation.
///
/// Values are monotonically non-decreasing within an operation and land
/// on `Fraction(1.0)` when the input size was known. Sources without a
/// length report the running byte count instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// `processed / total`, clamped to `[0.0, 1.0]`.
    Fraction(f64),
    /// Total size unknown; carries cumulative bytes processed.
    Indeterminate(u64),
}

/// Progress callback, invoked on the operation's own task, in chunk order.
pub type ProgressFn = Box<dyn Fn(Progress) + Send + Sync>;
