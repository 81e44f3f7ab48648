/// Uniform random numbers for probability gates.
pub trait RandomSource: Send + Sync {
    /// A value in `[0, 1)`.
    fn next_f64(&self) -> f64;
}
