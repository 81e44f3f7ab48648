/// Source of the current calendar day.
///
/// The file-edit tracker counts at most one qualifying save per day, so the
/// only thing it needs from a clock is a stable day string.
pub trait Clock: Send + Sync {
    /// Today's date at day granularity, e.g. `Fri Oct 16 2026`.
    fn today(&self) -> String;
}
