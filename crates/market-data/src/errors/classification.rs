/// How a per-source failure is reported by an aggregation.
///
/// The aggregator never propagates a single source's error. Every failure is
/// downgraded into one of these buckets so the caller can tell a slow
/// upstream apart from one that simply has nothing usable.
///
/// | Class | Meaning |
/// |-------|---------|
/// | `Timeout` | The source's deadline expired before it answered |
/// | `Miss` | The source answered (or failed fast) without a usable rate |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureClass {
    /// The source did not complete within its deadline.
    Timeout,

    /// Any other non-success: transport, status, decode or layout failure.
    Miss,
}
