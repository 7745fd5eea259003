/// Errors produced while evaluating a roll query.
///
/// Neither variant aborts a command. Each one degrades the sub-expression it
/// occurred in to a value of `0`, and its `Display` text is the marker that
/// shows up inline in the roll trace (see [`crate::RollOutcome`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A contiguous run of digits was longer than [`crate::MAX_FIELD_LEN`].
    #[error("Query field too long")]
    FieldTooLong,

    /// A divisor in a `*`/`/` chain evaluated to zero.
    #[error("Divide by zero")]
    DivideByZero,
}
