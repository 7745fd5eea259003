//! Dice notation for chat rooms.
//!
//! A roll query is a line such as `4d6kh3 + 2` or `1d20!! / 2`. Evaluating it
//! yields a [`RollOutcome`]: the numeric value, and a trace showing every die
//! that was rolled, exploded or discarded.
//!
//! ```
//! use chatroll::evaluate;
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let outcome = evaluate("2d6 + 3 * 2", &mut StdRng::seed_from_u64(42));
//!
//! assert!(outcome.value >= 8.0 && outcome.value <= 18.0);
//! assert!(outcome.trace.ends_with(" + 3 * 2"));
//! ```
//!
//! Errors never abort a query. A field of more than [`MAX_FIELD_LEN`] digits or a
//! division by zero reads as `0`, with the [`Error`] text standing in the trace.
//! [`handle`] wraps the evaluator in the `!roll`/`!gmroll` chat commands.
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]


#[cfg(test)]
mod roll_test_strategies;

mod error;
mod roll;
mod parser;
mod eval;
mod command;

pub use error::Error;
pub use roll::{
    DiceTerm, DiceTermBuilder, Die, FaceSource, Mode, RollResult,
    MIN_COUNT, MAX_COUNT, DEFAULT_SIDES, MAX_EXPLOSIONS
};
pub use parser::{
    Factor, parse_factor, MAX_FIELD_LEN,
    Chain, AdditiveChain, MultiplicativeChain,
    BinaryOperator, Precedence, split
};
pub use eval::{RollOutcome, evaluate, roll, format_value};
pub use command::{
    RollMode, RollRequest, RollConfig, Target, Outbound, TRIGGERS,
    parse_command, split_reason, compose, handle
};
