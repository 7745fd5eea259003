#[cfg(test)]
pub(crate) mod str_test_strategies;

mod lexer;
mod term;
mod chain;

pub use lexer::MAX_FIELD_LEN;
pub(crate) use lexer::{Lexer, Token};
pub use term::{Factor, parse_factor};
pub use chain::{
    Chain, AdditiveChain, MultiplicativeChain,
    BinaryOperator, Precedence,
    split
};
