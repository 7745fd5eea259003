use std::fmt::Display;


/// The tier an operator belongs to. Queries are split on `Sum` operators first,
/// then every piece is split on `Product` operators, which is what makes `*` and `/`
/// bind tighter than `+` and `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// `+` and `-`.
    Sum = 1,
    /// `*` and `/`.
    Product = 2,
}


/// The four arithmetic operators a roll query may chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl BinaryOperator {
    /// Applies the operator. Division by zero is left to the caller.
    pub fn op(&self, left: f64, right: f64) -> f64 {
        use BinaryOperator as Op;
        match self {
            Op::Add => left + right,
            Op::Subtract => left - right,
            Op::Multiply => left * right,
            Op::Divide => left / right
        }
    }

    /// The tier this operator is split at.
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => Precedence::Sum,
            BinaryOperator::Multiply | BinaryOperator::Divide => Precedence::Product
        }
    }

    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(BinaryOperator::Add),
            '-' => Some(BinaryOperator::Subtract),
            '*' => Some(BinaryOperator::Multiply),
            '/' => Some(BinaryOperator::Divide),
            _ => None
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/")
        }
    }
}


/// A query or query piece split at the operators of one [`Precedence`] tier.
///
/// `head` is the text before the first operator, `tail` pairs every following
/// operator with the text after it. All pieces are trimmed, and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain<'a> {
    /// The first operand.
    pub head: &'a str,
    /// Every following operand with the operator in front of it.
    pub tail: Vec<(BinaryOperator, &'a str)>
}

/// `+`/`-` chain of a whole query.
pub type AdditiveChain<'a> = Chain<'a>;

/// `*`/`/` chain of one additive operand.
pub type MultiplicativeChain<'a> = Chain<'a>;


/// Splits `input` at every operator of the given tier, left to right.
///
/// # Examples
/// ```
/// use chatroll::{split, BinaryOperator, Precedence};
///
/// let chain = split("2d6 + 3*2 - 1", Precedence::Sum);
/// assert_eq!(chain.head, "2d6");
/// assert_eq!(chain.tail, vec![(BinaryOperator::Add, "3*2"), (BinaryOperator::Subtract, "1")]);
///
/// let chain = split("3*2", Precedence::Product);
/// assert_eq!((chain.head, chain.tail.len()), ("3", 1));
/// ```
pub fn split(input: &str, precedence: Precedence) -> Chain<'_> {
    let mut head = None;
    let mut tail = Vec::new();
    let mut pending: Option<BinaryOperator> = None;
    let mut start = 0;

    for (i, ch) in input.char_indices() {
        let Some(op) = BinaryOperator::from_char(ch).filter(|op| op.precedence() == precedence) else {
            continue;
        };

        let text = input[start..i].trim();
        match pending {
            Some(previous) => tail.push((previous, text)),
            None => head = Some(text)
        }

        pending = Some(op);
        start = i + ch.len_utf8();
    }

    let text = input[start..].trim();
    match pending {
        Some(previous) => tail.push((previous, text)),
        None => head = Some(text)
    }

    Chain { head: head.unwrap_or_default(), tail }
}
