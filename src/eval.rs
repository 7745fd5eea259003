use tracing::debug;
use crate::{Error, FaceSource, RollResult};
use crate::parser::{parse_factor, split, AdditiveChain, BinaryOperator, Factor, MultiplicativeChain, Precedence};


/// Significant digits kept by [`format_value`].
const PRECISION: i32 = 6;


/// The result of evaluating a roll query: its numeric value and a trace of every
/// die that was rolled, exploded or discarded along the way.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollOutcome {
    /// The numeric result.
    pub value: f64,
    /// Human readable account of how `value` came about.
    pub trace: String
}

impl RollOutcome {
    fn literal(value: f64) -> Self {
        Self { value, trace: format_value(value) }
    }

    fn join(self, op: BinaryOperator, right: RollOutcome) -> Self {
        Self {
            value: op.op(self.value, right.value),
            trace: format!("{} {op} {}", self.trace, right.trace)
        }
    }
}

impl From<Error> for RollOutcome {
    /// Degrades a failed sub-expression to `0`, with the error text as its trace.
    fn from(error: Error) -> Self {
        Self { value: 0.0, trace: error.to_string() }
    }
}

impl From<RollResult> for RollOutcome {
    fn from(result: RollResult) -> Self {
        Self { value: result.total() as f64, trace: result.to_string() }
    }
}


/// Evaluates a roll query against the given source of die faces.
///
/// `*` and `/` bind tighter than `+` and `-`, and operators of the same tier fold
/// left to right. Errors never abort the query: a term whose numbers are too long
/// reads as `0` with the trace `Query field too long`, and a `*`/`/` chain that
/// divides by zero reads as `0` with the trace `Divide by zero`.
///
/// The trace joins the trace of each operand with its operator, one space on each
/// side: `[4] [2] + 3 * 2`. Literals show as [`format_value`] prints them.
///
/// # Examples
/// ```
/// use chatroll::evaluate;
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let outcome = evaluate("3+2*4", &mut rng);
/// assert_eq!(outcome.value, 11.0);
/// assert_eq!(outcome.trace, "3 + 2 * 4");
///
/// let outcome = evaluate("1 + 2d6/0", &mut rng);
/// assert_eq!(outcome.value, 1.0);
/// assert_eq!(outcome.trace, "1 + Divide by zero");
///
/// let outcome = evaluate("2d6+3", &mut rng);
/// assert!(outcome.value >= 5.0 && outcome.value <= 15.0);
/// ```
pub fn evaluate<S: FaceSource + ?Sized>(query: &str, source: &mut S) -> RollOutcome {
    let chain: AdditiveChain = split(query, Precedence::Sum);

    let mut outcome = evaluate_product(chain.head, source);
    for (op, segment) in chain.tail {
        let right = evaluate_product(segment, source);
        outcome = outcome.join(op, right);
    }

    debug!(query, value = outcome.value, trace = %outcome.trace, "evaluated roll query");
    outcome
}

/// Evaluates a roll query with the calling thread's own generator.
///
/// # Examples
/// ```
/// let outcome = chatroll::roll("4d6kh3");
/// assert!(outcome.value >= 3.0 && outcome.value <= 18.0);
/// assert_eq!(outcome.trace.matches('[').count(), 4);
/// ```
pub fn roll(query: &str) -> RollOutcome {
    evaluate(query, &mut rand::rng())
}

fn evaluate_product<S: FaceSource + ?Sized>(segment: &str, source: &mut S) -> RollOutcome {
    let chain: MultiplicativeChain = split(segment, Precedence::Product);

    let mut outcome = evaluate_factor(chain.head, source);
    for (op, token) in chain.tail {
        let right = evaluate_factor(token, source);

        if op == BinaryOperator::Divide && right.value == 0.0 {
            debug!(segment, "divisor evaluated to zero");
            return Error::DivideByZero.into();
        }

        outcome = outcome.join(op, right);
    }

    outcome
}

fn evaluate_factor<S: FaceSource + ?Sized>(token: &str, source: &mut S) -> RollOutcome {
    match parse_factor(token) {
        Ok(Factor::Literal(value)) => RollOutcome::literal(value),
        Ok(Factor::Dice(term)) => term.roll(source).into(),
        Err(err) => {
            debug!(token, %err, "term degraded to zero");
            err.into()
        }
    }
}


/// Renders a number the way C's `%g` does: six significant digits, no trailing
/// fractional zeros, and scientific notation for very large or very small values.
///
/// # Examples
/// ```
/// use chatroll::format_value;
///
/// assert_eq!(format_value(11.0), "11");
/// assert_eq!(format_value(3.5), "3.5");
/// assert_eq!(format_value(-2.25), "-2.25");
/// assert_eq!(format_value(1.0 / 3.0), "0.333333");
/// assert_eq!(format_value(1234567.0), "1.23457e+06");
/// ```
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }

    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs());
    }

    let decimals = (PRECISION - 1 - exponent) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(number: &str) -> &str {
    match number.contains('.') {
        true => number.trim_end_matches('0').trim_end_matches('.'),
        false => number
    }
}


#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use super::*;
    use crate::parser::str_test_strategies::sum_query_strategy;
    use crate::roll_test_strategies::{AlwaysMax, Scripted};
    use rand::{SeedableRng, rngs::StdRng};


    proptest! {
        #[test]
        fn test_plain_dice_bounds(count in 1u32..=20, sides in 1u32..=1000, seed: u64) {
            let outcome = evaluate(&format!("{count}d{sides}"), &mut StdRng::seed_from_u64(seed));

            prop_assert!(outcome.value >= f64::from(count));
            prop_assert!(outcome.value <= f64::from(count) * f64::from(sides));
            prop_assert_eq!(outcome.trace.matches('[').count(), count as usize);
        }

        #[test]
        fn test_precedence_consistency(a in 0u32..=100, b in 0u32..=100, c in 0u32..=100) {
            let (a, b, c) = (f64::from(a), f64::from(b), f64::from(c));
            let mut rng = StdRng::seed_from_u64(0);

            prop_assert_eq!(evaluate(&format!("{a} + {b} * {c}"), &mut rng).value, a + b * c);
            prop_assert_eq!(evaluate(&format!("{a} * {b} + {c}"), &mut rng).value, a * b + c);
            prop_assert_eq!(evaluate(&format!("{a} - {b} - {c}"), &mut rng).value, a - b - c);
        }

        #[test]
        fn test_left_to_right_division(a in 1u32..=1000, b in 1u32..=100, c in 1u32..=100) {
            let (a, b, c) = (f64::from(a), f64::from(b), f64::from(c));
            let outcome = evaluate(&format!("{a}/{b}/{c}"), &mut StdRng::seed_from_u64(0));

            prop_assert_eq!(outcome.value, a / b / c);
        }

        #[test]
        fn test_any_query_evaluates(query in sum_query_strategy(), seed: u64) {
            let outcome = evaluate(&query, &mut StdRng::seed_from_u64(seed));

            prop_assert!(!outcome.trace.is_empty());
            prop_assert!(outcome.value.is_finite());
        }

        #[test]
        fn test_same_seed_same_outcome(query in sum_query_strategy(), seed: u64) {
            let first = evaluate(&query, &mut StdRng::seed_from_u64(seed));
            let second = evaluate(&query, &mut StdRng::seed_from_u64(seed));

            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_integers_format_plainly(value in -999_999i64..=999_999) {
            prop_assert_eq!(format_value(value as f64), value.to_string());
        }
    }

    #[test]
    fn test_literal() {
        let outcome = evaluate("5", &mut AlwaysMax::default());
        assert_eq!(outcome, RollOutcome { value: 5.0, trace: "5".into() });
    }

    #[test]
    fn test_empty_query() {
        let outcome = evaluate("", &mut AlwaysMax::default());
        assert_eq!(outcome, RollOutcome { value: 0.0, trace: "0".into() });
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let outcome = evaluate("3+2*4", &mut AlwaysMax::default());
        assert_eq!(outcome.value, 11.0);
        assert_eq!(outcome.trace, "3 + 2 * 4");
    }

    #[test]
    fn test_leading_minus() {
        let outcome = evaluate("-3+1", &mut AlwaysMax::default());
        assert_eq!(outcome.value, -2.0);
        assert_eq!(outcome.trace, "0 - 3 + 1");
    }

    #[test]
    fn test_divide_by_zero_replaces_chain() {
        let outcome = evaluate("2d6/0", &mut AlwaysMax::default());
        assert_eq!(outcome, RollOutcome { value: 0.0, trace: "Divide by zero".into() });

        let outcome = evaluate("2*3/0*4", &mut AlwaysMax::default());
        assert_eq!(outcome, RollOutcome { value: 0.0, trace: "Divide by zero".into() });
    }

    #[test]
    fn test_divide_by_zero_stops_rolling() {
        let mut source = AlwaysMax::default();
        let outcome = evaluate("1d4/0*3d6 + 1d8", &mut source);

        assert_eq!(source.draws, 2);
        assert_eq!(outcome.value, 8.0);
        assert_eq!(outcome.trace, "Divide by zero + [8]");
    }

    #[test]
    fn test_divide_by_discarded_roll() {
        let outcome = evaluate("10/1d6dl1", &mut AlwaysMax::default());
        assert_eq!(outcome.trace, "Divide by zero");
    }

    #[test]
    fn test_field_too_long_degrades_term() {
        let outcome = evaluate("1234567890d6", &mut AlwaysMax::default());
        assert_eq!(outcome, RollOutcome { value: 0.0, trace: "Query field too long".into() });

        let outcome = evaluate("2d6 + 1d12345678901", &mut AlwaysMax::default());
        assert_eq!(outcome.value, 12.0);
        assert_eq!(outcome.trace, "[6] [6] + Query field too long");
    }

    #[test]
    fn test_exploding_trace() {
        let outcome = evaluate("1d6!", &mut Scripted::new(&[6, 6, 3]));
        assert_eq!(outcome.value, 15.0);
        assert_eq!(outcome.trace, "[6] [6] [3]");

        let outcome = evaluate("1d6!!", &mut Scripted::new(&[6, 6, 3]));
        assert_eq!(outcome.value, 15.0);
        assert_eq!(outcome.trace, "{15}");
    }

    #[test]
    fn test_always_max_explosions() {
        let outcome = evaluate("1d6!", &mut AlwaysMax::default());
        assert!(outcome.trace.matches('[').count() > 1);
        assert_eq!(outcome.value, 6.0 * outcome.trace.matches('[').count() as f64);

        let outcome = evaluate("1d6!!", &mut AlwaysMax::default());
        assert_eq!(outcome.trace.matches('{').count(), 1);
        assert!(!outcome.trace.contains('['));
    }

    #[test]
    fn test_single_draw_without_explode() {
        let mut source = AlwaysMax::default();
        let outcome = evaluate("1d20", &mut source);

        assert_eq!(source.draws, 1);
        assert_eq!(outcome.trace, "[20]");
    }

    #[test]
    fn test_mixed_query_trace() {
        let outcome = evaluate("4d6kh3 + 2 * 1d4 - 1", &mut Scripted::new(&[2, 5, 1, 6, 3]));
        assert_eq!(outcome.value, 13.0 + 6.0 - 1.0);
        assert_eq!(outcome.trace, "[2] [5] [x] [6] + 2 * [3] - 1");
    }

    #[test]
    fn test_fractional_values() {
        let outcome = evaluate("7/2", &mut AlwaysMax::default());
        assert_eq!(outcome.value, 3.5);
        assert_eq!(format_value(outcome.value), "3.5");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(100.0), "100");
        assert_eq!(format_value(123456.0), "123456");
        assert_eq!(format_value(999999.5), "1e+06");
        assert_eq!(format_value(1e7), "1e+07");
        assert_eq!(format_value(0.0001), "0.0001");
        assert_eq!(format_value(0.00001), "1e-05");
        assert_eq!(format_value(2.0 / 3.0), "0.666667");
    }
}
