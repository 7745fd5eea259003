use crate::{DiceTerm, DiceTermBuilder, Error, Mode, DEFAULT_SIDES};
use crate::parser::{Lexer, Token, MAX_FIELD_LEN};


/// One operand of a `*`/`/` chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Factor {
    /// A plain number, as in the `3` of `2d6+3`.
    Literal(f64),
    /// A dice term, as in the `2d6` of `2d6+3`.
    Dice(DiceTerm)
}


/// Recursive descent over the tokens of a single dice term.
///
/// Grammar: `[count] d [sides] ( (d|k) [h|l] [n] | ! [!] )*`.
/// Tokens outside the grammar are skipped.
#[derive(Debug)]
struct TermParser {
    lexer: Lexer,
    current: Token,
    peek: Token
}

impl TermParser {
    fn new(input: &str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        let peek = lexer.next_token()?;

        Ok(Self { lexer, current, peek })
    }

    fn next_token(&mut self) -> Result<(), Error> {
        self.current = self.peek;
        self.peek = self.lexer.next_token()?;

        Ok(())
    }

    fn parse(&mut self) -> Result<DiceTerm, Error> {
        let count = self.parse_count()?;
        let sides = self.parse_sides()?;

        let builder = DiceTerm::builder(sides).count(count);
        Ok(self.parse_modifiers(builder)?.build())
    }

    /// Reads up to the first `d`, leaving it as the current token.
    fn parse_count(&mut self) -> Result<u32, Error> {
        let mut count = None;

        while !matches!(self.current, Token::Dice | Token::Eof) {
            if let Token::Number(n) = self.current {
                count = Some(n);
            }

            self.next_token()?;
        }

        Ok(count.unwrap_or(1))
    }

    fn parse_sides(&mut self) -> Result<u32, Error> {
        match self.peek {
            Token::Number(sides) => {
                self.next_token()?;
                Ok(sides)
            },
            _ => Ok(DEFAULT_SIDES)
        }
    }

    fn parse_modifiers(&mut self, mut builder: DiceTermBuilder) -> Result<DiceTermBuilder, Error> {
        loop {
            self.next_token()?;

            builder = match self.current {
                Token::Eof => return Ok(builder),
                Token::Dice => builder.mode(self.parse_clause(false)?),
                Token::Keep => builder.mode(self.parse_clause(true)?),
                Token::Bang => {
                    let builder = builder.explode(true);

                    if self.peek == Token::Bang {
                        self.next_token()?;
                        builder.compound(true)
                    } else {
                        builder
                    }
                },
                _ => builder
            };
        }
    }

    /// Parses the rest of a clause whose `d` or `k` is the current token.
    /// Unqualified discards drop the lowest dice, unqualified keeps keep the highest.
    fn parse_clause(&mut self, keep: bool) -> Result<Mode, Error> {
        let highest = match self.peek {
            Token::High => {
                self.next_token()?;
                true
            },
            Token::Low => {
                self.next_token()?;
                false
            },
            _ => keep
        };

        let n = match self.peek {
            Token::Number(n) => {
                self.next_token()?;
                n
            },
            _ => 0
        };

        Ok(match keep {
            true => Mode::Keep { highest, n },
            false => Mode::Drop { highest, n }
        })
    }
}


/// Parses one atomic operand of a roll query.
///
/// A token without a `d`/`D` is a literal number. Text that is not a finite number
/// reads as `0`. Anything else is parsed as a dice term; see [`DiceTerm`] for the
/// meaning of its fields.
///
/// # Errors
/// Returns [`Error::FieldTooLong`] if any run of digits in the token is longer than
/// [`MAX_FIELD_LEN`].
///
/// # Examples
/// ```
/// use chatroll::{parse_factor, Error, Factor};
///
/// assert_eq!(parse_factor("5"), Ok(Factor::Literal(5.0)));
/// assert_eq!(parse_factor("five"), Ok(Factor::Literal(0.0)));
/// assert_eq!(parse_factor("1234567890d6"), Err(Error::FieldTooLong));
///
/// let Ok(Factor::Dice(term)) = parse_factor("4d6kl3!") else { panic!() };
/// assert_eq!((term.count(), term.sides()), (4, 6));
/// assert_eq!((term.drop_low(), term.drop_high()), (0, 1));
/// assert!(term.explode() && !term.compound());
/// ```
pub fn parse_factor(token: &str) -> Result<Factor, Error> {
    if !token.contains(|ch: char| ch.eq_ignore_ascii_case(&'d')) {
        return parse_literal(token).map(Factor::Literal);
    }

    TermParser::new(token)?
        .parse()
        .map(Factor::Dice)
}

fn parse_literal(token: &str) -> Result<f64, Error> {
    let mut run = 0;
    for ch in token.chars() {
        run = if ch.is_ascii_digit() { run + 1 } else { 0 };

        if run > MAX_FIELD_LEN {
            return Err(Error::FieldTooLong);
        }
    }

    Ok(token.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0))
}
