use crate::Error;


/// Longest run of digits accepted in a single numeric field.
pub const MAX_FIELD_LEN: usize = 9;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Number(u32),
    Dice,
    Keep,
    High,
    Low,
    Bang,
    Other(char),
    Eof,
}


/// Splits one dice term into tokens. Letters are case-insensitive.
#[derive(Debug)]
pub(crate) struct Lexer {
    input: Vec<char>,
    pub position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_whitespace();

        let Some(&ch) = self.input.get(self.position) else {
            return Ok(Token::Eof);
        };

        if ch.is_ascii_digit() {
            return self.read_number();
        }

        self.position += 1;

        let token = match ch.to_ascii_lowercase() {
            'd' => Token::Dice,
            'k' => Token::Keep,
            'h' => Token::High,
            'l' => Token::Low,
            '!' => Token::Bang,
            _ => Token::Other(ch)
        };

        Ok(token)
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.input[self.position].is_whitespace() {
            self.position += 1;
        }
    }

    fn read_number(&mut self) -> Result<Token, Error> {
        let mut field = String::new();

        while let Some(&ch) = self.input.get(self.position).filter(|ch| ch.is_ascii_digit()) {
            if field.len() == MAX_FIELD_LEN {
                return Err(Error::FieldTooLong);
            }

            field.push(ch);
            self.position += 1;
        }

        // nine digits always fit a u32
        Ok(Token::Number(field.parse().unwrap_or_default()))
    }
}
