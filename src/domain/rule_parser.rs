//! Rule text parser.
//!
//! Parses the strategy configuration's rule strings into rule lists with
//! positional error messages. Grammar:
//!
//! ```text
//! rules     := clause ( AND clause )*
//! clause    := orderflow | condition
//! orderflow := "orderflow" "(" name "," lookback "," threshold ")"
//! condition := operand op operand
//! operand   := number | field
//! op        := > >= < <= == != | gt gte lt lte eq ne above below
//!              crosses_above crosses_below
//! ```
//!
//! Keywords, operator words, and field names are case-insensitive. A blank
//! input parses to an empty rule list.

use crate::domain::error::ParseError;
use crate::domain::rule::{CompareOp, Condition, EntryRule, Operand, OrderflowCondition};
use crate::domain::series::Field;

pub fn parse_entry_rules(input: &str) -> Result<Vec<EntryRule>, ParseError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    if parser.at_end() {
        return Ok(Vec::new());
    }

    let mut rules = vec![parser.parse_entry_clause()?];
    while parser.consume_and_keyword() {
        rules.push(parser.parse_entry_clause()?);
    }
    parser.expect_end()?;
    Ok(rules)
}

pub fn parse_exit_rules(input: &str) -> Result<Vec<Condition>, ParseError> {
    let mut parser = Parser::new(input);
    parser.skip_whitespace();
    if parser.at_end() {
        return Ok(Vec::new());
    }

    let mut rules = vec![parser.parse_condition()?];
    while parser.consume_and_keyword() {
        rules.push(parser.parse_condition()?);
    }
    parser.expect_end()?;
    Ok(rules)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.remaining().is_empty()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error(format!("expected 'AND' or end of input, found '{}'", self.peek_word())))
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    /// Non-consuming look at the next word (for error messages and keyword checks).
    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_word(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if word.is_empty() {
            Err(self.error(format!("expected a word, found '{}'", self.peek_word())))
        } else {
            Ok(word)
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let value = self.parse_number()?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(ParseError {
                message: format!("expected a non-negative integer, found {}", value),
                position: start,
            });
        }
        Ok(value as usize)
    }

    fn consume_and_keyword(&mut self) -> bool {
        self.skip_whitespace();
        let word = self.peek_word();
        if word.eq_ignore_ascii_case("and") {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn parse_entry_clause(&mut self) -> Result<EntryRule, ParseError> {
        self.skip_whitespace();
        if self.peek_word().eq_ignore_ascii_case("orderflow") {
            return Ok(EntryRule::Orderflow(self.parse_orderflow()?));
        }
        Ok(EntryRule::Indicator(self.parse_condition()?))
    }

    fn parse_orderflow(&mut self) -> Result<OrderflowCondition, ParseError> {
        self.parse_word()?; // "orderflow", checked by the caller
        self.expect_char('(')?;
        let heuristic = self.parse_word()?;
        self.expect_char(',')?;
        let lookback = self.parse_integer()?;
        self.expect_char(',')?;
        let threshold = self.parse_number()?;
        self.expect_char(')')?;
        Ok(OrderflowCondition {
            heuristic,
            lookback,
            threshold,
        })
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        let left = self.parse_operand()?;
        let op = self.parse_operator()?;
        let right = self.parse_operand()?;
        Ok(Condition { left, op, right })
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '.' => {
                Ok(Operand::Constant(self.parse_number()?))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let start = self.pos;
                let word = self.parse_word()?;
                match Field::from_name(&word) {
                    Some(field) => Ok(Operand::Field(field)),
                    None => Err(ParseError {
                        message: format!("unknown field '{}'", word),
                        position: start,
                    }),
                }
            }
            Some(ch) => Err(self.error(format!("expected operand, found '{}'", ch))),
            None => Err(self.error("expected operand, found end of input")),
        }
    }

    fn parse_operator(&mut self) -> Result<CompareOp, ParseError> {
        self.skip_whitespace();
        let symbols = [
            (">=", CompareOp::Gte),
            ("<=", CompareOp::Lte),
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            (">", CompareOp::Gt),
            ("<", CompareOp::Lt),
        ];
        for (symbol, op) in symbols {
            if self.remaining().starts_with(symbol) {
                self.pos += symbol.len();
                return Ok(op);
            }
        }

        let start = self.pos;
        let word = self.parse_word()?;
        match word.to_ascii_lowercase().as_str() {
            "gt" | "above" => Ok(CompareOp::Gt),
            "gte" => Ok(CompareOp::Gte),
            "lt" | "below" => Ok(CompareOp::Lt),
            "lte" => Ok(CompareOp::Lte),
            "eq" => Ok(CompareOp::Eq),
            "ne" => Ok(CompareOp::Ne),
            "crosses_above" => Ok(CompareOp::CrossesAbove),
            "crosses_below" => Ok(CompareOp::CrossesBelow),
            _ => Err(ParseError {
                message: format!("unknown operator '{}'", word),
                position: start,
            }),
        }
    }
}
