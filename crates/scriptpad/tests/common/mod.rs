//! Deterministic fake engine shared by the integration tests.
//!
//! `Calc` compiles integer arithmetic (`+ - * /`, parentheses, unary minus, an
//! optional leading `return`) where the identifier `input` stands for the
//! session's input text parsed as an integer. It counts its calls so tests can
//! check when the session reaches the engine.

use scriptpad::Engine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Input,
    Neg(Box<Expr>),
    Binary(Box<Expr>, Op, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Default)]
pub struct Calc {
    pub compile_calls: usize,
    pub execute_calls: usize,
}

impl Calc {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for Calc {
    type Program = Expr;
    type Output = i64;
    type CompileError = String;
    type RuntimeError = String;

    fn compile(&mut self, source: &str) -> Result<Expr, String> {
        self.compile_calls += 1;
        let tokens = lex(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        if parser.peek() == Some(&Token::Return) {
            parser.pos += 1;
        }
        let expr = parser.expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected token {token:?}")),
        }
    }

    fn execute(&mut self, program: &Expr, input: &str) -> Result<i64, String> {
        self.execute_calls += 1;
        eval(program, input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    Return,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn lex(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                let value = digits.parse().map_err(|e| format!("bad integer {digits}: {e}"))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_alphanumeric() || **d == '_') {
                    word.push(d);
                    chars.next();
                }
                tokens.push(if word == "return" { Token::Return } else { Token::Ident(word) });
            }
            _ => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => return Err(format!("unexpected character '{other}'")),
                });
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(self.term()?));
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(self.factor()?));
        }
    }

    fn factor(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Int(value)) => Ok(Expr::Int(value)),
            Some(Token::Ident(name)) if name == "input" => Ok(Expr::Input),
            Some(Token::Ident(name)) => Err(format!("unknown identifier '{name}'")),
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.factor()?))),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("unclosed grouping".to_owned()),
                }
            }
            Some(token) => Err(format!("unexpected token {token:?}")),
            None => Err("unexpected end of source".to_owned()),
        }
    }
}

fn eval(expr: &Expr, input: &str) -> Result<i64, String> {
    match expr {
        Expr::Int(value) => Ok(*value),
        Expr::Input => input
            .trim()
            .parse()
            .map_err(|_| format!("input '{}' is not an integer", input.trim())),
        Expr::Neg(inner) => eval(inner, input)?.checked_neg().ok_or_else(overflow),
        Expr::Binary(lhs, op, rhs) => {
            let (lhs, rhs) = (eval(lhs, input)?, eval(rhs, input)?);
            match op {
                Op::Add => lhs.checked_add(rhs).ok_or_else(overflow),
                Op::Sub => lhs.checked_sub(rhs).ok_or_else(overflow),
                Op::Mul => lhs.checked_mul(rhs).ok_or_else(overflow),
                Op::Div if rhs == 0 => Err("division by zero".to_owned()),
                Op::Div => lhs.checked_div(rhs).ok_or_else(overflow),
            }
        }
    }
}

fn overflow() -> String {
    "integer overflow".to_owned()
}
