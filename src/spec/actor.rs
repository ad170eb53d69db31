//! Actor expressions: boolean expressions over claims of the calling identity.
//!
//! ```text
//! expr    := or
//! or      := and ("||" and)*
//! and     := unary ("&&" unary)*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | term [op literal]
//! term    := ident ("." ident)* | "true" | "false"
//! op      := == != =~ !~ < <= > >=
//! literal := "..." | '...' | number
//! ```
//!
//! Only the syntax is checked here; evaluation belongs to the runtime.

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str,
    Num,
    Not,
    And,
    Or,
    Cmp,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '=' if next == Some('=') || next == Some('~') => {
                tokens.push(Token::Cmp);
                i += 2;
            }
            '!' if next == Some('=') || next == Some('~') => {
                tokens.push(Token::Cmp);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '<' | '>' => {
                tokens.push(Token::Cmp);
                i += if next == Some('=') { 2 } else { 1 };
            }
            '"' | '\'' => {
                let quote = c;
                let mut j = i + 1;
                while j < chars.len() && chars[j] != quote {
                    if chars[j] == '\\' {
                        j += 1;
                    }
                    j += 1;
                }
                if j >= chars.len() {
                    return Err("unterminated string literal".to_string());
                }
                tokens.push(Token::Str);
                i = j + 1;
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
                    j += 1;
                }
                tokens.push(Token::Num);
                i = j;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut j = i;
                while j < chars.len()
                    && (chars[j].is_ascii_alphanumeric() || chars[j] == '_' || chars[j] == '.')
                {
                    j += 1;
                }
                let ident: String = chars[i..j].iter().collect();
                if ident.ends_with('.') || ident.contains("..") {
                    return Err(format!("invalid identifier '{ident}'"));
                }
                tokens.push(Token::Ident(ident));
                i = j;
            }
            other => return Err(format!("unexpected character '{other}'")),
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
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn or(&mut self) -> Result<(), String> {
        self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            self.and()?;
        }
        Ok(())
    }

    fn and(&mut self) -> Result<(), String> {
        self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            self.unary()?;
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<(), String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<(), String> {
        match self.next() {
            Some(Token::Open) => {
                self.or()?;
                match self.next() {
                    Some(Token::Close) => Ok(()),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(Token::Ident(_)) => {
                if self.peek() == Some(&Token::Cmp) {
                    self.pos += 1;
                    match self.next() {
                        Some(Token::Str) | Some(Token::Num) | Some(Token::Ident(_)) => Ok(()),
                        _ => Err("comparison requires a literal".to_string()),
                    }
                } else {
                    Ok(())
                }
            }
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// Check that `expr` is a well-formed actor expression.
pub fn validate_actor(expr: &str) -> Result<(), String> {
    if expr.contains('`') {
        return Err("backquotes are not allowed in the actor expression".to_string());
    }
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err("empty actor expression".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    parser.or()?;
    if parser.pos < parser.tokens.len() {
        return Err("unexpected trailing tokens in actor expression".to_string());
    }
    Ok(())
}
