use super::token::{Literal, Operator, Token, Word};
use super::Error;
use crate::error;

type Result<T> = std::result::Result<T, Error>;

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn is_basic_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_basic_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// ## One token lookahead lexer
///
/// The current token is always available through `token()`; `next()`
/// consumes it and scans the following one from the remaining source.

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    token: Token,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Result<Lexer<'a>> {
        let mut lexer = Lexer {
            src,
            pos: 0,
            line: 1,
            token: Token::Eof,
        };
        lexer.next()?;
        Ok(lexer)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Line of the lookahead. Producing an end of line token advances it.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Consume the lookahead and return it.
    pub fn next(&mut self) -> Result<Token> {
        let token = self.scan()?;
        Ok(std::mem::replace(&mut self.token, token))
    }

    /// Take the raw text between the lookahead and the end of the line,
    /// then scan the end of line as the new lookahead.
    pub fn rest_of_line(&mut self) -> Result<&'a str> {
        let rest = &self.src[self.pos..];
        let len = rest.find('\n').unwrap_or_else(|| rest.len());
        self.pos += len;
        self.next()?;
        Ok(&rest[..len])
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, skip: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(skip)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn scan(&mut self) -> Result<Token> {
        loop {
            let ch = match self.peek() {
                Some(ch) => ch,
                None => return Ok(Token::Eof),
            };
            if is_basic_whitespace(ch) {
                self.bump();
                continue;
            }
            if ch == '_' && self.continuation() {
                continue;
            }
            if ch == '\'' {
                self.comment();
                continue;
            }
            if ch == '\n' {
                self.bump();
                self.line += 1;
                return Ok(Token::Eol);
            }
            if ch == '"' {
                return Ok(self.string());
            }
            if is_basic_digit(ch) || (ch == '.' && self.peek_at(1).map_or(false, is_basic_digit))
            {
                return Ok(self.number());
            }
            if ch == '&' {
                return self.ampersand();
            }
            if is_basic_alphabetic(ch) {
                return Ok(self.alphabetic());
            }
            return self.minutia();
        }
    }

    fn continuation(&mut self) -> bool {
        let rest = &self.src[self.pos + 1..];
        let trimmed = rest.trim_start_matches(|c| c == ' ' || c == '\t' || c == '\r');
        let newline = if trimmed.starts_with('\'') {
            trimmed.find('\n')
        } else if trimmed.starts_with('\n') {
            Some(0)
        } else {
            None
        };
        match newline {
            Some(nl) => {
                self.pos = self.src.len() - trimmed.len() + nl + 1;
                self.line += 1;
                true
            }
            None => false,
        }
    }

    fn comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn string(&mut self) -> Token {
        let mut s = String::new();
        self.bump();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
            if ch == '"' {
                break;
            }
            s.push(ch);
        }
        Token::Literal(Literal::String(s))
    }

    fn digits(&mut self, s: &mut String) {
        while let Some(ch) = self.peek() {
            if !is_basic_digit(ch) {
                break;
            }
            s.push(ch);
            self.bump();
        }
    }

    fn number(&mut self) -> Token {
        let mut s = String::new();
        self.digits(&mut s);
        if self.peek() == Some('.') {
            s.push('.');
            self.bump();
            self.digits(&mut s);
        }
        if let Some('e') | Some('E') = self.peek() {
            let signed = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).map_or(false, is_basic_digit) {
                s.push('e');
                self.bump();
                if signed {
                    if let Some(sign) = self.bump() {
                        s.push(sign);
                    }
                }
                self.digits(&mut s);
            }
        }
        if self.peek() == Some('#') {
            self.bump();
        }
        Token::Literal(Literal::Number(s))
    }

    fn ampersand(&mut self) -> Result<Token> {
        self.bump();
        match self.peek() {
            Some('h') | Some('H') => {
                self.bump();
                let mut s = String::from("0x");
                while let Some(ch) = self.peek() {
                    if !ch.is_ascii_hexdigit() {
                        break;
                    }
                    s.push(ch.to_ascii_lowercase());
                    self.bump();
                }
                if s.len() == 2 || self.peek().map_or(false, is_ident_char) {
                    return Err(error!(SyntaxError, self.line; "Bad hex number"));
                }
                Ok(Token::Literal(Literal::Number(s)))
            }
            Some('=') => {
                self.bump();
                Ok(Token::Compound(Operator::Plus))
            }
            _ => Err(error!(SyntaxError, self.line; "Unexpected character \"&\"")),
        }
    }

    fn alphabetic(&mut self) -> Token {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if !is_ident_char(ch) {
                break;
            }
            s.push(ch.to_ascii_lowercase());
            self.bump();
        }
        match self.peek() {
            Some(ch @ '$') | Some(ch @ '%') | Some(ch @ '!') | Some(ch @ '#') => {
                s.push(ch);
                self.bump();
                return Token::Ident(s);
            }
            Some('&') if self.peek_at(1) != Some('=') => {
                s.push('&');
                self.bump();
                return Token::Ident(s);
            }
            _ => {}
        }
        match Token::from_word(&s) {
            Some(token) => token,
            None => Token::Ident(s),
        }
    }

    fn minutia(&mut self) -> Result<Token> {
        use Operator::*;
        let ch = match self.bump() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };
        let next = self.peek();
        let compound = match ch {
            '+' => Some(Plus),
            '-' => Some(Minus),
            '*' => Some(Multiply),
            '/' => Some(Divide),
            '\\' => Some(DivideInt),
            '^' => Some(Caret),
            _ => None,
        };
        if let (Some(op), Some('=')) = (compound, next) {
            self.bump();
            return Ok(Token::Compound(op));
        }
        if let Some(op) = compound {
            return Ok(Token::Operator(op));
        }
        let token = match (ch, next) {
            ('<', Some('=')) => Some(Token::Operator(LessEqual)),
            ('>', Some('=')) => Some(Token::Operator(GreaterEqual)),
            ('<', Some('>')) => Some(Token::Operator(NotEqual)),
            _ => None,
        };
        if let Some(token) = token {
            self.bump();
            return Ok(token);
        }
        Ok(match ch {
            '<' => Token::Operator(Less),
            '>' => Token::Operator(Greater),
            '=' => Token::Operator(Equal),
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '.' => Token::Dot,
            '?' => Token::Word(Word::Print),
            _ => {
                return Err(error!(SyntaxError, self.line; "Unexpected character \"{}\"", ch));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(s).unwrap();
        let mut v = vec![];
        while *lexer.token() != Token::Eof {
            v.push(lexer.next().unwrap());
        }
        v
    }

    #[test]
    fn test_continuation_joins_lines() {
        let mut lexer = Lexer::new("a _ ' note\n+ b\nc").unwrap();
        assert_eq!(lexer.next().unwrap(), Token::Ident("a".into()));
        assert_eq!(lexer.line(), 2);
        assert_eq!(lexer.next().unwrap(), Token::Operator(Operator::Plus));
        assert_eq!(lexer.next().unwrap(), Token::Ident("b".into()));
        assert_eq!(lexer.token(), &Token::Eol);
        assert_eq!(lexer.line(), 3);
    }

    #[test]
    fn test_long_suffix_and_compound() {
        assert_eq!(
            tokens("x& &= y&"),
            vec![
                Token::Ident("x&".into()),
                Token::Compound(Operator::Plus),
                Token::Ident("y&".into())
            ]
        );
    }

    #[test]
    fn test_rest_of_line() {
        let mut lexer = Lexer::new("DATA 1, \"a,b\" ,c\nx").unwrap();
        assert_eq!(lexer.token(), &Token::Word(Word::Data));
        assert_eq!(lexer.rest_of_line().unwrap(), " 1, \"a,b\" ,c");
        assert_eq!(lexer.next().unwrap(), Token::Eol);
        assert_eq!(lexer.next().unwrap(), Token::Ident("x".into()));
    }

    #[test]
    fn test_bad_hex() {
        assert_eq!(
            Lexer::new("&HZZ").err().unwrap().to_string(),
            "Bad hex number at line 1"
        );
    }
}
