use crate::lexer_log;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    /// Raw literal text; converted to a value by the compiler.
    Number(String),
    Identifier(String),
    Print,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Modulo,
    Carrot,
    Assignment,
    LParen,
    RParen,
    Newline,
}

impl TokenType {
    pub fn precedence(&self) -> Option<u8> {
        match self {
            TokenType::Carrot => Some(3),
            TokenType::Asterisk
            | TokenType::Slash
            | TokenType::Modulo => Some(2),
            TokenType::Plus
            | TokenType::Minus => Some(1),
            _ => None,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        matches!(self, TokenType::Carrot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn precedence(&self) -> Option<u8> {
        self.token_type.precedence()
    }

    pub fn is_right_associative(&self) -> bool {
        self.token_type.is_right_associative()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{:?}>", self.token_type)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {line}:{column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },
}

pub struct Lexer {
    chars: Vec<char>,
    current: usize,
    line: usize,
    column: usize,
    current_char: char,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let current_char = chars.first().copied().unwrap_or('\0');
        Lexer {
            chars,
            current: 0,
            line: 1,
            column: 1,
            current_char,
        }
    }

    fn advance(&mut self) {
        if self.current_char == '\n' {
            self.line += 1;
            self.column = 0;
        }
        self.current += 1;
        self.column += 1;
        self.current_char = self.chars.get(self.current).copied().unwrap_or('\0');
    }

    fn is_end_of_file(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn is_identifier_part(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    fn token(&self, token_type: TokenType) -> Token {
        Token { token_type, line: self.line, column: self.column }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_end_of_file() && self.current_char.is_whitespace() && self.current_char != '\n' {
            self.advance();
        }
    }

    // Malformed text such as `1.2.3` is kept as-is so the compiler can
    // report it against the literal.
    fn read_number(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut number = String::new();

        while self.current_char.is_ascii_digit() || self.current_char == '.' {
            number.push(self.current_char);
            self.advance();
        }

        Token { token_type: TokenType::Number(number), line, column }
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut identifier = String::new();

        while Self::is_identifier_part(self.current_char) {
            identifier.push(self.current_char);
            self.advance();
        }

        let token_type = match identifier.as_str() {
            "print" => TokenType::Print,
            _ => TokenType::Identifier(identifier),
        };

        Token { token_type, line, column }
    }

    pub fn read_token(&mut self) -> Result<Token, LexError> {
        let token_type = match self.current_char {
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '=' => TokenType::Assignment,
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Asterisk,
            '/' => TokenType::Slash,
            '%' => TokenType::Modulo,
            '^' => TokenType::Carrot,
            '\n' => TokenType::Newline,
            'a'..='z' | 'A'..='Z' | '_' => return Ok(self.read_identifier_or_keyword()),
            '0'..='9' | '.' => return Ok(self.read_number()),
            ch => {
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    line: self.line,
                    column: self.column,
                })
            }
        };
        let tok = self.token(token_type);
        self.advance();
        Ok(tok)
    }

    pub fn lex(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.is_end_of_file() {
                break;
            }
            let token = self.read_token()?;
            lexer_log!("{} at {}:{}", token, token.line, token.column);
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(source: &str) -> Vec<TokenType> {
        Lexer::new(source)
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn lexes_assignment() {
        assert_eq!(
            types("rate = 1.5 * (x + 2)"),
            vec![
                TokenType::Identifier("rate".to_string()),
                TokenType::Assignment,
                TokenType::Number("1.5".to_string()),
                TokenType::Asterisk,
                TokenType::LParen,
                TokenType::Identifier("x".to_string()),
                TokenType::Plus,
                TokenType::Number("2".to_string()),
                TokenType::RParen,
            ]
        );
    }

    #[test]
    fn print_is_a_keyword_but_printer_is_not() {
        assert_eq!(
            types("print printer"),
            vec![TokenType::Print, TokenType::Identifier("printer".to_string())]
        );
    }

    #[test]
    fn keeps_malformed_number_text() {
        assert_eq!(types("1.2.3"), vec![TokenType::Number("1.2.3".to_string())]);
    }

    #[test]
    fn tracks_lines_and_columns() {
        let tokens = Lexer::new("a\n  b").lex().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!(tokens[1].token_type, TokenType::Newline);
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn rejects_unknown_character() {
        let err = Lexer::new("3 $ 4").lex().unwrap_err();
        assert_eq!(err, LexError::UnexpectedCharacter { ch: '$', line: 1, column: 3 });
    }

    #[test]
    fn operator_precedence_table() {
        assert!(TokenType::Carrot.precedence() > TokenType::Asterisk.precedence());
        assert!(TokenType::Modulo.precedence() > TokenType::Minus.precedence());
        assert!(TokenType::Carrot.is_right_associative());
        assert_eq!(TokenType::Assignment.precedence(), None);
    }
}
