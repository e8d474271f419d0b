//! Tokenizer for Perlang source text.
//!
//! The tokenizer only knows about lexical structure. Whether an identifier names a type,
//! a variable or a reserved word in a given position is decided by the parser.
use std::fmt;
use std::{iter::Peekable, str::Chars};
use thiserror::Error;

/// Position in a text document expressed as zero-based line and character offset.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default, Hash)]
pub struct Position {
    /// Line position in a document (zero-based).
    pub line: usize,
    /// Character offset on a line in a document (zero-based). Assuming that
    /// the line is represented as a string, the `character` value represents
    /// the gap between the `character` and `character + 1`.
    pub character: usize,
}

// The effective range of a token.
// `start` inclusive, `end` exclusive.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default)]
pub struct EffectiveRange {
    pub length: usize,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub range: EffectiveRange,
    pub leading_trivia: Vec<Trivia>,
    text: String,
}

/// Trivia is not part of the normal language syntax and can appear anywhere between any two tokens.
#[derive(Debug, PartialEq, Clone)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub range: EffectiveRange,
    text: String,
}

impl Token {
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

impl Trivia {
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    // Primitive
    Identifier(String),
    Integer(i128),
    Float(f64),
    String(String),
    CharLiteral(char),

    // Keywords
    Var,
    Fun,
    Class,
    Enum,
    If,
    Else,
    While,
    For,
    Return,
    Print,
    True,
    False,
    Null,
    This,
    New,
    Public,
    Private,
    Mutable,
    Constructor,

    // Operators
    Eq,         // "=="
    Ne,         // "!="
    Le,         // "<="
    Ge,         // ">="
    AndAnd,     // "&&"
    OrOr,       // "||"
    Shl,        // "<<"
    Shr,        // ">>"
    StarStar,   // "**"
    PlusEq,     // "+="
    MinusEq,    // "-="
    PlusPlus,   // "++"
    MinusMinus, // "--"

    // punctuations
    Char(char),

    // End of input source
    Eos,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Var
                | TokenKind::Fun
                | TokenKind::Class
                | TokenKind::Enum
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Print
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::New
                | TokenKind::Public
                | TokenKind::Private
                | TokenKind::Mutable
                | TokenKind::Constructor
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum TriviaKind {
    // comment
    LineComment(String),
    Whitespace,
}

#[derive(Debug)]
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    at_end: bool,
    /// Tracking the range of token.
    lineno: usize,
    columnno: usize,
    start_position: Option<Position>,
    token_text: String,

    /// Remember a peeked value, even if it was None.
    peeked: Option<Result<Token, TokenError>>,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct TokenError {
    pub position: Position,
    pub kind: TokenErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenErrorKind {
    Error(String), // Genetic error
}

impl fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenErrorKind::Error(message) => write!(f, "{}", message),
        }
    }
}

impl<'a> Tokenizer<'a> {
    pub fn from_string<S: AsRef<str> + ?Sized>(src: &'a S) -> Tokenizer<'a> {
        let mut iter = src.as_ref().chars().peekable();
        let at_end = iter.peek().is_none();

        Tokenizer {
            chars: iter,
            at_end,
            lineno: 0,
            columnno: 0,
            start_position: None,
            token_text: "".to_string(),
            peeked: None,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.at_end
    }

    /// Returns a reference to the `next_token()` value without advance the tokenizer.
    pub fn peek(&mut self) -> Result<&Token, &TokenError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.advance_token(),
        };

        self.peeked.get_or_insert(token).as_ref()
    }

    pub fn peek_kind(&mut self) -> Result<&TokenKind, &TokenError> {
        self.peek().map(|x| &x.kind)
    }

    pub fn current_position(&self) -> Position {
        Position {
            line: self.lineno,
            character: self.columnno,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, TokenError> {
        match self.peeked.take() {
            Some(v) => v,
            None => self.advance_token(),
        }
    }

    fn begin_token(&mut self) {
        self.token_text.clear();
        self.start_position = Some(self.current_position());
    }

    fn end_token(&mut self) -> (String, EffectiveRange) {
        let end = self.current_position();
        let range = EffectiveRange {
            length: self.token_text.chars().count(),
            start: self.start_position.take().unwrap_or(end),
            end,
        };

        (self.token_text.clone(), range)
    }

    fn error<S: Into<String>>(&self, message: S) -> TokenError {
        TokenError {
            position: self.current_position(),
            kind: TokenErrorKind::Error(message.into()),
        }
    }

    fn advance_token(&mut self) -> Result<Token, TokenError> {
        let leading_trivia = self.read_trivia();

        self.begin_token();

        let kind = match self.peek_char() {
            None => TokenKind::Eos,
            Some(nextc) => match nextc {
                '0'..='9' => self.read_number(nextc)?,
                'a'..='z' | 'A'..='Z' | '_' => self.read_name(nextc),
                '!' | '=' | '<' | '>' | '&' | '|' | '*' | '+' | '-' => self.read_operator(nextc),
                '"' => self.read_string()?,
                '\'' => self.read_char()?,
                x => {
                    self.next_char();
                    TokenKind::Char(x)
                }
            },
        };

        let (text, range) = self.end_token();

        Ok(Token {
            kind,
            range,
            text,
            leading_trivia,
        })
    }

    fn read_escape(&mut self) -> Result<char, TokenError> {
        // '\\'
        self.next_char();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Err(self.error("Premature EOF while reading escape sequence")),
        };

        let unescaped = match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            '"' => '"',
            '\'' => '\'',
            '\\' => '\\',
            c => return Err(self.error(format!("Unrecognized escape sequence: \"\\{}\"", c))),
        };

        self.next_char();
        Ok(unescaped)
    }

    fn read_string(&mut self) -> Result<TokenKind, TokenError> {
        let mut string = String::new();
        self.next_char();

        loop {
            match self.peek_char() {
                Some('"') => {
                    self.next_char();
                    break;
                }
                Some('\\') => {
                    string.push(self.read_escape()?);
                }
                Some(c) => {
                    string.push(c);
                    self.next_char();
                }
                None => return Err(self.error("Premature EOF while reading string")),
            };
        }

        Ok(TokenKind::String(string))
    }

    fn read_char(&mut self) -> Result<TokenKind, TokenError> {
        self.next_char();

        let c = match self.peek_char() {
            Some('\\') => self.read_escape()?,
            Some('\'') | None => return Err(self.error("Empty character literal")),
            Some(c) => {
                self.next_char();
                c
            }
        };

        match self.peek_char() {
            Some('\'') => {
                self.next_char();
                Ok(TokenKind::CharLiteral(c))
            }
            _ => Err(self.error("Unterminated character literal")),
        }
    }

    fn read_operator(&mut self, nextc: char) -> TokenKind {
        let c = nextc;
        self.next_char();

        let nextc = match self.peek_char() {
            None => return TokenKind::Char(c),
            Some(c) => c,
        };

        let token = match (c, nextc) {
            ('=', '=') => TokenKind::Eq,
            ('!', '=') => TokenKind::Ne,
            ('<', '=') => TokenKind::Le,
            ('>', '=') => TokenKind::Ge,
            ('<', '<') => TokenKind::Shl,
            ('>', '>') => TokenKind::Shr,
            ('&', '&') => TokenKind::AndAnd,
            ('|', '|') => TokenKind::OrOr,
            ('*', '*') => TokenKind::StarStar,
            ('+', '=') => TokenKind::PlusEq,
            ('-', '=') => TokenKind::MinusEq,
            ('+', '+') => TokenKind::PlusPlus,
            ('-', '-') => TokenKind::MinusMinus,
            _ => return TokenKind::Char(c),
        };

        self.next_char();
        token
    }

    fn read_name(&mut self, nextc: char) -> TokenKind {
        let mut value = nextc.to_string();
        self.next_char();

        while let Some(nextc) = self.peek_char() {
            match nextc {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {
                    value.push(nextc);
                }
                _ => break,
            };
            self.next_char();
        }

        match value.as_str() {
            "var" => TokenKind::Var,
            "fun" => TokenKind::Fun,
            "class" => TokenKind::Class,
            "enum" => TokenKind::Enum,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "print" => TokenKind::Print,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            "new" => TokenKind::New,
            "public" => TokenKind::Public,
            "private" => TokenKind::Private,
            "mutable" => TokenKind::Mutable,
            "constructor" => TokenKind::Constructor,
            _ => TokenKind::Identifier(value),
        }
    }

    fn read_number(&mut self, nextc: char) -> Result<TokenKind, TokenError> {
        let mut digits = nextc.to_string();
        self.next_char();

        while let Some(x @ '0'..='9') = self.peek_char() {
            digits.push(x);
            self.next_char();
        }

        // fraction
        if let Some('.') = self.peek_char() {
            if let Some('0'..='9') = self.peek_second_char() {
                digits.push('.');
                self.next_char();

                while let Some(x @ '0'..='9') = self.peek_char() {
                    digits.push(x);
                    self.next_char();
                }

                return digits
                    .parse::<f64>()
                    .map(TokenKind::Float)
                    .map_err(|_| self.error(format!("Invalid floating point literal: {}", digits)));
            }
        }

        digits
            .parse::<i128>()
            .map(TokenKind::Integer)
            .map_err(|_| self.error(format!("Integer literal is too large: {}", digits)))
    }

    fn peek_char(&mut self) -> Option<char> {
        let c = self.chars.peek();
        self.at_end = c.is_none();
        c.copied()
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();

        lookahead.next();
        lookahead.next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next()?;

        self.token_text.push(c);
        self.columnno += 1;

        if c == '\n' {
            self.lineno += 1;
            self.columnno = 0;
        }

        Some(c)
    }

    fn read_whitespace(&mut self) -> TriviaKind {
        while let Some(c) = self.peek_char() {
            if !(c == ' ' || c == '\t' || c == '\n' || c == '\r') {
                break;
            }
            self.next_char();
        }

        TriviaKind::Whitespace
    }

    fn read_comment(&mut self) -> TriviaKind {
        let mut comment = String::new();

        // "//"
        self.next_char();
        self.next_char();

        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }

            comment.push(c);
            self.next_char();
        }

        TriviaKind::LineComment(comment)
    }

    fn read_trivia(&mut self) -> Vec<Trivia> {
        let mut trivia = vec![];

        while let Some(c) = self.peek_char() {
            self.begin_token();

            let kind = if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.read_whitespace()
            } else if c == '/' && self.peek_second_char() == Some('/') {
                self.read_comment()
            } else {
                break;
            };

            let (text, range) = self.end_token();

            trivia.push(Trivia { kind, text, range })
        }

        trivia
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}:{}", self.line + 1, self.character + 1)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier `{}`", name),
            TokenKind::Integer(i) => write!(f, "integer `{}`", i),
            TokenKind::Float(x) => write!(f, "number `{}`", x),
            TokenKind::String(s) => write!(f, "string {:?}", s),
            TokenKind::CharLiteral(c) => write!(f, "character {:?}", c),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Fun => write!(f, "fun"),
            TokenKind::Class => write!(f, "class"),
            TokenKind::Enum => write!(f, "enum"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::While => write!(f, "while"),
            TokenKind::For => write!(f, "for"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::This => write!(f, "this"),
            TokenKind::New => write!(f, "new"),
            TokenKind::Public => write!(f, "public"),
            TokenKind::Private => write!(f, "private"),
            TokenKind::Mutable => write!(f, "mutable"),
            TokenKind::Constructor => write!(f, "constructor"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::AndAnd => write!(f, "&&"),
            TokenKind::OrOr => write!(f, "||"),
            TokenKind::Shl => write!(f, "<<"),
            TokenKind::Shr => write!(f, ">>"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::PlusEq => write!(f, "+="),
            TokenKind::MinusEq => write!(f, "-="),
            TokenKind::PlusPlus => write!(f, "++"),
            TokenKind::MinusMinus => write!(f, "--"),
            TokenKind::Char(c) => write!(f, "{}", c),
            TokenKind::Eos => write!(f, "(EOF)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn is_at_end_empty() {
        let tokenizer = Tokenizer::from_string("");
        assert!(tokenizer.is_at_end());
    }

    #[test]
    fn is_at_end_one() {
        let mut tokenizer = Tokenizer::from_string("o");
        assert!(!tokenizer.is_at_end());
        tokenizer.next_token().unwrap();
        assert!(tokenizer.is_at_end());
    }

    #[test]
    fn tokenize() {
        let mut tokenizer = Tokenizer::from_string("42() ab_01");

        let token = tokenizer.next_token().unwrap();
        assert_matches!(token.kind, TokenKind::Integer(42));
        assert_eq!(
            token.range,
            EffectiveRange {
                start: Position {
                    line: 0,
                    character: 0
                },
                end: Position {
                    line: 0,
                    character: 2
                },
                length: 2
            }
        );

        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Char('('));
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Char(')'));

        let token = tokenizer.next_token().unwrap();
        assert_matches!(token.kind, TokenKind::Identifier(ref name) => {
            assert_eq!(name, "ab_01");
        });
        assert_eq!(token.range.start.character, 5);
        assert_eq!(token.text(), "ab_01");

        let token = tokenizer.next_token().unwrap();

        assert!(tokenizer.is_at_end());
        assert_eq!(token.kind, TokenKind::Eos);
    }

    #[test]
    fn operators() {
        let mut tokenizer = Tokenizer::from_string("!===<><=>= && || << >> ** += -= ++ --");

        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Ne);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Eq);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Char('<'));
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Char('>'));
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Le);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Ge);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::AndAnd);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::OrOr);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Shl);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Shr);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::StarStar);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::PlusEq);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::MinusEq);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::PlusPlus);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::MinusMinus);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Eos);
    }

    #[test]
    fn keywords() {
        let mut tokenizer = Tokenizer::from_string("var fun mutable constructor int");

        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Var);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Fun);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Mutable);
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Constructor);
        // type names are plain identifiers
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Identifier(name) => {
            assert_eq!(name, "int");
        });
    }

    #[test]
    fn numbers() {
        let mut tokenizer = Tokenizer::from_string("18446744073709551616 1.5 3");

        assert_eq!(
            tokenizer.next_token().unwrap().kind,
            TokenKind::Integer(18446744073709551616)
        );
        assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Float(1.5));
        assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Integer(3));
    }

    #[test]
    fn integer_too_large() {
        let mut tokenizer = Tokenizer::from_string("999999999999999999999999999999999999999999");

        assert_matches!(tokenizer.next_token(), Err(TokenError { kind: TokenErrorKind::Error(message), .. }) => {
            assert!(message.starts_with("Integer literal is too large"));
        });
    }

    #[test]
    fn comment() {
        let mut tokenizer = Tokenizer::from_string("// comment\n");

        let token = tokenizer.next_token().unwrap();

        assert_eq!(token.kind, TokenKind::Eos);
        assert_eq!(token.leading_trivia.len(), 2);

        let trivia = &token.leading_trivia[0];

        assert_matches!(trivia.kind, TriviaKind::LineComment(ref str) => {
            assert_eq!(str, " comment");
        });
        assert_eq!(trivia.text(), "// comment");
        assert_eq!(
            trivia.range,
            EffectiveRange {
                start: Position {
                    line: 0,
                    character: 0
                },
                end: Position {
                    line: 0,
                    character: 10
                },
                length: 10
            }
        );

        let trivia = &token.leading_trivia[1];

        assert_eq!(trivia.kind, TriviaKind::Whitespace);
        assert_eq!(trivia.range.end, Position { line: 1, character: 0 });
    }

    #[test]
    fn slash_is_not_a_comment() {
        let mut tokenizer = Tokenizer::from_string("a / b");

        tokenizer.next_token().unwrap();
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::Char('/'));
    }

    #[test]
    fn strings_and_chars() {
        let mut tokenizer = Tokenizer::from_string("\"\" \"\\n\" 'a' '\\''");

        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::String(str) => {
            assert_eq!(str, "");
        });
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::String(str) => {
            assert_eq!(str, "\n");
        });
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::CharLiteral('a'));
        assert_matches!(tokenizer.next_token().unwrap().kind, TokenKind::CharLiteral('\''));
    }

    #[test]
    fn unterminated_string() {
        let mut tokenizer = Tokenizer::from_string("\"abc");

        assert!(tokenizer.next_token().is_err());
    }

    #[test]
    fn peek0() {
        let mut tokenizer = Tokenizer::from_string("1 2 3");

        // peek() lets us see into the future
        assert_eq!(tokenizer.peek().unwrap().kind, TokenKind::Integer(1));
        assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Integer(1));
        assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Integer(2));

        // The tokenizer does not advance even if we `peek` multiple times
        assert_eq!(tokenizer.peek().unwrap().kind, TokenKind::Integer(3));
        assert_eq!(tokenizer.peek().unwrap().kind, TokenKind::Integer(3));
        assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Integer(3));

        // After an iterator is finished.
        assert_eq!(tokenizer.peek().unwrap().kind, TokenKind::Eos);
        assert_eq!(tokenizer.peek().unwrap().kind, TokenKind::Eos);
    }
}
