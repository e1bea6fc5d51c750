//! Character stream to token stream for the CV dialog format.
//!
//! The lexer is a small state machine. From the undecided state it skips
//! whitespace and dispatches on the next character; every other state
//! accumulates one token and returns to undecided. Numbers and identifiers
//! only learn they are finished by reading one character too far, so they
//! back the cursor up by one before handing control back.

use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::error::Error;

/// Preprocessor directives understood by the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    If,
    Ifdef,
    Elif,
    Else,
    Endif,
    Include,
    Error,
    Define,
}

impl Directive {
    pub const ALL: [Directive; 8] = [
        Directive::If,
        Directive::Ifdef,
        Directive::Elif,
        Directive::Else,
        Directive::Endif,
        Directive::Include,
        Directive::Error,
        Directive::Define,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Directive::If => "#if",
            Directive::Ifdef => "#ifdef",
            Directive::Elif => "#elif",
            Directive::Else => "#else",
            Directive::Endif => "#endif",
            Directive::Include => "#include",
            Directive::Error => "#error",
            Directive::Define => "#define",
        }
    }

    pub fn from_text(text: &str) -> Option<Directive> {
        Directive::ALL
            .into_iter()
            .find(|directive| directive.as_str() == text)
    }
}

/// The CV dialog section and control macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    BeginDialogDefinition,
    EndDialogDefinition,
    BeginDialogProperties,
    EndDialogProperties,
    DefineDialogProperty,
    DeclareControl,
    BeginControlDefinitions,
    EndControlDefinitions,
    BeginControl,
    EndControl,
    BeginLayers,
    EndLayers,
    BeginLayer,
    EndLayer,
}

impl Keyword {
    pub const ALL: [Keyword; 14] = [
        Keyword::BeginDialogDefinition,
        Keyword::EndDialogDefinition,
        Keyword::BeginDialogProperties,
        Keyword::EndDialogProperties,
        Keyword::DefineDialogProperty,
        Keyword::DeclareControl,
        Keyword::BeginControlDefinitions,
        Keyword::EndControlDefinitions,
        Keyword::BeginControl,
        Keyword::EndControl,
        Keyword::BeginLayers,
        Keyword::EndLayers,
        Keyword::BeginLayer,
        Keyword::EndLayer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::BeginDialogDefinition => "begin_dialog_definition_ex_",
            Keyword::EndDialogDefinition => "end_dialog_definition_ex_",
            Keyword::BeginDialogProperties => "begin_dialog_properties",
            Keyword::EndDialogProperties => "end_dialog_properties",
            Keyword::DefineDialogProperty => "define_dialog_property",
            Keyword::DeclareControl => "declare_control",
            Keyword::BeginControlDefinitions => "begin_control_definitions",
            Keyword::EndControlDefinitions => "end_control_definitions",
            Keyword::BeginControl => "begin_control_ex",
            Keyword::EndControl => "end_control_ex",
            Keyword::BeginLayers => "BEGIN_LAYERS",
            Keyword::EndLayers => "END_LAYERS",
            Keyword::BeginLayer => "BEGIN_LAYER",
            Keyword::EndLayer => "END_LAYER",
        }
    }

    pub fn from_text(text: &str) -> Option<Keyword> {
        Keyword::ALL.into_iter().find(|keyword| keyword.as_str() == text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Directive(Directive),
    /// Full comment text including the leading `//`, trimmed.
    Comment(String),
    /// Contents between the delimiting quotes; doubled quotes are kept as-is.
    String(String),
    Number(f64),
    Identifier(String),
    Keyword(Keyword),
    Comma,
    BinaryOr,
    OpenParen,
    CloseParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Directive,
    Comment,
    String,
    Number,
    Identifier,
    Keyword,
    Comma,
    BinaryOr,
    OpenParen,
    CloseParen,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Directive => "directive",
            TokenKind::Comment => "comment",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Comma => "`,`",
            TokenKind::BinaryOr => "`|`",
            TokenKind::OpenParen => "`(`",
            TokenKind::CloseParen => "`)`",
        };
        write!(f, "{}", name)
    }
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Directive(_) => TokenKind::Directive,
            Token::Comment(_) => TokenKind::Comment,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::Identifier(_) => TokenKind::Identifier,
            Token::Keyword(_) => TokenKind::Keyword,
            Token::Comma => TokenKind::Comma,
            Token::BinaryOr => TokenKind::BinaryOr,
            Token::OpenParen => TokenKind::OpenParen,
            Token::CloseParen => TokenKind::CloseParen,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Directive(directive) => write!(f, "directive `{}`", directive.as_str()),
            Token::Comment(text) => write!(f, "comment `{}`", text),
            Token::String(value) => write!(f, "string \"{}\"", value),
            Token::Number(value) => write!(f, "number {}", value),
            Token::Identifier(name) => write!(f, "identifier `{}`", name),
            Token::Keyword(keyword) => write!(f, "keyword `{}`", keyword.as_str()),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Undecided,
    Directive,
    Comment,
    Number,
    String,
    Identifier,
}

/// Tokenizer over a fully loaded source text.
#[derive(Debug, Clone)]
pub struct Lexer {
    chars: Vec<char>,
    cursor: usize,
    state: State,
    buffer: String,
    tokens: Vec<Token>,
}

/// Tokenizes a whole CV dialog or string-table source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(source).tokenize()
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            cursor: 0,
            state: State::Undecided,
            buffer: String::new(),
            tokens: Vec::new(),
        }
    }

    /// Moves the read cursor back by `count` characters, stopping at the start.
    pub fn backup(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_sub(count);
    }

    /// Moves the read cursor forward by `count` characters, stopping at the end.
    pub fn skip(&mut self, count: usize) {
        self.cursor = (self.cursor + count).min(self.chars.len());
    }

    /// Looks `offset` characters past the cursor without consuming anything.
    /// `peek(0)` is the character the next read would return.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).copied()
    }

    fn read(&mut self) -> Option<char> {
        let c = self.chars.get(self.cursor).copied();
        if c.is_some() {
            self.cursor += 1;
        }
        c
    }

    /// Runs the state machine to the end of input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Error> {
        loop {
            let c = self.read();
            match self.state {
                State::Undecided => match c {
                    None => break,
                    Some(c) => self.dispatch(c)?,
                },
                State::Directive => match c {
                    Some(c) if !c.is_whitespace() => self.buffer.push(c),
                    _ => self.finish_directive()?,
                },
                State::Comment => match c {
                    Some(c) if c != '\n' => self.buffer.push(c),
                    _ => self.finish_comment()?,
                },
                State::Number => match c {
                    Some(c) if c.is_ascii_digit() || c == '.' => self.buffer.push(c),
                    _ => {
                        self.finish_number()?;
                        if c.is_some() {
                            self.backup(1);
                        }
                    }
                },
                State::String => match c {
                    None => return Err(self.error("unterminated string literal")),
                    Some('"') if self.peek(0) == Some('"') => {
                        self.buffer.push_str("\"\"");
                        self.skip(1);
                    }
                    Some('"') => {
                        let value = std::mem::take(&mut self.buffer);
                        self.emit(Token::String(value));
                    }
                    Some(c) => self.buffer.push(c),
                },
                State::Identifier => match c {
                    Some(c) if is_identifier_char(c) => self.buffer.push(c),
                    _ => {
                        self.finish_identifier();
                        if c.is_some() {
                            self.backup(1);
                        }
                    }
                },
            }

            if c.is_none() && self.state == State::Undecided {
                break;
            }
        }

        debug!("tokenized {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn dispatch(&mut self, c: char) -> Result<(), Error> {
        match c {
            c if c.is_whitespace() => {}
            ',' => self.tokens.push(Token::Comma),
            '|' => self.tokens.push(Token::BinaryOr),
            '(' => self.tokens.push(Token::OpenParen),
            ')' => self.tokens.push(Token::CloseParen),
            '#' => self.begin(State::Directive, Some(c)),
            '/' => self.begin(State::Comment, Some(c)),
            '"' => self.begin(State::String, None),
            c if c.is_ascii_digit() || c == '-' => self.begin(State::Number, Some(c)),
            c if c.is_alphabetic() || c == '_' || c == ':' => {
                self.begin(State::Identifier, Some(c))
            }
            c => return Err(self.error(format!("unexpected character '{}'", c))),
        }
        Ok(())
    }

    fn begin(&mut self, state: State, first: Option<char>) {
        self.buffer.clear();
        if let Some(c) = first {
            self.buffer.push(c);
        }
        self.state = state;
    }

    fn emit(&mut self, token: Token) {
        self.tokens.push(token);
        self.buffer.clear();
        self.state = State::Undecided;
    }

    fn finish_directive(&mut self) -> Result<(), Error> {
        match Directive::from_text(&self.buffer) {
            Some(directive) => {
                self.emit(Token::Directive(directive));
                Ok(())
            }
            None => Err(self.error(format!("unknown directive `{}`", self.buffer))),
        }
    }

    fn finish_comment(&mut self) -> Result<(), Error> {
        let text = self.buffer.trim().to_string();
        if !text.starts_with("//") {
            return Err(self.error(format!("expected `//` comment, got `{}`", text)));
        }
        self.emit(Token::Comment(text));
        Ok(())
    }

    fn finish_number(&mut self) -> Result<(), Error> {
        match self.buffer.parse::<f64>() {
            Ok(value) => {
                self.emit(Token::Number(value));
                Ok(())
            }
            Err(_) => Err(self.error(format!("invalid number `{}`", self.buffer))),
        }
    }

    fn finish_identifier(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        let token = match Keyword::from_text(&text) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(text),
        };
        self.emit(token);
    }

    /// Builds a lexical error pointing at the most recently read character.
    fn error(&self, message: impl Into<String>) -> Error {
        let position = self.cursor.saturating_sub(1);
        let mut line = 1;
        let mut column = 1;
        for c in &self.chars[..position.min(self.chars.len())] {
            if *c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Error::Lex {
            line,
            column,
            message: message.into(),
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}
