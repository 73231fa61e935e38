//! Tokens of the IFJ25 language.

use std::fmt;

/// Kinds of tokens produced by the lexer (closed set).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // --- keywords ---
    KwClass,
    KwIf,
    KwElse,
    KwIs,
    KwNull,
    KwReturn,
    KwVar,
    KwWhile,
    KwIfj,
    KwStatic,
    KwImport,
    KwFor,
    KwTypeNum,
    KwTypeString,
    KwTypeNull,
    KwTypeBool,
    KwTrue,
    KwFalse,

    // --- punctuation ---
    LPar,
    RPar,
    LCurly,
    RCurly,
    Comma,
    Assign,
    Dot,
    Eol,
    Eof,

    // --- operators ---
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Not,

    // --- literals / identifiers ---
    Ident,
    GlobalIdent,
    IntLit,
    FloatLit,
    StrLit,
    MultilineStrLit,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::KwClass => "KW_CLASS",
            TokenKind::KwIf => "KW_IF",
            TokenKind::KwElse => "KW_ELSE",
            TokenKind::KwIs => "KW_IS",
            TokenKind::KwNull => "KW_VAL_NULL",
            TokenKind::KwReturn => "KW_RETURN",
            TokenKind::KwVar => "KW_VAR",
            TokenKind::KwWhile => "KW_WHILE",
            TokenKind::KwIfj => "KW_IFJ",
            TokenKind::KwStatic => "KW_STATIC",
            TokenKind::KwImport => "KW_IMPORT",
            TokenKind::KwFor => "KW_FOR",
            TokenKind::KwTypeNum => "KW_TYPE_NUM",
            TokenKind::KwTypeString => "KW_TYPE_STRING",
            TokenKind::KwTypeNull => "KW_TYPE_NULL",
            TokenKind::KwTypeBool => "KW_TYPE_BOOL",
            TokenKind::KwTrue => "KW_VAL_TRUE",
            TokenKind::KwFalse => "KW_VAL_FALSE",
            TokenKind::LPar => "LPAR",
            TokenKind::RPar => "RPAR",
            TokenKind::LCurly => "LCURLY",
            TokenKind::RCurly => "RCURLY",
            TokenKind::Comma => "COMMA",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Dot => "DOT",
            TokenKind::Eol => "EOL",
            TokenKind::Eof => "EOF",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "MULTIPLY",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Lt => "IS_SMALLER",
            TokenKind::Gt => "IS_BIGGER",
            TokenKind::LtEq => "IS_SMALLER_OR_EQUAL",
            TokenKind::GtEq => "IS_BIGGER_OR_EQUAL",
            TokenKind::EqEq => "IS_EQUAL",
            TokenKind::NotEq => "IS_NOT_EQUAL",
            TokenKind::AndAnd => "LOGICAL_AND",
            TokenKind::OrOr => "LOGICAL_OR",
            TokenKind::Not => "LOGICAL_NOT",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::GlobalIdent => "GLOBAL_IDENTIFIER",
            TokenKind::IntLit => "INT_LITERAL",
            TokenKind::FloatLit => "FLOAT_LITERAL",
            TokenKind::StrLit => "STRING_LITERAL",
            TokenKind::MultilineStrLit => "MULTILINE_STRING_LITERAL",
        };
        write!(f, "{}", name)
    }
}

/// Payload carried by literal and identifier tokens.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    Str(String),
}

impl TokenValue {
    /// The string payload, if this is a string-carrying value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::None => write!(f, "N/A"),
            TokenValue::Int(v) => write!(f, "{}", v),
            TokenValue::Float(v) => write!(f, "{}", v),
            TokenValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// One lexical unit: kind, source line and optional payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Self {
            kind,
            line,
            value: TokenValue::None,
        }
    }

    pub fn with_value(kind: TokenKind, line: u32, value: TokenValue) -> Self {
        Self { kind, line, value }
    }

    /// The identifier or string payload; empty for payload-free tokens.
    pub fn text(&self) -> &str {
        self.value.as_str().unwrap_or("")
    }
}

/// Looks up the keyword table (case-sensitive).
///
/// Returns the keyword kind, or `None` for a plain identifier.
pub fn keyword_from_ident(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "class" => TokenKind::KwClass,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "is" => TokenKind::KwIs,
        "null" => TokenKind::KwNull,
        "return" => TokenKind::KwReturn,
        "var" => TokenKind::KwVar,
        "while" => TokenKind::KwWhile,
        "Ifj" => TokenKind::KwIfj,
        "static" => TokenKind::KwStatic,
        "import" => TokenKind::KwImport,
        "for" => TokenKind::KwFor,
        "Num" => TokenKind::KwTypeNum,
        "String" => TokenKind::KwTypeString,
        "Null" => TokenKind::KwTypeNull,
        "Bool" => TokenKind::KwTypeBool,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        _ => return None,
    };
    Some(kind)
}
