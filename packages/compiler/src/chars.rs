/*
 * Character Codes
 */
#![allow(non_upper_case_globals)]

//! Character constants used throughout the compiler

// Special characters
pub const EOF: char = '\0';
pub const TAB: char = '\t';
pub const LF: char = '\n'; // Line feed
pub const NEWLINE: char = '\n'; // Alias for LF
pub const CR: char = '\r'; // Carriage return
pub const SPACE: char = ' ';

// Punctuation
pub const BANG: char = '!';
pub const DQ: char = '"';
pub const HASH: char = '#';
pub const DOLLAR: char = '$';
pub const SQ: char = '\'';
pub const COMMA: char = ',';
pub const MINUS: char = '-';
pub const PERIOD: char = '.';
pub const COLON: char = ':';
pub const SEMICOLON: char = ';';
pub const LT: char = '<';
pub const EQ: char = '=';
pub const GT: char = '>';
pub const AT: char = '@';
pub const PIPE: char = '|';
pub const LBRACE: char = '{';
pub const RBRACE: char = '}';
pub const LBRACKET: char = '[';
pub const RBRACKET: char = ']';
pub const UNDERSCORE: char = '_';

/// Pattern delimiter characters. These are reserved and never part of an
/// identifier.
pub const PATTERN_DELIMITERS: &[char] = &[LT, GT, PIPE, SEMICOLON, COLON, PERIOD, AT];

/// True for characters allowed inside an ASDL identifier.
pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == UNDERSCORE
}

/// True for the first character of an ASDL identifier.
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == UNDERSCORE
}

pub fn is_whitespace(ch: char) -> bool {
    ch == SPACE || ch == TAB || ch == CR || ch == LF
}

pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}
