//! Surface forms of operators and identifiers for each backend.

use crate::frontend::ast::Operator;

/// EARS wording of an operator.
pub fn ears_operator(op: Operator) -> &'static str {
    match op {
        Operator::Gt => "is greater than",
        Operator::Ge => "is greater than or equal to",
        Operator::Lt => "is less than",
        Operator::Le => "is less than or equal to",
        Operator::Eq => "is",
        Operator::Ne => "is not",
        Operator::Add => "+",
        Operator::Sub => "-",
        Operator::Mul => "*",
        Operator::Div => "/",
        Operator::Mod => "mod",
    }
}

/// GAL symbol of an operator.
pub fn gal_operator(op: Operator) -> &'static str {
    match op {
        Operator::Gt => ">",
        Operator::Ge => ">=",
        Operator::Lt => "<",
        Operator::Le => "<=",
        Operator::Eq => "==",
        Operator::Ne => "!=",
        Operator::Add => "+",
        Operator::Sub => "-",
        Operator::Mul => "*",
        Operator::Div => "/",
        Operator::Mod => "%",
    }
}

/// Words that collide with the EARS grammar or its property language and are
/// therefore written title-cased.
fn reserved(word: &str) -> bool {
    matches!(
        word,
        "on" | "off"
            | "high"
            | "low"
            | "open"
            | "closed"
            | "true"
            | "false"
            | "when"
            | "while"
            | "then"
            | "if"
            | "where"
            | "shall"
            | "and"
            | "or"
            | "not"
            | "is"
            | "the"
            | "system"
            | "end"
            | "id"
            | "up"
            | "down"
            | "left"
            | "right"
            | "start"
            | "stop"
            | "enabled"
            | "disabled"
            | "active"
            | "inactive"
    )
}

/// Single-letter unit symbols, written upper-cased.
fn unit(word: &str) -> bool {
    matches!(
        word,
        "m" | "s" | "h" | "k" | "g" | "l" | "v" | "a" | "w" | "c" | "f" | "n"
    )
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Make a constant safe to appear in EARS text.
///
/// Reserved vocabulary is title-cased, single-letter units are upper-cased,
/// and hyphens become `__` except the sign of a negative number.
pub fn safe_ears_name(token: &str) -> String {
    let lower = token.to_ascii_lowercase();
    if reserved(&lower) {
        return title_case(token);
    }
    if unit(&lower) {
        return token.to_ascii_uppercase();
    }

    match token.strip_prefix('-') {
        Some(rest) if is_number(token) => format!("-{}", rest.replace('-', "__")),
        _ => token.replace('-', "__"),
    }
}

/// Make arbitrary text a GAL identifier.
pub fn gal_identifier(text: &str) -> String {
    let mut ident: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// A constant as it appears inside a GAL expression.
pub fn gal_value(token: &str) -> String {
    if token.parse::<i64>().is_ok() {
        token.to_string()
    } else {
        gal_identifier(token)
    }
}
