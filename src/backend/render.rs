//! Rendering of conditional elements, shared by both backends.
//!
//! The traversal is written once; each backend supplies a [`Dialect`] with its
//! vocabulary and its conventions for patterns, variables and negation.

use crate::frontend::ast::{Condition, Field, Operator, Pattern};
use crate::utils::Span;

/// Backend-specific vocabulary used by the fold.
pub trait Dialect {
    /// Conjunction, spaces included.
    const AND: &'static str;
    /// Disjunction, spaces included.
    const OR: &'static str;
    /// Comparison connective flipped by `not`.
    const IS: &'static str;
    /// Negated comparison connective.
    const IS_NOT: &'static str;

    /// Surface form of an operator.
    fn operator(&self, op: Operator) -> &'static str;
    /// A symbol or number.
    fn constant(&self, token: &str) -> String;
    /// A variable, given without `?`.
    fn variable(&self, name: &str) -> String;
    /// A string literal, given without quotes.
    fn text(&self, text: &str) -> String;

    /// Render a pattern. `None` means the pattern only introduced bindings and
    /// its text is deferred to the places where those variables are used.
    fn pattern(&mut self, pattern: &Pattern) -> Option<String>;

    /// Render `?variable <- pattern`.
    fn assigned(&mut self, variable: &str, pattern: &Pattern) -> Option<String>;

    /// Negation of text that has no top-level comparison to flip.
    fn wrap_not(&self, text: &str) -> String;
}

/// Render a conditional element.
pub fn condition<D: Dialect>(dialect: &mut D, condition: &Condition) -> Option<String> {
    match condition {
        Condition::Pattern(pattern) => dialect.pattern(pattern),
        Condition::Not(inner) => {
            let text = self::condition(dialect, inner)?;
            Some(negate(dialect, &text))
        }
        Condition::Or(children) => group(dialect, children, D::OR),
        Condition::And(children) | Condition::Exists(children) => {
            group(dialect, children, D::AND)
        }
        Condition::Test(expr) => Some(field(dialect, expr)),
        Condition::Assigned { variable, pattern } => dialect.assigned(variable, pattern),
    }
}

fn group<D: Dialect>(
    dialect: &mut D,
    children: &[Span<'_, Condition<'_>>],
    connective: &str,
) -> Option<String> {
    let parts: Vec<String> = children
        .iter()
        .filter_map(|child| condition(dialect, child))
        .collect();
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(format!("({})", parts.join(connective))),
    }
}

/// Render a field appearing in an expression.
pub fn field<D: Dialect>(dialect: &D, field: &Span<'_, Field<'_>>) -> String {
    match &**field {
        Field::Constant(token) => dialect.constant(token),
        Field::Variable(name) => dialect.variable(name),
        Field::Text(text) => dialect.text(text),
        Field::Slot(slot) => {
            let mut parts = vec![dialect.constant(&slot.head)];
            parts.extend(slot.fields.iter().map(|f| self::field(dialect, f)));
            parts.join(" ")
        }
        Field::Call(call) => {
            let args: Vec<String> = call.args.iter().map(|a| self::field(dialect, a)).collect();
            format!("{}({})", dialect.constant(&call.name), args.join(", "))
        }
        Field::Arithmetic { operator, operands } => arithmetic(dialect, **operator, operands),
        Field::Or(alternatives) => {
            let parts: Vec<String> = alternatives
                .iter()
                .map(|a| self::field(dialect, a))
                .collect();
            parts.join(D::OR)
        }
    }
}

/// Infix rendering. Operands are ordered by source position, not by the order
/// they happen to be stored in.
fn arithmetic<D: Dialect>(
    dialect: &D,
    operator: Operator,
    operands: &[Span<'_, Field<'_>>],
) -> String {
    let mut operands: Vec<&Span<'_, Field<'_>>> = operands.iter().collect();
    operands.sort_by_key(|operand| operand.start);

    let parts: Vec<String> = operands
        .into_iter()
        .map(|operand| match &**operand {
            Field::Arithmetic { .. } => format!("({})", field(dialect, operand)),
            _ => field(dialect, operand),
        })
        .collect();

    let symbol = dialect.operator(operator);
    match parts.as_slice() {
        [single] => format!("{symbol} {single}"),
        _ => parts.join(&format!(" {symbol} ")),
    }
}

/// Characters of rendered text outside quoted literals, each with the
/// parenthesis depth it sits at.
///
/// Inside a literal, `\` escapes the next character.
fn unquoted(text: &str) -> impl Iterator<Item = (usize, char, usize)> + '_ {
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    text.char_indices().filter_map(move |(i, c)| {
        if quoted {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '\'' => quoted = false,
                _ => {}
            }
            return None;
        }
        let at = depth;
        match c {
            '\'' => {
                quoted = true;
                return None;
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        Some((i, c, at))
    })
}

/// Positions of `needle` outside parentheses and quoted literals.
fn top_level_matches<'t>(text: &'t str, needle: &'t str) -> impl Iterator<Item = usize> + 't {
    unquoted(text)
        .filter(move |&(i, _, depth)| depth == 0 && text[i..].starts_with(needle))
        .map(|(i, _, _)| i)
}

/// A quoted literal. Quotes and backslashes inside it are escaped.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Drop the escapes [`quote`] added, once the text is final.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quoted = false;
    let mut escaped = false;
    for c in text.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => {
                escaped = true;
                continue;
            }
            '\'' => quoted = !quoted,
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Flip the first top-level comparison of `text`, or wrap it when there is none.
///
/// Nested comparisons are left as they are.
pub fn negate<D: Dialect>(dialect: &D, text: &str) -> String {
    let is = top_level_matches(text, D::IS).next();
    let is_not = top_level_matches(text, D::IS_NOT).next();

    let (at, from, to) = match (is, is_not) {
        (Some(a), Some(b)) if b <= a => (b, D::IS_NOT, D::IS),
        (Some(a), _) => (a, D::IS, D::IS_NOT),
        (None, Some(b)) => (b, D::IS_NOT, D::IS),
        (None, None) => return dialect.wrap_not(text),
    };
    format!("{}{}{}", &text[..at], to, &text[at + from.len()..])
}

/// Whether the whole of `text` is one parenthesized group.
pub fn enclosed(text: &str) -> bool {
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    unquoted(text)
        .find(|&(_, c, depth)| c == ')' && depth == 1)
        .is_some_and(|(i, _, _)| i + 1 == text.len())
}

/// Replace every top-level occurrence of `from`.
pub fn replace_top_level(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for at in top_level_matches(text, from) {
        if at < last {
            continue;
        }
        out.push_str(&text[last..at]);
        out.push_str(to);
        last = at + from.len();
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse;

    /// Minimal dialect that echoes its input.
    struct Plain;

    impl Dialect for Plain {
        const AND: &'static str = " & ";
        const OR: &'static str = " | ";
        const IS: &'static str = " = ";
        const IS_NOT: &'static str = " ≠ ";

        fn operator(&self, op: Operator) -> &'static str {
            match op {
                Operator::Eq => "=",
                Operator::Ne => "≠",
                Operator::Gt => ">",
                Operator::Add => "+",
                Operator::Sub => "-",
                _ => "?op",
            }
        }
        fn constant(&self, token: &str) -> String {
            token.to_string()
        }
        fn variable(&self, name: &str) -> String {
            format!("${name}")
        }
        fn text(&self, text: &str) -> String {
            quote(text)
        }
        fn pattern(&mut self, pattern: &Pattern) -> Option<String> {
            Some(format!("{} = 1", *pattern.head))
        }
        fn assigned(&mut self, _variable: &str, pattern: &Pattern) -> Option<String> {
            self.pattern(pattern)
        }
        fn wrap_not(&self, text: &str) -> String {
            format!("~{text}")
        }
    }

    fn render_first(source: &str) -> Option<String> {
        let module = parse(source, "t.clp").unwrap();
        condition(&mut Plain, &module.rules[0].conditions[0])
    }

    #[test]
    fn groups_are_parenthesized() {
        assert_eq!(
            render_first("(defrule r (or (a) (b)) => )").as_deref(),
            Some("(a = 1 | b = 1)")
        );
        assert_eq!(
            render_first("(defrule r (exists (a) (b)) => )").as_deref(),
            Some("(a = 1 & b = 1)")
        );
        assert_eq!(
            render_first("(defrule r (and (a)) => )").as_deref(),
            Some("a = 1")
        );
    }

    #[test]
    fn not_flips_a_single_top_level_comparison() {
        assert_eq!(
            render_first("(defrule r (not (a)) => )").as_deref(),
            Some("a ≠ 1")
        );
        assert_eq!(
            render_first("(defrule r (not (or (a) (b))) => )").as_deref(),
            Some("~(a = 1 | b = 1)")
        );
        assert_eq!(
            render_first("(defrule r (not (not (a))) => )").as_deref(),
            Some("a = 1")
        );
    }

    #[test]
    fn arithmetic_follows_source_order() {
        assert_eq!(
            render_first("(defrule r (test (> (- ?a 1) 10)) => )").as_deref(),
            Some("($a - 1) > 10")
        );
    }

    #[test]
    fn arithmetic_sorts_operands_by_position() {
        let module = parse("(defrule r (test (> ?a 10)) => )", "t.clp").unwrap();
        let mut test = module.rules[0].conditions[0].clone().into_inner();
        if let Condition::Test(expr) = &mut test {
            if let Field::Arithmetic { operands, .. } = &mut ***expr {
                operands.reverse();
            }
        }
        assert_eq!(condition(&mut Plain, &test).as_deref(), Some("$a > 10"));
    }

    #[test]
    fn enclosed_groups() {
        assert!(enclosed("(a | b)"));
        assert!(!enclosed("(a - 1) > (b)"));
        assert!(!enclosed("a"));
        assert!(enclosed("(a | ')(')"));
        assert!(!enclosed("('(' | a) | (b)"));
    }

    #[test]
    fn replace_only_at_top_level() {
        assert_eq!(
            replace_top_level("a is b and (c is d) and e is f", " is ", " shall be "),
            "a shall be b and (c is d) and e shall be f"
        );
        assert_eq!(
            replace_top_level("note is 'x is y'", " is ", " shall be "),
            "note shall be 'x is y'"
        );
    }

    #[test]
    fn escaped_quotes_stay_inside_the_literal() {
        let text = format!("{} is x and y is z", quote("don't"));
        assert_eq!(text, r"'don\'t' is x and y is z");
        let replaced = replace_top_level(&text, " is ", " shall be ");
        assert_eq!(replaced, r"'don\'t' shall be x and y shall be z");
        assert_eq!(unescape(&replaced), "'don't' shall be x and y shall be z");
        assert_eq!(unescape(&quote(r"a\b")), r"'a\b'");
    }

    #[test]
    fn negation_skips_comparisons_inside_literals() {
        let text = format!("{} is x", quote("it's one is two"));
        assert_eq!(
            negate(&Plain, &text.replace(" is ", " = ")),
            r"'it\'s one = two' ≠ x"
        );
    }
}
