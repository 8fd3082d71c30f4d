//! EARS backend: one structured requirement per rule.

use std::cell::RefCell;
use std::fmt::Display;

use tracing::debug;

use super::bindings::Bindings;
use super::lexeme::{ears_operator, safe_ears_name};
use super::render::{self, Dialect};
use crate::error::CompileError;
use crate::frontend::ast::{self, Action, Condition, Field, Operator, Pattern};
use crate::utils::Span;

/// Requirement descriptions starting with this are facts, not requirements.
pub const KNOWN_FACT: &str = "Known fact ";

/// The requirement derived from one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// Rule name.
    pub name: String,
    /// Documentation and declaration text, emitted as comments.
    pub comments: Vec<String>,
    /// Conjunction of the rendered conditions.
    pub condition: String,
    /// Conjunction of the rendered actions.
    pub response: String,
    /// The rule documents itself as a known fact.
    pub known_fact: bool,
}

impl Requirement {
    /// The requirement in `While ..., ...` form.
    pub fn statement(&self) -> String {
        format!("While {}, {}.", self.condition, self.response)
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ID \"{}\":", self.name)?;
        for comment in &self.comments {
            writeln!(f, "// {}", comment)?;
        }
        writeln!(f, "When {}", self.condition)?;
        write!(f, "    then {}", self.response)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Condition,
    Action,
}

struct Ears {
    bindings: Bindings,
    side: Side,
    /// Text of patterns that were reduced to bindings.
    deferred: Vec<String>,
    /// First variable rendered without a binding.
    unbound: RefCell<Option<String>>,
}

impl Ears {
    fn new() -> Self {
        Self {
            bindings: Bindings::new(),
            side: Side::Condition,
            deferred: vec![],
            unbound: RefCell::new(None),
        }
    }

    /// `subject is v1 v2 ...`. On the condition side, unbound variables are
    /// bound to `subject` and dropped from the text.
    fn values(&mut self, subject: &str, fields: &[Span<'_, Field<'_>>]) -> Option<String> {
        let mut text = vec![];
        let mut bound = false;
        for field in fields {
            match &**field {
                Field::Variable(name)
                    if self.side == Side::Condition && !self.bindings.is_bound(name) =>
                {
                    bound |= self.bindings.bind(name, subject);
                }
                _ => text.push(render::field(self, field)),
            }
        }

        if text.is_empty() {
            let present = format!("{subject} is present");
            if bound {
                self.deferred.push(present);
                return None;
            }
            return Some(present);
        }
        Some(format!("{subject} is {}", text.join(" ")))
    }

    fn slots(&mut self, subject: &str, slots: &[Span<'_, Pattern<'_>>]) -> Option<String> {
        let parts: Vec<String> = slots
            .iter()
            .filter_map(|slot| {
                let subject = format!("{subject} {}", safe_ears_name(&slot.head));
                self.values(&subject, &slot.fields)
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join(Self::AND))
    }

    fn action(&mut self, action: &Action) -> String {
        match action {
            Action::Assert(patterns) => {
                let parts: Vec<String> = patterns
                    .iter()
                    .filter_map(|pattern| self.pattern(pattern))
                    .collect();
                parts.join(Self::AND)
            }
            Action::Retract(targets) => {
                let parts: Vec<String> = targets
                    .iter()
                    .map(|target| match &**target {
                        Field::Variable(name) => format!("{} is retracted", self.variable(name)),
                        _ => format!("fact {} is retracted", render::field(self, target)),
                    })
                    .collect();
                parts.join(Self::AND)
            }
            Action::Modify { variable, slots } => {
                let subject = self.variable(variable);
                self.slots(&subject, slots)
                    .unwrap_or_else(|| format!("{subject} is modified"))
            }
            Action::Duplicate { variable, slots } => {
                let subject = format!("copy of {}", self.variable(variable));
                self.slots(&subject, slots)
                    .unwrap_or_else(|| format!("{subject} is asserted"))
            }
            Action::Call(call) => {
                let name = safe_ears_name(&call.name);
                if call.args.is_empty() {
                    format!("{name} is invoked")
                } else {
                    let args: Vec<String> =
                        call.args.iter().map(|a| render::field(self, a)).collect();
                    format!("{name} is invoked with {}", args.join(", "))
                }
            }
        }
    }
}

impl Dialect for Ears {
    const AND: &'static str = " and ";
    const OR: &'static str = " or ";
    const IS: &'static str = " is ";
    const IS_NOT: &'static str = " is not ";

    fn operator(&self, op: Operator) -> &'static str {
        ears_operator(op)
    }

    fn constant(&self, token: &str) -> String {
        safe_ears_name(token)
    }

    fn variable(&self, name: &str) -> String {
        match self.bindings.get(name) {
            Some(bound) => bound.to_string(),
            None => {
                self.unbound
                    .borrow_mut()
                    .get_or_insert_with(|| name.to_string());
                format!("?{name}")
            }
        }
    }

    fn text(&self, text: &str) -> String {
        match text {
            "true" | "false" => text.to_string(),
            "" => " ".to_string(),
            _ => render::quote(text),
        }
    }

    fn pattern(&mut self, pattern: &Pattern) -> Option<String> {
        let head = safe_ears_name(&pattern.head);
        if pattern.fields.is_empty() {
            return Some(format!("{head} is present"));
        }

        let (slots, values): (Vec<_>, Vec<_>) = pattern
            .fields
            .iter()
            .partition(|field| matches!(&***field, Field::Slot(_)));
        if slots.is_empty() {
            return self.values(&head, &pattern.fields);
        }

        let slots: Vec<Span<'_, Pattern<'_>>> = slots
            .into_iter()
            .filter_map(|field| match &**field {
                Field::Slot(slot) => Some(field.clone().map(|_| slot.clone())),
                _ => None,
            })
            .collect();
        let values: Vec<Span<'_, Field<'_>>> = values.into_iter().cloned().collect();

        let mut parts: Vec<String> = self.slots(&head, &slots).into_iter().collect();
        if !values.is_empty() {
            parts.extend(self.values(&head, &values));
        }
        (!parts.is_empty()).then(|| parts.join(Self::AND))
    }

    fn assigned(&mut self, variable: &str, pattern: &Pattern) -> Option<String> {
        let text = self.pattern(pattern);
        if self.side == Side::Condition
            && self.bindings.bind(variable, safe_ears_name(&pattern.head))
        {
            self.deferred.extend(text);
            return None;
        }
        text
    }

    fn wrap_not(&self, text: &str) -> String {
        match render::enclosed(text) {
            true => format!("not {text}"),
            false => format!("not ({text})"),
        }
    }
}

/// Rewrite top-level `is` connectives to requirement language.
fn shall(text: &str) -> String {
    let text = render::replace_top_level(text, " is not ", " shall not be ");
    render::replace_top_level(&text, " is ", " shall be ")
}

/// Render the requirement for one rule.
///
/// Fails on the first variable used before any pattern of the rule bound it.
pub fn requirement(rule: &ast::Rule) -> Result<Requirement, CompileError> {
    let name = rule.name.to_string();
    let mut ears = Ears::new();

    let mut conditions = vec![];
    let mut fallback = vec![];
    for condition in &rule.conditions {
        ears.deferred.clear();
        match render::condition(&mut ears, condition) {
            Some(text) => conditions.push(text),
            None => {
                if matches!(
                    &**condition,
                    Condition::Pattern(_) | Condition::Assigned { .. }
                ) {
                    fallback.append(&mut ears.deferred);
                }
            }
        }
    }
    if conditions.is_empty() {
        conditions = fallback;
    }

    ears.side = Side::Action;
    let responses: Vec<String> = rule
        .actions
        .iter()
        .map(|action| shall(&ears.action(action)))
        .collect();

    let condition = match conditions.is_empty() {
        true => "true".to_string(),
        false => conditions.join(Ears::AND),
    };
    let response = match responses.is_empty() {
        true => "no action shall be taken".to_string(),
        false => responses.join(Ears::AND),
    };

    if let Some(variable) = ears.unbound.take() {
        return Err(CompileError::UnresolvedVariable {
            rule: name,
            variable,
            text: render::unescape(&format!("When {condition} then {response}")),
        });
    }

    let mut comments = vec![];
    if let Some(doc) = &rule.doc {
        comments.push(doc.to_string());
    }
    comments.extend(rule.declarations.iter().map(|d| d.as_str().to_string()));

    let known_fact = rule
        .doc
        .as_ref()
        .is_some_and(|doc| doc.starts_with(KNOWN_FACT));

    debug!(rule = %name, "rendered requirement");
    Ok(Requirement {
        name,
        comments,
        condition: render::unescape(&condition),
        response: render::unescape(&response),
        known_fact,
    })
}

/// `Known fact ...` lines for the initial facts of a `deffacts` block.
pub fn known_facts(facts: &ast::Facts) -> Vec<String> {
    let mut ears = Ears::new();
    ears.side = Side::Action;
    facts
        .facts
        .iter()
        .filter_map(|fact| ears.pattern(fact))
        .map(|text| format!("{KNOWN_FACT}{}", render::unescape(&text)))
        .collect()
}
