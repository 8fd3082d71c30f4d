//! GAL backend: one Petri-net transition per rule.
//!
//! Facts become integer cells owned by the rules that mention them. Effects
//! whose cells depend on the other rules are left as [`Pending`] statements
//! and filled in by [`super::resolve`].

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use tracing::debug;

use super::lexeme::{gal_identifier, gal_operator, gal_value};
use super::render::{self, Dialect};
use crate::error::Diagnostic;
use crate::frontend::ast::{self, Action, Condition, Field, Operator, Pattern};
use crate::utils::Span;

/// Cell written by every transition with its own index.
pub const RULE_FIRED: &str = "rule_fired";

/// Prefix of pattern variables inside GAL expressions.
pub const VARIABLE_PREFIX: &str = "variable_";

/// What a pending effect does to the instances of its fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingKind {
    /// Direct `assert`: every instance becomes 1.
    Produce,
    /// Guarded assert: instances become 1 only if none is present.
    Assert,
    /// Every instance becomes 0.
    Retract,
}

impl Display for PendingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingKind::Produce | PendingKind::Assert => write!(f, "ASSERT"),
            PendingKind::Retract => write!(f, "RETRACT"),
        }
    }
}

/// An effect on a fact whose cells are not known yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// 效果类型
    pub kind: PendingKind,
    /// 目标事实
    pub fact: String,
}

/// A statement of a transition body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `cell = value;`
    Assign {
        /// 目标单元
        cell: String,
        /// 新值
        value: i64,
    },
    /// `if (g1 == 0 && ...) { ... }`
    Guarded {
        /// Cells that must all be 0.
        guard: Vec<String>,
        /// 条件成立时执行
        body: Vec<Statement>,
    },
    /// Effect waiting for [`super::resolve`].
    Pending(Pending),
}

impl Statement {
    fn pending(kind: PendingKind, fact: String) -> Self {
        Statement::Pending(Pending { kind, fact })
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Assign { cell, value } => write!(f, "{cell} = {value};"),
            Statement::Guarded { guard, body } => {
                let guard: Vec<String> = guard.iter().map(|cell| format!("{cell} == 0")).collect();
                write!(f, "if ({}) {{", guard.join(" && "))?;
                for statement in body {
                    write!(f, " {statement}")?;
                }
                write!(f, " }}")
            }
            Statement::Pending(Pending { kind, fact }) => write!(f, "//{kind}: {fact}"),
        }
    }
}

/// A rule-qualified instance of a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    /// Declared name, distinct across the net.
    pub name: String,
    /// 所属事实
    pub fact: String,
}

/// Cell names handed out across the whole net.
///
/// Every `(rule, fact)` pair gets its own cell. The name is `<rule>_<fact>`
/// unless that is [`RULE_FIRED`] or already taken by another pair, in which
/// case the first free `_<n>` suffix is appended.
#[derive(Debug, Clone, Default)]
pub struct CellNames {
    taken: HashSet<String>,
    names: HashMap<(usize, String), String>,
}

impl CellNames {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell of `fact` owned by the rule at `index`.
    pub fn cell(&mut self, index: usize, rule: &str, fact: String) -> Cell {
        let key = (index, fact);
        if let Some(name) = self.names.get(&key) {
            return Cell {
                name: name.clone(),
                fact: key.1,
            };
        }

        let base = format!("{rule}_{}", key.1);
        let mut name = base.clone();
        let mut suffix = 1;
        while name == RULE_FIRED || self.taken.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        if name != base {
            debug!(cell = %base, renamed = %name, "cell name already in use");
        }

        self.taken.insert(name.clone());
        self.names.insert(key.clone(), name.clone());
        Cell { name, fact: key.1 }
    }
}

/// A rule lowered to the net.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Rule name as a GAL identifier.
    pub name: String,
    /// Position of the rule in source order.
    pub index: usize,
    /// 使能条件
    pub guard: String,
    /// 变迁体
    pub actions: Vec<Statement>,
    /// Cells read by the conditions, at any depth.
    pub conditions: Vec<Cell>,
    /// Cells of directly asserted facts.
    pub produced: Vec<Cell>,
}

impl Transition {
    /// Every cell the transition owns, each once.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        let mut seen = HashSet::new();
        self.conditions
            .iter()
            .chain(&self.produced)
            .filter(move |cell| seen.insert(&cell.name))
    }

    /// Pending statements still in the body.
    pub fn pending(&self) -> impl Iterator<Item = &Pending> {
        self.actions.iter().filter_map(|statement| match statement {
            Statement::Pending(pending) => Some(pending),
            _ => None,
        })
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "transition {} [{}] {{", self.name, self.guard)?;
        for statement in &self.actions {
            writeln!(f, "    {statement}")?;
        }
        write!(f, "}}")
    }
}

/// Name of the fact a pattern denotes.
///
/// Constants and text identify the fact; variables, calls and arithmetic
/// match any value and are left out.
pub fn fact_name(pattern: &Pattern) -> String {
    let mut parts = vec![pattern.head.to_string()];
    for field in &pattern.fields {
        fact_part(field, &mut parts);
    }
    gal_identifier(&parts.join("_"))
}

fn fact_part(field: &Field, parts: &mut Vec<String>) {
    match field {
        Field::Constant(token) | Field::Text(token) => parts.push(token.to_string()),
        Field::Slot(slot) => {
            let mut values = vec![];
            for field in &slot.fields {
                fact_part(field, &mut values);
            }
            if !values.is_empty() {
                parts.push(slot.head.to_string());
                parts.append(&mut values);
            }
        }
        Field::Or(alternatives) => {
            let mut values = vec![];
            for alternative in alternatives {
                fact_part(alternative, &mut values);
            }
            if !values.is_empty() {
                parts.push(values.join("_or_"));
            }
        }
        Field::Variable(_) | Field::Call(_) | Field::Arithmetic { .. } => {}
    }
}

/// The pattern bound to a fact after `modify`/`duplicate` replaced `slots`.
fn updated<'a>(pattern: &Pattern<'a>, slots: &[Span<'a, Pattern<'a>>]) -> Pattern<'a> {
    let mut pattern = pattern.clone();
    for slot in slots {
        let existing = pattern
            .fields
            .iter_mut()
            .find(|field| matches!(&***field, Field::Slot(s) if *s.head == *slot.head));
        match existing {
            Some(field) => **field = Field::Slot((**slot).clone()),
            None => pattern.fields.push(slot.clone().map(Field::Slot)),
        }
    }
    pattern
}

struct Gal<'n> {
    rule: String,
    index: usize,
    names: &'n mut CellNames,
    conditions: Vec<Cell>,
}

impl Gal<'_> {
    fn cell(&mut self, fact: String) -> Cell {
        self.names.cell(self.index, &self.rule, fact)
    }

    fn record(cells: &mut Vec<Cell>, cell: &Cell) {
        if !cells.contains(cell) {
            cells.push(cell.clone());
        }
    }
}

impl Dialect for Gal<'_> {
    const AND: &'static str = " && ";
    const OR: &'static str = " || ";
    const IS: &'static str = " == ";
    const IS_NOT: &'static str = " != ";

    fn operator(&self, op: Operator) -> &'static str {
        gal_operator(op)
    }

    fn constant(&self, token: &str) -> String {
        gal_value(token)
    }

    fn variable(&self, name: &str) -> String {
        format!("{VARIABLE_PREFIX}{}", gal_identifier(name))
    }

    fn text(&self, text: &str) -> String {
        gal_identifier(text)
    }

    fn pattern(&mut self, pattern: &Pattern) -> Option<String> {
        let cell = self.cell(fact_name(pattern));
        let text = format!("{} == 1", cell.name);
        Self::record(&mut self.conditions, &cell);
        Some(text)
    }

    fn assigned(&mut self, _variable: &str, pattern: &Pattern) -> Option<String> {
        self.pattern(pattern)
    }

    fn wrap_not(&self, text: &str) -> String {
        match render::enclosed(text) {
            true => format!("!{text}"),
            false => format!("!({text})"),
        }
    }
}

/// Lower one rule to a transition, naming its cells through `names`.
///
/// Effects on a variable that no `?v <- pattern` of the rule binds are
/// dropped and reported.
pub fn transition(
    rule: &ast::Rule,
    index: usize,
    names: &mut CellNames,
) -> (Transition, Vec<Diagnostic>) {
    let mut gal = Gal {
        rule: gal_identifier(&rule.name),
        index,
        names,
        conditions: vec![],
    };
    let mut diagnostics = vec![];

    let guards: Vec<String> = rule
        .conditions
        .iter()
        .filter_map(|condition| render::condition(&mut gal, condition))
        .collect();
    let guard = match guards.is_empty() {
        true => "true".to_string(),
        false => guards.join(Gal::AND),
    };

    let mut actions = vec![Statement::Assign {
        cell: RULE_FIRED.to_string(),
        value: index as i64,
    }];

    let mut consumed = vec![];
    for condition in &rule.conditions {
        let pattern = match &**condition {
            Condition::Pattern(pattern) => pattern,
            Condition::Assigned { pattern, .. } => &**pattern,
            _ => continue,
        };
        let cell = gal.cell(fact_name(pattern));
        if !consumed.contains(&cell.name) {
            consumed.push(cell.name.clone());
            actions.push(Statement::Assign {
                cell: cell.name,
                value: -1,
            });
        }
    }

    let mut missing = |variable: &str, action: &'static str| {
        diagnostics.push(Diagnostic::MissingBindingTarget {
            rule: rule.name.to_string(),
            variable: variable.to_string(),
            action,
        })
    };

    let mut produced = vec![];
    for action in &rule.actions {
        match &**action {
            Action::Assert(patterns) => {
                for pattern in patterns {
                    let cell = gal.cell(fact_name(pattern));
                    actions.push(Statement::pending(PendingKind::Produce, cell.fact.clone()));
                    Gal::record(&mut produced, &cell);
                }
            }
            Action::Retract(targets) => {
                for target in targets {
                    let Field::Variable(variable) = &**target else {
                        debug!(rule = %rule.name, target = %target.as_str(), "retract by fact index has no cell");
                        continue;
                    };
                    match rule.bound_pattern(variable) {
                        Some(pattern) => actions.push(Statement::pending(
                            PendingKind::Retract,
                            fact_name(pattern),
                        )),
                        None => missing(variable, "retract"),
                    }
                }
            }
            Action::Modify { variable, slots } => match rule.bound_pattern(variable) {
                Some(pattern) => {
                    actions.push(Statement::pending(PendingKind::Retract, fact_name(pattern)));
                    actions.push(Statement::pending(
                        PendingKind::Assert,
                        fact_name(&updated(pattern, slots)),
                    ));
                }
                None => missing(variable, "modify"),
            },
            Action::Duplicate { variable, slots } => match rule.bound_pattern(variable) {
                Some(pattern) => actions.push(Statement::pending(
                    PendingKind::Assert,
                    fact_name(&updated(pattern, slots)),
                )),
                None => missing(variable, "duplicate"),
            },
            Action::Call(call) => {
                debug!(rule = %rule.name, call = %call.name, "call does not change the net");
            }
        }
    }

    let transition = Transition {
        name: gal.rule,
        index,
        guard,
        actions,
        conditions: gal.conditions,
        produced,
    };
    (transition, diagnostics)
}
