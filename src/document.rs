//! Orchestration of both backends over a whole rule set.
//!
//! Rules are lowered as they arrive. Everything that needs global knowledge
//! (document order, fact instances, environment inputs) waits for
//! [`DocumentBuilder::build`].

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::backend::ears::{self, Requirement};
use crate::backend::facts::{FactTable, Input};
use crate::backend::gal::{self, CellNames, Transition};
use crate::backend::resolve;
use crate::error::Diagnostic;
use crate::frontend::ast;
use crate::options::Options;
use crate::target::Target;
use crate::utils::Span;

/// Conflict-resolution strategy among rules of equal salience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Newest rule first.
    #[default]
    Depth,
    /// Oldest rule first.
    Breadth,
}

impl FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depth" => Ok(Strategy::Depth),
            "breadth" => Ok(Strategy::Breadth),
            _ => Err(()),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Depth => write!(f, "depth"),
            Strategy::Breadth => write!(f, "breadth"),
        }
    }
}

/// The token following `salience` in the declarations of a rule.
fn salience_token<'a>(rule: &ast::Rule<'a>) -> Option<&'a str> {
    rule.declarations.iter().find_map(|declaration| {
        let mut tokens = declaration
            .as_str()
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .filter(|token| !token.is_empty());
        tokens.find(|token| *token == "salience")?;
        Some(tokens.next().unwrap_or_default())
    })
}

/// Declared salience of a rule. Absent means 0; unparsable means 0 and a
/// diagnostic.
pub fn salience(rule: &ast::Rule) -> (i64, Option<Diagnostic>) {
    match salience_token(rule) {
        None => (0, None),
        Some(token) => match token.parse() {
            Ok(value) => (value, None),
            Err(_) => (
                0,
                Some(Diagnostic::MalformedSalience {
                    rule: rule.name.to_string(),
                    text: token.to_string(),
                }),
            ),
        },
    }
}

/// Items grouped by salience.
#[derive(Debug, Clone)]
pub struct PriorityGroups<T> {
    groups: BTreeMap<i64, VecDeque<T>>,
    strategy: Strategy,
}

impl<T> PriorityGroups<T> {
    /// Empty groups ordered by `strategy`.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            groups: BTreeMap::new(),
            strategy,
        }
    }

    /// Add `item` to the group of `salience`.
    pub fn push(&mut self, salience: i64, item: T) {
        let group = self.groups.entry(salience).or_default();
        match self.strategy {
            Strategy::Depth => group.push_back(item),
            Strategy::Breadth => group.push_front(item),
        }
    }

    /// Groups in ascending salience, then the whole sequence reversed: the
    /// highest salience comes first.
    pub fn into_ordered(self) -> Vec<T> {
        let mut items: Vec<T> = self.groups.into_values().flatten().collect();
        items.reverse();
        items
    }
}

/// A cell declaration of the net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// 单元名
    pub cell: String,
    /// 1 if a `deffacts` block asserts the fact, else 0.
    pub initial: i64,
}

/// Both artifacts of one compilation, before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Requirements in final document order.
    pub requirements: Vec<Requirement>,
    /// `Known fact ...` lines emitted as leading comments.
    pub known_facts: Vec<String>,
    /// Transitions in rule order, pending effects resolved.
    pub transitions: Vec<Transition>,
    /// One per cell, in first-use order.
    pub declarations: Vec<Declaration>,
    /// Environment transitions for facts no rule produces.
    pub inputs: Vec<Input>,
    /// 非致命问题
    pub diagnostics: Vec<Diagnostic>,
    /// The strategy the requirements were ordered with.
    pub strategy: Strategy,
}

impl Document {
    /// Write the document to a target.
    pub fn write<T: Target>(&self, f: impl std::io::Write, options: &Options) -> Result<()> {
        T::write(f, self, options)
    }
}

/// 用于构建文档的构建器。
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    /// Requirements with their salience, in arrival order.
    requirements: Vec<(i64, Requirement)>,
    transitions: Vec<Transition>,
    cells: CellNames,
    known_facts: Vec<String>,
    /// Facts of `deffacts` blocks.
    initial: Vec<String>,
    /// Strategy declared by the sources.
    strategy: Option<Strategy>,
    names: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl DocumentBuilder {
    /// 创建一个新的 `DocumentBuilder`。
    pub fn new() -> Self {
        Default::default()
    }

    /// Whether a rule of this name was already added.
    pub fn defines(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// 向文档添加一个模块。
    pub fn module(&mut self, module: &ast::Module) -> Result<&mut Self> {
        for keyword in &module.strategies {
            let strategy = keyword.parse::<Strategy>().unwrap_or_else(|()| {
                self.report(Diagnostic::UnknownStrategy {
                    keyword: keyword.to_string(),
                });
                Strategy::Depth
            });
            self.strategy = Some(strategy);
        }

        for facts in &module.facts {
            self.known_facts.extend(ears::known_facts(facts));
            self.initial
                .extend(facts.facts.iter().map(|pattern| gal::fact_name(pattern)));
        }

        for rule in &module.rules {
            self.rule(rule)?;
        }

        Ok(self)
    }

    /// Lower one rule through both backends.
    pub fn rule(&mut self, rule: &Span<'_, ast::Rule<'_>>) -> Result<&mut Self> {
        let requirement =
            ears::requirement(rule).map_err(|e| anyhow!("{}", e.to_snippet(&rule.name)))?;

        let (salience, malformed) = salience(rule);
        if let Some(diagnostic) = malformed {
            self.report(diagnostic);
        }

        let index = self.transitions.len();
        let (transition, diagnostics) = gal::transition(rule, index, &mut self.cells);
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }

        debug!(rule = %rule.name, salience, index, "lowered rule");
        self.names.insert(rule.name.to_string());
        self.requirements.push((salience, requirement));
        self.transitions.push(transition);
        Ok(self)
    }

    /// 构建文档。
    ///
    /// `strategy` overrides the one declared by the sources.
    pub fn build(self, strategy: Option<Strategy>) -> Document {
        let DocumentBuilder {
            requirements,
            mut transitions,
            mut known_facts,
            initial,
            strategy: declared,
            mut diagnostics,
            ..
        } = self;
        let strategy = strategy.or(declared).unwrap_or_default();

        let mut groups = PriorityGroups::new(strategy);
        for (salience, requirement) in requirements {
            if requirement.known_fact {
                known_facts.extend(requirement.comments.into_iter().next());
            } else {
                groups.push(salience, requirement);
            }
        }

        let facts = FactTable::collect(&transitions, initial);
        for diagnostic in resolve::resolve(&mut transitions, &facts) {
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        }

        let mut seen = HashSet::new();
        let declarations = transitions
            .iter()
            .flat_map(|transition| transition.cells())
            .filter(|cell| seen.insert(cell.name.clone()))
            .map(|cell| Declaration {
                cell: cell.name.clone(),
                initial: facts.initial_value(cell),
            })
            .collect();
        let inputs = facts.inputs(&transitions);

        debug!(
            rules = transitions.len(),
            inputs = inputs.len(),
            %strategy,
            "built document"
        );
        Document {
            requirements: groups.into_ordered(),
            known_facts,
            transitions,
            declarations,
            inputs,
            diagnostics,
            strategy,
        }
    }
}
