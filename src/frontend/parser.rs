//! CLIPS parser.

use crate::{error::CompileError, frontend::ast, utils::Span};
use pest::{
    iterators::{Pair, Pairs},
    Parser,
};

mod grammar {
    #[derive(Parser)]
    #[grammar = "frontend/clips.pest"]
    pub struct ClipsParser;
}

use grammar::{ClipsParser, Rule};

/// Build the syntax tree of one source unit.
pub fn parse<'a>(source: &'a str, filename: &'a str) -> Result<ast::Module<'a>, CompileError> {
    let mut parsed = ClipsParser::parse(Rule::Program, source).map_err(|err| {
        let (start, end) = match err.location {
            pest::error::InputLocation::Pos(pos) => (pos, pos),
            pest::error::InputLocation::Span(span) => span,
        };
        let lines = Span::new((), filename, source, start, end)
            .lines()
            .unwrap_or_default();
        let message = err.variant.message();
        CompileError::Syntax(lines.to_snippet("syntax error", &message))
    })?;

    let parser = ModuleParser { filename, source };
    Ok(match parsed.next() {
        Some(program) => parser.parse_module(program),
        None => ast::Module::default(),
    })
}

#[derive(Copy, Clone)]
struct ModuleParser<'a> {
    filename: &'a str,
    source: &'a str,
}

/// Next child of a node whose shape is fixed by the grammar.
fn child<'a>(pairs: &mut Pairs<'a, Rule>) -> Pair<'a, Rule> {
    pairs
        .next()
        .unwrap_or_else(|| unreachable!("grammar guarantees this child"))
}

impl<'a> ModuleParser<'a> {
    fn span<T>(self, inner: T, pair: &Pair<'a, Rule>) -> Span<'a, T> {
        Span::from_pest(inner, self.filename, self.source, pair.as_span())
    }

    fn parse_module(self, program: Pair<'a, Rule>) -> ast::Module<'a> {
        let mut module = ast::Module::default();

        for pair in program.into_inner() {
            match pair.as_rule() {
                Rule::Defrule => module.rules.push(self.parse_rule(pair)),
                Rule::Deffacts => module.facts.push(self.parse_facts(pair)),
                Rule::SetStrategy => {
                    let keyword = child(&mut pair.into_inner());
                    module.strategies.push(self.parse_symbol(keyword));
                }
                Rule::Skipped | Rule::EOI => {}
                _ => unreachable!(),
            }
        }

        module
    }

    fn parse_rule(self, rule: Pair<'a, Rule>) -> Span<'a, ast::Rule<'a>> {
        let span = rule.as_span();
        let mut pairs = rule.into_inner();
        let name = self.parse_symbol(child(&mut pairs));

        let mut doc = None;
        let mut declarations = vec![];
        let mut conditions = vec![];
        let mut actions = vec![];
        for pair in pairs {
            match pair.as_rule() {
                Rule::Doc => doc = Some(self.parse_doc(pair)),
                Rule::Declare => declarations.push(self.span((), &pair)),
                Rule::Conditions => {
                    conditions = pair.into_inner().map(|p| self.parse_condition(p)).collect()
                }
                Rule::Actions => {
                    actions = pair.into_inner().map(|p| self.parse_action(p)).collect()
                }
                _ => unreachable!(),
            }
        }

        let rule = ast::Rule {
            name,
            doc,
            declarations,
            conditions,
            actions,
        };
        Span::from_pest(rule, self.filename, self.source, span)
    }

    fn parse_facts(self, facts: Pair<'a, Rule>) -> Span<'a, ast::Facts<'a>> {
        let span = facts.as_span();
        let mut pairs = facts.into_inner();
        let name = self.parse_symbol(child(&mut pairs));

        let mut doc = None;
        let mut patterns = vec![];
        for pair in pairs {
            match pair.as_rule() {
                Rule::Doc => doc = Some(self.parse_doc(pair)),
                Rule::Pattern => patterns.push(self.parse_pattern(pair)),
                _ => unreachable!(),
            }
        }

        let facts = ast::Facts {
            name,
            doc,
            facts: patterns,
        };
        Span::from_pest(facts, self.filename, self.source, span)
    }

    fn parse_condition(self, condition: Pair<'a, Rule>) -> Span<'a, ast::Condition<'a>> {
        let span = condition.as_span();
        let condition = match condition.as_rule() {
            Rule::Pattern => ast::Condition::Pattern(self.parse_pattern(condition).into_inner()),
            Rule::NotCE => {
                let inner = child(&mut condition.into_inner());
                ast::Condition::Not(Box::new(self.parse_condition(inner)))
            }
            Rule::OrCE => ast::Condition::Or(self.parse_conditions(condition)),
            Rule::AndCE => ast::Condition::And(self.parse_conditions(condition)),
            Rule::ExistsCE => ast::Condition::Exists(self.parse_conditions(condition)),
            Rule::TestCE => {
                let call = child(&mut condition.into_inner());
                ast::Condition::Test(Box::new(self.parse_value(call)))
            }
            Rule::Assigned => {
                let mut pairs = condition.into_inner();
                let variable = self.parse_variable(child(&mut pairs));
                let pattern = self.parse_pattern(child(&mut pairs));
                ast::Condition::Assigned { variable, pattern }
            }
            _ => unreachable!(),
        };
        Span::from_pest(condition, self.filename, self.source, span)
    }

    fn parse_conditions(self, group: Pair<'a, Rule>) -> Vec<Span<'a, ast::Condition<'a>>> {
        group
            .into_inner()
            .map(|p| self.parse_condition(p))
            .collect()
    }

    fn parse_pattern(self, pattern: Pair<'a, Rule>) -> Span<'a, ast::Pattern<'a>> {
        let span = pattern.as_span();
        let mut pairs = pattern.into_inner();
        let head = self.parse_symbol(child(&mut pairs));
        let fields = pairs
            .map(|p| match p.as_rule() {
                Rule::Slot => self.parse_slot(p),
                _ => self.parse_value(p),
            })
            .collect();

        let pattern = ast::Pattern { head, fields };
        Span::from_pest(pattern, self.filename, self.source, span)
    }

    /// A parenthesized field of a pattern: a template slot, or an operator
    /// application written in slot position.
    fn parse_slot(self, slot: Pair<'a, Rule>) -> Span<'a, ast::Field<'a>> {
        let pattern = self.parse_pattern(slot);
        match pattern.head.parse::<ast::Operator>() {
            Ok(operator) => {
                let operator = pattern.head.clone().map(|_| operator);
                pattern.map(|p| ast::Field::Arithmetic {
                    operator,
                    operands: p.fields,
                })
            }
            Err(()) => pattern.map(ast::Field::Slot),
        }
    }

    fn parse_value(self, value: Pair<'a, Rule>) -> Span<'a, ast::Field<'a>> {
        let span = value.as_span();
        let field = match value.as_rule() {
            Rule::Call => {
                let call = self.parse_call(value);
                match call.name.parse::<ast::Operator>() {
                    Ok(operator) => ast::Field::Arithmetic {
                        operator: call.name.clone().map(|_| operator),
                        operands: call.args,
                    },
                    Err(()) => ast::Field::Call(call),
                }
            }
            Rule::OrOperation => {
                ast::Field::Or(value.into_inner().map(|p| self.parse_value(p)).collect())
            }
            Rule::Variable => ast::Field::Variable(*self.parse_variable(value)),
            Rule::GlobalVariable => {
                ast::Field::Constant(child(&mut value.into_inner()).as_str())
            }
            Rule::Number | Rule::Symbol => ast::Field::Constant(value.as_str()),
            Rule::String => ast::Field::Text(child(&mut value.into_inner()).as_str()),
            _ => unreachable!(),
        };
        Span::from_pest(field, self.filename, self.source, span)
    }

    fn parse_call(self, call: Pair<'a, Rule>) -> ast::Call<'a> {
        let mut pairs = call.into_inner();
        let name = self.parse_symbol(child(&mut pairs));
        let args = pairs.map(|p| self.parse_value(p)).collect();
        ast::Call { name, args }
    }

    fn parse_action(self, action: Pair<'a, Rule>) -> Span<'a, ast::Action<'a>> {
        let span = action.as_span();
        let action = match action.as_rule() {
            Rule::AssertA => {
                ast::Action::Assert(action.into_inner().map(|p| self.parse_pattern(p)).collect())
            }
            Rule::RetractA => {
                ast::Action::Retract(action.into_inner().map(|p| self.parse_value(p)).collect())
            }
            Rule::ModifyA => {
                let (variable, slots) = self.parse_fact_update(action);
                ast::Action::Modify { variable, slots }
            }
            Rule::DuplicateA => {
                let (variable, slots) = self.parse_fact_update(action);
                ast::Action::Duplicate { variable, slots }
            }
            Rule::Call => ast::Action::Call(self.parse_call(action)),
            _ => unreachable!(),
        };
        Span::from_pest(action, self.filename, self.source, span)
    }

    #[allow(clippy::type_complexity)]
    fn parse_fact_update(
        self,
        action: Pair<'a, Rule>,
    ) -> (Span<'a, &'a str>, Vec<Span<'a, ast::Pattern<'a>>>) {
        let mut pairs = action.into_inner();
        let variable = self.parse_variable(child(&mut pairs));
        let slots = pairs.map(|p| self.parse_pattern(p)).collect();
        (variable, slots)
    }

    fn parse_variable(self, variable: Pair<'a, Rule>) -> Span<'a, &'a str> {
        match variable.clone().into_inner().next() {
            Some(name) => self.parse_symbol(name),
            None => self.span("", &variable),
        }
    }

    fn parse_symbol(self, symbol: Pair<'a, Rule>) -> Span<'a, &'a str> {
        self.span(symbol.as_str(), &symbol)
    }

    fn parse_doc(self, doc: Pair<'a, Rule>) -> Span<'a, &'a str> {
        let inner = child(&mut doc.into_inner());
        self.parse_symbol(inner)
    }
}
