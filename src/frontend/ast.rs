//! Syntax tree of the CLIPS subset understood by the compiler.
//!
//! Every node is wrapped in a [`Span`] so backends can quote the original
//! source text and sort operands by source position.

use std::fmt::Display;
use std::str::FromStr;

use crate::utils::Span;

/// Arithmetic and relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=` or `eq`
    Eq,
    /// `<>` or `neq`
    Ne,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `mod`
    Mod,
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "=" | "eq" => Operator::Eq,
            "<>" | "neq" => Operator::Ne,
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "mod" => Operator::Mod,
            _ => return Err(()),
        })
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "mod",
        };
        f.write_str(symbol)
    }
}

/// A single field of a pattern, slot or function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a> {
    /// Symbol or number.
    Constant(&'a str),
    /// `?name` or `$?name`, stored without the prefix. Empty for wildcards.
    Variable(&'a str),
    /// String literal, stored without quotes.
    Text(&'a str),
    /// `(slot value*)` inside a template pattern.
    Slot(Pattern<'a>),
    /// Function call other than an operator.
    Call(Call<'a>),
    /// Operator applied to its operands.
    Arithmetic {
        /// 运算符
        operator: Span<'a, Operator>,
        /// 操作数，按出现顺序
        operands: Vec<Span<'a, Field<'a>>>,
    },
    /// `a|b|c` field connective.
    Or(Vec<Span<'a, Field<'a>>>),
}

/// `(head field*)`
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern<'a> {
    /// Relation or template name, or the slot name inside a template.
    pub head: Span<'a, &'a str>,
    /// 字段
    pub fields: Vec<Span<'a, Field<'a>>>,
}

/// `(name arg*)`
#[derive(Debug, Clone, PartialEq)]
pub struct Call<'a> {
    /// 函数名
    pub name: Span<'a, &'a str>,
    /// 参数
    pub args: Vec<Span<'a, Field<'a>>>,
}

/// Conditional elements on the left-hand side of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<'a> {
    /// Ordered or template pattern.
    Pattern(Pattern<'a>),
    /// `(not ce)`
    Not(Box<Span<'a, Condition<'a>>>),
    /// `(or ce+)`
    Or(Vec<Span<'a, Condition<'a>>>),
    /// `(and ce+)`
    And(Vec<Span<'a, Condition<'a>>>),
    /// `(exists ce+)`
    Exists(Vec<Span<'a, Condition<'a>>>),
    /// `(test expr)`
    Test(Box<Span<'a, Field<'a>>>),
    /// `?variable <- pattern`
    Assigned {
        /// Fact-address variable, without `?`.
        variable: Span<'a, &'a str>,
        /// 被绑定的模式
        pattern: Span<'a, Pattern<'a>>,
    },
}

/// Actions on the right-hand side of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<'a> {
    /// `(assert pattern+)`
    Assert(Vec<Span<'a, Pattern<'a>>>),
    /// `(retract target+)`, by variable or fact index.
    Retract(Vec<Span<'a, Field<'a>>>),
    /// `(modify ?v slot+)`
    Modify {
        /// 被修改的事实
        variable: Span<'a, &'a str>,
        /// 新的槽值
        slots: Vec<Span<'a, Pattern<'a>>>,
    },
    /// `(duplicate ?v slot+)`
    Duplicate {
        /// 被复制的事实
        variable: Span<'a, &'a str>,
        /// 新的槽值
        slots: Vec<Span<'a, Pattern<'a>>>,
    },
    /// Any other function call.
    Call(Call<'a>),
}

/// `(defrule ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule<'a> {
    /// 规则名
    pub name: Span<'a, &'a str>,
    /// 文档字符串
    pub doc: Option<Span<'a, &'a str>>,
    /// `(declare ...)` forms, kept as source text.
    pub declarations: Vec<Span<'a, ()>>,
    /// Left-hand side.
    pub conditions: Vec<Span<'a, Condition<'a>>>,
    /// Right-hand side.
    pub actions: Vec<Span<'a, Action<'a>>>,
}

impl<'a> Rule<'a> {
    /// The pattern bound to `?variable` by a top-level `?variable <- pattern`.
    pub fn bound_pattern(&self, variable: &str) -> Option<&Span<'a, Pattern<'a>>> {
        self.conditions.iter().find_map(|condition| match &**condition {
            Condition::Assigned {
                variable: v,
                pattern,
            } if **v == variable => Some(pattern),
            _ => None,
        })
    }
}

/// `(deffacts ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Facts<'a> {
    /// 名称
    pub name: Span<'a, &'a str>,
    /// 文档字符串
    pub doc: Option<Span<'a, &'a str>>,
    /// Facts present before any rule fires.
    pub facts: Vec<Span<'a, Pattern<'a>>>,
}

/// One source unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module<'a> {
    /// 规则，按源码顺序
    pub rules: Vec<Span<'a, Rule<'a>>>,
    /// `(deffacts ...)` blocks.
    pub facts: Vec<Span<'a, Facts<'a>>>,
    /// Keywords of `(set-strategy ...)` forms, in source order.
    pub strategies: Vec<Span<'a, &'a str>>,
}
