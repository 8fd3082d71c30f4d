//! Errors and diagnostics.

use thiserror::Error;

use crate::backend::gal::PendingKind;
use crate::utils::Span;

/// Errors that stop compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Rendered snippet of a parse failure.
    #[error("{0}")]
    Syntax(String),

    /// A rule name defined twice.
    #[error("duplicate rule name '{name}'")]
    DuplicateRule {
        /// 规则名
        name: String,
    },

    /// A variable used before any pattern bound it.
    #[error("unresolved variable '?{variable}' in rule '{rule}': {text}")]
    UnresolvedVariable {
        /// 规则名
        rule: String,
        /// Variable name, without `?`.
        variable: String,
        /// The requirement as far as it was rendered.
        text: String,
    },
}

impl CompileError {
    /// Render the error against the source text of `span`.
    pub fn to_snippet<T>(&self, span: &Span<'_, T>) -> String {
        match (self, span.lines()) {
            (CompileError::Syntax(snippet), _) => snippet.clone(),
            (_, Some(lines)) => lines.to_snippet(&self.to_string(), self.label()),
            (_, None) => self.to_string(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CompileError::Syntax(_) => "syntax error",
            CompileError::DuplicateRule { .. } => "rule defined again here",
            CompileError::UnresolvedVariable { .. } => "variable used before it is bound",
        }
    }
}

/// Problems that degrade the output without stopping compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `retract`, `modify` or `duplicate` of a variable with no `?v <- pattern`.
    #[error("rule '{rule}': {action} target '?{variable}' is not bound by any pattern of the rule")]
    MissingBindingTarget {
        /// 规则名
        rule: String,
        /// Variable name, without `?`.
        variable: String,
        /// The action naming it.
        action: &'static str,
    },

    /// A pending effect on a fact that has no cells.
    #[error("no cell instances of fact '{fact}' for the {kind} marker; left unresolved")]
    UnmatchedMarker {
        /// 效果类型
        kind: PendingKind,
        /// 事实名
        fact: String,
    },

    /// `(declare (salience x))` where `x` is not an integer.
    #[error("rule '{rule}': salience '{text}' is not an integer, using 0")]
    MalformedSalience {
        /// 规则名
        rule: String,
        /// The token found after `salience`.
        text: String,
    },

    /// `(set-strategy x)` with an unsupported keyword.
    #[error("unknown strategy '{keyword}', using depth")]
    UnknownStrategy {
        /// 策略名
        keyword: String,
    },
}
