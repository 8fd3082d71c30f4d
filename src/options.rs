//! 编译选项。

use crate::document::Strategy;

/// 编译选项。
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Conflict-resolution strategy, overriding `(set-strategy ...)`.
    pub strategy: Option<Strategy>,
    /// 输出每条规则的可达性性质。
    pub properties: bool,
    /// 为外部事实生成输入变迁。
    pub environment: bool,
    /// Indentation of requirement bodies.
    pub indent: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strategy: None,
            properties: true,
            environment: true,
            indent: 4,
        }
    }
}
