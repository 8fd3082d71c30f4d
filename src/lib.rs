//! A compiler from CLIPS rules to EARS requirements and GAL Petri nets.
//!
//! Every rule becomes one structured requirement and one transition of a net
//! whose reachability properties detect rules that can never fire.

#![deny(missing_docs)]

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod backend;
pub mod document;
pub mod error;
pub mod frontend;
pub mod options;
pub mod target;
pub(crate) mod utils;

use anyhow::Result;
use document::{Document, DocumentBuilder};
use options::Options;
use target::Target;

/// 编译器上下文
#[derive(Default)]
pub struct Context {
    builder: DocumentBuilder,
    options: Options,
}

impl Context {
    /// 创建一个新的编译器上下文。
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置编译选项。
    pub fn set_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// 编译源代码。
    pub fn add_file(mut self, filename: &str, source: &str) -> Result<Self> {
        let module = match frontend::parser::parse(source, filename) {
            Ok(module) => module,
            Err(snippet) => anyhow::bail!("{}", snippet),
        };

        if let Err(e) = frontend::check::check_module(&module, |name| self.builder.defines(name)) {
            anyhow::bail!("{}", e.to_snippet());
        }

        self.builder.module(&module)?;
        Ok(self)
    }

    /// 构建文档。
    pub fn build(self) -> Document {
        self.builder.build(self.options.strategy)
    }

    /// 输出到流。
    pub fn output_stream<T: Target>(self, output: impl std::io::Write) -> Result<()> {
        let options = self.options.clone();
        let document = self.build();
        T::write(output, &document, &options)?;
        Ok(())
    }

    /// 输出到文件。
    pub fn output_file<T: Target>(self, output: impl AsRef<std::path::Path>) -> Result<()> {
        let options = self.options.clone();
        let document = self.build();
        T::write_to_file(output, &document, &options)?;
        Ok(())
    }
}
