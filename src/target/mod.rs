//! 编译目标

use std::path::Path;

use anyhow::Result;

use crate::document::Document;
use crate::options::Options;

mod ears;
mod gal;
pub use self::ears::Ears;
pub use self::gal::Gal;

/// 编译目标
pub trait Target {
    /// 将文档写入流。
    fn write(f: impl std::io::Write, document: &Document, options: &Options) -> Result<()>;

    /// 将文档写入文件。
    fn write_to_file(
        filename: impl AsRef<Path>,
        document: &Document,
        options: &Options,
    ) -> Result<()> {
        let mut f = std::fs::File::create(filename)?;
        Self::write(&mut f, document, options)
    }
}
