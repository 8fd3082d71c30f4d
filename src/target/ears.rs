//! 输出 EARS 需求文档

use anyhow::Result;

use crate::backend::ears::Requirement;
use crate::document::Document;
use crate::options::Options;

/// 输出 EARS 需求文档
pub struct Ears;

impl super::Target for Ears {
    fn write(mut f: impl std::io::Write, document: &Document, options: &Options) -> Result<()> {
        let mut text = String::new();
        Self::write_header(&mut text, &document.known_facts);
        for requirement in &document.requirements {
            Self::write_requirement(&mut text, requirement, options.indent);
        }
        text.push_str("end.\n");

        f.write_all(collapse_blank_lines(&text).as_bytes())?;
        Ok(())
    }
}

impl Ears {
    const HEADER: &str = "// Requirements generated by clipsnet";

    fn write_header(text: &mut String, known_facts: &[String]) {
        text.push_str(Self::HEADER);
        text.push('\n');
        for fact in known_facts {
            text.push_str(&format!("// {fact}\n"));
        }
        text.push('\n');
    }

    fn write_requirement(text: &mut String, requirement: &Requirement, indent: usize) {
        let indent = " ".repeat(indent);
        text.push_str(&format!("ID \"{}\":\n", requirement.name));
        for comment in &requirement.comments {
            for line in comment.lines() {
                text.push_str(&format!("{indent}// {}\n", line.trim()));
            }
        }
        text.push_str(&format!("{indent}{}\n\n", requirement.statement()));
    }
}

fn push_blank_lines(out: &mut String, blank: &mut usize) {
    let keep = if *blank >= 5 { 2 } else { *blank };
    out.push_str(&"\n".repeat(keep));
    *blank = 0;
}

/// Runs of five or more blank lines become two.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank += 1;
            continue;
        }
        push_blank_lines(&mut out, &mut blank);
        out.push_str(line);
        out.push('\n');
    }
    push_blank_lines(&mut out, &mut blank);
    out
}
