//! 输出 GAL Petri 网模型

use anyhow::Result;

use crate::backend::gal::RULE_FIRED;
use crate::document::Document;
use crate::options::Options;

/// 输出 GAL Petri 网模型
pub struct Gal;

impl super::Target for Gal {
    fn write(mut f: impl std::io::Write, document: &Document, options: &Options) -> Result<()> {
        writeln!(f, "gal System {{")?;
        Self::write_declarations(&mut f, document)?;
        Self::write_transitions(&mut f, document, options)?;
        writeln!(f, "}}")?;
        writeln!(f, "main System;")?;
        if options.properties {
            Self::write_properties(&mut f, document)?;
        }
        Ok(())
    }
}

impl Gal {
    const INDENT: &str = "    ";

    fn write_declarations(mut f: impl std::io::Write, document: &Document) -> Result<()> {
        writeln!(f, "{}int {RULE_FIRED} = -1;", Self::INDENT)?;
        for declaration in &document.declarations {
            writeln!(
                f,
                "{}int {} = {};",
                Self::INDENT,
                declaration.cell,
                declaration.initial
            )?;
        }
        Ok(())
    }

    fn write_block(mut f: impl std::io::Write, block: impl std::fmt::Display) -> Result<()> {
        for line in block.to_string().lines() {
            writeln!(f, "{}{}", Self::INDENT, line)?;
        }
        Ok(())
    }

    fn write_transitions(
        mut f: impl std::io::Write,
        document: &Document,
        options: &Options,
    ) -> Result<()> {
        for transition in &document.transitions {
            Self::write_block(&mut f, transition)?;
        }
        if options.environment {
            for input in &document.inputs {
                Self::write_block(&mut f, input)?;
            }
        }
        Ok(())
    }

    fn write_properties(mut f: impl std::io::Write, document: &Document) -> Result<()> {
        for transition in &document.transitions {
            writeln!(
                f,
                "property {}_fired [reachable]: {RULE_FIRED} == {};",
                transition.name, transition.index
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentBuilder;
    use crate::frontend::parser::parse;
    use crate::target::Target;

    fn model(source: &str, options: &Options) -> String {
        let module = parse(source, "t.clp").unwrap();
        let mut builder = DocumentBuilder::new();
        builder.module(&module).unwrap();
        let document = builder.build(None);

        let mut out = Vec::new();
        Gal::write(&mut out, &document, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn model_layout() {
        let text = model(
            "(defrule R1 (declare (salience 5)) (Pitch ?p) => (assert (Pitch-high ?p)))",
            &Options::default(),
        );
        assert_eq!(
            text,
            "gal System {
    int rule_fired = -1;
    int R1_Pitch = 0;
    int R1_Pitch_high = 0;
    transition R1 [R1_Pitch == 1] {
        rule_fired = 0;
        R1_Pitch = -1;
        R1_Pitch_high = 1;
    }
    transition Input_R1_Pitch [R1_Pitch == 0] {
        R1_Pitch = 1;
    }
}
main System;
property R1_fired [reachable]: rule_fired == 0;
"
        );
    }

    #[test]
    fn options_disable_inputs_and_properties() {
        let options = Options {
            properties: false,
            environment: false,
            ..Options::default()
        };
        let text = model("(defrule a (x) => )", &options);
        assert!(!text.contains("Input_"));
        assert!(!text.contains("property"));
        assert!(text.ends_with("main System;\n"));
    }
}
