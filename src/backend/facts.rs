//! Facts and their cells across the whole rule set.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Display;

use super::gal::{Cell, Transition};

/// A transition that lets the environment supply a fact nothing produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// The cell it supplies.
    pub cell: String,
}

impl Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "transition Input_{0} [{0} == 0] {{", self.cell)?;
        writeln!(f, "    {} = 1;", self.cell)?;
        write!(f, "}}")
    }
}

/// Where each fact lives in the net.
///
/// Built once after every rule has been lowered; nothing is added later.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FactTable {
    /// Facts targeted by some action.
    output: BTreeSet<String>,
    /// Cells of each fact, in rule order.
    instances: BTreeMap<String, Vec<String>>,
    /// Facts present in the initial state.
    initial: BTreeSet<String>,
}

impl FactTable {
    /// Collect the facts of `transitions`, reading their pending effects.
    pub fn collect<'t>(
        transitions: impl IntoIterator<Item = &'t Transition>,
        initial: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut table = FactTable {
            initial: initial.into_iter().collect(),
            ..Default::default()
        };
        for transition in transitions {
            for pending in transition.pending() {
                table.output.insert(pending.fact.clone());
            }
            for cell in transition.cells() {
                let instances = table.instances.entry(cell.fact.clone()).or_default();
                if !instances.contains(&cell.name) {
                    instances.push(cell.name.clone());
                }
            }
        }
        table
    }

    /// Whether some rule produces or consumes `fact` through an action.
    pub fn is_output(&self, fact: &str) -> bool {
        self.output.contains(fact)
    }

    /// The cells holding `fact`.
    pub fn instances(&self, fact: &str) -> &[String] {
        self.instances.get(fact).map(Vec::as_slice).unwrap_or_default()
    }

    /// Initial value of a cell.
    pub fn initial_value(&self, cell: &Cell) -> i64 {
        i64::from(self.initial.contains(&cell.fact))
    }

    /// Input transitions for condition cells of facts no action targets.
    pub fn inputs<'t>(&self, transitions: impl IntoIterator<Item = &'t Transition>) -> Vec<Input> {
        let mut seen = HashSet::new();
        transitions
            .into_iter()
            .flat_map(|transition| &transition.conditions)
            .filter(|cell| !self.is_output(&cell.fact))
            .filter(|cell| seen.insert(cell.name.clone()))
            .map(|cell| Input {
                cell: cell.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::gal::{transition, CellNames};
    use crate::frontend::parser::parse;

    const SOURCE: &str = r#"
(defrule stop (light red) (car ?c) => (assert (brake on)))
(defrule release ?b <- (brake on) (light green) => (retract ?b))
(defrule watch (light red) => )
"#;

    fn transitions() -> Vec<Transition> {
        let module = parse(SOURCE, "t.clp").unwrap();
        let mut names = CellNames::new();
        module
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| transition(rule, index, &mut names).0)
            .collect()
    }

    #[test]
    fn output_facts_and_instances() {
        let transitions = transitions();
        let table = FactTable::collect(&transitions, ["light_green".to_string()]);
        assert!(table.is_output("brake_on"));
        assert!(!table.is_output("light_red"));
        assert_eq!(table.instances("brake_on"), ["stop_brake_on", "release_brake_on"]);
        assert_eq!(table.instances("light_red"), ["stop_light_red", "watch_light_red"]);
        assert!(table.instances("missing").is_empty());

        let green = Cell {
            name: "release_light_green".into(),
            fact: "light_green".into(),
        };
        assert_eq!(table.initial_value(&green), 1);
    }

    #[test]
    fn inputs_only_for_external_facts() {
        let transitions = transitions();
        let table = FactTable::collect(&transitions, []);
        let inputs: Vec<String> = table
            .inputs(&transitions)
            .into_iter()
            .map(|input| input.cell)
            .collect();
        assert_eq!(
            inputs,
            vec![
                "stop_light_red",
                "stop_car",
                "release_light_green",
                "watch_light_red"
            ]
        );
    }

    #[test]
    fn input_display() {
        let input = Input {
            cell: "stop_car".into(),
        };
        assert_eq!(
            input.to_string(),
            "transition Input_stop_car [stop_car == 0] {\n    stop_car = 1;\n}"
        );
    }
}
