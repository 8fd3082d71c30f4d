//! Second pass: turn pending effects into statements over fact instances.

use super::facts::FactTable;
use super::gal::{Pending, PendingKind, Statement, Transition};
use crate::error::Diagnostic;

fn assign(cells: &[String], value: i64) -> Vec<Statement> {
    cells
        .iter()
        .map(|cell| Statement::Assign {
            cell: cell.clone(),
            value,
        })
        .collect()
}

/// Statements replacing `pending`, or `None` when its fact has no cells.
fn expand(pending: &Pending, facts: &FactTable) -> Option<Vec<Statement>> {
    let cells = facts.instances(&pending.fact);
    if cells.is_empty() {
        return None;
    }
    Some(match pending.kind {
        PendingKind::Produce => assign(cells, 1),
        PendingKind::Retract => assign(cells, 0),
        PendingKind::Assert => vec![Statement::Guarded {
            guard: cells.to_vec(),
            body: assign(cells, 1),
        }],
    })
}

/// Resolve the pending statements of one transition.
pub fn resolve_transition(transition: &mut Transition, facts: &FactTable) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];
    let mut actions = Vec::with_capacity(transition.actions.len());
    for statement in transition.actions.drain(..) {
        match statement {
            Statement::Pending(pending) => match expand(&pending, facts) {
                Some(statements) => actions.extend(statements),
                None => {
                    diagnostics.push(Diagnostic::UnmatchedMarker {
                        kind: pending.kind,
                        fact: pending.fact.clone(),
                    });
                    actions.push(Statement::Pending(pending));
                }
            },
            statement => actions.push(statement),
        }
    }
    transition.actions = actions;
    diagnostics
}

/// Resolve every transition. Running it again leaves the net unchanged.
pub fn resolve(transitions: &mut [Transition], facts: &FactTable) -> Vec<Diagnostic> {
    transitions
        .iter_mut()
        .flat_map(|transition| resolve_transition(transition, facts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::gal::{transition, CellNames};
    use crate::frontend::parser::parse;

    fn net(source: &str) -> (Vec<Transition>, FactTable) {
        let module = parse(source, "t.clp").unwrap();
        let mut names = CellNames::new();
        let transitions: Vec<Transition> = module
            .rules
            .iter()
            .enumerate()
            .map(|(index, rule)| transition(rule, index, &mut names).0)
            .collect();
        let facts = FactTable::collect(&transitions, []);
        (transitions, facts)
    }

    fn body(transition: &Transition) -> Vec<String> {
        transition.actions.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn retract_clears_every_instance() {
        let (mut transitions, facts) = net(
            "(defrule clear ?f <- (traffic_light green) => (retract ?f))
             (defrule go (traffic_light green) => (assert (moving)))",
        );
        let diagnostics = resolve(&mut transitions, &facts);
        assert!(diagnostics.is_empty());
        assert_eq!(
            body(&transitions[0]),
            vec![
                "rule_fired = 0;",
                "clear_traffic_light_green = -1;",
                "clear_traffic_light_green = 0;",
                "go_traffic_light_green = 0;",
            ]
        );
        assert_eq!(
            body(&transitions[1]),
            vec![
                "rule_fired = 1;",
                "go_traffic_light_green = -1;",
                "go_moving = 1;"
            ]
        );
    }

    #[test]
    fn assert_is_guarded() {
        let (mut transitions, facts) = net(
            "(defrule m ?l <- (light (color red)) => (modify ?l (color green)))
             (defrule seen (light (color green)) => )",
        );
        resolve(&mut transitions, &facts);
        assert_eq!(
            body(&transitions[0]),
            vec![
                "rule_fired = 0;",
                "m_light_color_red = -1;",
                "m_light_color_red = 0;",
                "if (seen_light_color_green == 0) { seen_light_color_green = 1; }",
            ]
        );
    }

    #[test]
    fn unmatched_marker_stays() {
        let (mut transitions, facts) =
            net("(defrule d ?l <- (light red) => (duplicate ?l (level high)))");
        let diagnostics = resolve(&mut transitions, &facts);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnmatchedMarker {
                kind: PendingKind::Assert,
                fact: "light_red_level_high".into()
            }]
        );
        assert_eq!(
            body(&transitions[0]).last().map(String::as_str),
            Some("//ASSERT: light_red_level_high")
        );
    }

    #[test]
    fn resolving_twice_changes_nothing() {
        let (mut transitions, facts) = net(
            "(defrule a ?x <- (p) => (retract ?x) (assert (q)))
             (defrule b (q) => (assert (p)))",
        );
        resolve(&mut transitions, &facts);
        let once = transitions.clone();
        resolve(&mut transitions, &facts);
        assert_eq!(transitions, once);
    }
}
