use clipsnet::document::{Document, Strategy};
use clipsnet::options::Options;
use clipsnet::target::{Ears, Gal};
use clipsnet::Context;

fn document(source: &str) -> Document {
    Context::new()
        .add_file("rules.clp", source)
        .expect("source compiles")
        .build()
}

fn ears(document: &Document, options: &Options) -> String {
    let mut out = Vec::new();
    document.write::<Ears>(&mut out, options).unwrap();
    String::from_utf8(out).unwrap()
}

fn gal(document: &Document, options: &Options) -> String {
    let mut out = Vec::new();
    document.write::<Gal>(&mut out, options).unwrap();
    String::from_utf8(out).unwrap()
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{text}"))
}

#[test]
fn pitch_rule_in_both_artifacts() {
    let document =
        document("(defrule R1 (declare (salience 5)) (Pitch ?p) => (assert (Pitch-high ?p)))");
    let options = Options::default();

    let ears = ears(&document, &options);
    assert!(ears.contains("ID \"R1\":\n"));
    assert!(ears.contains("    // (declare (salience 5))\n"));
    assert!(ears.contains("    While Pitch is present, Pitch__high shall be Pitch.\n"));
    assert!(ears.ends_with("end.\n"));

    let gal = gal(&document, &options);
    assert!(gal.starts_with("gal System {\n    int rule_fired = -1;\n"));
    assert!(gal.contains("transition R1 [R1_Pitch == 1] {"));
    assert!(gal.contains("R1_Pitch = -1;"));
    assert!(gal.contains("R1_Pitch_high = 1;"));
    assert!(gal.contains("property R1_fired [reachable]: rule_fired == 0;"));
}

#[test]
fn higher_salience_group_comes_first() {
    let document = document(
        "(defrule late (declare (salience -3)) (b) => (assert (c)))
         (defrule early (declare (salience 10)) (a) => (assert (b)))",
    );
    let ears = ears(&document, &Options::default());
    assert!(position(&ears, "ID \"early\"") < position(&ears, "ID \"late\""));
}

#[test]
fn missing_salience_is_zero() {
    let document = document(
        "(defrule below (declare (salience -1)) (a) => )
         (defrule plain (a) => )
         (defrule above (declare (salience 1)) (a) => )",
    );
    let names: Vec<&str> = document
        .requirements
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["above", "plain", "below"]);
}

#[test]
fn retract_resolves_without_markers() {
    let document = document(
        "(defrule switch ?f <- (traffic_light green) (car waiting) => (retract ?f))",
    );
    let gal = gal(&document, &Options::default());
    assert!(gal.contains("traffic_light_green = 0;"));
    assert!(!gal.contains("//RETRACT"));
    assert!(!gal.contains("//ASSERT"));
    assert!(document.diagnostics.is_empty());
}

#[test]
fn external_facts_get_one_input_per_rule() {
    let document = document(
        "(defrule a (sensor on) => (assert (alarm)))
         (defrule b (sensor on) (alarm) => (retract 1))
         (defrule c ?x <- (alarm) => (retract ?x))",
    );
    let gal = gal(&document, &Options::default());
    assert_eq!(gal.matches("transition Input_").count(), 2);
    assert!(gal.contains("transition Input_a_sensor_on [a_sensor_on == 0] {\n        a_sensor_on = 1;\n    }"));
    assert!(gal.contains("transition Input_b_sensor_on [b_sensor_on == 0]"));
    assert!(!gal.contains("Input_c_alarm"));
}

#[test]
fn negation_in_both_artifacts() {
    let document = document("(defrule calm (not (alarm ringing)) => (relax))");
    assert_eq!(document.requirements[0].condition, "alarm is not ringing");
    assert_eq!(document.transitions[0].guard, "calm_alarm_ringing != 1");
}

#[test]
fn one_property_per_rule() {
    let document = document(
        "(defrule a (x) => )
         (defrule b (y) => )
         (defrule c (z) => )",
    );
    let model = gal(&document, &Options::default());
    for (index, name) in ["a", "b", "c"].iter().enumerate() {
        let line = format!("property {name}_fired [reachable]: rule_fired == {index};");
        assert_eq!(model.matches(&line).count(), 1);
    }

    let options = Options {
        properties: false,
        ..Options::default()
    };
    assert!(!gal(&document, &options).contains("property "));
}

#[test]
fn initial_facts_start_present() {
    let document = document(
        "(deffacts startup (traffic_light red))
         (defrule wait (traffic_light red) => (assert (car stopped)))
         (defrule watch (traffic_light red) => )",
    );
    let gal = gal(&document, &Options::default());
    assert!(gal.contains("int wait_traffic_light_red = 1;"));
    assert!(gal.contains("int watch_traffic_light_red = 1;"));
    assert!(gal.contains("int wait_car_stopped = 0;"));

    let ears = ears(&document, &Options::default());
    assert!(ears.contains("// Known fact traffic_light is red\n"));
}

#[test]
fn strategy_from_options_wins() {
    let source = "(set-strategy breadth)
                  (defrule first (a) => )
                  (defrule second (a) => )";
    let options = Options {
        strategy: Some(Strategy::Depth),
        ..Options::default()
    };
    let document = Context::new()
        .set_options(options)
        .add_file("rules.clp", source)
        .unwrap()
        .build();
    assert_eq!(document.strategy, Strategy::Depth);
    assert_eq!(document.requirements[0].name, "second");
}

#[test]
fn duplicate_rules_across_files() {
    let result = Context::new()
        .add_file("one.clp", "(defrule same (a) => )")
        .unwrap()
        .add_file("two.clp", "(defrule same (b) => )");
    let err = result.err().expect("duplicate rule is rejected");
    let message = err.to_string();
    assert!(message.contains("duplicate rule name 'same'"));
    assert!(message.contains("two.clp"));
}

#[test]
fn unresolved_variable_names_the_rule() {
    let result = Context::new().add_file("bad.clp", "(defrule leaky (a) => (assert (b ?z)))");
    let message = result.err().expect("unresolved variable is fatal").to_string();
    assert!(message.contains("rule 'leaky'"));
    assert!(message.contains("?z"));
}

#[test]
fn apostrophe_literal_does_not_mask_unbound_variable() {
    let result = Context::new().add_file("p.clp", r#"(defrule r (a x) => (printout t "don't" ?y))"#);
    let message = result.err().expect("unbound ?y is fatal").to_string();
    assert!(message.contains("unresolved variable '?y' in rule 'r'"));
}

#[test]
fn symbols_ending_in_question_mark_compile() {
    let document = document("(defrule r (task done?) => (assert (report ready)))");
    let ears = ears(&document, &Options::default());
    assert!(ears.contains("While task is done?, report shall be ready."));
}

#[test]
fn cells_stay_distinct_across_rules() {
    let document = document(
        "(defrule a (b_c) => )
         (defrule a_b ?f <- (c) => (retract ?f))
         (defrule rule (fired) => )",
    );
    let gal = gal(&document, &Options::default());
    assert_eq!(gal.matches("int rule_fired = ").count(), 1);
    assert!(gal.contains("int a_b_c = 0;"));
    assert!(gal.contains("int a_b_c_1 = 0;"));
    assert!(gal.contains("int rule_fired_1 = 0;"));
    assert!(gal.contains("transition rule [rule_fired_1 == 1] {"));
    assert!(gal.contains("a_b_c_1 = 0;"));
    assert!(!gal.contains("    a_b_c = 0;"));
}

#[test]
fn syntax_errors_are_fatal() {
    let result = Context::new().add_file("broken.clp", "(defrule r (a) =>");
    assert!(result.is_err());
}

#[test]
fn output_stream_writes_the_model() {
    let mut out = Vec::new();
    Context::new()
        .add_file("rules.clp", "(defrule a (x) => (assert (y)))")
        .unwrap()
        .output_stream::<Gal>(&mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("main System;"));
}
