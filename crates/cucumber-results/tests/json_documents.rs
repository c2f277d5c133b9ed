//! Behavioural tests reading Cucumber JSON reports from disk.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use cucumber_results::document::{parse_documents, parse_files};
use cucumber_results::model::UNTAGGED;
use cucumber_results::query::NodeRef;
use cucumber_results::{
    BuilderConfig, InMemoryAttachments, ModelError, Outcome, ReadError, ResultTree, ScenarioId,
    TreeBuilder,
};
use rstest::rstest;

mod common;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse(names: &[&str]) -> ResultTree {
    match parse_files(names.iter().map(|name| fixture(name)), BuilderConfig::default()) {
        Ok(tree) => tree,
        Err(err) => panic!("fixtures {names:?} should parse: {err}"),
    }
}

#[test]
fn passing_report_builds_single_pass() {
    let tree = parse(&["passing.json"]);
    let counts = tree.counts();
    assert_eq!((counts.pass, counts.fail, counts.skip), (1, 0, 0));
    assert_eq!(counts.duration, Duration::from_millis(1));

    let Some(NodeRef::Scenario(id, scenario)) =
        tree.find("cucumber/calculator/adding-two-numbers")
    else {
        panic!("scenario should be addressable by its safe-name path");
    };
    assert_eq!(scenario.name(), "Adding two numbers");
    assert_eq!(
        tree.full_name(id).as_deref(),
        Some("Calculator \u{01C2} Adding two numbers")
    );
    let Some((_, feature)) = tree.feature_by_safe_name("calculator") else {
        panic!("feature should be addressable");
    };
    assert_eq!(feature.uri(), Some("features/calculator.feature"));
}

#[test]
fn passing_report_indexes_feature_tags() {
    let tree = parse(&["passing.json"]);
    let Some(math) = tree.tag("@math") else {
        panic!("feature tag should be indexed");
    };
    assert_eq!(math.len(), 1);
    assert!(math.contains(ScenarioId::new(0, 0)));
    assert!(tree.tag(UNTAGGED).is_some_and(|tag| tag.len() == 1));
}

#[test]
fn background_failure_fails_every_scenario() {
    let tree = parse(&["background_failure.json"]);
    let counts = tree.counts();
    assert_eq!((counts.pass, counts.fail, counts.skip), (0, 3, 0));
    assert_eq!(counts.duration, Duration::from_millis(8));
    assert_eq!(tree.failed_scenarios().count(), 3);
    for (_, scenario) in tree.failed_scenarios() {
        assert_eq!(
            scenario.error_details().as_deref(),
            Some("java.sql.SQLException: connection refused")
        );
    }
    let Some(smoke) = tree.tag("@smoke") else {
        panic!("@smoke should be indexed");
    };
    assert_eq!(smoke.counts().fail, 1);
    assert_eq!(smoke.failed_scenarios(), &[ScenarioId::new(0, 0)]);
}

#[test]
fn undefined_fails_and_pending_skips() {
    let tree = parse(&["undefined.json"]);
    let counts = tree.counts();
    assert_eq!((counts.pass, counts.fail, counts.skip), (0, 1, 1));

    let Some(undefined) = tree.scenario(ScenarioId::new(0, 0)) else {
        panic!("first scenario should exist");
    };
    assert!(undefined.is_failed());
    assert_eq!(
        undefined.error_details().as_deref(),
        Some("Step \"I search for \"Dune\"\" is undefined")
    );
    let Some(pending) = tree.scenario(ScenarioId::new(0, 1)) else {
        panic!("second scenario should exist");
    };
    assert!(pending.is_skipped());
    assert_eq!(
        pending.steps().last().map(|step| step.outcome()),
        Some(Outcome::Skipped)
    );
}

#[test]
fn embeddings_are_decoded_and_stored() {
    let mut store = InMemoryAttachments::default();
    let mut builder = TreeBuilder::with_store(BuilderConfig::default(), &mut store);
    let read = parse_documents(&mut builder, [fixture("embedded.json")]);
    assert_eq!(read.ok(), Some(1));
    let tree = builder.finish();

    let Some(scenario) = tree.scenario(ScenarioId::new(0, 0)) else {
        panic!("scenario should exist");
    };
    assert_eq!(scenario.duration(), Duration::from_millis(8));
    assert_eq!(
        scenario.error_details().as_deref(),
        Some("java.lang.AssertionError: blank page")
    );
    let names: Vec<_> = scenario
        .embedded_items()
        .iter()
        .map(|item| item.filename.as_str())
        .collect();
    assert_eq!(names, vec!["embed_1.png", "embed_2.txt"]);
    assert_eq!(
        store.get("embed_1.png").map(|item| item.data.clone()),
        Some(vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'])
    );
    assert_eq!(
        store.get("embed_2.txt").map(|item| item.data.clone()),
        Some(b"console log".to_vec())
    );
}

#[test]
fn after_hook_screenshot_reaches_the_store() {
    let mut store = InMemoryAttachments::default();
    let mut builder = TreeBuilder::with_store(BuilderConfig::default(), &mut store);
    let read = parse_documents(&mut builder, [fixture("hook_embedding.json")]);
    assert_eq!(read.ok(), Some(1));
    let tree = builder.finish();

    let Some(scenario) = tree.scenario(ScenarioId::new(0, 0)) else {
        panic!("scenario should exist");
    };
    assert_eq!(scenario.after_hooks().len(), 1);
    let Some(item) = scenario.embedded_items().first() else {
        panic!("after hook embedding should be attached to the scenario");
    };
    assert_eq!(item.mime_type, "image/png");
    assert_eq!(item.filename, "embed_1.png");
    assert_eq!(
        store.get("embed_1.png").map(|stored| stored.data.clone()),
        Some(b"hi".to_vec())
    );
}

#[test]
fn expanded_outline_rows_get_distinct_names() {
    let tree = parse(&["duplicate_names.json"]);
    assert_eq!(
        tree.scenario_path(ScenarioId::new(0, 0)).as_deref(),
        Some("outline/eating;;2")
    );
    assert_eq!(
        tree.scenario_path(ScenarioId::new(0, 1)).as_deref(),
        Some("outline/eating;;2_2")
    );
}

#[rstest]
#[case::strict(true)]
#[case::lenient(false)]
fn step_without_result_follows_ordering_policy(#[case] strict: bool) {
    let config = BuilderConfig::default().with_strict_step_ordering(strict);
    let outcome = parse_files([fixture("unresolved_step.json")], config);
    if strict {
        assert!(matches!(
            outcome,
            Err(ReadError::Model(ModelError::DuplicateStep { .. }))
        ));
    } else {
        let Ok(tree) = outcome else {
            panic!("lenient parse should succeed");
        };
        let steps = tree
            .scenario(ScenarioId::new(0, 0))
            .map(|scenario| scenario.steps().len());
        assert_eq!(steps, Some(1));
        assert_eq!(tree.counts().pass, 1);
    }
}

#[test]
fn malformed_document_aborts_but_keeps_earlier_documents() {
    let mut builder = TreeBuilder::new(BuilderConfig::default());
    let outcome = parse_documents(
        &mut builder,
        [fixture("passing.json"), fixture("malformed.json")],
    );
    match outcome {
        Err(ReadError::Model(ModelError::Malformed { line, uri, .. })) => {
            assert!(line >= 4, "line {line} should point at the truncation");
            assert!(uri.ends_with("malformed.json"));
        }
        other => panic!("malformed JSON should be rejected, got {other:?}"),
    }
    assert_eq!(builder.finish().counts().pass, 1);
}

#[test]
fn empty_document_contributes_nothing() {
    let mut builder = TreeBuilder::new(BuilderConfig::default());
    let read = parse_documents(&mut builder, [fixture("empty.json")]);
    assert_eq!(read.ok(), Some(1));
    let tree = builder.finish();
    assert!(tree.is_empty());
    assert_eq!(tree.counts().total(), 0);
    assert!(tree.is_passed());
}

#[test]
fn missing_document_is_an_io_error() {
    let outcome = parse_files([fixture("does-not-exist.json")], BuilderConfig::default());
    let Err(ReadError::Io { path, .. }) = outcome else {
        panic!("missing file should be an I/O error");
    };
    assert!(path.ends_with("does-not-exist.json"));
}

#[test]
fn documents_written_at_runtime_are_read() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("temporary directory should be created");
    };
    let path = dir.path().join("cucumber.json");
    let report = r#"[{"uri": "a.feature", "name": "A", "elements": [
        {"type": "scenario", "name": "s", "steps": [
            {"keyword": "Given ", "name": "x", "result": {"status": "failed", "error_message": "nope"}}
        ]}
    ]}]"#;
    if let Err(err) = fs::write(&path, report) {
        panic!("report should be written: {err}");
    }
    let Ok(tree) = parse_files([&path], BuilderConfig::default()) else {
        panic!("report should parse");
    };
    assert_eq!(tree.counts().fail, 1);
    assert_eq!(
        tree.failed_scenarios()
            .next()
            .and_then(|(_, scenario)| scenario.error_details()),
        Some("nope".to_string())
    );
}

#[test]
fn rerun_report_merges_as_new_feature() {
    let mut base = parse(&["passing.json"]);
    let rerun = parse(&["passing.json"]);
    let expected = base.counts() + rerun.counts();

    let summary = base.merge(rerun);
    assert_eq!(summary.features_added, 1);
    assert_eq!(base.counts(), expected);
    assert!(matches!(
        base.find("cucumber/calculator_2/adding-two-numbers"),
        Some(NodeRef::Scenario(..))
    ));
    assert!(matches!(
        base.find("cucumber/calculator/adding-two-numbers"),
        Some(NodeRef::Scenario(..))
    ));
}

#[test]
fn parsed_report_merges_with_built_tree() {
    let mut base = common::single_feature("built.feature", "Built", &[Outcome::Failed]);
    base.merge(parse(&["passing.json"]));
    assert_eq!((base.counts().pass, base.counts().fail), (1, 1));
    assert_eq!(base.features().len(), 2);
}
