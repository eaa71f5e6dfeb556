//! End-to-end runs against temporary projects.

use std::sync::Arc;
use std::time::Duration;

use masquerade::engine::EngineClient;
use masquerade::progress::{CancelToken, NoProgress};
use masquerade::refactor::{Anonymizer, RunState};
use masquerade::source::DartParser;
use masquerade::ErrorCode;

mod common;
use common::{
    anonymizer, quiet_anonymizer, CancelAfter, FailingAtRequest, FailingOn, Project, Unresponsive,
    SEED,
};

fn three_files() -> Project {
    let project = Project::new();
    project
        .write("lib/a.dart", "@De String alphaToken = 'a';\n")
        .write("lib/b.dart", "@De String betaToken = 'b';\nvoid useB() => print(betaToken);\n")
        .write("lib/c.dart", "@De String gammaToken = 'c';\n");
    project
}

#[test]
fn renames_references_across_files_and_persists_mapping() {
    let project = Project::new();
    project
        .write(
            "lib/config.dart",
            "class Config {\n  @De\n  static const String apiKey = 'k';\n}\n",
        )
        .write(
            "lib/main.dart",
            "import 'config.dart';\nvoid main() => print(Config.apiKey);\n",
        );
    let options = project.options(Some(SEED));
    let mut runner = quiet_anonymizer(project.lexical_engine());

    let report = runner.run(&options).unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(runner.state(), RunState::Completed);
    let new_name = report.mapping.get("apiKey").unwrap().to_string();
    let config = project.read("lib/config.dart");
    assert_eq!(
        config,
        format!("class Config {{\n  static const String {} = 'k';\n}}\n", new_name)
    );
    assert!(project.read("lib/main.dart").contains(&format!("Config.{}", new_name)));

    let rename = report.rename.unwrap();
    assert_eq!(rename.renamed, 1);
    assert!(rename.changed_files.contains("lib/config.dart"));
    assert!(rename.changed_files.contains("lib/main.dart"));

    let stored = masquerade::mapping::load(&options.mapping_path).unwrap().unwrap();
    assert_eq!(stored, report.mapping);
}

#[test]
fn second_run_is_a_no_op() {
    let project = three_files();
    let options = project.options(Some(SEED));

    let first = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();
    assert_eq!(first.mapping.len(), 3);
    let after_first: Vec<String> = ["lib/a.dart", "lib/b.dart", "lib/c.dart"]
        .iter()
        .map(|f| project.read(f))
        .collect();

    let second = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();

    assert_eq!(second.state, RunState::Completed);
    assert!(second.scan.names.is_empty());
    assert!(second.mapping.is_empty());
    assert!(second.rename.is_none());
    let after_second: Vec<String> = ["lib/a.dart", "lib/b.dart", "lib/c.dart"]
        .iter()
        .map(|f| project.read(f))
        .collect();
    assert_eq!(after_first, after_second);

    // The mapping file is replaced on every seeded run, here by an empty one.
    assert_eq!(second.mapping_file.as_deref(), Some(options.mapping_path.as_path()));
    let stored = masquerade::mapping::load(&options.mapping_path).unwrap().unwrap();
    assert!(stored.is_empty());
}

#[test]
fn same_seed_gives_same_mapping() {
    let first = three_files();
    let second = three_files();

    let a = quiet_anonymizer(first.lexical_engine())
        .run(&first.options(Some(SEED)))
        .unwrap();
    let b = quiet_anonymizer(second.lexical_engine())
        .run(&second.options(Some(SEED)))
        .unwrap();

    assert_eq!(a.mapping, b.mapping);
}

#[test]
fn cancellation_stops_at_a_file_boundary() {
    let project = three_files();
    let options = project.options(Some(SEED));
    let cancel = CancelToken::new();
    let progress = Arc::new(CancelAfter {
        token: cancel.clone(),
        after: 1,
    });
    let mut runner = anonymizer(project.lexical_engine(), progress, cancel);

    let report = runner.run(&options).unwrap();

    assert_eq!(report.state, RunState::Cancelled);
    assert_eq!(runner.state(), RunState::Cancelled);
    let rename = report.rename.unwrap();
    assert!(rename.cancelled);
    assert_eq!(rename.files_processed, 1);
    assert!(!project.read("lib/a.dart").contains("@De"));
    assert_eq!(project.read("lib/b.dart"), "@De String betaToken = 'b';\nvoid useB() => print(betaToken);\n");
    assert_eq!(project.read("lib/c.dart"), "@De String gammaToken = 'c';\n");

    let stored = masquerade::mapping::load(&options.mapping_path).unwrap().unwrap();
    assert_eq!(stored.len(), 3);
}

#[test]
fn engine_failure_keeps_earlier_files_and_leaves_the_rest_untouched() {
    let project = three_files();
    let options = project.options(Some(SEED));
    let engine = FailingOn {
        inner: project.lexical_engine(),
        file_suffix: "b.dart",
    };
    let mut runner = quiet_anonymizer(engine);

    let err = runner.run(&options).unwrap_err();

    assert_eq!(err.code, ErrorCode::RefactorEngineFailed);
    assert_eq!(runner.state(), RunState::Failed);
    assert_eq!(err.details["committedFiles"], serde_json::json!(["lib/a.dart"]));
    assert!(!project.read("lib/a.dart").contains("alphaToken"));
    assert_eq!(project.read("lib/b.dart"), "@De String betaToken = 'b';\nvoid useB() => print(betaToken);\n");
    assert_eq!(project.read("lib/c.dart"), "@De String gammaToken = 'c';\n");
}

#[test]
fn rolled_back_file_keeps_earlier_commits_listed() {
    let project = Project::new();
    let a_source = "@De String alphaToken = 'a';\nvoid f() => print(betaToken);\n";
    let b_source = "@De String betaToken = 'b';\n@De String deltaToken = 'd';\n";
    project.write("lib/a.dart", a_source).write("lib/b.dart", b_source);
    let options = project.options(Some(SEED));
    // Requests: alphaToken in a, betaToken in b (also edits a), deltaToken in b.
    let engine = FailingAtRequest {
        inner: project.lexical_engine(),
        fail_at: 3,
        seen: 0,
    };
    let mut runner = quiet_anonymizer(engine);

    let err = runner.run(&options).unwrap_err();

    assert_eq!(err.code, ErrorCode::RefactorEngineFailed);
    assert_eq!(err.details["committedFiles"], serde_json::json!(["lib/a.dart"]));
    assert!(err.details.get("unrestoredFiles").is_none());

    let mapping = masquerade::mapping::load(&options.mapping_path).unwrap().unwrap();
    let alpha = mapping.get("alphaToken").unwrap();
    assert_eq!(
        project.read("lib/a.dart"),
        format!("String {} = 'a';\nvoid f() => print(betaToken);\n", alpha)
    );
    assert_eq!(project.read("lib/b.dart"), b_source);
}

#[test]
fn repeated_marked_name_is_renamed_once_and_every_marker_removed() {
    let project = Project::new();
    project
        .write(
            "lib/a.dart",
            "class Keys {\n  @De\n  static const String apiKey = 'k';\n}\n",
        )
        .write(
            "lib/b.dart",
            "@De String apiKey = 'b';\nvoid f() {\n  @De var apiKey = 1;\n  print(apiKey);\n}\n",
        );
    let options = project.options(Some(SEED));

    let report = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.scan.declarations, 3);
    assert_eq!(report.mapping.len(), 1);
    let new_name = report.mapping.get("apiKey").unwrap();

    let a = project.read("lib/a.dart");
    let b = project.read("lib/b.dart");
    assert!(!a.contains("@De") && !b.contains("@De"));
    assert_eq!(
        a,
        format!("class Keys {{\n  static const String {} = 'k';\n}}\n", new_name)
    );
    assert_eq!(
        b,
        format!(
            "String {n} = 'b';\nvoid f() {{\n  var {n} = 1;\n  print({n});\n}}\n",
            n = new_name
        )
    );

    let rename = report.rename.unwrap();
    assert_eq!(rename.renamed, 1);
    assert_eq!(rename.files_processed, 2);
    assert!(rename.changed_files.contains("lib/a.dart"));
    assert!(rename.changed_files.contains("lib/b.dart"));
}

#[test]
fn unanswered_request_fails_with_timeout() {
    let project = Project::new();
    let source = "@De int counter = 0;\n";
    project.write("lib/a.dart", source);
    let options = project.options(Some(SEED));
    let client = EngineClient::spawn(Unresponsive, Duration::from_millis(50)).unwrap();
    let mut runner = Anonymizer::new(
        Arc::new(DartParser),
        client,
        Arc::new(NoProgress),
        CancelToken::new(),
    );

    let err = runner.run(&options).unwrap_err();

    assert_eq!(err.code, ErrorCode::RefactorEngineTimeout);
    assert_eq!(err.details["timeoutMillis"], serde_json::json!(50));
    assert_eq!(project.read("lib/a.dart"), source);
}

#[test]
fn unparsable_file_is_skipped_and_left_alone() {
    let project = Project::new();
    let broken = "@De int lost = 1;\nvoid broken( {\n";
    project
        .write("lib/good.dart", "@De int kept = 1;\n")
        .write("lib/broken.dart", broken);
    let options = project.options(Some(SEED));

    let report = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.scan.skipped.len(), 1);
    assert_eq!(report.scan.skipped[0].file, "lib/broken.dart");
    assert!(report.mapping.contains("kept"));
    assert!(!report.mapping.contains("lost"));
    assert_eq!(project.read("lib/broken.dart"), broken);
}

#[test]
fn strict_run_refuses_unparsable_files() {
    let project = Project::new();
    project
        .write("lib/good.dart", "@De int kept = 1;\n")
        .write("lib/broken.dart", "void broken( {\n");
    let mut options = project.options(Some(SEED));
    options.strict = true;
    let mut runner = quiet_anonymizer(project.lexical_engine());

    let err = runner.run(&options).unwrap_err();

    assert_eq!(err.code, ErrorCode::SourceParseFailed);
    assert_eq!(project.read("lib/good.dart"), "@De int kept = 1;\n");
    assert!(!options.mapping_path.exists());
}

#[test]
fn doc_comment_references_are_not_rewritten() {
    let project = Project::new();
    project.write(
        "lib/a.dart",
        "/// Sent as [apiKey] in headers.\n@De String apiKey = 'k';\n",
    );
    let options = project.options(Some(SEED));

    let report = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();

    let new_name = report.mapping.get("apiKey").unwrap();
    assert_eq!(
        project.read("lib/a.dart"),
        format!("/// Sent as [apiKey] in headers.\nString {} = 'k';\n", new_name)
    );
}

#[test]
fn blank_seed_changes_nothing() {
    let project = three_files();
    let options = project.options(Some("   "));

    let report = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.scan.names.len(), 3);
    assert!(report.mapping.is_empty());
    assert!(!options.mapping_path.exists());
    assert_eq!(project.read("lib/c.dart"), "@De String gammaToken = 'c';\n");
}

#[test]
fn dry_run_writes_nothing() {
    let project = three_files();
    let mut options = project.options(Some(SEED));
    options.dry_run = true;

    let report = quiet_anonymizer(project.lexical_engine()).run(&options).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.mapping.len(), 3);
    assert!(report.rename.is_none());
    assert!(!options.mapping_path.exists());
    assert_eq!(project.read("lib/a.dart"), "@De String alphaToken = 'a';\n");
}
