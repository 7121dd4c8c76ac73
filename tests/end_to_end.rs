use chrono::Utc;

use codetandem::curriculum::{generate_modules_document, load_modules};
use codetandem::domain::ReviewResult;
use codetandem::extractor::{extract_marked_code, MarkerSelector};
use codetandem::gating::{apply_submission, GatingPolicy, Submission};
use codetandem::store::ProgressStore;

const CURRICULUM: &str = "\
# Getting Started
- Print a greeting
- Read a number

# Collections
- Build a vector
";

const LEARNER_FILE: &str = "\
fn main() {
    // TODO: [obj-1] print a greeting
    println!(\"hello\");

    // TODO: [obj-2] read a number
    let n: i32 = \"42\".parse().unwrap();
}
";

#[test]
fn passing_every_objective_advances_to_the_next_module() {
    let dir = tempfile::tempdir().unwrap();
    let curriculum = dir.path().join("curriculum.md");
    let modules_path = dir.path().join("modules.json");
    let state_path = dir.path().join("codetandem.state.json");
    let source = dir.path().join("main.rs");
    std::fs::write(&curriculum, CURRICULUM).unwrap();
    std::fs::write(&source, LEARNER_FILE).unwrap();

    generate_modules_document(&curriculum, &modules_path).unwrap();
    let modules = load_modules(&modules_path).unwrap();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].id, "getting-started");

    let store = ProgressStore::new();
    store.initialize_state(&state_path, &modules[0].id, modules.len()).unwrap();

    let review = ReviewResult { success: true, feedback: "Nice".into(), score: Some(80.0), suggestions: vec![] };
    let policy = GatingPolicy::default();

    for id in ["obj-1", "obj-2"] {
        let extraction = extract_marked_code(&source, &MarkerSelector::Id(id.into())).unwrap();
        let sub = Submission {
            modules: &modules,
            marker_id: extraction.marker_id.as_deref(),
            review: &review,
            auto_advance: true,
        };
        let (_, outcome) = store
            .mutate(&state_path, |st| apply_submission(st, &sub, &policy, Utc::now()))
            .unwrap();
        assert_eq!(outcome.adjusted_score, 8.0);
        assert!(outcome.passed);
    }

    let state = store.load_state(&state_path).unwrap();
    assert_eq!(state.completed_modules, vec!["getting-started"]);
    assert_eq!(state.current_module_id, "collections");
    assert_eq!(state.assessment_pending, Some(true));
    assert_eq!(state.progress("getting-started").objectives_completed.len(), 2);
    assert_eq!(state.progress("getting-started").attempts, 2);
}

#[test]
fn failed_update_leaves_the_document_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let store = ProgressStore::new();
    store.initialize_state(&state_path, "only", 1).unwrap();
    let before = std::fs::read(&state_path).unwrap();

    let modules = vec![codetandem::domain::Module {
        id: "only".into(),
        title: "Only".into(),
        objectives: vec!["One thing".into()],
    }];
    let review = ReviewResult { success: true, feedback: String::new(), score: Some(9.0), suggestions: vec![] };
    let sub = Submission { modules: &modules, marker_id: Some("obj-3"), review: &review, auto_advance: true };
    let err = store
        .mutate(&state_path, |st| apply_submission(st, &sub, &GatingPolicy::default(), Utc::now()))
        .unwrap_err();

    assert_eq!(err.kind(), "objective_not_found");
    assert_eq!(std::fs::read(&state_path).unwrap(), before);
}
