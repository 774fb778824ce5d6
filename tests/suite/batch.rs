//! Batch driver: ordering, persistence and failure scope

use shorten::{DocumentOutcome, dry_run, list_documents, render_summary, run_batch};
use shorten_config::OnRemoteFailure;
use tempfile::tempdir;

use crate::common::{
    HalvingRewriter, PoisonedRewriter, batch_options, small_shortener, words, write_files,
};

#[test]
fn documents_are_listed_by_name() {
    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("b.txt", "b"), ("a.txt", "a"), ("c.md", "c")]);
    std::fs::create_dir(dir.path().join("subdir")).unwrap();

    let listed = list_documents(dir.path()).unwrap();
    let names: Vec<_> = listed
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.md"]);
}

#[tokio::test]
async fn mixed_batch_reports_each_document() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let long = words(300);
    write_files(
        input.path(),
        &[
            ("a.txt", long.as_str()),
            ("b.md", "# Heading\n\nA *short* markdown note with a few words in it."),
            ("c.odt", "PK\x03\x04"),
            ("d.txt", ""),
        ],
    );
    let documents = list_documents(input.path()).unwrap();
    let rewriter = HalvingRewriter::default();
    let options = batch_options(output.path(), OnRemoteFailure::SkipDocument, 1);

    let report = run_batch(&small_shortener(), &rewriter, &documents, &options).await;

    assert!(!report.aborted);
    let names: Vec<&str> = report.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.md", "c.odt", "d.txt"]);

    match &report.documents[0].outcome {
        DocumentOutcome::Shortened { stats, output: path } => {
            assert_eq!(stats.original_chars, long.chars().count());
            assert!(stats.final_chars < stats.original_chars);
            let saved = std::fs::read_to_string(path).unwrap();
            assert_eq!(saved.chars().count(), stats.final_chars);
            let file = path.file_name().unwrap().to_string_lossy();
            assert!(file.starts_with("a_0."));
            assert!(file.ends_with(".txt"));
        }
        other => panic!("expected Shortened, got {other:?}"),
    }
    assert!(report.documents[1].outcome.is_shortened());
    match &report.documents[2].outcome {
        DocumentOutcome::Failed { reason } => assert!(reason.contains("unsupported")),
        other => panic!("expected Failed, got {other:?}"),
    }
    match &report.documents[3].outcome {
        DocumentOutcome::Failed { reason } => assert!(reason.contains("no text")),
        other => panic!("expected Failed, got {other:?}"),
    }

    let summary = render_summary(&report);
    assert!(summary.starts_with("Shortening 4 files done!\n"));
    assert_eq!(summary.matches("ERROR! Not shortened.").count(), 2);
}

#[tokio::test]
async fn concurrent_batch_keeps_input_order() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let files: Vec<(String, String)> = (0..6)
        .map(|i| (format!("doc{i}.txt"), words(40 + i * 30)))
        .collect();
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    write_files(input.path(), &refs);
    let documents = list_documents(input.path()).unwrap();
    let options = batch_options(output.path(), OnRemoteFailure::SkipDocument, 3);

    let report = run_batch(
        &small_shortener(),
        &HalvingRewriter::default(),
        &documents,
        &options,
    )
    .await;

    assert!(report.all_shortened());
    let names: Vec<&str> = report.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["doc0.txt", "doc1.txt", "doc2.txt", "doc3.txt", "doc4.txt", "doc5.txt"]
    );
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 6);
}

#[tokio::test]
async fn remote_failure_skips_only_that_document() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_files(
        input.path(),
        &[
            ("a.txt", "a healthy little document"),
            ("b.txt", "this one is POISON for the model"),
            ("c.txt", "another healthy document"),
        ],
    );
    let documents = list_documents(input.path()).unwrap();
    let rewriter = PoisonedRewriter::new("POISON");
    let options = batch_options(output.path(), OnRemoteFailure::SkipDocument, 1);

    let report = run_batch(&small_shortener(), &rewriter, &documents, &options).await;

    assert!(!report.aborted);
    assert!(report.documents[0].outcome.is_shortened());
    assert!(matches!(
        report.documents[1].outcome,
        DocumentOutcome::Failed { .. }
    ));
    assert!(report.documents[2].outcome.is_shortened());
    assert_eq!(rewriter.calls(), 3);
}

#[tokio::test]
async fn abort_policy_stops_the_run() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_files(
        input.path(),
        &[
            ("a.txt", "a healthy little document"),
            ("b.txt", "this one is POISON for the model"),
            ("c.txt", "never attempted"),
        ],
    );
    let documents = list_documents(input.path()).unwrap();
    let rewriter = PoisonedRewriter::new("POISON");
    let options = batch_options(output.path(), OnRemoteFailure::AbortRun, 1);

    let report = run_batch(&small_shortener(), &rewriter, &documents, &options).await;

    assert!(report.aborted);
    assert!(report.documents[0].outcome.is_shortened());
    match &report.documents[2].outcome {
        DocumentOutcome::Failed { reason } => assert!(reason.contains("not attempted")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(rewriter.calls(), 2);
    assert!(render_summary(&report).contains("Run aborted"));
}

#[tokio::test]
async fn repeated_runs_never_overwrite() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_files(input.path(), &[("paper.txt", "one two three four five six")]);
    let documents = list_documents(input.path()).unwrap();
    let options = batch_options(output.path(), OnRemoteFailure::SkipDocument, 1);
    let shortener = small_shortener();

    for _ in 0..3 {
        let report = run_batch(&shortener, &HalvingRewriter::default(), &documents, &options).await;
        assert!(report.all_shortened());
    }

    let mut names: Vec<String> = std::fs::read_dir(output.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 3);
    assert!(names.iter().any(|n| n.ends_with("_(1).txt")));
    assert!(names.iter().any(|n| n.ends_with("_(2).txt")));
}

#[test]
fn dry_run_makes_no_calls() {
    let input = tempdir().unwrap();
    let long = words(300);
    write_files(input.path(), &[("a.txt", long.as_str()), ("b.txt", "")]);
    let documents = list_documents(input.path()).unwrap();

    let plans = dry_run(&small_shortener(), &documents);

    assert_eq!(plans.len(), 2);
    let plan = plans[0].plan.as_ref().unwrap();
    assert!(plan.windows >= 3);
    assert!(plans[1].plan.is_err());
}
