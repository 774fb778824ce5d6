use std::fmt::Write;

use crate::batch::{DocumentOutcome, DocumentPlan, RunReport};

/// End-of-run report, one block per document in input order.
#[must_use]
pub fn render_summary(report: &RunReport) -> String {
    let mut out = format!("Shortening {} files done!\n", report.documents.len());
    for (i, doc) in report.documents.iter().enumerate() {
        let _ = writeln!(out, "File {}: {}", i + 1, doc.name);
        match &doc.outcome {
            DocumentOutcome::Shortened { stats, output } => {
                let file = output
                    .file_name()
                    .map_or_else(|| output.display().to_string(), |f| f.to_string_lossy().into_owned());
                let _ = writeln!(out, "| Output file name: {file}");
                let _ = writeln!(
                    out,
                    "| Shorten characters: {} -> {}",
                    stats.original_chars, stats.final_chars
                );
                let _ = writeln!(out, "| Shortened to {:.2} %", stats.char_ratio() * 100.0);
            }
            DocumentOutcome::Unsaved { stats, reason } => {
                let _ = writeln!(out, "| Output file name: not saved ({reason})");
                let _ = writeln!(
                    out,
                    "| Shorten characters: {} -> {}",
                    stats.original_chars, stats.final_chars
                );
            }
            DocumentOutcome::Failed { reason } => {
                let _ = writeln!(out, "| ERROR! Not shortened. ({reason})");
            }
        }
    }
    if report.aborted {
        out.push_str("Run aborted after a remote failure.\n");
    }
    out
}

#[must_use]
pub fn render_plan_summary(plans: &[DocumentPlan]) -> String {
    let mut out = format!("Planned {} files (dry run, nothing sent)\n", plans.len());
    for (i, doc) in plans.iter().enumerate() {
        let _ = writeln!(out, "File {}: {}", i + 1, doc.name);
        match &doc.plan {
            Ok(plan) => {
                let _ = writeln!(
                    out,
                    "| {} characters, {} tokens, {} windows",
                    plan.chars, plan.tokens, plan.windows
                );
            }
            Err(reason) => {
                let _ = writeln!(out, "| ERROR! Cannot plan. ({reason})");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{DocumentReport, WindowPlan};
    use shorten_context::ShortenStats;
    use std::path::PathBuf;

    fn stats() -> ShortenStats {
        ShortenStats {
            original_chars: 200,
            final_chars: 90,
            original_tokens: 50,
            final_tokens: 22,
        }
    }

    #[test]
    fn summary_lists_each_outcome() {
        let report = RunReport {
            documents: vec![
                DocumentReport {
                    name: "a.txt".into(),
                    outcome: DocumentOutcome::Shortened {
                        stats: stats(),
                        output: PathBuf::from("/out/a_0.45.txt"),
                    },
                },
                DocumentReport {
                    name: "b.odt".into(),
                    outcome: DocumentOutcome::Failed {
                        reason: "unsupported".into(),
                    },
                },
                DocumentReport {
                    name: "c.txt".into(),
                    outcome: DocumentOutcome::Unsaved {
                        stats: stats(),
                        reason: "disk full".into(),
                    },
                },
            ],
            aborted: false,
        };

        let summary = render_summary(&report);
        assert_eq!(
            summary,
            "Shortening 3 files done!\n\
             File 1: a.txt\n\
             | Output file name: a_0.45.txt\n\
             | Shorten characters: 200 -> 90\n\
             | Shortened to 45.00 %\n\
             File 2: b.odt\n\
             | ERROR! Not shortened. (unsupported)\n\
             File 3: c.txt\n\
             | Output file name: not saved (disk full)\n\
             | Shorten characters: 200 -> 90\n"
        );
    }

    #[test]
    fn aborted_run_is_noted() {
        let report = RunReport {
            documents: Vec::new(),
            aborted: true,
        };
        assert!(render_summary(&report).ends_with("Run aborted after a remote failure.\n"));
    }

    #[test]
    fn plan_summary() {
        let plans = vec![
            DocumentPlan {
                name: "a.txt".into(),
                plan: Ok(WindowPlan {
                    chars: 10,
                    tokens: 3,
                    windows: 1,
                }),
            },
            DocumentPlan {
                name: "b.txt".into(),
                plan: Err("no text to shorten".into()),
            },
        ];
        let summary = render_plan_summary(&plans);
        assert!(summary.contains("| 10 characters, 3 tokens, 1 windows"));
        assert!(summary.contains("| ERROR! Cannot plan. (no text to shorten)"));
    }
}
