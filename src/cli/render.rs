// Terminal rendering of run progress

use crate::constitution::{CritiqueOutcome, CritiqueVerdict, RunEvent, RunTrail};
use crate::principles::PrincipleRegistry;

const RULE: &str = "------------------------------------------------------------";

pub fn render_event(event: &RunEvent) {
    match event {
        RunEvent::Started { initial_answer } => {
            println!("== Initial Output ==");
            println!("{}", initial_answer);
            println!("{}", RULE);
        }
        RunEvent::Outcome(outcome) => print!("{}", format_outcome(outcome)),
        RunEvent::Finished {
            final_answer,
            cancelled,
        } => {
            if *cancelled {
                println!("(run cancelled; remaining principles were not evaluated)");
                println!("{}", RULE);
            }
            println!("== Output after Constitutional Review ==");
            println!("{}", final_answer);
        }
    }
}

pub fn format_outcome(outcome: &CritiqueOutcome) -> String {
    let verdict = match outcome.verdict {
        CritiqueVerdict::Needed => "critique needed",
        CritiqueVerdict::NotNeeded => "no critique needed",
        CritiqueVerdict::Ambiguous => "no marker",
    };

    let mut out = format!("[{}] {}\n", outcome.principle_name, verdict);
    if let Some(error) = &outcome.error {
        out.push_str(&format!("  error: {}\n", error));
    }
    if !outcome.critique_text.is_empty() {
        out.push_str(&format!("Critique: {}\n", outcome.critique_text.trim()));
    }
    match &outcome.revision_text {
        Some(revision) => out.push_str(&format!("Revision: {}\n", revision)),
        None => out.push_str("Revision: (none)\n"),
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

pub fn render_summary(trail: &RunTrail) {
    let failures = trail.failures().count();
    eprintln!(
        "{} principle(s) evaluated, {} revision(s){}",
        trail.outcomes.len(),
        trail.revision_count(),
        if failures > 0 {
            format!(", {} recovered failure(s)", failures)
        } else {
            String::new()
        }
    );
}

pub fn format_registry(registry: &PrincipleRegistry) -> String {
    let mut out = String::new();
    for (idx, principle) in registry.iter().enumerate() {
        let mode = if principle.can_revise() {
            "revises"
        } else {
            "critique only"
        };
        out.push_str(&format!("{}. {} ({})\n", idx + 1, principle.name(), mode));
        out.push_str(&format!("   critique: {}\n", principle.critique_question()));
        if principle.can_revise() {
            out.push_str(&format!("   revision: {}\n", principle.revision_instruction()));
        }
    }
    out
}
