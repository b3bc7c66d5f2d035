//! Briefing synthesizer
//!
//! Renders the council verdict as a markdown brief for a reviewer or a
//! downstream language model. Output depends only on its inputs.

use crate::guard::SignalOutcome;
use crate::tally::VoteTally;
use common::{Recommendation, Vote};

const CLOSING_TASK: &str = "Synthesize all of the above. Act as a senior portfolio manager and write a \
detailed, nuanced investment decision. Weigh the consensus, but give more weight to the \
*disagreement* between models (e.g. 'momentum models are buying while mean-reversion models \
are selling, suggesting...'). Treat failed algorithms as missing evidence, not as votes. \
Finish with a final recommendation and clear justifications.";

/// Build the briefing for `ticker`
///
/// `outcomes` must be in registry order; every entry is rendered once.
pub fn synthesize(ticker: &str, tally: &VoteTally, outcomes: &[SignalOutcome]) -> String {
    let mut brief = String::new();

    brief.push_str("**Quant Council Briefing**\n\n");
    brief.push_str(&format!(
        "**Objective:** Produce a comprehensive, long-form investment thesis for {}.\n\n",
        ticker
    ));
    brief.push_str(&format!("**Ticker:** {}\n", ticker));
    brief.push_str(&format!("**Council's Collective Vote:** {}\n\n", tally.council_vote));

    brief.push_str("**Vote Breakdown:**\n");
    for rec in Recommendation::ALL {
        brief.push_str(&format!(
            "* **{} ({}):** {}\n",
            rec,
            tally.count(rec),
            tally.names(rec).join(", ")
        ));
    }
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.vote == Vote::Error)
        .map(|o| o.name.as_str())
        .collect();
    if !failed.is_empty() {
        brief.push_str(&format!(
            "* **Error ({}, not counted):** {}\n",
            failed.len(),
            failed.join(", ")
        ));
    }

    brief.push_str("\n**Individual Algorithm Analysis:**\n\n");
    for outcome in outcomes {
        brief.push_str(&render_outcome(outcome));
        brief.push('\n');
    }

    brief.push_str("**Task:**\n");
    brief.push_str(CLOSING_TASK);
    brief
}

fn render_outcome(outcome: &SignalOutcome) -> String {
    let mut section = format!(
        "--- Algorithm: {} ---\nVote: {}\nRationale: {}\n",
        outcome.display_name, outcome.vote, outcome.summary
    );
    if let Some(trace) = &outcome.trace {
        section.push_str("Trace:\n");
        section.push_str(trace);
        section.push('\n');
    }
    section
}
