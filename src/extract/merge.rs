use tracing::info;

use crate::model::DocumentRecord;

/// Reconciles the rule-based record with an AI-derived one. Field policy:
/// header gaps are filled (rule-based values are never overwritten), rates
/// and commodities are replaced wholesale only when the AI pass found
/// strictly more, notes are unioned by exact text, and the route summary
/// adopts the longer string. The "more entries wins" rule can prefer a
/// larger-but-noisier AI list; that is the intended behavior, not a bug to
/// fix with extra heuristics.
pub fn merge(mut rule_based: DocumentRecord, ai_based: Option<DocumentRecord>) -> DocumentRecord {
    let Some(ai) = ai_based else {
        return rule_based;
    };

    let header = &mut rule_based.header;
    let ai_header = ai.header;
    header.item_number = header.item_number.take().or(ai_header.item_number);
    header.revision = header.revision.take().or(ai_header.revision);
    header.cprs_number = header.cprs_number.take().or(ai_header.cprs_number);
    header.issue_date = header.issue_date.take().or(ai_header.issue_date);
    header.effective_date = header.effective_date.take().or(ai_header.effective_date);
    header.expiration_date = header.expiration_date.take().or(ai_header.expiration_date);
    header.change_description = header
        .change_description
        .take()
        .or(ai_header.change_description);

    if ai.rates.len() > rule_based.rates.len() {
        info!(
            rule_based = rule_based.rates.len(),
            ai = ai.rates.len(),
            "adopting AI rate list"
        );
        rule_based.rates = ai.rates;
    }

    if ai.commodities.len() > rule_based.commodities.len() {
        info!(
            rule_based = rule_based.commodities.len(),
            ai = ai.commodities.len(),
            "adopting AI commodity list"
        );
        rule_based.commodities = ai.commodities;
    }

    for ai_note in ai.notes {
        if !rule_based.notes.iter().any(|note| note.text == ai_note.text) {
            let mut note = ai_note;
            note.sort_order = rule_based.notes.len() as i64;
            rule_based.notes.push(note);
        }
    }

    if ai.origin_info.len() > rule_based.origin_info.len() {
        rule_based.origin_info = ai.origin_info;
    }
    if ai.destination_info.len() > rule_based.destination_info.len() {
        rule_based.destination_info = ai.destination_info;
    }

    rule_based
}
