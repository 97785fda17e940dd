use crate::model::{NoteInfo, NoteType};
use crate::util::clean_text;

use super::patterns::Patterns;

const PROVISION_KEYWORDS: [&str; 8] = [
    "SUBJECT TO",
    "APPLIES",
    "MINIMUM",
    "MAXIMUM",
    "EQUIPMENT",
    "CONDITIONS",
    "RENEWAL",
    "CHANGES",
];

// Lines carrying these belong to the header block, not the notes section.
const HEADER_MARKERS: [&str; 3] = ["ITEM:", "REVISION:", "ISSUED:"];

const NOTE_TEXT_LIMIT: usize = 500;

/// Line-by-line note classification, first matching rule wins: numbered,
/// asterisk, lettered equipment note, provision keyword, then a general
/// catch-all for long rate/charge sentences. Lines matching nothing are
/// dropped. `sort_order` is the running count of accepted notes.
pub fn extract_notes(patterns: &Patterns, text: &str) -> Vec<NoteInfo> {
    let mut notes = Vec::<NoteInfo>::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.len() < 5 {
            continue;
        }

        if let Some(note) = classify_line(patterns, line, notes.len() as i64) {
            notes.push(note);
        }
    }

    notes
}

fn classify_line(patterns: &Patterns, line: &str, sort_order: i64) -> Option<NoteInfo> {
    if let Some(captures) = patterns.note_numbered.captures(line) {
        return Some(NoteInfo {
            note_type: NoteType::Numbered,
            code: captures[1].to_string(),
            text: clean_text(&captures[2], NOTE_TEXT_LIMIT),
            sort_order,
        });
    }

    if let Some(stripped) = line.strip_prefix('*') {
        let body = stripped.trim_start_matches(['-', ' ']).trim();
        if body.is_empty() {
            return None;
        }
        return Some(NoteInfo {
            note_type: NoteType::Asterisk,
            code: "*".to_string(),
            text: clean_text(body, NOTE_TEXT_LIMIT),
            sort_order,
        });
    }

    if let Some(captures) = patterns.note_equipment.captures(line) {
        return Some(NoteInfo {
            note_type: NoteType::Equipment,
            code: captures[1].to_string(),
            text: clean_text(&captures[2], NOTE_TEXT_LIMIT),
            sort_order,
        });
    }

    let upper = line.to_ascii_uppercase();

    if PROVISION_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
        && !HEADER_MARKERS.iter().any(|marker| upper.contains(marker))
    {
        return Some(NoteInfo {
            note_type: NoteType::Provision,
            code: String::new(),
            text: clean_text(line, NOTE_TEXT_LIMIT),
            sort_order,
        });
    }

    if line.len() > 20
        && (upper.contains("RATE") || upper.contains("CHARGE") || upper.contains("CAR"))
    {
        return Some(NoteInfo {
            note_type: NoteType::General,
            code: String::new(),
            text: clean_text(line, NOTE_TEXT_LIMIT),
            sort_order,
        });
    }

    None
}
