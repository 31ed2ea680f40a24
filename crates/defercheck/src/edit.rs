//! One-shot application of suggested-fix edits.
//!
//! All offsets address the original text. Edits are sorted, identical
//! duplicates collapsed (two findings may synthesize the same signature or
//! prologue edit for a shared enclosing function), then spliced in a single
//! left-to-right pass. A true overlap is a fault, never best-effort.

use crate::diagnostics::{Report, TextEdit};

#[derive(Debug, Clone)]
pub struct EditError {
    pub message: String,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EditError {}

/// Flattens every suggested fix in the report into one edit list.
pub fn collect_fix_edits(report: &Report) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    for diag in &report.diagnostics {
        if let Some(fix) = &diag.fix {
            edits.extend(fix.edits.iter().cloned());
        }
    }
    edits
}

pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut sorted: Vec<TextEdit> = edits.to_vec();
    sorted.sort_by(|a, b| {
        (a.pos, a.end, a.new_text.as_str()).cmp(&(b.pos, b.end, b.new_text.as_str()))
    });
    sorted.dedup();

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for edit in &sorted {
        let pos = edit.pos as usize;
        let end = edit.end as usize;
        if pos > end {
            return Err(EditError {
                message: format!("edit range inverted: {}..{}", edit.pos, edit.end),
            });
        }
        if end > text.len() {
            return Err(EditError {
                message: format!(
                    "edit {}..{} past end of file (len {})",
                    edit.pos,
                    edit.end,
                    text.len()
                ),
            });
        }
        if !text.is_char_boundary(pos) || !text.is_char_boundary(end) {
            return Err(EditError {
                message: format!("edit {}..{} splits a character", edit.pos, edit.end),
            });
        }
        if pos < cursor {
            return Err(EditError {
                message: format!("edit {}..{} overlaps a preceding edit", edit.pos, edit.end),
            });
        }
        out.push_str(&text[cursor..pos]);
        out.push_str(&edit.new_text);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}
