//! Record → template context transformation.
//!
//! The context is a flat map of the short placeholder keys used by the DEBIT
//! template. Building it is pure: no I/O, no shared state, one call per record.
//!
//! # Degradations (accepted, not errors)
//! - Notes wrapping to more than [`NOTE_SLOTS`] fragments lose everything past
//!   the last slot.
//! - A categorical value matching no enumeration member leaves its whole
//!   marker group empty.

use std::collections::BTreeMap;

use serde::Serialize;
use textwrap::{Options, WordSeparator, WrapAlgorithm};

use crate::debit::currency::format_amount;
use crate::debit::models::{DebitRecord, NO_LABEL, YES_LABEL};

/// Maximum characters per note fragment. Every char counts as one column,
/// so `textwrap` is built without `unicode-width`.
pub const NOTE_WIDTH: usize = 97;
/// Placeholder keys receiving note fragments, in order.
pub const NOTE_SLOTS: [&str; 5] = ["obs", "obs2", "obs3", "obs4", "obs5"];

pub const MARKER: &str = "X";

// ────────────────────────────────────────────────────────────────────────────
// Marker tables: (placeholder key, label that checks it)
// ────────────────────────────────────────────────────────────────────────────

pub const OFFICE_MARKERS: &[(&str, &str)] =
    &[("e1", "ASBZ SP"), ("e2", "ZUCCA BSB"), ("e3", "CONSULTING")];

pub const EXPENSE_TYPE_MARKERS: &[(&str, &str)] = &[
    ("m", "MOTOCA"),
    ("c", "CARTÓRIO"),
    ("co", "CORREIOS"),
    ("o", "OUTROS"),
];

pub const REIMBURSABLE_MARKERS: &[(&str, &str)] = &[("si", YES_LABEL), ("na", NO_LABEL)];

pub const ADVANCE_MARKERS: &[(&str, &str)] = &[("as", YES_LABEL), ("an", NO_LABEL)];

/// Flat placeholder map handed to the document renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TemplateContext(BTreeMap<&'static str, String>);

impl TemplateContext {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn placeholder_count(&self) -> usize {
        self.0.len()
    }
}

/// Builds the template context for one record.
pub fn build_context(record: &DebitRecord) -> TemplateContext {
    let mut ctx = TemplateContext::default();

    ctx.insert("s", record.requester.to_uppercase());
    ctx.insert("cc", text_or_empty(&record.cost_center));
    ctx.insert("cl", text_or_empty(&record.client_id));
    ctx.insert("osc", text_or_empty(&record.case_id));
    ctx.insert(
        "data",
        record
            .expense_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
    );
    ctx.insert("total", format_amount(&record.amount));

    let mut fragments = wrap_note(&record.note).into_iter();
    for slot in NOTE_SLOTS {
        ctx.insert(slot, fragments.next().unwrap_or_default());
    }

    mark_selection(&mut ctx, OFFICE_MARKERS, &record.office);
    mark_selection(&mut ctx, EXPENSE_TYPE_MARKERS, &record.expense_type);
    mark_selection(&mut ctx, REIMBURSABLE_MARKERS, &record.reimbursable);
    mark_selection(&mut ctx, ADVANCE_MARKERS, &record.advance_given);

    ctx
}

/// Splits a note into fragments of at most [`NOTE_WIDTH`] columns at word
/// boundaries. A single word longer than the width becomes its own,
/// overlong fragment rather than being split.
pub fn wrap_note(note: &str) -> Vec<String> {
    let normalized: String = note
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if normalized.trim().is_empty() {
        return Vec::new();
    }

    let options = Options::new(NOTE_WIDTH)
        .break_words(false)
        .word_separator(WordSeparator::AsciiSpace)
        .wrap_algorithm(WrapAlgorithm::FirstFit);
    textwrap::wrap(&normalized, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Writes `X` to the key whose label equals `selected` exactly, and `""` to
/// every other key of the group.
fn mark_selection(ctx: &mut TemplateContext, group: &[(&'static str, &str)], selected: &str) {
    for (key, label) in group {
        ctx.insert(*key, if *label == selected { MARKER } else { "" });
    }
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}
