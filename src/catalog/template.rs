//! Parameter-slot extraction from module command templates.
//!
//! A slot is written `{name}` inside the command. Extraction is purely textual:
//! the command is never executed or shell-parsed.

/// How the authoring loop treats a parameter slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    /// Free text, optionally a reference token to an earlier probe.
    Text,
    /// A path inside the project, stored relative to the project root.
    File,
    /// Supplied implicitly by the runner (`head`, `head~1`); never prompted.
    Reserved,
}

pub const FILE_SLOT: &str = "file";
const RESERVED_SLOTS: [&str; 2] = ["head", "head~1"];

impl SlotKind {
    /// Classify a slot name. Matching is case-insensitive.
    pub fn of(slot: &str) -> Self {
        let lowered = slot.to_lowercase();
        if lowered == FILE_SLOT {
            SlotKind::File
        } else if RESERVED_SLOTS.contains(&lowered.as_str()) {
            SlotKind::Reserved
        } else {
            SlotKind::Text
        }
    }
}

/// Every distinct `{...}` slot in `command`, in first-occurrence order.
///
/// A slot runs from an opening brace to the next closing brace and must hold
/// at least one character; `{}` is skipped.
pub fn extract_parameters(command: &str) -> Vec<String> {
    let mut slots: Vec<String> = Vec::new();
    let mut rest = command;
    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            break;
        };
        if close == 0 {
            rest = after_open;
            continue;
        }
        let slot = &after_open[..close];
        if !slots.iter().any(|seen| seen == slot) {
            slots.push(slot.to_string());
        }
        rest = &after_open[close + 1..];
    }
    slots
}
