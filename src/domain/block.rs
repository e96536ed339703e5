//! Plantation blocks and their display ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::common::*;

/// A block belongs to exactly one phase and is shown by its label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub phase_id: PhaseId,
    pub label: String,
}

impl Block {
    pub fn new(id: BlockId, phase_id: PhaseId, label: impl Into<String>) -> Self {
        Self {
            id,
            phase_id,
            label: label.into(),
        }
    }

    pub fn sort_key(&self) -> BlockLabel {
        BlockLabel::parse(&self.label)
    }
}

impl Displayable for Block {
    fn display_label(&self) -> String {
        format!("Block {}", self.label)
    }
}

/// Ordering key for block labels: numeric labels by value, then the rest lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockLabel {
    Numeric(u64),
    Alpha(String),
}

impl BlockLabel {
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.parse::<u64>() {
            Ok(value) => BlockLabel::Numeric(value),
            Err(_) => BlockLabel::Alpha(trimmed.to_string()),
        }
    }
}

pub fn compare_labels(a: &str, b: &str) -> Ordering {
    BlockLabel::parse(a)
        .cmp(&BlockLabel::parse(b))
        .then_with(|| a.cmp(b))
}

/// Sorts blocks for display. Ties on label fall back to the block id.
pub fn sort_blocks(blocks: &mut [Block]) {
    blocks.sort_by(|a, b| {
        a.sort_key()
            .cmp(&b.sort_key())
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub fn sorted_blocks<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut sorted: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
    sorted.sort_by(|a, b| compare_labels(a, b));
    sorted
}
