//! Health-benefit milestones keyed by elapsed fasting hours.
//!
//! The catalog is a fixed ascending table. Queries are total: any elapsed
//! duration maps to exactly one current milestone (the zero-hour entry is
//! the floor) and at most one upcoming milestone.

use serde::Serialize;

/// One entry in the milestone table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    /// Threshold in whole hours since the fast started.
    pub hours: u32,
    pub title: &'static str,
    pub description: &'static str,
}

/// Milestones in strictly ascending hour order. The first entry sits at
/// zero so `current_for` never comes up empty.
pub const MILESTONES: &[Milestone] = &[
    Milestone {
        hours: 0,
        title: "Fast begun",
        description: "Insulin is still elevated while the last meal digests.",
    },
    Milestone {
        hours: 3,
        title: "Blood sugar settling",
        description: "Insulin falls and glucagon starts mobilizing stored energy.",
    },
    Milestone {
        hours: 8,
        title: "Fat burning",
        description: "Liver glycogen runs low and fatty-acid oxidation ramps up.",
    },
    Milestone {
        hours: 12,
        title: "Ketosis begins",
        description: "Ketone production starts as glycogen stores empty out.",
    },
    Milestone {
        hours: 16,
        title: "Autophagy",
        description: "Cellular cleanup accelerates while nutrient signals stay low.",
    },
    Milestone {
        hours: 18,
        title: "Growth hormone surge",
        description: "Growth hormone rises to protect lean mass.",
    },
    Milestone {
        hours: 24,
        title: "Deep ketosis",
        description: "Ketones now supply a large share of the brain's fuel.",
    },
    Milestone {
        hours: 48,
        title: "Cellular renewal",
        description: "Damaged proteins are recycled and insulin sensitivity improves.",
    },
    Milestone {
        hours: 72,
        title: "Immune reset",
        description: "Stem-cell activity picks up after three full days.",
    },
];

/// The most recent milestone at or below `elapsed_hours`.
pub fn current_for(elapsed_hours: u32) -> &'static Milestone {
    MILESTONES
        .iter()
        .rev()
        .find(|m| m.hours <= elapsed_hours)
        .unwrap_or(&MILESTONES[0])
}

/// The next milestone strictly above `elapsed_hours`, if any remain.
pub fn next_after(elapsed_hours: u32) -> Option<&'static Milestone> {
    MILESTONES.iter().find(|m| m.hours > elapsed_hours)
}

pub fn all() -> &'static [Milestone] {
    MILESTONES
}
