//! Referral discount tiers.
//!
//! Every referral moves a user one step along the tier sequence
//! `[10, 30, 50, 70]`. Four referrals complete a cycle, and each completed
//! cycle is banked as one order at the top tier. Leftover referrals give one
//! more order at the tier they reached.
//!
//! | referrals | discounts           |
//! |-----------|---------------------|
//! | 0         | next: 0%            |
//! | 1         | next: 10%           |
//! | 4         | next: 70%           |
//! | 5         | next: 70%, 2: 10%   |
//! | 11        | next: 70%, 2: 70%, 3: 50% |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which upcoming order a discount applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderLabel {
    /// The user's next order.
    Next,
    /// The n-th entry (1-based) of the computed discount list.
    Order(usize),
}

impl fmt::Display for OrderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next order"),
            Self::Order(n) => write!(f, "order {n}"),
        }
    }
}

/// A single discount on one upcoming order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountEntry {
    pub label: OrderLabel,
    /// Discount in whole percent.
    pub percent: u8,
}

impl fmt::Display for DiscountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Discount on {}: {}%", self.label, self.percent)
    }
}

/// The ordered discounts a user is entitled to. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discounts(Vec<DiscountEntry>);

impl Discounts {
    /// All entries, next order first.
    pub fn entries(&self) -> &[DiscountEntry] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries. Computed discounts never are.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Discount on the next order.
    pub fn next_order_percent(&self) -> u8 {
        self.0.first().map(|e| e.percent).unwrap_or(0)
    }

    /// Unwrap into the entry list.
    pub fn into_vec(self) -> Vec<DiscountEntry> {
        self.0
    }
}

impl fmt::Display for Discounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Number of tiers in a cycle.
pub const TIER_COUNT: usize = 4;

/// A cyclic sequence of discount tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscountSchedule {
    tiers: [u8; TIER_COUNT],
}

impl DiscountSchedule {
    /// The tiers the bot advertises: 10%, 30%, 50%, 70%.
    pub const STANDARD: Self = Self {
        tiers: [10, 30, 50, 70],
    };

    /// The tier percentages in order.
    pub fn tiers(&self) -> &[u8; TIER_COUNT] {
        &self.tiers
    }

    /// Discount banked for each completed cycle (the top tier).
    pub fn cycle_percent(&self) -> u8 {
        self.tiers[TIER_COUNT - 1]
    }

    /// Discounts earned by `referral_count` referrals.
    pub fn compute(&self, referral_count: usize) -> Discounts {
        let full_cycles = referral_count / TIER_COUNT;
        let remainder = referral_count % TIER_COUNT;

        let mut percents = vec![self.cycle_percent(); full_cycles];
        if remainder != 0 {
            percents.push(self.tiers[remainder - 1]);
        }
        if percents.is_empty() {
            percents.push(0);
        }

        let entries = percents
            .into_iter()
            .enumerate()
            .map(|(i, percent)| DiscountEntry {
                label: if i == 0 {
                    OrderLabel::Next
                } else {
                    OrderLabel::Order(i + 1)
                },
                percent,
            })
            .collect();
        Discounts(entries)
    }
}

impl Default for DiscountSchedule {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Discounts earned by `referral_count` referrals under the standard tiers.
pub fn compute_discounts(referral_count: usize) -> Discounts {
    DiscountSchedule::STANDARD.compute(referral_count)
}
