//! Discount tiers and referral links.
//!
//! Both halves of this crate are pure: no I/O, no clocks, no shared state.
//!
//! - [`schedule`] maps a referral count to the discounts a user has earned on
//!   their upcoming orders.
//! - [`link`] builds the invitation link a user shares to refer others.

pub mod error;
pub mod link;
pub mod schedule;

pub use error::LinkError;
pub use link::{generate_link, ReferralLinkGenerator};
pub use schedule::{compute_discounts, DiscountEntry, DiscountSchedule, Discounts, OrderLabel};
