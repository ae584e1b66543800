//! Audiences for herald.
//!
//! An [`Audience`] groups viewers, resolves one facet per feature against its
//! first viewer, and fans every send out to its current viewers. Boss bars
//! shown to an audience are tracked through a [`BossBarBridge`] that keeps the
//! audience's viewers in sync with the bar's attributes.

mod audience;
mod bridge;
mod builder;

#[cfg(test)]
mod testing;

pub use audience::Audience;
pub use bridge::BossBarBridge;
pub use builder::AudienceBuilder;
