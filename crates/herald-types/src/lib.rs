//! Shared types for herald audiences.
//!
//! This crate defines the values that flow between hosts, facets, and
//! audiences: locales, text components, the per-feature content types,
//! boss bar attributes and the boss bar observable itself, translation,
//! and configuration.

pub mod bossbar;
mod component;
mod config;
mod error;
mod feature;
mod locale;
pub mod translation;

pub use bossbar::{
    BossBar, BossBarColor, BossBarFlag, BossBarFlags, BossBarId, BossBarListener, BossBarOverlay,
    BossBarState,
};
pub use component::{
    ActionBar, Book, ChatKind, ChatLine, Component, Sound, SoundAction, SoundSource, SoundStop,
    TabList, Title, TitleAction, TitleTimes,
};
pub use config::HeraldConfig;
pub use error::{BossBarError, TranslateError};
pub use feature::{Feature, FeatureKind};
pub use locale::Locale;
pub use translation::{Passthrough, TranslationCatalog, Translator};

/// Default capacity for registry event channels.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
