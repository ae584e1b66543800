//! Viewer registry for herald.
//!
//! The [`AudienceRegistry`] gives every viewer it sees its own single-viewer
//! audience, indexes it by player id and console status, and answers
//! filtered queries with [`LiveView`]s that re-evaluate on every traversal.

mod events;
mod factory;
mod player;
mod registry;
mod view;

pub use events::{event_channel, RegistryEvent};
pub use factory::{AudienceFactory, CatalogFactory, ViewerClassifier};
pub use player::PlayerId;
pub use registry::AudienceRegistry;
pub use view::LiveView;
