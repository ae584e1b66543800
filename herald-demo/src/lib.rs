//! Herald demo host.
//!
//! Wires an in-memory platform into an [`AudienceRegistry`] and walks
//! through the main audience operations, logging every packet the host
//! facets produce.

mod config;
mod host;

pub use config::{load_config, parse_config, read_config, CONFIG_ENV, DEBUG_ENV};
pub use host::{catalog, translations, DemoClassifier, DemoViewer, Outbox, Profile};

use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Result};
use crossbeam_channel::Receiver;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use herald_facet::{Diagnostics, FacetSelector};
use herald_registry::{event_channel, AudienceRegistry, CatalogFactory, PlayerId, RegistryEvent};
use herald_types::{
    Book, BossBar, BossBarColor, BossBarFlag, BossBarFlags, BossBarOverlay, ChatLine, Component,
    HeraldConfig, Locale, Sound, SoundSource, Title,
};

/// Initialize logging.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "herald_demo=debug,herald_registry=debug,herald_audience=debug,herald_facet=info,herald_types=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn player(n: u128, name: &str, protocol: u32, world: &str, permissions: &[&str]) -> DemoViewer {
    DemoViewer::Player(Box::new(Profile {
        id: PlayerId::new(Uuid::from_u128(n)),
        name: name.to_string(),
        protocol,
        world: world.to_string(),
        server: "lobby".to_string(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        locale: None,
    }))
}

fn drain_events(events: &Receiver<RegistryEvent<DemoViewer>>) -> usize {
    let mut count = 0;
    for event in events.try_iter() {
        debug!(?event, "Registry event");
        count += 1;
    }
    count
}

/// Run the demo scenario.
pub fn run(config: HeraldConfig) -> Result<()> {
    let outbox = Outbox::default();
    let selector = FacetSelector::new(Diagnostics::from_config(&config));
    let catalog = Arc::new(host::catalog(&outbox, &selector));
    info!(?catalog, "Facet catalog built");

    let factory = CatalogFactory::new(catalog)
        .with_translator(Arc::new(host::translations()))
        .with_config(config.clone());
    let (event_tx, event_rx) = event_channel(config.event_channel_capacity);
    let registry = AudienceRegistry::new(Arc::new(DemoClassifier), Arc::new(factory), config)
        .with_events(event_tx);

    let alice = player(1, "alice", 763, "overworld", &["admin"]);
    let bob = player(2, "bob", 340, "overworld", &[]);
    let mut chloe = player(3, "chloe", 763, "nether", &[]);
    if let DemoViewer::Player(profile) = &mut chloe {
        profile.locale = Some(Locale::parse("fr_FR"));
    }

    for viewer in [DemoViewer::Console, alice.clone(), bob.clone(), chloe.clone()] {
        registry.add_viewer(viewer);
    }
    info!(viewers = registry.len(), "Viewers registered");

    let everyone = registry.all();
    let welcome = Component::translatable_with("demo.welcome", vec![Component::text("everyone")]);
    everyone.send_message(&ChatLine::system(welcome));

    let admins = registry.permission("admin");
    admins.show_title(&Title::new("Maintenance", "in five minutes"));
    registry.players().send_action_bar("Server restarting soon");
    registry.players().play_sound(&Sound::new("block.note_block.bell", SoundSource::Master));
    registry.players().send_player_list_header_and_footer("Herald demo", "lobby");
    registry.world("overworld").open_book(&Book {
        title: Component::text("Rules"),
        author: Component::text("staff"),
        pages: vec![Component::text("Be nice."), Component::text("Have fun.")],
    });

    let raid = Arc::new(BossBar::new(
        Component::translatable("demo.raid"),
        0.0,
        BossBarColor::Red,
        BossBarOverlay::Notched10,
        BossBarFlags::empty(),
    )?);
    registry.players().show_boss_bar(&raid);

    let progress = {
        let raid = Arc::clone(&raid);
        thread::spawn(move || -> Result<(), herald_types::BossBarError> {
            for step in 1..=4 {
                raid.set_percent(step as f32 / 4.0)?;
            }
            raid.add_flags(BossBarFlag::DarkenScreen.into());
            Ok(())
        })
    };
    progress
        .join()
        .map_err(|_| anyhow!("boss bar thread panicked"))??;

    // The cached view keeps tracking registrations.
    let before = admins.len();
    registry.remove_viewer(&alice);
    info!(before, after = admins.len(), "Admin view after alice left");

    registry.change_viewer(&bob, Locale::parse("fr_FR"));
    registry.players().hide_boss_bar(&raid);
    info!(listeners = raid.listener_count(), "Boss bar hidden");

    registry.close();

    let packets = outbox.drain();
    let events = drain_events(&event_rx);
    info!(packets = packets.len(), events, "Demo finished");
    println!("{}", serde_json::to_string_pretty(&packets)?);

    Ok(())
}
