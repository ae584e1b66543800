//! An in-memory host platform.
//!
//! Viewers are plain values and every facet writes the "packets" it would
//! send into an [`Outbox`]. Chat has three candidates in priority order so the
//! demo shows per-viewer selection: a native path for modern clients, a
//! packet path for every player, and a console sink.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use herald_facet::{
    BarView, BossBarFacet, BossBarHandle, BossBarSink, BossBarUpdate, Capability, Detection, Facet,
    FacetCatalog, FacetError, FacetResult, FacetSelector, PerViewerBossBar, Probe,
};
use herald_registry::{PlayerId, ViewerClassifier};
use herald_types::{
    ActionBar, Book, ChatKind, ChatLine, Locale, SoundAction, TabList, TitleAction,
    TranslationCatalog,
};

/// First protocol version with native component chat.
pub const NATIVE_CHAT_PROTOCOL: u32 = 735;

/// A connected player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile {
    pub id: PlayerId,
    pub name: String,
    pub protocol: u32,
    pub world: String,
    pub server: String,
    pub permissions: Vec<String>,
    pub locale: Option<Locale>,
}

/// A message recipient on the demo host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DemoViewer {
    Console,
    Player(Box<Profile>),
}

impl DemoViewer {
    pub fn name(&self) -> &str {
        match self {
            Self::Console => "console",
            Self::Player(profile) => &profile.name,
        }
    }

    fn profile(&self) -> FacetResult<&Profile> {
        match self {
            Self::Player(profile) => Ok(&**profile),
            Self::Console => Err(FacetError::ViewerMismatch("expected a player".into())),
        }
    }
}

/// Everything the demo facets sent, in order.
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<String>>>);

impl Outbox {
    fn push(&self, viewer: &DemoViewer, packet: String) {
        info!(viewer = viewer.name(), "{}", packet);
        self.0.lock().push(format!("{} <- {}", viewer.name(), packet));
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

fn detect_native_chat() -> Probe<u32> {
    Probe::Available(NATIVE_CHAT_PROTOCOL)
}

fn detect_sound_engine() -> Probe<()> {
    Probe::unavailable("no sound engine on the in-memory host")
}

static NATIVE_CHAT: Detection<u32> = Detection::new("native-chat", detect_native_chat);
static SOUND_ENGINE: Detection<()> = Detection::new("sound-engine", detect_sound_engine);

struct NativeChat {
    outbox: Outbox,
}

impl Facet<DemoViewer> for NativeChat {
    fn name(&self) -> &'static str {
        "native-chat"
    }

    fn supported(&self) -> bool {
        NATIVE_CHAT.is_available()
    }

    fn applicable(&self, viewer: &DemoViewer) -> FacetResult<bool> {
        let min = NATIVE_CHAT.get().copied().unwrap_or(u32::MAX);
        Ok(viewer.profile()?.protocol >= min)
    }
}

impl Capability<DemoViewer, ChatLine> for NativeChat {
    type Message = String;

    fn create_message(&self, _viewer: &DemoViewer, content: &ChatLine) -> Option<String> {
        let tag = match content.kind {
            ChatKind::Chat => "chat",
            ChatKind::System => "system",
        };
        Some(format!("[{}] {}", tag, content.message.plain_text()))
    }

    fn send(&self, viewer: &DemoViewer, message: &String) -> FacetResult<()> {
        self.outbox.push(viewer, format!("native {}", message));
        Ok(())
    }
}

struct PacketChat {
    outbox: Outbox,
}

impl Facet<DemoViewer> for PacketChat {
    fn name(&self) -> &'static str {
        "packet-chat"
    }

    fn applicable(&self, viewer: &DemoViewer) -> FacetResult<bool> {
        viewer.profile().map(|_| true)
    }
}

impl Capability<DemoViewer, ChatLine> for PacketChat {
    type Message = String;

    fn create_message(&self, _viewer: &DemoViewer, content: &ChatLine) -> Option<String> {
        // Legacy clients get flattened text.
        Some(content.message.plain_text())
    }

    fn send(&self, viewer: &DemoViewer, message: &String) -> FacetResult<()> {
        self.outbox.push(viewer, format!("chat-packet {:?}", message));
        Ok(())
    }
}

struct ConsoleChat {
    outbox: Outbox,
}

impl Facet<DemoViewer> for ConsoleChat {
    fn name(&self) -> &'static str {
        "console-chat"
    }

    fn applicable(&self, viewer: &DemoViewer) -> FacetResult<bool> {
        Ok(matches!(viewer, DemoViewer::Console))
    }
}

impl Capability<DemoViewer, ChatLine> for ConsoleChat {
    type Message = String;

    fn create_message(&self, _viewer: &DemoViewer, content: &ChatLine) -> Option<String> {
        Some(content.message.plain_text())
    }

    fn send(&self, viewer: &DemoViewer, message: &String) -> FacetResult<()> {
        self.outbox.push(viewer, format!("log {}", message));
        Ok(())
    }
}

/// Player-only packet facet for the remaining features.
struct Packets {
    outbox: Outbox,
}

impl Facet<DemoViewer> for Packets {
    fn name(&self) -> &'static str {
        "packets"
    }

    fn applicable(&self, viewer: &DemoViewer) -> FacetResult<bool> {
        viewer.profile().map(|_| true)
    }
}

impl Capability<DemoViewer, ActionBar> for Packets {
    type Message = String;

    fn create_message(&self, _viewer: &DemoViewer, content: &ActionBar) -> Option<String> {
        Some(format!("action-bar {:?}", content.0.plain_text()))
    }

    fn send(&self, viewer: &DemoViewer, message: &String) -> FacetResult<()> {
        self.outbox.push(viewer, message.clone());
        Ok(())
    }
}

impl Capability<DemoViewer, TitleAction> for Packets {
    type Message = Vec<String>;

    fn create_message(&self, _viewer: &DemoViewer, content: &TitleAction) -> Option<Vec<String>> {
        Some(match content {
            TitleAction::Show(title) => {
                let mut packets = Vec::new();
                if let Some(times) = title.times {
                    packets.push(format!(
                        "title-times {}ms/{}ms/{}ms",
                        times.fade_in.as_millis(),
                        times.stay.as_millis(),
                        times.fade_out.as_millis()
                    ));
                }
                packets.push(format!("subtitle {:?}", title.subtitle.plain_text()));
                packets.push(format!("title {:?}", title.title.plain_text()));
                packets
            }
            TitleAction::Clear => vec!["title-clear".to_string()],
            TitleAction::Reset => vec!["title-reset".to_string()],
        })
    }

    fn send(&self, viewer: &DemoViewer, message: &Vec<String>) -> FacetResult<()> {
        for packet in message {
            self.outbox.push(viewer, packet.clone());
        }
        Ok(())
    }
}

impl Capability<DemoViewer, Book> for Packets {
    type Message = String;

    fn create_message(&self, _viewer: &DemoViewer, content: &Book) -> Option<String> {
        if content.pages.is_empty() {
            return None;
        }
        Some(format!(
            "open-book {:?} by {:?}, {} pages",
            content.title.plain_text(),
            content.author.plain_text(),
            content.pages.len()
        ))
    }

    fn send(&self, viewer: &DemoViewer, message: &String) -> FacetResult<()> {
        self.outbox.push(viewer, message.clone());
        Ok(())
    }
}

impl Capability<DemoViewer, TabList> for Packets {
    type Message = String;

    fn create_message(&self, _viewer: &DemoViewer, content: &TabList) -> Option<String> {
        Some(format!(
            "tab-list header={:?} footer={:?}",
            content.header.plain_text(),
            content.footer.plain_text()
        ))
    }

    fn send(&self, viewer: &DemoViewer, message: &String) -> FacetResult<()> {
        self.outbox.push(viewer, message.clone());
        Ok(())
    }
}

/// Sound through a native engine the in-memory host does not have.
struct NativeSound;

impl Facet<DemoViewer> for NativeSound {
    fn name(&self) -> &'static str {
        "native-sound"
    }

    fn supported(&self) -> bool {
        SOUND_ENGINE.is_available()
    }
}

impl Capability<DemoViewer, SoundAction> for NativeSound {
    type Message = SoundAction;

    fn create_message(&self, _viewer: &DemoViewer, content: &SoundAction) -> Option<SoundAction> {
        Some(content.clone())
    }

    fn send(&self, _viewer: &DemoViewer, _message: &SoundAction) -> FacetResult<()> {
        Err(FacetError::Unavailable("sound engine".into()))
    }
}

/// Encodes boss bar updates with protocol ordinals and flag bits.
struct PacketBarSink {
    outbox: Outbox,
}

impl BossBarSink<DemoViewer> for PacketBarSink {
    fn show(&mut self, viewer: &DemoViewer, view: &BarView) -> FacetResult<()> {
        self.outbox.push(
            viewer,
            format!(
                "boss-bar add {:?} {:.2} color={} overlay={} flags={:#x}",
                view.name.plain_text(),
                view.percent,
                view.color.ordinal(),
                view.overlay.ordinal(),
                view.flags.bits()
            ),
        );
        Ok(())
    }

    fn update(&mut self, viewer: &DemoViewer, update: &BossBarUpdate) -> FacetResult<()> {
        let packet = match update {
            BossBarUpdate::Name(name) => format!("boss-bar name {:?}", name.plain_text()),
            BossBarUpdate::Percent(percent) => format!("boss-bar percent {:.2}", percent),
            BossBarUpdate::Color(color) => format!("boss-bar style color={}", color.ordinal()),
            BossBarUpdate::Overlay(overlay) => {
                format!("boss-bar style overlay={}", overlay.ordinal())
            }
            BossBarUpdate::Flags(flags) => format!("boss-bar flags {:#x}", flags.bits()),
        };
        self.outbox.push(viewer, packet);
        Ok(())
    }

    fn hide(&mut self, viewer: &DemoViewer) -> FacetResult<()> {
        self.outbox.push(viewer, "boss-bar remove".to_string());
        Ok(())
    }
}

struct PacketBossBars {
    outbox: Outbox,
}

impl Facet<DemoViewer> for PacketBossBars {
    fn name(&self) -> &'static str {
        "packet-boss-bars"
    }

    fn applicable(&self, viewer: &DemoViewer) -> FacetResult<bool> {
        viewer.profile().map(|_| true)
    }
}

impl BossBarFacet<DemoViewer> for PacketBossBars {
    fn create_bossbar(&self, viewers: &[DemoViewer]) -> Box<dyn BossBarHandle<DemoViewer>> {
        let sink = PacketBarSink {
            outbox: self.outbox.clone(),
        };
        Box::new(PerViewerBossBar::new(sink, viewers))
    }
}

/// The host's candidate facets, highest priority first.
pub fn catalog(outbox: &Outbox, selector: &FacetSelector) -> FacetCatalog<DemoViewer> {
    let (native, packet, console) = (outbox.clone(), outbox.clone(), outbox.clone());
    let (action_bar, title, book, tab_list, bars) = (
        outbox.clone(),
        outbox.clone(),
        outbox.clone(),
        outbox.clone(),
        outbox.clone(),
    );

    FacetCatalog::builder()
        .chat(move || Ok(NativeChat { outbox: native }))
        .chat(move || Ok(PacketChat { outbox: packet }))
        .chat(move || Ok(ConsoleChat { outbox: console }))
        .action_bar(move || Ok(Packets { outbox: action_bar }))
        .title(move || Ok(Packets { outbox: title }))
        .book(move || Ok(Packets { outbox: book }))
        .tab_list(move || Ok(Packets { outbox: tab_list }))
        .sound(|| Ok(NativeSound))
        .boss_bar(move || Ok(PacketBossBars { outbox: bars }))
        .build(selector)
}

/// Message patterns used by the demo.
pub fn translations() -> TranslationCatalog {
    let catalog = TranslationCatalog::default();
    catalog.register("demo.welcome", Locale::parse("en_US"), "Welcome, {0}!");
    catalog.register("demo.welcome", Locale::parse("fr_FR"), "Bienvenue, {0} !");
    catalog.register("demo.raid", Locale::parse("en_US"), "Raid in progress");
    catalog.register("demo.raid", Locale::parse("fr_FR"), "Raid en cours");
    catalog
}

/// Classifies [`DemoViewer`]s from their profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoClassifier;

impl ViewerClassifier<DemoViewer> for DemoClassifier {
    fn player_id(&self, viewer: &DemoViewer) -> Option<PlayerId> {
        viewer.profile().ok().map(|profile| profile.id)
    }

    fn is_console(&self, viewer: &DemoViewer) -> bool {
        matches!(viewer, DemoViewer::Console)
    }

    fn has_permission(&self, viewer: &DemoViewer, node: &str) -> bool {
        match viewer {
            DemoViewer::Console => true,
            DemoViewer::Player(profile) => profile.permissions.iter().any(|p| p == node),
        }
    }

    fn is_in_world(&self, viewer: &DemoViewer, world: &str) -> bool {
        viewer.profile().is_ok_and(|profile| profile.world == world)
    }

    fn is_on_server(&self, viewer: &DemoViewer, server: &str) -> bool {
        viewer.profile().is_ok_and(|profile| profile.server == server)
    }

    fn locale(&self, viewer: &DemoViewer) -> Option<Locale> {
        viewer.profile().ok().and_then(|profile| profile.locale.clone())
    }
}
