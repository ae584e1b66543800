//! Recording facets for the audience tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use herald_facet::{
    BarView, BossBarFacet, BossBarHandle, BossBarSink, BossBarUpdate, Capability, Facet,
    FacetCatalog, FacetError, FacetResult, FacetSelector, PerViewerBossBar,
};
use herald_types::{
    BossBarColor, BossBarFlags, BossBarOverlay, ChatLine, Component, TitleAction,
};

/// Viewer whose deliveries fail.
pub(crate) const FAILING: u32 = 13;

/// Viewer whose deliveries panic.
pub(crate) const PANICKING: u32 = 66;

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Entries starting with `prefix`, in order.
pub(crate) fn entries(log: &Log, prefix: &str) -> Vec<String> {
    log.lock()
        .iter()
        .filter(|line| line.starts_with(prefix))
        .cloned()
        .collect()
}

fn check(viewer: u32) -> FacetResult<()> {
    match viewer {
        FAILING => Err(FacetError::Delivery("connection reset".into())),
        PANICKING => panic!("viewer {} exploded", viewer),
        _ => Ok(()),
    }
}

pub(crate) struct RecordingChat {
    log: Log,
}

impl Facet<u32> for RecordingChat {
    fn name(&self) -> &'static str {
        "recording-chat"
    }
}

impl Capability<u32, ChatLine> for RecordingChat {
    type Message = String;

    fn create_message(&self, _viewer: &u32, content: &ChatLine) -> Option<String> {
        Some(content.message.plain_text())
    }

    fn send(&self, viewer: &u32, message: &String) -> FacetResult<()> {
        check(*viewer)?;
        self.log.lock().push(format!("chat {} {}", viewer, message));
        Ok(())
    }
}

pub(crate) struct RecordingTitle {
    log: Log,
}

impl Facet<u32> for RecordingTitle {
    fn name(&self) -> &'static str {
        "recording-title"
    }
}

impl Capability<u32, TitleAction> for RecordingTitle {
    type Message = String;

    fn create_message(&self, _viewer: &u32, content: &TitleAction) -> Option<String> {
        Some(match content {
            TitleAction::Show(title) => format!("show {}", title.title.plain_text()),
            TitleAction::Clear => "clear".to_string(),
            TitleAction::Reset => "reset".to_string(),
        })
    }

    fn send(&self, viewer: &u32, message: &String) -> FacetResult<()> {
        self.log.lock().push(format!("title {} {}", viewer, message));
        Ok(())
    }
}

/// Per-viewer sink writing `bar ...` entries.
pub(crate) struct LogSink {
    log: Log,
}

impl LogSink {
    pub(crate) fn new(log: Log) -> Self {
        Self { log }
    }
}

impl BossBarSink<u32> for LogSink {
    fn show(&mut self, viewer: &u32, view: &BarView) -> FacetResult<()> {
        self.log
            .lock()
            .push(format!("bar show {} {} {}", viewer, view.name.plain_text(), view.percent));
        Ok(())
    }

    fn update(&mut self, viewer: &u32, update: &BossBarUpdate) -> FacetResult<()> {
        check(*viewer)?;
        self.log.lock().push(format!("bar update {} {:?}", viewer, update));
        Ok(())
    }

    fn hide(&mut self, viewer: &u32) -> FacetResult<()> {
        self.log.lock().push(format!("bar hide {}", viewer));
        Ok(())
    }
}

pub(crate) struct RecordingBars {
    log: Log,
    created: Arc<AtomicUsize>,
}

impl Facet<u32> for RecordingBars {
    fn name(&self) -> &'static str {
        "recording-bars"
    }
}

impl BossBarFacet<u32> for RecordingBars {
    fn create_bossbar(&self, viewers: &[u32]) -> Box<dyn BossBarHandle<u32>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Box::new(PerViewerBossBar::new(LogSink::new(self.log.clone()), viewers))
    }
}

/// Handle writing `handle ...` entries. Rejects [`FAILING`] and panics on
/// [`PANICKING`] when they are added.
pub(crate) struct LogHandle {
    log: Log,
    viewers: HashSet<u32>,
}

impl LogHandle {
    pub(crate) fn new(log: Log) -> Self {
        Self {
            log,
            viewers: HashSet::new(),
        }
    }

    fn push(&self, entry: String) {
        self.log.lock().push(entry);
    }
}

impl BossBarHandle<u32> for LogHandle {
    fn name_changed(&mut self, name: &Component) -> FacetResult<()> {
        self.push(format!("handle name {}", name.plain_text()));
        Ok(())
    }

    fn percent_changed(&mut self, percent: f32) -> FacetResult<()> {
        self.push(format!("handle percent {}", percent));
        Ok(())
    }

    fn color_changed(&mut self, color: BossBarColor) -> FacetResult<()> {
        self.push(format!("handle color {:?}", color));
        Ok(())
    }

    fn overlay_changed(&mut self, overlay: BossBarOverlay) -> FacetResult<()> {
        self.push(format!("handle overlay {:?}", overlay));
        Ok(())
    }

    fn flags_changed(&mut self, added: BossBarFlags, removed: BossBarFlags) -> FacetResult<()> {
        self.push(format!("handle flags +{} -{}", added.bits(), removed.bits()));
        Ok(())
    }

    fn add_viewer(&mut self, viewer: &u32) -> FacetResult<()> {
        check(*viewer)?;
        self.viewers.insert(*viewer);
        self.push(format!("handle add {}", viewer));
        Ok(())
    }

    fn remove_viewer(&mut self, viewer: &u32) -> FacetResult<()> {
        self.viewers.remove(viewer);
        self.push(format!("handle remove {}", viewer));
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    fn close(&mut self) {
        self.viewers.clear();
        self.push("handle close".to_string());
    }
}

/// A catalog with recording chat, title, and boss bar facets.
pub(crate) struct Fixture {
    pub log: Log,
    pub bars_created: Arc<AtomicUsize>,
    pub catalog: Arc<FacetCatalog<u32>>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let log = new_log();
        let bars_created = Arc::new(AtomicUsize::new(0));

        let (chat_log, title_log, bar_log) = (log.clone(), log.clone(), log.clone());
        let created = bars_created.clone();
        let catalog = FacetCatalog::builder()
            .chat(move || Ok(RecordingChat { log: chat_log }))
            .title(move || Ok(RecordingTitle { log: title_log }))
            .boss_bar(move || {
                Ok(RecordingBars {
                    log: bar_log,
                    created,
                })
            })
            .build(&FacetSelector::default());

        Self {
            log,
            bars_created,
            catalog: Arc::new(catalog),
        }
    }

    pub(crate) fn bars_created(&self) -> usize {
        self.bars_created.load(Ordering::SeqCst)
    }
}
