//! Boss bar attributes and the boss bar observable.
//!
//! A [`BossBar`] is owned by application code. Audiences never own one; they
//! attach a [`BossBarListener`] and forward every change to their viewers.
//!
//! Mutations are serialised by a re-entrant lock and listeners are notified
//! while it is held, so each listener observes changes in mutation order.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::component::Component;
use crate::error::BossBarError;

/// Boss bar colors, in protocol ordinal order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossBarColor {
    #[default]
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    White,
}

impl BossBarColor {
    /// Every color, indexed by ordinal.
    pub const ALL: [BossBarColor; 7] = [
        Self::Pink,
        Self::Blue,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::White,
    ];

    /// Protocol ordinal.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Color for a protocol ordinal.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }
}

/// Boss bar overlays (segment notches), in protocol ordinal order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossBarOverlay {
    #[default]
    Progress,
    Notched6,
    Notched10,
    Notched12,
    Notched20,
}

impl BossBarOverlay {
    /// Every overlay, indexed by ordinal.
    pub const ALL: [BossBarOverlay; 5] = [
        Self::Progress,
        Self::Notched6,
        Self::Notched10,
        Self::Notched12,
        Self::Notched20,
    ];

    /// Protocol ordinal.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Overlay for a protocol ordinal.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Number of segments drawn, `None` for a continuous bar.
    pub fn segments(self) -> Option<u8> {
        match self {
            Self::Progress => None,
            Self::Notched6 => Some(6),
            Self::Notched10 => Some(10),
            Self::Notched12 => Some(12),
            Self::Notched20 => Some(20),
        }
    }
}

/// Boss bar flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossBarFlag {
    DarkenScreen,
    PlayBossMusic,
    CreateWorldFog,
}

impl BossBarFlag {
    /// Every flag.
    pub const ALL: [BossBarFlag; 3] = [Self::DarkenScreen, Self::PlayBossMusic, Self::CreateWorldFog];

    /// Protocol bit for this flag.
    pub fn bit(self) -> u8 {
        match self {
            Self::DarkenScreen => 0x1,
            Self::PlayBossMusic => 0x2,
            Self::CreateWorldFog => 0x4,
        }
    }
}

/// A set of [`BossBarFlag`]s stored as protocol bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BossBarFlags(u8);

impl BossBarFlags {
    const MASK: u8 = 0x7;

    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every flag.
    pub const fn all() -> Self {
        Self(Self::MASK)
    }

    /// Build from protocol bits, ignoring unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Protocol bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, flag: BossBarFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: BossBarFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: BossBarFlag) {
        self.0 &= !flag.bit();
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Flags in `self` that are not in `other`.
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterate the contained flags in bit order.
    pub fn iter(self) -> impl Iterator<Item = BossBarFlag> {
        BossBarFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Apply a flag delta to a protocol byte, as packet-level facets do.
    pub fn apply_bits(base: u8, added: Self, removed: Self) -> u8 {
        (base | added.0) & !removed.0
    }
}

impl FromIterator<BossBarFlag> for BossBarFlags {
    fn from_iter<I: IntoIterator<Item = BossBarFlag>>(iter: I) -> Self {
        let mut flags = Self::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl From<BossBarFlag> for BossBarFlags {
    fn from(flag: BossBarFlag) -> Self {
        Self(flag.bit())
    }
}

/// Process-unique identity of a boss bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BossBarId(u64);

impl BossBarId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BossBarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bossbar#{}", self.0)
    }
}

/// Observer of boss bar changes.
///
/// Callbacks run on the mutating thread while the bar's mutation lock is
/// held. A panicking listener is logged and skipped.
pub trait BossBarListener: Send + Sync {
    fn name_changed(&self, _bar: &BossBar, _old: &Component, _new: &Component) {}

    fn percent_changed(&self, _bar: &BossBar, _old: f32, _new: f32) {}

    fn color_changed(&self, _bar: &BossBar, _old: BossBarColor, _new: BossBarColor) {}

    fn overlay_changed(&self, _bar: &BossBar, _old: BossBarOverlay, _new: BossBarOverlay) {}

    fn flags_changed(&self, _bar: &BossBar, _added: BossBarFlags, _removed: BossBarFlags) {}
}

/// Point-in-time copy of a bar's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct BossBarState {
    pub name: Component,
    pub percent: f32,
    pub color: BossBarColor,
    pub overlay: BossBarOverlay,
    pub flags: BossBarFlags,
}

/// An observable boss bar.
pub struct BossBar {
    id: BossBarId,
    state: RwLock<BossBarState>,
    listeners: RwLock<Vec<Arc<dyn BossBarListener>>>,
    mutation: ReentrantMutex<()>,
}

impl BossBar {
    /// Create a bar. Fails if `percent` is outside `[0, 1]`.
    pub fn new(
        name: impl Into<Component>,
        percent: f32,
        color: BossBarColor,
        overlay: BossBarOverlay,
        flags: BossBarFlags,
    ) -> Result<Self, BossBarError> {
        check_percent(percent)?;
        Ok(Self {
            id: BossBarId::next(),
            state: RwLock::new(BossBarState {
                name: name.into(),
                percent,
                color,
                overlay,
                flags,
            }),
            listeners: RwLock::new(Vec::new()),
            mutation: ReentrantMutex::new(()),
        })
    }

    /// Create a full, pink, continuous bar without flags.
    pub fn simple(name: impl Into<Component>) -> Self {
        Self {
            id: BossBarId::next(),
            state: RwLock::new(BossBarState {
                name: name.into(),
                percent: 1.0,
                color: BossBarColor::default(),
                overlay: BossBarOverlay::default(),
                flags: BossBarFlags::empty(),
            }),
            listeners: RwLock::new(Vec::new()),
            mutation: ReentrantMutex::new(()),
        }
    }

    pub fn id(&self) -> BossBarId {
        self.id
    }

    pub fn name(&self) -> Component {
        self.state.read().name.clone()
    }

    pub fn percent(&self) -> f32 {
        self.state.read().percent
    }

    pub fn color(&self) -> BossBarColor {
        self.state.read().color
    }

    pub fn overlay(&self) -> BossBarOverlay {
        self.state.read().overlay
    }

    pub fn flags(&self) -> BossBarFlags {
        self.state.read().flags
    }

    /// Copy of every attribute, read atomically.
    pub fn state(&self) -> BossBarState {
        self.state.read().clone()
    }

    /// Hold the mutation lock.
    ///
    /// While the guard lives no other thread can mutate the bar, so a
    /// listener can replay [`BossBar::state`] and then register without
    /// missing a change. The lock is re-entrant for the holding thread.
    pub fn mutation_guard(&self) -> ReentrantMutexGuard<'_, ()> {
        self.mutation.lock()
    }

    pub fn set_name(&self, name: impl Into<Component>) {
        let _guard = self.mutation.lock();
        let name = name.into();
        let old = {
            let mut state = self.state.write();
            if state.name == name {
                return;
            }
            std::mem::replace(&mut state.name, name.clone())
        };
        self.notify(|listener| listener.name_changed(self, &old, &name));
    }

    pub fn set_percent(&self, percent: f32) -> Result<(), BossBarError> {
        check_percent(percent)?;
        let _guard = self.mutation.lock();
        let old = {
            let mut state = self.state.write();
            if state.percent == percent {
                return Ok(());
            }
            std::mem::replace(&mut state.percent, percent)
        };
        self.notify(|listener| listener.percent_changed(self, old, percent));
        Ok(())
    }

    pub fn set_color(&self, color: BossBarColor) {
        let _guard = self.mutation.lock();
        let old = {
            let mut state = self.state.write();
            if state.color == color {
                return;
            }
            std::mem::replace(&mut state.color, color)
        };
        self.notify(|listener| listener.color_changed(self, old, color));
    }

    pub fn set_overlay(&self, overlay: BossBarOverlay) {
        let _guard = self.mutation.lock();
        let old = {
            let mut state = self.state.write();
            if state.overlay == overlay {
                return;
            }
            std::mem::replace(&mut state.overlay, overlay)
        };
        self.notify(|listener| listener.overlay_changed(self, old, overlay));
    }

    /// Replace the flag set; listeners receive the added and removed deltas.
    pub fn set_flags(&self, flags: BossBarFlags) {
        let _guard = self.mutation.lock();
        let old = {
            let mut state = self.state.write();
            if state.flags == flags {
                return;
            }
            std::mem::replace(&mut state.flags, flags)
        };
        let added = flags.difference(old);
        let removed = old.difference(flags);
        self.notify(|listener| listener.flags_changed(self, added, removed));
    }

    pub fn add_flags(&self, flags: BossBarFlags) {
        let _guard = self.mutation.lock();
        let current = self.flags();
        self.set_flags(current.union(flags));
    }

    pub fn remove_flags(&self, flags: BossBarFlags) {
        let _guard = self.mutation.lock();
        let current = self.flags();
        self.set_flags(current.difference(flags));
    }

    /// Register a listener. Registering the same listener twice is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn BossBarListener>) {
        let _guard = self.mutation.lock();
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregister a listener. Returns true if it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn BossBarListener>) -> bool {
        let _guard = self.mutation.lock();
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn notify(&self, f: impl Fn(&dyn BossBarListener)) {
        // Snapshot so listeners may (un)register from inside a callback.
        let listeners = self.listeners.read().clone();
        trace!(bar = %self.id, listeners = listeners.len(), "Notifying boss bar listeners");

        for listener in listeners {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))) {
                warn!(bar = %self.id, "Boss bar listener panicked: {:?}", panic);
            }
        }
    }
}

impl fmt::Debug for BossBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BossBar")
            .field("id", &self.id)
            .field("state", &*self.state.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn check_percent(percent: f32) -> Result<(), BossBarError> {
    if (0.0..=1.0).contains(&percent) {
        Ok(())
    } else {
        Err(BossBarError::InvalidPercent(percent))
    }
}

/// Listener identity is the allocation, not the vtable.
fn same_listener(a: &Arc<dyn BossBarListener>, b: &Arc<dyn BossBarListener>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
