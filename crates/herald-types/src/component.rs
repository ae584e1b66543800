//! Content delivered to viewers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A piece of presentable text.
///
/// Formatting and serialization belong to the host; the engine only needs to
/// know which parts must be translated before delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    /// Literal text.
    Text(String),

    /// A translation key with positional arguments.
    Translatable { key: String, args: Vec<Component> },

    /// A sequence of components rendered one after another.
    Group(Vec<Component>),
}

impl Component {
    /// Create a literal text component.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a translatable component without arguments.
    pub fn translatable(key: impl Into<String>) -> Self {
        Self::Translatable {
            key: key.into(),
            args: Vec::new(),
        }
    }

    /// Create a translatable component with arguments.
    pub fn translatable_with(key: impl Into<String>, args: Vec<Component>) -> Self {
        Self::Translatable {
            key: key.into(),
            args,
        }
    }

    /// The empty component.
    pub fn empty() -> Self {
        Self::Group(Vec::new())
    }

    /// Returns true if rendering this component needs a translator.
    pub fn needs_translation(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Translatable { .. } => true,
            Self::Group(children) => children.iter().any(Component::needs_translation),
        }
    }

    /// Flatten to plain text. Untranslated keys are emitted verbatim.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain(&mut out);
        out
    }

    fn write_plain(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Translatable { key, .. } => out.push_str(key),
            Self::Group(children) => {
                for child in children {
                    child.write_plain(out);
                }
            }
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Component {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Component {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// How a chat line is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    /// A player-visible chat message.
    #[default]
    Chat,

    /// A system message.
    System,
}

/// A line of chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Message body.
    pub message: Component,

    /// Presentation kind.
    pub kind: ChatKind,
}

impl ChatLine {
    /// Create a chat line of the default kind.
    pub fn new(message: impl Into<Component>) -> Self {
        Self {
            message: message.into(),
            kind: ChatKind::Chat,
        }
    }

    /// Create a system message line.
    pub fn system(message: impl Into<Component>) -> Self {
        Self {
            message: message.into(),
            kind: ChatKind::System,
        }
    }
}

/// Text shown above the hotbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBar(pub Component);

/// Fade timings for a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleTimes {
    /// Fade-in duration.
    pub fade_in: Duration,

    /// Time the title stays fully visible.
    pub stay: Duration,

    /// Fade-out duration.
    pub fade_out: Duration,
}

impl Default for TitleTimes {
    fn default() -> Self {
        // 10/70/20 ticks at 20 ticks per second.
        Self {
            fade_in: Duration::from_millis(500),
            stay: Duration::from_millis(3500),
            fade_out: Duration::from_millis(1000),
        }
    }
}

/// A title and subtitle pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Main title text.
    pub title: Component,

    /// Subtitle text.
    pub subtitle: Component,

    /// Fade timings; `None` keeps the viewer's current timings.
    pub times: Option<TitleTimes>,
}

impl Title {
    /// Create a title with default timings.
    pub fn new(title: impl Into<Component>, subtitle: impl Into<Component>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            times: Some(TitleTimes::default()),
        }
    }
}

/// Title operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TitleAction {
    /// Show a title.
    Show(Title),

    /// Hide the current title, keeping timings.
    Clear,

    /// Hide the current title and reset timings.
    Reset,
}

/// Sound categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundSource {
    #[default]
    Master,
    Music,
    Record,
    Weather,
    Block,
    Hostile,
    Neutral,
    Player,
    Ambient,
    Voice,
}

impl SoundSource {
    /// Lowercase protocol name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Music => "music",
            Self::Record => "record",
            Self::Weather => "weather",
            Self::Block => "block",
            Self::Hostile => "hostile",
            Self::Neutral => "neutral",
            Self::Player => "player",
            Self::Ambient => "ambient",
            Self::Voice => "voice",
        }
    }
}

/// A sound to play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// Namespaced sound key (e.g. `minecraft:entity.player.levelup`).
    pub key: String,

    /// Category the sound plays in.
    pub source: SoundSource,

    /// Volume multiplier.
    pub volume: f32,

    /// Pitch multiplier.
    pub pitch: f32,
}

impl Sound {
    /// Create a sound at unit volume and pitch.
    pub fn new(key: impl Into<String>, source: SoundSource) -> Self {
        Self {
            key: key.into(),
            source,
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

/// Which sounds to stop. Both `None` stops everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundStop {
    /// Only stop this sound key.
    pub sound: Option<String>,

    /// Only stop sounds in this category.
    pub source: Option<SoundSource>,
}

impl SoundStop {
    /// Stop every sound.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Sound operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SoundAction {
    Play(Sound),
    Stop(SoundStop),
}

/// A written book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: Component,
    pub author: Component,
    pub pages: Vec<Component>,
}

/// Player-list header and footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabList {
    pub header: Component,
    pub footer: Component,
}
