//! Feature kinds and the per-feature rendering contract.

use serde::{Deserialize, Serialize};

use crate::component::{
    ActionBar, Book, ChatLine, Component, SoundAction, TabList, Title, TitleAction,
};
use crate::error::TranslateError;
use crate::locale::Locale;
use crate::translation::Translator;

/// The features an audience can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Chat,
    ActionBar,
    Title,
    Sound,
    Book,
    BossBar,
    TabList,
}

impl FeatureKind {
    /// Every feature kind, in resolution order.
    pub const ALL: [FeatureKind; 7] = [
        Self::Chat,
        Self::ActionBar,
        Self::Title,
        Self::Sound,
        Self::Book,
        Self::BossBar,
        Self::TabList,
    ];

    /// Returns the display name for this feature.
    pub fn name(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::ActionBar => "action bar",
            Self::Title => "title",
            Self::Sound => "sound",
            Self::Book => "book",
            Self::BossBar => "boss bar",
            Self::TabList => "tab list",
        }
    }
}

/// Content that belongs to one feature kind.
///
/// `render` produces a copy with every component translated for `locale`.
pub trait Feature: Clone + Send + Sync + 'static {
    /// The feature this content is delivered through.
    const KIND: FeatureKind;

    /// Translate all components carried by this content.
    fn render(&self, translator: &dyn Translator, locale: &Locale) -> Result<Self, TranslateError>;
}

impl Feature for ChatLine {
    const KIND: FeatureKind = FeatureKind::Chat;

    fn render(&self, translator: &dyn Translator, locale: &Locale) -> Result<Self, TranslateError> {
        Ok(Self {
            message: translator.render(&self.message, locale)?,
            kind: self.kind,
        })
    }
}

impl Feature for ActionBar {
    const KIND: FeatureKind = FeatureKind::ActionBar;

    fn render(&self, translator: &dyn Translator, locale: &Locale) -> Result<Self, TranslateError> {
        Ok(Self(translator.render(&self.0, locale)?))
    }
}

impl Feature for TitleAction {
    const KIND: FeatureKind = FeatureKind::Title;

    fn render(&self, translator: &dyn Translator, locale: &Locale) -> Result<Self, TranslateError> {
        match self {
            Self::Show(title) => Ok(Self::Show(Title {
                title: translator.render(&title.title, locale)?,
                subtitle: translator.render(&title.subtitle, locale)?,
                times: title.times,
            })),
            Self::Clear => Ok(Self::Clear),
            Self::Reset => Ok(Self::Reset),
        }
    }
}

impl Feature for SoundAction {
    const KIND: FeatureKind = FeatureKind::Sound;

    fn render(&self, _translator: &dyn Translator, _locale: &Locale) -> Result<Self, TranslateError> {
        Ok(self.clone())
    }
}

impl Feature for Book {
    const KIND: FeatureKind = FeatureKind::Book;

    fn render(&self, translator: &dyn Translator, locale: &Locale) -> Result<Self, TranslateError> {
        let pages = self
            .pages
            .iter()
            .map(|page| translator.render(page, locale))
            .collect::<Result<Vec<Component>, _>>()?;

        Ok(Self {
            title: translator.render(&self.title, locale)?,
            author: translator.render(&self.author, locale)?,
            pages,
        })
    }
}

impl Feature for TabList {
    const KIND: FeatureKind = FeatureKind::TabList;

    fn render(&self, translator: &dyn Translator, locale: &Locale) -> Result<Self, TranslateError> {
        Ok(Self {
            header: translator.render(&self.header, locale)?,
            footer: translator.render(&self.footer, locale)?,
        })
    }
}
