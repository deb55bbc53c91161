// SPDX-License-Identifier: GPL-3.0-only

//! Localized UI text, embedded from `i18n/` and looked up with [`fl!`](crate::fl).

use std::sync::LazyLock;

use i18n_embed::fluent::{FluentLanguageLoader, fluent_language_loader};
use i18n_embed::unic_langid::LanguageIdentifier;
use i18n_embed::{DefaultLocalizer, LanguageLoader, Localizer};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "i18n/"]
struct Localizations;

pub static LANGUAGE_LOADER: LazyLock<FluentLanguageLoader> = LazyLock::new(|| {
    let loader: FluentLanguageLoader = fluent_language_loader!();
    if let Err(e) = loader.load_fallback_language(&Localizations) {
        tracing::error!(%e, "failed to load fallback language");
    }
    loader
});

/// Applies the desktop's preferred languages.
pub fn init(requested_languages: &[LanguageIdentifier]) {
    if let Err(e) = localizer().select(requested_languages) {
        tracing::warn!(%e, "failed to load localizations");
    }
}

#[must_use]
pub fn localizer() -> Box<dyn Localizer> {
    Box::new(DefaultLocalizer::new(&*LANGUAGE_LOADER, &Localizations))
}

#[macro_export]
macro_rules! fl {
    ($message_id:literal) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id)
    }};

    ($message_id:literal, $($args:expr),*) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id, $($args), *)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_text_is_embedded() {
        assert_eq!(crate::fl!("app-title"), "Archive Mount");
        assert!(crate::fl!("tool-exited", tool = "ratarmount", code = 2).contains("ratarmount"));
    }
}
