//! Stream composition and its settings.

mod composer;
mod settings;

pub use composer::{Composer, IntoConfigTree, change_stream, generate_stream};
pub use settings::{ComposerSettings, ComposerSettingsBuilder};
