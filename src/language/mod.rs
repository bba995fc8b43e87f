pub mod adaptive;
pub mod cache;
pub mod core;
pub mod selector;

pub use adaptive::{roulette, AdaptiveSelector};
pub use cache::ContentTagCache;
pub use core::{Language, LanguageError, SupportedLanguage};
pub use selector::{RandomSelector, WeakKeySelector, WordSelector};
