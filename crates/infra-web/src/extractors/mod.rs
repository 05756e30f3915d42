// Built-in extractors

pub mod generic;

pub use generic::GenericPageExtractor;

use extracta_core::application::ExtractorRegistry;
use extracta_core::domain::FetchMode;
use std::sync::Arc;

pub const BUILTIN_CATEGORY: &str = "web";
pub const BUILTIN_SOURCE: &str = "generic";

/// Register `web/generic` in all three handler tables
pub fn register_builtin(registry: &mut ExtractorRegistry) -> &mut ExtractorRegistry {
    for mode in [FetchMode::One, FetchMode::List, FetchMode::Detail] {
        registry.register(
            mode,
            BUILTIN_CATEGORY,
            BUILTIN_SOURCE,
            Arc::new(GenericPageExtractor::new(mode)),
        );
    }
    registry
}
