// Extracta Infrastructure - Web Adapters
// Implements: ContextProvider/ExecutionContext, Extractor (web/generic), ResultPersister

pub mod context;
pub mod extractors;
pub mod forwarder;

#[cfg(test)]
mod test_support;

pub use context::{HttpContextProvider, HttpPage, DEFAULT_USER_AGENT};
pub use extractors::{register_builtin, GenericPageExtractor};
pub use forwarder::HttpResultForwarder;
