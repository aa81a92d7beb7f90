pub mod content;
pub mod converter;
pub mod dispatcher;
pub mod genre_cache;
pub mod providers;

pub use content::ContentService;
pub use converter::Converter;
pub use dispatcher::Dispatcher;
pub use genre_cache::{GenreCache, GenreCatalog};
pub use providers::{MetadataProvider, TmdbProvider};
