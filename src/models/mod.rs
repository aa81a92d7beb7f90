mod content;
mod tmdb;

pub use content::{ContentCategory, ContentItem, Genre, User};
pub use tmdb::{
    DetailsResponse, GenreListResponse, ListItem, Page, ProductionCountry, Video, VideoList,
};
