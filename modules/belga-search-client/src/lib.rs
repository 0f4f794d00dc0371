//! Clients for the four Belga search APIs the newsroom panels query:
//! the image library, coverages (galleries), the 360 text archive and
//! the Belga Press monitoring archive. Every client returns normalized
//! [`NewsItem`](newsbridge_core::item::NewsItem) records.

pub mod archive;
pub mod auth;
pub mod coverage;
pub mod error;
pub mod image;
pub mod period;
pub mod press;
pub mod types;

pub use archive::{archive_to_item, ArchiveDoc, Belga360ArchiveClient, ARCHIVE_GUID_PREFIX};
pub use auth::HmacCredentials;
pub use coverage::{
    gallery_to_item, BelgaCoverageClient, GalleryDoc, COVERAGE_GUID_PREFIX, COVERAGE_MIMETYPE,
};
pub use error::{Result, SearchError};
pub use image::{image_to_item, BelgaImageClient, ImageDoc, IMAGE_GUID_PREFIX};
pub use period::{local_today, Period};
pub use press::{press_to_item, BelgaPressClient, PressDoc, PRESS_GUID_PREFIX};
pub use types::{DateRange, SearchParams, SearchQuery, SearchResult};
