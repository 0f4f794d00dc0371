//! Search provider for Belga coverages (picture galleries). Same API and
//! auth as the image library, different endpoint and item shape.

use serde::Deserialize;

use newsbridge_core::item::{ItemType, NewsItem, Rendition, RenditionKind};
use newsbridge_core::text::strip_tags;

use crate::auth::{encode_query, HmacCredentials};
use crate::error::Result;
use crate::image::{http_client, parse_belga_datetime, picture_search_params, signed_get};
use crate::types::{SearchParams, SearchQuery, SearchResult};

pub const COVERAGE_GUID_PREFIX: &str = "urn:belga.be:coverage:";
pub const COVERAGE_MIMETYPE: &str = "application/vnd.belga.coverage";
const DEFAULT_BASE_URL: &str = "https://api.ssl.belga.be/belgaimage-api/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryDoc {
    pub gallery_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub create_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub icon_thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GallerySearchResponse {
    #[serde(default)]
    galleries: Vec<GalleryDoc>,
    #[serde(rename = "nrGalleries", default)]
    nr_galleries: u64,
}

/// Client for `searchGalleries` and `getGalleryById`.
#[derive(Debug)]
pub struct BelgaCoverageClient {
    http: reqwest::Client,
    base_url: String,
    creds: HmacCredentials,
}

impl BelgaCoverageClient {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_base_url(username, password, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into(),
            creds: HmacCredentials::new(username, password),
        }
    }

    pub async fn authorize(&mut self) -> Result<()> {
        self.creds.authorize(&self.http, &self.base_url).await
    }

    pub async fn find(&self, query: &SearchQuery, params: &SearchParams) -> Result<SearchResult> {
        let qs = encode_query(&picture_search_params(query, params));
        let path = format!("/searchGalleries?{qs}");
        let data: GallerySearchResponse =
            signed_get(&self.http, &self.creds, &self.base_url, &path).await?;
        Ok(SearchResult {
            docs: data.galleries.iter().map(gallery_to_item).collect(),
            count: data.nr_galleries,
        })
    }

    pub async fn fetch(&self, guid: &str) -> Result<NewsItem> {
        let id = guid.strip_prefix(COVERAGE_GUID_PREFIX).unwrap_or(guid);
        let path = format!("/getGalleryById?i={id}");
        let doc: GalleryDoc = signed_get(&self.http, &self.creds, &self.base_url, &path).await?;
        Ok(gallery_to_item(&doc))
    }
}

pub fn gallery_to_item(doc: &GalleryDoc) -> NewsItem {
    let guid = format!("{}{}", COVERAGE_GUID_PREFIX, doc.gallery_id);
    let mut item = NewsItem::with_guid(ItemType::Graphic, guid.clone());
    item.mimetype = Some(COVERAGE_MIMETYPE.to_string());
    item.headline = doc.name.as_deref().map(strip_tags);
    item.description_text = doc.description.as_deref().map(strip_tags);
    let created = doc
        .create_date
        .as_deref()
        .and_then(|value| parse_belga_datetime(value, chrono_tz::Europe::Brussels));
    item.versioncreated = created;
    item.firstcreated = created;
    item.byline = doc
        .author
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(doc.user_id.as_deref())
        .map(strip_tags);
    item.creditline = doc.credit.as_deref().map(strip_tags);
    item.source = item.creditline.clone();
    // a coverage only exposes its icon; every rendition points at it
    if let Some(href) = doc.icon_thumbnail_url.as_deref() {
        for kind in [
            RenditionKind::Original,
            RenditionKind::BaseImage,
            RenditionKind::Thumbnail,
            RenditionKind::ViewImage,
        ] {
            item.renditions.insert(kind, Rendition::href(href));
        }
    }
    item.extra.bcoverage = Some(guid);
    item.fetchable = false;
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> GalleryDoc {
        serde_json::from_value(serde_json::json!({
            "galleryId": 6690595,
            "name": "JUDO GRAND PRIX",
            "description": "Judo Grand Prix <b>Zagreb</b> 2019",
            "createDate": "2019-08-28T16:14:00",
            "author": "photonews",
            "credit": "BELGA",
            "iconThumbnailUrl": "https://0.t.cdn.belga.be/belgaimage:154670415:150x150?v=5d66d83c"
        }))
        .unwrap()
    }

    #[test]
    fn gallery_becomes_a_graphic_coverage() {
        let item = gallery_to_item(&doc());
        assert_eq!(item.guid, "urn:belga.be:coverage:6690595");
        assert_eq!(item.item_type, ItemType::Graphic);
        assert_eq!(item.mimetype.as_deref(), Some(COVERAGE_MIMETYPE));
        assert_eq!(item.headline.as_deref(), Some("JUDO GRAND PRIX"));
        assert_eq!(
            item.description_text.as_deref(),
            Some("Judo Grand Prix Zagreb 2019")
        );
        assert_eq!(
            item.extra.bcoverage.as_deref(),
            Some("urn:belga.be:coverage:6690595")
        );
        assert!(!item.fetchable);
    }

    #[test]
    fn every_rendition_points_at_the_icon() {
        let item = gallery_to_item(&doc());
        assert_eq!(item.renditions.len(), 4);
        let icon = item.renditions[&RenditionKind::Thumbnail].href.clone();
        assert!(icon.as_deref().unwrap().contains("belgaimage:154670415"));
        for rendition in item.renditions.values() {
            assert_eq!(rendition.href, icon);
        }
    }
}
