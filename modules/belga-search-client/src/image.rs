//! Search provider for the Belga image library.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use newsbridge_core::item::{ItemType, NewsItem, Rendition, RenditionKind};
use newsbridge_core::text::strip_tags;

use crate::auth::{encode_query, HmacCredentials};
use crate::error::{Result, SearchError};
use crate::types::{SearchParams, SearchQuery, SearchResult};

pub const IMAGE_GUID_PREFIX: &str = "urn:belga.be:image:";
const DEFAULT_BASE_URL: &str = "https://api.ssl.belga.be/belgaimage-api/";

/// Catalog searches run inside interactive requests, so the client caps
/// every call at ten seconds.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client")
}

/// Signed GET against the picture API. The signature covers the path with
/// its query string, so the query must be encoded before signing.
pub(crate) async fn signed_get<T: DeserializeOwned>(
    http: &reqwest::Client,
    creds: &HmacCredentials,
    base_url: &str,
    path: &str,
) -> Result<T> {
    let mut request = http.get(format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    ));
    for (name, value) in creds.headers(path, false)? {
        request = request.header(name, value);
    }
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SearchError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp.json().await?)
}

/// Query parameters shared by the image and coverage searches.
pub(crate) fn picture_search_params(
    query: &SearchQuery,
    params: &SearchParams,
) -> Vec<(&'static str, String)> {
    let mut out = vec![
        ("s", query.from.to_string()),
        ("l", query.size_or_default().to_string()),
    ];
    for (key, values) in [("c", &params.sources), ("h", &params.subjects)] {
        if !values.is_empty() {
            let mut sorted = values.clone();
            sorted.sort();
            out.push((key, sorted.join(",")));
        }
    }
    // the API takes epoch millis at UTC midnight
    if let Some(start) = params.dates.start {
        out.push(("f", utc_midnight_millis(start).to_string()));
    }
    if let Some(end) = params.dates.end {
        out.push(("e", utc_midnight_millis(end).to_string()));
    }
    if let Some(period) = params.period {
        out.push(("p", period.as_str().to_uppercase()));
    }
    if let Some(text) = query.query_string.as_deref() {
        let terms: Vec<&str> = text.split_whitespace().collect();
        if !terms.is_empty() {
            out.push(("t", terms.join(" AND ")));
        }
    }
    out
}

fn utc_midnight_millis(date: chrono::NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
        .timestamp_millis()
}

/// Belga timestamps without an offset are wall-clock Brussels time.
pub(crate) fn parse_belga_datetime(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc));
        }
    }
    None
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDoc {
    pub image_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub create_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub detail_url: Option<String>,
    #[serde(default)]
    pub small_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageSearchResponse {
    #[serde(default)]
    images: Vec<ImageDoc>,
    #[serde(rename = "nrImages", default)]
    nr_images: u64,
}

/// Client for `searchImages` and `getImageById`.
#[derive(Debug)]
pub struct BelgaImageClient {
    http: reqwest::Client,
    base_url: String,
    creds: HmacCredentials,
}

impl BelgaImageClient {
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

    /// Trade the configured password for request tokens. Must run once
    /// before `find` or `fetch`.
    pub async fn authorize(&mut self) -> Result<()> {
        self.creds.authorize(&self.http, &self.base_url).await
    }

    pub async fn find(&self, query: &SearchQuery, params: &SearchParams) -> Result<SearchResult> {
        let qs = encode_query(&picture_search_params(query, params));
        let path = format!("/searchImages?{qs}");
        let data: ImageSearchResponse =
            signed_get(&self.http, &self.creds, &self.base_url, &path).await?;
        Ok(SearchResult {
            docs: data.images.iter().map(image_to_item).collect(),
            count: data.nr_images,
        })
    }

    pub async fn fetch(&self, guid: &str) -> Result<NewsItem> {
        let id = guid.strip_prefix(IMAGE_GUID_PREFIX).unwrap_or(guid);
        let path = format!("/getImageById?i={id}");
        let doc: ImageDoc = signed_get(&self.http, &self.creds, &self.base_url, &path).await?;
        Ok(image_to_item(&doc))
    }
}

pub fn image_to_item(doc: &ImageDoc) -> NewsItem {
    let guid = format!("{}{}", IMAGE_GUID_PREFIX, doc.image_id);
    let mut item = NewsItem::with_guid(ItemType::Picture, guid);
    item.headline = doc.name.as_deref().map(strip_tags);
    item.description_text = doc.caption.as_deref().map(strip_tags);
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
    if let Some(href) = doc.detail_url.as_deref() {
        item.renditions.insert(
            RenditionKind::Original,
            Rendition {
                href: Some(href.to_string()),
                width: doc.width,
                height: doc.height,
                ..Default::default()
            },
        );
        item.renditions
            .insert(RenditionKind::BaseImage, Rendition::href(href));
    }
    if let Some(href) = doc.small_url.as_deref() {
        item.renditions
            .insert(RenditionKind::Thumbnail, Rendition::href(href));
    }
    if let Some(href) = doc.preview_url.as_deref() {
        item.renditions
            .insert(RenditionKind::ViewImage, Rendition::href(href));
    }
    // the search result carries everything, nothing left to fetch
    item.fetchable = false;
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;
    use crate::types::DateRange;
    use chrono::NaiveDate;

    fn doc() -> ImageDoc {
        serde_json::from_value(serde_json::json!({
            "imageId": 5999735,
            "name": "20190827_zap_d99_014.jpg",
            "caption": "August 27, 2019: Gaza <b>clashes</b>",
            "createDate": "2019-08-28T09:22:00",
            "author": "ZUMAPRESS",
            "userId": "abcd",
            "credit": "ZUMAPRESS",
            "width": 4283,
            "height": 2855,
            "detailUrl": "https://2.t.cdn.belga.be/belgaimage:154669691:800x800:w?v=5d66d83c&m=kmkpnpoe",
            "smallUrl": "https://1.t.cdn.belga.be/belgaimage:154669691:150x150?v=5d66d83c&m=fbjlajnf",
            "previewUrl": "https://0.t.cdn.belga.be/belgaimage:154669691:600x140?v=5d66d83c&m=epmecjbf"
        }))
        .unwrap()
    }

    #[test]
    fn search_result_becomes_a_picture() {
        let item = image_to_item(&doc());
        assert_eq!(item.guid, "urn:belga.be:image:5999735");
        assert_eq!(item.item_type, ItemType::Picture);
        assert!(!item.fetchable);
        assert_eq!(item.headline.as_deref(), Some("20190827_zap_d99_014.jpg"));
        assert_eq!(
            item.description_text.as_deref(),
            Some("August 27, 2019: Gaza clashes")
        );
        assert_eq!(item.byline.as_deref(), Some("ZUMAPRESS"));
        assert_eq!(item.creditline.as_deref(), Some("ZUMAPRESS"));
        assert_eq!(item.source.as_deref(), Some("ZUMAPRESS"));
        // Brussels summer time is two hours ahead of UTC
        assert_eq!(
            item.versioncreated.unwrap().to_rfc3339(),
            "2019-08-28T07:22:00+00:00"
        );
        let original = &item.renditions[&RenditionKind::Original];
        assert_eq!(original.width, Some(4283));
        assert_eq!(original.height, Some(2855));
        assert_eq!(
            item.renditions[&RenditionKind::BaseImage].href,
            original.href
        );
        assert!(item.renditions.contains_key(&RenditionKind::Thumbnail));
        assert!(item.renditions.contains_key(&RenditionKind::ViewImage));
    }

    #[test]
    fn byline_falls_back_to_the_uploading_user() {
        let mut raw = doc();
        raw.author = None;
        assert_eq!(image_to_item(&raw).byline.as_deref(), Some("abcd"));
    }

    #[test]
    fn search_params_follow_the_api_contract() {
        let query = SearchQuery::new(20, 10).with_text("  test  query ");
        let params = SearchParams {
            sources: vec!["BELGA".into(), "AFP".into()],
            subjects: vec!["news".into()],
            period: Some(Period::Week),
            dates: DateRange {
                start: NaiveDate::from_ymd_opt(2020, 2, 14),
                end: None,
            },
            ..Default::default()
        };
        let pairs = picture_search_params(&query, &params);
        assert_eq!(
            pairs,
            vec![
                ("s", "20".to_string()),
                ("l", "10".to_string()),
                ("c", "AFP,BELGA".to_string()),
                ("h", "news".to_string()),
                ("f", "1581638400000".to_string()),
                ("p", "WEEK".to_string()),
                ("t", "test AND query".to_string()),
            ]
        );
    }

    #[test]
    fn naive_timestamps_are_brussels_wall_clock() {
        let tz = chrono_tz::Europe::Brussels;
        // winter, one hour ahead of UTC
        assert_eq!(
            parse_belga_datetime("2020-01-15T10:00:00", tz)
                .unwrap()
                .to_rfc3339(),
            "2020-01-15T09:00:00+00:00"
        );
        // an explicit offset wins
        assert_eq!(
            parse_belga_datetime("2020-01-15T10:00:00+02:00", tz)
                .unwrap()
                .to_rfc3339(),
            "2020-01-15T08:00:00+00:00"
        );
        assert!(parse_belga_datetime("not a date", tz).is_none());
    }
}
