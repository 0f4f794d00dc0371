//! Search provider for the Belga 360 text archive. The webservice is
//! internal and unauthenticated.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use newsbridge_core::item::{ContentState, ItemType, NewsItem};
use newsbridge_core::text::{block_texts, strip_tags};

use crate::error::{Result, SearchError};
use crate::image::http_client;
use crate::period::{local_today, Period};
use crate::types::{SearchParams, SearchQuery, SearchResult};

pub const ARCHIVE_GUID_PREFIX: &str = "urn:belga.be:360archive:";
pub const TEXT_MIMETYPE: &str = "application/superdesk.item.text";
const DEFAULT_BASE_URL: &str = "http://mules.staging.belga.be:48080/belga360-ws/";
const SEARCH_ENDPOINT: &str = "archivenewsobjects";

/// Asset types the editor can open as text.
const SUPPORTED_TYPES: &[&str] = &["Text", "Brieft", "Alert", "Short"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveProxy {
    #[serde(default)]
    pub varchar_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveComponent {
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub proxies: Vec<ArchiveProxy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveDoc {
    pub news_object_id: u64,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub head_line: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Epoch millis.
    #[serde(default)]
    pub validate_date: Option<i64>,
    /// Epoch millis.
    #[serde(default)]
    pub create_date: Option<i64>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub news_components: Vec<ArchiveComponent>,
}

#[derive(Debug, Deserialize)]
struct ArchiveSearchResponse {
    #[serde(rename = "newsObjects", default)]
    news_objects: Vec<ArchiveDoc>,
    #[serde(rename = "nrNewsObjects", default)]
    nr_news_objects: u64,
}

/// Client for `archivenewsobjects`.
#[derive(Debug)]
pub struct Belga360ArchiveClient {
    http: reqwest::Client,
    base_url: String,
    tz: chrono_tz::Tz,
}

impl Belga360ArchiveClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into(),
            tz: chrono_tz::Europe::Brussels,
        }
    }

    pub fn with_timezone(mut self, tz: chrono_tz::Tz) -> Self {
        self.tz = tz;
        self
    }

    pub async fn find(&self, query: &SearchQuery, params: &SearchParams) -> Result<SearchResult> {
        let pairs = archive_search_params(query, params, local_today(self.tz));
        let data: ArchiveSearchResponse = self.api_get(SEARCH_ENDPOINT, &pairs).await?;
        Ok(SearchResult {
            docs: data.news_objects.iter().map(archive_to_item).collect(),
            count: data.nr_news_objects,
        })
    }

    pub async fn fetch(&self, guid: &str) -> Result<NewsItem> {
        let id = guid.strip_prefix(ARCHIVE_GUID_PREFIX).unwrap_or(guid);
        let doc: ArchiveDoc = self
            .api_get(&format!("{SEARCH_ENDPOINT}/{id}"), &[])
            .await?;
        Ok(archive_to_item(&doc))
    }

    async fn api_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let resp = self.http.get(url).query(params).send().await?;
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
}

impl Default for Belga360ArchiveClient {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn archive_search_params(
    query: &SearchQuery,
    params: &SearchParams,
    today: NaiveDate,
) -> Vec<(&'static str, String)> {
    let mut out = vec![
        ("start", query.from.to_string()),
        ("pageSize", query.size_or_default().to_string()),
    ];
    if let Some(languages) = params.languages.as_deref() {
        if !languages.is_empty() {
            out.push(("language", languages.to_lowercase()));
        }
    }
    let wanted: Vec<&str> = SUPPORTED_TYPES
        .iter()
        .copied()
        .filter(|supported| match params.types.as_deref() {
            Some(types) if !types.is_empty() => types.eq_ignore_ascii_case(supported),
            _ => true,
        })
        .collect();
    out.push(("assetType", wanted.join(" OR ")));
    if let Some(credits) = params.credits.as_deref() {
        if !credits.trim().is_empty() {
            out.push(("credits", credits.trim().to_uppercase()));
        }
    }
    if let Some(start) = params.dates.start {
        out.push(("fromDate", start.format("%Y%m%d").to_string()));
    }
    if let Some(end) = params.dates.end {
        out.push(("toDate", end.format("%Y%m%d").to_string()));
    }
    // a recognized period wins over explicit dates
    if let Some((from, to)) = params.period.and_then(|p| archive_period_range(p, today)) {
        out.retain(|(key, _)| *key != "fromDate" && *key != "toDate");
        out.push(("fromDate", from.format("%Y%m%d").to_string()));
        out.push(("toDate", to.format("%Y%m%d").to_string()));
    }
    out.push((
        "searchText",
        query.query_string.clone().unwrap_or_default(),
    ));
    out
}

/// The archive only understands the four backward-shift periods.
fn archive_period_range(period: Period, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = match period {
        Period::Day => today - Duration::days(1),
        Period::Week => today - Duration::days(7),
        Period::Month => today.checked_sub_months(Months::new(1)).unwrap_or(today),
        Period::Year => today.checked_sub_months(Months::new(12)).unwrap_or(today),
        _ => return None,
    };
    Some((start, today))
}

fn epoch_millis(value: Option<i64>) -> DateTime<Utc> {
    value
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}

fn component_text(doc: &ArchiveDoc, asset_type: &str) -> String {
    doc.news_components
        .iter()
        .find(|component| {
            component
                .asset_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(asset_type))
        })
        .and_then(|component| component.proxies.first())
        .and_then(|proxy| proxy.varchar_data.as_deref())
        .map(flatten_text)
        .unwrap_or_default()
}

/// Belga text payloads are mostly plain text with newlines; markup is
/// flattened to one line per block so the newlines survive.
pub(crate) fn flatten_text(value: &str) -> String {
    if value.contains('<') {
        block_texts(value).join("\n")
    } else {
        value.trim().to_string()
    }
}

/// The archive body keeps its paragraph indents when rendered as HTML.
fn indented_body(text: &str) -> String {
    format!("&nbsp;&nbsp;&nbsp;&nbsp;{text}").replace('\n', "<br/>&nbsp;&nbsp;&nbsp;&nbsp;")
}

fn archive_profile(asset_type: &str) -> String {
    let label = asset_type.to_lowercase();
    if label == "short" {
        "text".to_string()
    } else {
        label
    }
}

pub fn archive_to_item(doc: &ArchiveDoc) -> NewsItem {
    let guid = format!("{}{}", ARCHIVE_GUID_PREFIX, doc.news_object_id);
    let mut item = NewsItem::with_guid(ItemType::Text, guid.clone());
    item.mimetype = Some(TEXT_MIMETYPE.to_string());
    item.state = ContentState::Published;
    item.profile = doc
        .asset_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(archive_profile);
    item.headline = doc.head_line.as_deref().map(strip_tags);
    item.slugline = doc.topic.as_deref().map(strip_tags);
    item.description_text = doc.description.as_deref().map(strip_tags);
    item.versioncreated = Some(epoch_millis(doc.validate_date));
    item.firstcreated = Some(epoch_millis(doc.create_date));
    item.creditline = doc.credit.as_deref().map(strip_tags);
    item.source = doc.source.as_deref().map(strip_tags);
    item.language = doc.language.as_deref().map(strip_tags);
    item.abstract_text = Some(component_text(doc, "lead"));
    item.body_html = Some(indented_body(&component_text(doc, "body")));
    item.extra.bcoverage = Some(guid);
    item.fetchable = false;
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateRange;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn doc() -> ArchiveDoc {
        serde_json::from_value(serde_json::json!({
            "newsObjectId": 1510000,
            "assetType": "Short",
            "headLine": "Polen wil centra voor migranten",
            "topic": "migratie",
            "validateDate": 1581406800000i64,
            "createDate": 1581403200000i64,
            "credit": "BELGA",
            "source": "BELGA",
            "language": "nl",
            "newsComponents": [
                {"assetType": "Body", "proxies": [{"varcharData": "eerste regel\ntweede regel"}]},
                {"assetType": "Lead", "proxies": [{"varcharData": "de samenvatting"}]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn archive_doc_becomes_a_published_text_item() {
        let item = archive_to_item(&doc());
        assert_eq!(item.guid, "urn:belga.be:360archive:1510000");
        assert_eq!(item.state, ContentState::Published);
        assert_eq!(item.mimetype.as_deref(), Some(TEXT_MIMETYPE));
        assert_eq!(item.profile.as_deref(), Some("text"));
        assert_eq!(item.slugline.as_deref(), Some("migratie"));
        assert_eq!(item.abstract_text.as_deref(), Some("de samenvatting"));
        assert_eq!(
            item.body_html.as_deref(),
            Some(
                "&nbsp;&nbsp;&nbsp;&nbsp;eerste regel<br/>&nbsp;&nbsp;&nbsp;&nbsp;tweede regel"
            )
        );
        assert_eq!(
            item.versioncreated.unwrap().to_rfc3339(),
            "2020-02-11T07:40:00+00:00"
        );
        assert_eq!(
            item.extra.bcoverage.as_deref(),
            Some("urn:belga.be:360archive:1510000")
        );
        assert!(!item.fetchable);
    }

    #[test]
    fn asset_types_filter_and_join() {
        let query = SearchQuery::new(0, 25).with_text("migratie");
        let all = archive_search_params(&query, &SearchParams::default(), date(2020, 2, 14));
        assert!(all.contains(&("assetType", "Text OR Brieft OR Alert OR Short".to_string())));
        assert!(all.contains(&("searchText", "migratie".to_string())));

        let params = SearchParams {
            types: Some("alert".into()),
            languages: Some("NL".into()),
            credits: Some(" belga ".into()),
            ..Default::default()
        };
        let filtered = archive_search_params(&query, &params, date(2020, 2, 14));
        assert!(filtered.contains(&("assetType", "Alert".to_string())));
        assert!(filtered.contains(&("language", "nl".to_string())));
        assert!(filtered.contains(&("credits", "BELGA".to_string())));
    }

    #[test]
    fn period_overrides_explicit_dates() {
        let query = SearchQuery::new(0, 25);
        let params = SearchParams {
            period: Some(Period::Week),
            dates: DateRange {
                start: Some(date(2019, 1, 1)),
                end: Some(date(2019, 6, 1)),
            },
            ..Default::default()
        };
        let pairs = archive_search_params(&query, &params, date(2020, 2, 14));
        assert!(pairs.contains(&("fromDate", "20200207".to_string())));
        assert!(pairs.contains(&("toDate", "20200214".to_string())));
        assert!(!pairs.contains(&("fromDate", "20190101".to_string())));
    }

    #[test]
    fn day_period_reaches_one_day_back() {
        let range = archive_period_range(Period::Day, date(2020, 3, 1));
        assert_eq!(range, Some((date(2020, 2, 29), date(2020, 3, 1))));
        // the picture-only periods are not understood here
        assert_eq!(archive_period_range(Period::ThisWeek, date(2020, 3, 1)), None);
    }
}
