//! Search provider for the Belga Press monitoring archive. Auth is an
//! OAuth client-credentials grant against the Belga SSO.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use newsbridge_core::item::{ContentState, ItemType, NewsItem};
use newsbridge_core::text::strip_tags;

use crate::archive::flatten_text;
use crate::error::{Result, SearchError};
use crate::image::{http_client, parse_belga_datetime};
use crate::period::local_today;
use crate::types::{SearchParams, SearchQuery, SearchResult};

pub const PRESS_GUID_PREFIX: &str = "urn:belga.be:belgapress:";
const DEFAULT_BASE_URL: &str = "https://bp-api.ssl.belga.be/belgapress/api";
const DEFAULT_TOKEN_URL: &str =
    "https://sso.ssl.belga.be/auth/realms/belga/protocol/openid-connect/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressDoc {
    pub uuid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub word_count: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct PressMeta {
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PressSearchResponse {
    #[serde(default)]
    data: Vec<PressDoc>,
    #[serde(rename = "_meta", default)]
    meta: PressMeta,
}

/// Client for `newsobjects` and `newsobject/{uuid}`.
#[derive(Debug)]
pub struct BelgaPressClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    access_token: Option<String>,
    tz: chrono_tz::Tz,
}

impl BelgaPressClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: None,
            tz: chrono_tz::Europe::Brussels,
        }
    }

    pub fn with_urls(mut self, base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.token_url = token_url.into();
        self
    }

    /// Trade the client credentials for a bearer token.
    pub async fn authorize(&mut self) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}?scope=openid%20profile", self.token_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        let token: TokenResponse = resp.json().await?;
        self.access_token = token.access_token;
        tracing::debug!(client_id = %self.client_id, "belga press authorized");
        Ok(())
    }

    pub async fn find(&self, query: &SearchQuery, params: &SearchParams) -> Result<SearchResult> {
        let pairs = press_search_params(query, params, local_today(self.tz));
        let data: PressSearchResponse = self.api_get("newsobjects", &pairs).await?;
        let count = data.meta.total.unwrap_or(data.data.len() as u64);
        Ok(SearchResult {
            docs: data.data.iter().map(|doc| press_to_item(doc, self.tz)).collect(),
            count,
        })
    }

    pub async fn fetch(&self, guid: &str) -> Result<NewsItem> {
        let id = guid.strip_prefix(PRESS_GUID_PREFIX).unwrap_or(guid);
        let doc: PressDoc = self.api_get(&format!("newsobject/{id}"), &[]).await?;
        Ok(press_to_item(&doc, self.tz))
    }

    async fn api_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(SearchError::NotAuthenticated("belga press api"))?;
        let resp = self
            .http
            .get(format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint))
            .header("Authorization", format!("Bearer {token}"))
            .header("X-Belga-Context", "API")
            .query(params)
            .send()
            .await?;
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

pub(crate) fn press_search_params(
    query: &SearchQuery,
    params: &SearchParams,
    today: NaiveDate,
) -> Vec<(&'static str, String)> {
    let mut out = vec![
        ("offset", query.from.to_string()),
        ("count", query.size_or_default().to_string()),
    ];
    if let Some(types) = params.types.as_deref().filter(|s| !s.is_empty()) {
        out.push(("mediumtypegroup", types.to_string()));
    }
    if let Some(languages) = params.languages.as_deref().filter(|s| !s.is_empty()) {
        out.push(("language", languages.to_string()));
    }
    let period_range = params.period.map(|period| period.date_range(today));
    if let Some((from, to)) = period_range {
        out.push(("start", from.format("%Y-%m-%d").to_string()));
        out.push(("end", to.format("%Y-%m-%d").to_string()));
    }
    if let Some(start) = params.dates.start {
        // an explicit start only narrows a period, it never widens it
        let narrows = period_range.map_or(true, |(from, _)| start > from);
        if narrows {
            out.retain(|(key, _)| *key != "start");
            out.push(("start", start.format("%Y-%m-%d").to_string()));
        }
    }
    if let Some(end) = params.dates.end {
        out.retain(|(key, _)| *key != "end");
        out.push(("end", end.format("%Y-%m-%d").to_string()));
    }
    out.push((
        "order",
        if query.sort_ascending {
            "PUBLISHDATE".to_string()
        } else {
            "-PUBLISHDATE".to_string()
        },
    ));
    if let Some(text) = query.query_string.as_deref().filter(|s| !s.is_empty()) {
        out.push(("searchtext", text.to_string()));
    }
    out
}

pub fn press_to_item(doc: &PressDoc, tz: chrono_tz::Tz) -> NewsItem {
    let guid = format!("{}{}", PRESS_GUID_PREFIX, doc.uuid);
    let mut item = NewsItem::with_guid(ItemType::Text, guid);
    item.mimetype = Some(crate::archive::TEXT_MIMETYPE.to_string());
    item.state = ContentState::Published;
    item.headline = doc.title.as_deref().map(strip_tags);
    item.abstract_text = doc.lead.as_deref().map(strip_tags);
    item.body_html = doc.body.as_deref().map(flatten_text);
    let published = doc
        .publish_date
        .as_deref()
        .and_then(|value| parse_belga_datetime(value, tz));
    item.versioncreated = published;
    // the press archive never fills createDate
    item.firstcreated = published;
    item.source = doc.source.as_deref().map(strip_tags);
    item.language = doc.language.as_deref().map(strip_tags);
    item.word_count = doc.word_count;
    item.extra.bpress = Some(doc.uuid.clone());
    item.fetchable = false;
    item
}
