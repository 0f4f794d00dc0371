use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::{Subject, SubjectScheme, SubjectSet};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Text,
    Picture,
    Graphic,
    Audio,
    Video,
    Event,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemType::Text => write!(f, "text"),
            ItemType::Picture => write!(f, "picture"),
            ItemType::Graphic => write!(f, "graphic"),
            ItemType::Audio => write!(f, "audio"),
            ItemType::Video => write!(f, "video"),
            ItemType::Event => write!(f, "event"),
        }
    }
}

impl ItemType {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "picture" | "photo" | "image" => Self::Picture,
            "graphic" => Self::Graphic,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "event" => Self::Event,
            _ => Self::Text,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(
            self,
            ItemType::Picture | ItemType::Graphic | ItemType::Audio | ItemType::Video
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PubStatus {
    #[default]
    Usable,
    Withheld,
    Canceled,
}

impl std::fmt::Display for PubStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PubStatus::Usable => write!(f, "usable"),
            PubStatus::Withheld => write!(f, "withheld"),
            PubStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl PubStatus {
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "withheld" | "embargoed" => Self::Withheld,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Usable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    Draft,
    Ingested,
    #[default]
    InProgress,
    Published,
    Corrected,
    Killed,
}

impl ContentState {
    /// Published and corrected items are the ones the outbound chain keeps.
    pub fn is_publishable(&self) -> bool {
        matches!(self, ContentState::Published | ContentState::Corrected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentFormat {
    #[default]
    Html,
    Preformatted,
    Nitf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HowPresent {
    Origin,
    Event,
}

// --- Editorial structures ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dateline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub role: String,
    /// Display label when the name field carries the role (ANSA meta authors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_label: Option<String>,
    /// Id of the stored user this author resolves to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub qcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Category {
    pub fn new(qcode: impl Into<String>) -> Self {
        Self {
            qcode: qcode.into(),
            name: None,
        }
    }
}

// --- Media ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenditionKind {
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "baseImage")]
    BaseImage,
    #[serde(rename = "thumbnail")]
    Thumbnail,
    #[serde(rename = "viewImage")]
    ViewImage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Blob store id for internally uploaded media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "belga-urn", default, skip_serializing_if = "Option::is_none")]
    pub belga_urn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Rendition {
    pub fn href(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Default::default()
        }
    }
}

pub type RenditionMap = BTreeMap<RenditionKind, Rendition>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

// --- Composition ---

/// An association slot either embeds the full item or references it by id;
/// the formatter hydrates references from the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Association {
    Full(Box<NewsItem>),
    Reference {
        id: String,
        #[serde(rename = "type")]
        item_type: ItemType,
    },
}

impl Association {
    pub fn item_type(&self) -> ItemType {
        match self {
            Association::Full(item) => item.item_type,
            Association::Reference { item_type, .. } => *item_type,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Association::Full(item) => &item.id,
            Association::Reference { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub attachment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BelgaUrl {
    pub guid: String,
    pub url: String,
    pub description: String,
}

impl BelgaUrl {
    /// Builds an entry with a fresh guid; the guid survives update and
    /// translation once assigned.
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4().to_string(),
            url: url.into(),
            description: description.into(),
        }
    }

    pub fn ensure_guid(&mut self) {
        if self.guid.is_empty() {
            self.guid = Uuid::new_v4().to_string();
        }
    }
}

/// Free-form side fields of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_present: Option<HowPresent>,
    /// Who is on a picture / in a video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
    /// Legacy comma-separated keyword field.
    #[serde(
        rename = "belga-keywords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub belga_keywords: Option<String>,
    #[serde(rename = "belga-url", default, skip_serializing_if = "Vec::is_empty")]
    pub belga_url: Vec<BelgaUrl>,
    /// External coverage URNs from `belga-coverage-*` custom fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coverages: Vec<String>,
    /// Self-reference a coverage search result carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcoverage: Option<String>,
    /// Press archive uuid a press search result carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpress: Option<String>,
}

// --- Ingest-side metadata ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Administrative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editorial_info: Option<String>,
}

impl Administrative {
    pub fn is_empty(&self) -> bool {
        self == &Administrative::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentFrom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociatedWith {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
}

// --- The item ---

/// The universal in-memory record every parser produces and the formatter
/// consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    // Identity
    pub id: String,
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub pubstatus: PubStatus,
    #[serde(default)]
    pub state: ContentState,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub format: ContentFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    // Lineage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewritten_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<String>,

    // Editorial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creditline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyrightholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dateline: Option<Dateline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ednote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,

    // Time (UTC instants)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstcreated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioncreated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstpublished: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embargo: Option<DateTime<Utc>>,

    // People
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_creator: Option<String>,

    // Classification
    #[serde(default, skip_serializing_if = "SubjectSet::is_empty")]
    pub subject: SubjectSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anpa_category: Vec<Category>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    #[serde(default)]
    pub extra: Extra,

    // Media
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renditions: RenditionMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filemeta: Option<FileMeta>,

    // Composition
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub associations: BTreeMap<String, Association>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,

    // Ingest-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_provider_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_head_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anpa_take_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anpa_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_source: Option<String>,
    #[serde(default, skip_serializing_if = "Administrative::is_empty")]
    pub administrative: Administrative,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentfrom: Option<SentFrom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_with: Option<AssociatedWith>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<Characteristics>,

    /// Search results are complete; consumers must not fetch them again.
    #[serde(rename = "_fetchable", default = "default_fetchable")]
    pub fetchable: bool,
}

fn default_fetchable() -> bool {
    true
}

impl NewsItem {
    pub fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            fetchable: true,
            ..Default::default()
        }
    }

    pub fn with_guid(item_type: ItemType, guid: impl Into<String>) -> Self {
        let guid = guid.into();
        Self {
            id: guid.clone(),
            guid,
            item_type,
            fetchable: true,
            ..Default::default()
        }
    }

    /// Set-insert into the subject set; duplicates on `(scheme, qcode)` are
    /// silently dropped.
    pub fn add_subject(&mut self, subject: Subject) -> bool {
        self.subject.add(subject)
    }

    /// Fill only the provided dateline fields, preserving the rest.
    pub fn set_dateline(
        &mut self,
        text: Option<String>,
        date: Option<DateTime<Utc>>,
        city: Option<String>,
    ) {
        let dateline = self.dateline.get_or_insert_with(Dateline::default);
        if text.is_some() {
            dateline.text = text;
        }
        if date.is_some() {
            dateline.date = date;
        }
        if city.is_some() {
            dateline.city = city;
        }
    }

    /// Guarantee exactly one `services-products` entry exists, adding
    /// `NEWS/GENERAL` when the source carried none.
    pub fn ensure_service_product(&mut self) {
        if !self.subject.has_scheme(SubjectScheme::ServicesProducts) {
            self.subject.add(Subject::service_product("NEWS/GENERAL"));
        }
    }

    pub fn is_publishable(&self) -> bool {
        self.state.is_publishable()
    }

    /// Generated item guid for items born outside a provider envelope.
    pub fn generate_guid() -> String {
        format!("urn:newsml:localhost:{}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_dateline_fills_only_provided_fields() {
        let mut item = NewsItem::new(ItemType::Text);
        item.set_dateline(Some("Paris, 9 déc 2018 (AFP) -".into()), None, None);
        item.set_dateline(None, None, Some("Paris".into()));
        let dateline = item.dateline.unwrap();
        assert_eq!(dateline.text.as_deref(), Some("Paris, 9 déc 2018 (AFP) -"));
        assert_eq!(dateline.city.as_deref(), Some("Paris"));
        assert!(dateline.date.is_none());
    }

    #[test]
    fn ensure_service_product_backfills_news_general() {
        let mut item = NewsItem::new(ItemType::Text);
        item.ensure_service_product();
        let entry = item
            .subject
            .first_of(SubjectScheme::ServicesProducts)
            .unwrap();
        assert_eq!(entry.qcode, "NEWS/GENERAL");
        assert_eq!(entry.parent.as_deref(), Some("NEWS"));

        // a second call must not duplicate
        item.ensure_service_product();
        assert_eq!(
            item.subject
                .of_scheme(SubjectScheme::ServicesProducts)
                .count(),
            1
        );
    }

    #[test]
    fn ensure_service_product_keeps_existing_entry() {
        let mut item = NewsItem::new(ItemType::Text);
        item.add_subject(Subject::service_product("NEWS/SPORTS"));
        item.ensure_service_product();
        let entries: Vec<_> = item
            .subject
            .of_scheme(SubjectScheme::ServicesProducts)
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].qcode, "NEWS/SPORTS");
    }

    #[test]
    fn association_reference_roundtrips() {
        let reference = Association::Reference {
            id: "urn:newsml:localhost:pic-1".into(),
            item_type: ItemType::Picture,
        };
        let json = serde_json::to_string(&reference).unwrap();
        let back: Association = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), "urn:newsml:localhost:pic-1");
        assert_eq!(back.item_type(), ItemType::Picture);
    }

    #[test]
    fn belga_url_keeps_assigned_guid() {
        let mut url = BelgaUrl::new("https://www.belga.be", "Belga");
        let guid = url.guid.clone();
        url.ensure_guid();
        assert_eq!(url.guid, guid);

        let mut blank = BelgaUrl {
            guid: String::new(),
            url: "https://example.com".into(),
            description: String::new(),
        };
        blank.ensure_guid();
        assert!(!blank.guid.is_empty());
    }
}
