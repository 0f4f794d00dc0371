//! ANSA delivers NITF documents. Metadata rides in head/meta tags and
//! timestamps are Rome wall-clock.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{Author, Category, ItemType, NewsItem};
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::vocab::VocabularyResolver;

use crate::xmltree::Element;

const PRIORITY_TABLE: &[(&str, i32)] = &[
    ("Flash", 1),
    ("Delayed", 2),
    ("Bulletin", 3),
    ("Urgent", 4),
    ("Routine", 5),
];

const MAPPING_PRODUCT: &[(&str, &str)] = &[("NS042", "English Media Service")];

const ANSA_PREFIX: &str = ">>>ANSA/";

pub struct AnsaNitfParser {
    vocab: Arc<VocabularyResolver>,
}

impl AnsaNitfParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }

    pub fn name(&self) -> &'static str {
        "belga_ansa_nitf"
    }

    pub fn can_parse(&self, root: &Element) -> bool {
        root.name == "nitf"
    }

    pub fn parse(&self, root: &Element) -> Result<NewsItem> {
        let mut item = NewsItem::with_guid(ItemType::Text, NewsItem::generate_guid());

        if let Some(head_el) = root.child("head") {
            self.parse_head(&mut item, head_el)?;
        }
        if let Some(body_el) = root.child("body") {
            self.parse_body(&mut item, body_el);
        }

        item.ensure_service_product();
        item.add_subject(Subject::plain(SubjectScheme::Distribution, "default"));
        item.slugline = None;
        item.keywords.clear();
        Ok(item)
    }

    fn parse_head(&self, item: &mut NewsItem, head_el: &Element) -> Result<()> {
        if let Some(issued) = head_el
            .find("docdata/date.issue")
            .and_then(|e| e.attr("norm"))
        {
            let issued = parse_rome_datetime(issued)?;
            item.firstcreated = Some(issued);
            item.versioncreated = Some(issued);
        }

        if let Some(headline) = head_el.find_text("title") {
            item.headline = Some(strip_ansa_prefix(&headline).to_string());
        }

        for meta_el in head_el.children_named("meta") {
            let name = meta_el.attr("name").unwrap_or_default();
            let content = meta_el.attr("content").unwrap_or_default();
            match name {
                "wordcount" => item.word_count = content.parse().ok(),
                "author" | "writer" => item.authors.push(Author {
                    id: None,
                    name: name.to_uppercase(),
                    role: name.to_uppercase(),
                    sub_label: Some(content.to_string()),
                    parent: None,
                }),
                "keyword" => {
                    item.keywords = vec![strip_ansa_prefix(content).to_string()];
                }
                "priority" => {
                    let priority = map_priority(content)?;
                    item.priority = Some(priority);
                    item.urgency = Some(priority);
                }
                "category" => {
                    let category = Category {
                        qcode: content.to_string(),
                        name: Some(content.to_string()),
                    };
                    if !item.anpa_category.contains(&category) {
                        item.anpa_category.push(category);
                    }
                }
                "product-id" => {
                    let prefix = content.get(..5).unwrap_or(content);
                    let product = MAPPING_PRODUCT
                        .iter()
                        .find(|(code, _)| *code == prefix)
                        .map(|(_, product)| *product)
                        .unwrap_or("English Media Service");
                    item.add_subject(Subject::named(
                        SubjectScheme::ServicesProducts,
                        product,
                        product,
                    ));
                }
                _ => {}
            }
        }

        // category and category_iptc metas both feed the IPTC subjects
        let codes: Vec<String> = head_el
            .children_named("meta")
            .filter(|m| matches!(m.attr("name"), Some("category_iptc") | Some("category")))
            .filter_map(|m| m.attr("content"))
            .map(str::to_string)
            .collect();
        for subject in self.vocab.map_iptc_subjects(codes.iter().map(String::as_str)) {
            item.add_subject(subject);
        }
        Ok(())
    }

    fn parse_body(&self, item: &mut NewsItem, body_el: &Element) {
        if let Some(city) = body_el.find_text("body.head/dateline/location") {
            item.set_dateline(None, None, Some(city));
        }
        if let Some(source) = body_el.find_text("body.head/distributor/org") {
            item.source = Some(source);
        }
        if let Some(byline) = body_el.find_text("body.head/byline") {
            item.byline = Some(byline);
        }

        let mut paragraphs = String::new();
        for p_el in body_el.find_all("body.content/block/p") {
            paragraphs.push_str(&p_el.outer_xml());
        }
        if !paragraphs.is_empty() {
            item.body_html = Some(paragraphs);
        }
    }
}

fn strip_ansa_prefix(text: &str) -> &str {
    text.strip_prefix(ANSA_PREFIX).unwrap_or(text).trim()
}

fn map_priority(letter: &str) -> Result<i32> {
    let name = match letter {
        "F" => "Flash",
        "D" => "Delayed",
        "B" => "Bulletin",
        "U" => "Urgent",
        "R" => "Routine",
        other => return Err(NewsbridgeError::parse(format!("bad priority {other:?}"))),
    };
    PRIORITY_TABLE
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
        .ok_or_else(|| NewsbridgeError::parse(format!("bad priority {letter:?}")))
}

/// `date.issue@norm` is Rome wall-clock in `%Y%m%dT%H%M%S` form.
fn parse_rome_datetime(raw: &str) -> Result<DateTime<Utc>> {
    let rome: Tz = chrono_tz::Europe::Rome;
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y%m%dT%H%M%S")
        .map_err(|_| NewsbridgeError::timestamp(raw))?;
    naive
        .and_local_timezone(rome)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| NewsbridgeError::timestamp(raw))
}
