//! DPA NewsML-G2 (2.0) feed. One newsMessage carries an itemSet of
//! newsItem trees with XHTML payloads.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{Author, Category, ContentFormat, ItemType, NewsItem, PubStatus};
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::vocab::VocabularyResolver;

use crate::xmltree::Element;

const MAPPING_CATEGORY: &[(&str, &str)] = &[
    ("F", "NEWS/ECONOMY"),
    ("WI", "NEWS/ECONOMY"),
    ("I", "NEWS/POLITICS"),
    ("PL", "NEWS/POLITICS"),
    ("KU", "NEWS/CULTURE"),
    ("S", "NEWS/SPORTS"),
    ("SP", "NEWS/SPORTS"),
];

pub fn category_product(letter: &str) -> Option<&'static str> {
    MAPPING_CATEGORY
        .iter()
        .find(|(code, _)| letter.eq_ignore_ascii_case(code))
        .map(|(_, product)| *product)
}

pub struct DpaNewsmlTwoParser {
    vocab: Arc<VocabularyResolver>,
}

impl DpaNewsmlTwoParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }

    pub fn name(&self) -> &'static str {
        "belga_dpa_newsml20"
    }

    pub fn can_parse(&self, root: &Element) -> bool {
        root.name == "newsMessage"
    }

    pub fn parse(&self, root: &Element) -> Result<Vec<NewsItem>> {
        let mut items = Vec::new();
        for item_set in root.children_named("itemSet") {
            for news_el in item_set.children_named("newsItem") {
                let item = self
                    .parse_item(news_el)
                    .map_err(|e| NewsbridgeError::Parse(format!("{}: {e}", self.name())))?;
                items.push(item);
            }
        }
        Ok(items)
    }

    fn parse_item(&self, news_el: &Element) -> Result<NewsItem> {
        let mut item = NewsItem::new(ItemType::Text);

        let uri = news_el.attr("guid").unwrap_or_default().to_string();
        let version = news_el.attr("version").unwrap_or("1");
        item.guid = format!("{uri}:{version}");
        item.id = item.guid.clone();
        item.item_id = Some(uri);
        item.version = version.parse().unwrap_or(1);
        item.format = ContentFormat::Html;

        if let Some(meta_el) = news_el.child("itemMeta") {
            self.parse_item_meta(&mut item, meta_el)?;
        }
        if let Some(meta_el) = news_el.child("contentMeta") {
            self.parse_content_meta(&mut item, meta_el)?;
        }
        if let Some(inline_el) = news_el.find("contentSet/inlineXML") {
            self.parse_inline_content(&mut item, inline_el);
        }

        // the publication date rides in the XHTML header, not itemMeta
        let published = news_el
            .descendants_named("time")
            .into_iter()
            .find(|t| t.attr("class") == Some("publicationDate"))
            .and_then(|t| t.attr("data-datetime"))
            .and_then(parse_iso_datetime);
        item.firstcreated = published.or(item.versioncreated);

        item.add_subject(Subject::plain(SubjectScheme::Credits, "DPA"));
        item.ensure_service_product();
        item.add_subject(Subject::plain(SubjectScheme::Distribution, "default"));
        item.slugline = None;
        item.keywords.clear();
        Ok(item)
    }

    fn parse_item_meta(&self, item: &mut NewsItem, meta_el: &Element) -> Result<()> {
        if let Some(class) = meta_el.child("itemClass").and_then(|e| e.attr("qcode")) {
            let kind = class.rsplit(':').next().unwrap_or(class);
            item.item_type = ItemType::from_str_loose(kind);
        }
        if let Some(created) = meta_el.child("versionCreated").and_then(Element::text_trimmed) {
            item.versioncreated = parse_iso_datetime(&created);
        }
        if let Some(status) = meta_el.child("pubStatus").and_then(|e| e.attr("qcode")) {
            let status = status.rsplit(':').next().unwrap_or(status);
            item.pubstatus = PubStatus::from_str_loose(status);
        }
        if let Some(ednote) = meta_el.child("edNote").and_then(Element::text_trimmed) {
            item.ednote = Some(ednote);
        }
        Ok(())
    }

    fn parse_content_meta(&self, item: &mut NewsItem, meta_el: &Element) -> Result<()> {
        if let Some(urgency) = meta_el.child("urgency").and_then(Element::text_trimmed) {
            let urgency: i32 = urgency
                .parse()
                .map_err(|_| NewsbridgeError::parse(format!("bad urgency {urgency:?}")))?;
            item.urgency = Some(if urgency == 4 { 3 } else { urgency });
        }
        item.language = meta_el
            .child("language")
            .and_then(|e| e.attr("tag"))
            .map(str::to_string);
        if let Some(headline) = meta_el.child("headline").and_then(Element::text_trimmed) {
            item.headline = Some(headline);
        }
        if let Some(by) = meta_el.child("by").and_then(Element::text_trimmed) {
            item.authors.push(Author {
                id: None,
                name: by.clone(),
                role: by,
                sub_label: None,
                parent: None,
            });
        }
        if let Some(dateline) = meta_el.child("dateline").and_then(Element::text_trimmed) {
            item.set_dateline(Some(dateline), None, None);
        }
        if let Some(credit) = meta_el.child("creditline").and_then(Element::text_trimmed) {
            item.creditline = Some(credit);
        }

        // display-role genre prefixes the headline
        let genre = meta_el
            .children_named("genre")
            .find(|g| g.attr("role").is_some_and(|r| r.contains("display")))
            .and_then(|g| g.child("name"))
            .and_then(Element::text_trimmed);
        if let Some(genre) = genre {
            if let Some(headline) = item.headline.take() {
                item.headline = Some(format!("({genre}): {headline}"));
            }
            item.genre = Some(genre);
        }

        self.parse_subjects(item, meta_el);
        Ok(())
    }

    fn parse_subjects(&self, item: &mut NewsItem, meta_el: &Element) {
        let mut iptc_codes = Vec::new();
        for subject_el in meta_el.children_named("subject") {
            let qcode = subject_el.attr("qcode").unwrap_or_default();
            match qcode.split_once(':') {
                Some(("subj", code)) => iptc_codes.push(code.to_string()),
                Some(("category", letter)) => {
                    item.anpa_category.push(Category::new(letter.to_uppercase()));
                    if let Some(product) = category_product(letter) {
                        item.add_subject(Subject::service_product(product));
                    }
                }
                _ => {}
            }
            // geoArea concepts carry the ISO country in a sameAs alias
            if subject_el.attr("type") == Some("cpnat:geoArea") {
                let code = subject_el
                    .find("sameAs/name")
                    .and_then(Element::text_trimmed)
                    .filter(|name| name.len() == 3);
                if let Some(code) = code {
                    item.extra.country = Some(code.clone());
                    if let Some(country) = self.vocab.get_country(&code) {
                        item.add_subject(country);
                    }
                }
            }
        }
        for subject in self.vocab.map_iptc_subjects(iptc_codes.iter().map(String::as_str)) {
            item.add_subject(subject);
        }
    }

    fn parse_inline_content(&self, item: &mut NewsItem, inline_el: &Element) {
        let body = inline_el
            .descendants_named("section")
            .into_iter()
            .find(|s| s.attr("class").is_some_and(|c| c.contains("main")))
            .or_else(|| inline_el.descendants_named("body").into_iter().next());
        if let Some(body) = body {
            item.body_html = Some(body.inner_xml().trim().to_string());
        }
    }
}

fn parse_iso_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsml12::test_fixtures::test_vocab;

    const DPA_DOC: &str = r#"<newsMessage xmlns="http://iptc.org/std/nar/2006-10-01/">
      <header><sent>2019-06-03T15:00:01+02:00</sent></header>
      <itemSet>
        <newsItem guid="urn:newsml:dpa.com:20090101:190603-99-492251" version="3">
          <itemMeta>
            <itemClass qcode="ninat:text"/>
            <versionCreated>2019-06-03T15:00:01+02:00</versionCreated>
            <pubStatus qcode="stat:usable"/>
          </itemMeta>
          <contentMeta>
            <urgency>4</urgency>
            <language tag="de"/>
            <genre qcode="dpatextgenre:26" role="genrerole:display"><name>Zusammenfassung</name></genre>
            <subject type="cpnat:abstract" qcode="subj:11017000"><name>Migration</name></subject>
            <subject type="cpnat:abstract" qcode="category:pl"/>
            <subject type="cpnat:geoArea"><name>Griechenland</name><sameAs qcode="iso3166-1a3:GRC"><name>GRC</name></sameAs></subject>
            <headline>Mehr als 200 Migranten aufgegriffen</headline>
            <dateline>Athen (dpa) -</dateline>
            <creditline>dpa</creditline>
          </contentMeta>
          <contentSet>
            <inlineXML contenttype="application/xhtml+xml">
              <html xmlns="http://www.w3.org/1999/xhtml">
                <body>
                  <header><time class="publicationDate" data-datetime="2019-06-03T14:00:01+02:00"/></header>
                  <section class="main"><p>Athen (dpa) - Ungeachtet der Vereinbarung.</p></section>
                </body>
              </html>
            </inlineXML>
          </contentSet>
        </newsItem>
      </itemSet>
    </newsMessage>"#;

    #[test]
    fn guid_carries_the_version_and_urgency_is_clamped() {
        let parser = DpaNewsmlTwoParser::new(test_vocab());
        let root = Element::parse(DPA_DOC.as_bytes()).unwrap();
        assert!(parser.can_parse(&root));
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        assert_eq!(item.guid, "urn:newsml:dpa.com:20090101:190603-99-492251:3");
        assert_eq!(item.version, 3);
        assert_eq!(item.urgency, Some(3));
        assert_eq!(item.language.as_deref(), Some("de"));
    }

    #[test]
    fn display_genre_prefixes_the_headline() {
        let parser = DpaNewsmlTwoParser::new(test_vocab());
        let root = Element::parse(DPA_DOC.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        assert_eq!(
            items[0].headline.as_deref(),
            Some("(Zusammenfassung): Mehr als 200 Migranten aufgegriffen")
        );
    }

    #[test]
    fn category_letter_and_geo_area_map_into_subjects() {
        let parser = DpaNewsmlTwoParser::new(test_vocab());
        let root = Element::parse(DPA_DOC.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        assert_eq!(item.anpa_category[0].qcode, "PL");
        assert!(item
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/POLITICS"));
        assert!(item.subject.contains(SubjectScheme::Credits, "DPA"));
        assert!(item.subject.contains(SubjectScheme::Distribution, "default"));
        assert_eq!(item.extra.country.as_deref(), Some("GRC"));
    }

    #[test]
    fn publication_date_in_the_xhtml_header_becomes_firstcreated() {
        let parser = DpaNewsmlTwoParser::new(test_vocab());
        let root = Element::parse(DPA_DOC.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        assert_eq!(
            item.firstcreated.map(|d| d.to_rfc3339()),
            Some("2019-06-03T12:00:01+00:00".to_string())
        );
        assert_eq!(
            item.body_html.as_deref(),
            Some("<p>Athen (dpa) - Ungeachtet der Vereinbarung.</p>")
        );
    }
}
