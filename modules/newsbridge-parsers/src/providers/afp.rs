//! AFP twist on the NewsML 1.2 kernel: legacy category mapping, urgent
//! headline synthesis and fixed credits.

use std::sync::Arc;

use newsbridge_core::error::Result;
use newsbridge_core::item::NewsItem;
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::text::first_paragraph;
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{base_parse_newsitem, NewsmlOneParser};
use crate::xmltree::Element;

const MAPPING_CATEGORY: &[(&str, &str)] = &[
    ("SPO", "NEWS/SPORTS"),
    ("POL", "NEWS/POLITICS"),
    ("ECO", "NEWS/ECONOMY"),
];

pub struct AfpNewsmlParser {
    vocab: Arc<VocabularyResolver>,
}

impl AfpNewsmlParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }
}

impl NewsmlOneParser for AfpNewsmlParser {
    fn name(&self) -> &'static str {
        "belga_afp_newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn parse_newsitem(&self, item: &mut NewsItem, newsitem_el: &Element) -> Result<()> {
        base_parse_newsitem(self, item, newsitem_el)?;

        // only the first legacy category decides the product
        let qcode = match item.anpa_category.first() {
            Some(category) => MAPPING_CATEGORY
                .iter()
                .find(|(cat, _)| *cat == category.qcode)
                .map(|(_, product)| *product)
                .unwrap_or("NEWS/GENERAL"),
            None => "NEWS/GENERAL",
        };
        item.add_subject(Subject::service_product(qcode));

        // urgent wires often arrive without a headline
        if matches!(item.urgency, Some(1) | Some(2)) && item.headline.is_none() {
            if let Some(first_line) = item.body_html.as_deref().and_then(first_paragraph) {
                item.headline = Some(format!("URGENT: {}", first_line.trim()));
            }
        }

        item.subject.remove_scheme(SubjectScheme::Label);
        item.add_subject(Subject::plain(SubjectScheme::Credits, "AFP"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsml12::test_fixtures::{test_vocab, AFP_STYLE_DOC};

    #[test]
    fn category_maps_to_one_product_and_label_is_dropped() {
        let parser = AfpNewsmlParser::new(test_vocab());
        let root = Element::parse(AFP_STYLE_DOC.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];

        let products: Vec<_> = item
            .subject
            .of_scheme(SubjectScheme::ServicesProducts)
            .map(|s| s.qcode.as_str())
            .collect();
        // first category is HUM, unmapped
        assert_eq!(products, vec!["NEWS/GENERAL"]);
        assert!(!item.subject.has_scheme(SubjectScheme::Label));
        assert!(item.subject.contains(SubjectScheme::Credits, "AFP"));
    }

    #[test]
    fn mapped_category_becomes_the_product() {
        let doc = AFP_STYLE_DOC.replace("cat=\"HUM\"", "cat=\"SPO\"");
        let parser = AfpNewsmlParser::new(test_vocab());
        let root = Element::parse(doc.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        assert!(items[0]
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/SPORTS"));
    }

    #[test]
    fn urgent_item_without_headline_takes_first_body_line() {
        let doc = AFP_STYLE_DOC
            .replace("<Urgency FormalName=\"4\"/>", "<Urgency FormalName=\"1\"/>")
            .replace(
                "<HeadLine xml:lang=\"fr\">Un an après, les fans de Johnny lui rendent hommage à Paris</HeadLine>",
                "",
            );
        let parser = AfpNewsmlParser::new(test_vocab());
        let root = Element::parse(doc.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        assert_eq!(
            items[0].headline.as_deref(),
            Some("URGENT: Un an après la mort de Johnny Hallyday, des fans lui rendent hommage.")
        );
    }
}
