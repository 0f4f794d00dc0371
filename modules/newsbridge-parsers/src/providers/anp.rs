//! ANP (Dutch wire) variant: genre-driven products, keyword-line CV
//! matching with original-metadata splitting, and body-derived city.

use std::sync::Arc;

use regex::Regex;

use newsbridge_core::error::Result;
use newsbridge_core::item::NewsItem;
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::text::strip_tags;
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{base_parse_newsitem, NewsmlOneParser};
use crate::xmltree::Element;

const MAPPING_GENRE: &[(&str, &str)] = &[
    ("ECONOMIE", "NEWS/ECONOMY"),
    ("BOURSE", "NEWS/ECONOMY"),
    ("FINANCE", "NEWS/ECONOMY"),
    ("SPORT", "NEWS/SPORTS"),
    ("POLITIEK", "NEWS/POLITICS"),
];

pub struct AnpNewsmlParser {
    vocab: Arc<VocabularyResolver>,
    city_re: Regex,
}

impl AnpNewsmlParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self {
            vocab,
            city_re: Regex::new(r"([A-Z][A-Za-z ]+)\s*\(\s*[A-Z/]+\s*\)")
                .unwrap_or_else(|e| panic!("city pattern: {e}")),
        }
    }
}

impl NewsmlOneParser for AnpNewsmlParser {
    fn name(&self) -> &'static str {
        "belga_anp_newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn parse_newsitem(&self, item: &mut NewsItem, newsitem_el: &Element) -> Result<()> {
        base_parse_newsitem(self, item, newsitem_el)?;

        let genre_product = item
            .subject
            .first_of(SubjectScheme::Genre)
            .and_then(|genre| {
                let upper = genre.qcode.to_uppercase();
                MAPPING_GENRE
                    .iter()
                    .find(|(needle, _)| upper.contains(needle))
                    .map(|(_, product)| *product)
            });
        if let Some(product) = genre_product {
            item.add_subject(Subject::service_product(product));
        }

        item.add_subject(Subject::plain(SubjectScheme::Sources, "ANP"));

        // KeywordLine entries go through the belga-keywords CV; unmatched
        // compound entries are split into their parts
        if let Some(keyword_line) = item.extra.belga_keywords.clone() {
            for raw in keyword_line.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                for subject in self.vocab.get_keywords(raw) {
                    if subject.scheme == SubjectScheme::OriginalMetadata
                        && (subject.qcode.contains(';') || subject.qcode.contains('-'))
                    {
                        for part in subject
                            .qcode
                            .split([';', '-'])
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                        {
                            item.add_subject(Subject::plain(SubjectScheme::BelgaKeywords, part));
                        }
                    } else {
                        item.add_subject(subject);
                    }
                }
            }
        }

        if item.extra.city.is_none() {
            if let Some(body) = item.body_html.as_deref() {
                if let Some(captures) = self.city_re.captures(&strip_tags(body)) {
                    item.extra.city = Some(captures[1].trim().to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsml12::test_fixtures::{test_vocab, AFP_STYLE_DOC};

    fn anp_doc() -> String {
        AFP_STYLE_DOC
            .replace(
                "<DescriptiveMetadata>\n        <Language FormalName=\"fr\"/>",
                "<DescriptiveMetadata>\n        <Language FormalName=\"nl\"/>\n        <Genre FormalName=\"Economie nieuws\"/>",
            )
            .replace(
                "</NewsLines>",
                "<KeywordLine>brief, binnenland-buitenland</KeywordLine>\n      </NewsLines>",
            )
            .replace(
                "<Property FormalName=\"City\" Value=\"Paris\"/>",
                "",
            )
    }

    #[test]
    fn genre_decides_the_product_and_source_is_anp() {
        let parser = AnpNewsmlParser::new(test_vocab());
        let root = Element::parse(anp_doc().as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        assert!(item
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/ECONOMY"));
        assert!(item.subject.contains(SubjectScheme::Sources, "ANP"));
    }

    #[test]
    fn unmatched_compound_keywords_are_split() {
        let parser = AnpNewsmlParser::new(test_vocab());
        let root = Element::parse(anp_doc().as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        // "brief" matches the CV, the compound entry is split
        assert!(item.subject.contains(SubjectScheme::BelgaKeywords, "BRIEF"));
        assert!(item
            .subject
            .contains(SubjectScheme::BelgaKeywords, "binnenland"));
        assert!(item
            .subject
            .contains(SubjectScheme::BelgaKeywords, "buitenland"));
    }

    #[test]
    fn city_is_pulled_from_the_body_when_missing() {
        let doc = anp_doc().replace(
            "<p>Un an après la mort de Johnny Hallyday, des fans lui rendent hommage.</p>",
            "<p>AMSTERDAM (ANP) - Het kabinet overlegt vandaag.</p>",
        );
        let parser = AnpNewsmlParser::new(test_vocab());
        let root = Element::parse(doc.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        assert_eq!(items[0].extra.city.as_deref(), Some("AMSTERDAM"));
    }
}
