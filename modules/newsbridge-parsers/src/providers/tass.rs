//! TASS variant: Moscow wall-clock timestamps, double NewsComponent
//! nesting and keyword-driven products.

use std::sync::Arc;

use chrono_tz::Tz;

use newsbridge_core::error::Result;
use newsbridge_core::item::NewsItem;
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{
    base_parse_newscomponent, base_parse_newsitem, base_parse_newsmanagement, NewsmlOneParser,
};
use crate::xmltree::Element;

const MAPPING_PRODUCTS: &[(&str, &str)] = &[
    ("POLITICS", "NEWS/POLITICS"),
    ("ECONOMY", "NEWS/ECONOMY"),
];

pub struct TassNewsmlParser {
    vocab: Arc<VocabularyResolver>,
}

impl TassNewsmlParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }
}

impl NewsmlOneParser for TassNewsmlParser {
    fn name(&self) -> &'static str {
        "belga_tass_newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn can_parse(&self, root: &Element) -> bool {
        root.name == "NewsML" && root.attr("Version").unwrap_or("1.2") == "1.2"
    }

    fn naive_timezone(&self) -> Tz {
        chrono_tz::Europe::Moscow
    }

    fn parse_newsmanagement(
        &self,
        item: &mut NewsItem,
        manage_el: Option<&Element>,
    ) -> Result<()> {
        base_parse_newsmanagement(self, item, manage_el)?;
        // the feed only stamps FirstCreated reliably
        item.versioncreated = item.firstcreated;
        Ok(())
    }

    fn parse_newsitem(&self, item: &mut NewsItem, newsitem_el: &Element) -> Result<()> {
        base_parse_newsitem(self, item, newsitem_el)?;

        let product = item.keywords.iter().find_map(|keyword| {
            MAPPING_PRODUCTS
                .iter()
                .find(|(needle, _)| keyword.contains(needle))
                .map(|(_, product)| *product)
        });
        if !item.keywords.is_empty() {
            item.add_subject(Subject::service_product(product.unwrap_or("NEWS/GENERAL")));
        }
        item.add_subject(Subject::plain(SubjectScheme::Sources, "TASS"));
        Ok(())
    }

    fn parse_newscomponent(&self, item: &mut NewsItem, component_el: &Element) -> Result<()> {
        // the payload sits two components deep; attributes sit on the outer
        if let Some(inner) = component_el.find("NewsComponent/NewsComponent") {
            base_parse_newscomponent(self, item, inner)?;
        }
        if let Some(duid) = component_el.attr("Duid") {
            item.guid = duid.to_string();
            item.id = item.guid.clone();
        }
        if let Some(essential) = component_el.attr("Essential").filter(|v| !v.is_empty()) {
            item.add_subject(Subject::plain(SubjectScheme::Essential, essential));
        }
        if let Some(equivalents) = component_el
            .attr("EquivalentsList")
            .filter(|v| !v.is_empty())
        {
            item.add_subject(Subject::plain(SubjectScheme::EquivalentsList, equivalents));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::newsml12::test_fixtures::test_vocab;

    const TASS_DOC: &str = r#"<NewsML Version="1.2">
      <NewsItem>
        <Identification>
          <NewsIdentifier><NewsItemId>tass-1</NewsItemId></NewsIdentifier>
        </Identification>
        <NewsManagement>
          <FirstCreated>20190604T120000</FirstCreated>
          <Status FormalName="Usable"/>
        </NewsManagement>
        <NewsComponent Duid="03AE4325838900396A95" Essential="no" EquivalentsList="no">
          <NewsComponent Duid="03AE4325838900396A95">
            <NewsComponent xml:lang="en">
              <Role FormalName="Main"/>
              <NewsLines><HeadLine>Kremlin comments on economy</HeadLine></NewsLines>
              <DescriptiveMetadata>
                <Language FormalName="en"/>
                <Property FormalName="Keyword" Value="RUSSIA-ECONOMY-FORUM"/>
              </DescriptiveMetadata>
              <ContentItem>
                <MediaType FormalName="Text"/>
                <DataContent><nitf><body><body.content><p>Moscow speaks.</p></body.content></body></nitf></DataContent>
              </ContentItem>
            </NewsComponent>
          </NewsComponent>
        </NewsComponent>
      </NewsItem>
    </NewsML>"#;

    #[test]
    fn moscow_wall_clock_is_converted_to_utc() {
        let parser = TassNewsmlParser::new(test_vocab());
        let root = Element::parse(TASS_DOC.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let expected = Utc.with_ymd_and_hms(2019, 6, 4, 9, 0, 0).unwrap();
        assert_eq!(items[0].firstcreated, Some(expected));
        assert_eq!(items[0].versioncreated, Some(expected));
    }

    #[test]
    fn keywords_map_to_products_and_outer_duid_wins() {
        let parser = TassNewsmlParser::new(test_vocab());
        let root = Element::parse(TASS_DOC.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        assert_eq!(item.guid, "03AE4325838900396A95");
        assert!(item
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/ECONOMY"));
        assert!(item.subject.contains(SubjectScheme::Sources, "TASS"));
        assert!(item.subject.contains(SubjectScheme::Essential, "no"));
        assert_eq!(item.body_html.as_deref(), Some("<p>Moscow speaks.</p>"));
    }
}
