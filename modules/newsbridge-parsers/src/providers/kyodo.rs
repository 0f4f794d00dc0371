//! Kyodo NewsML variant: the dateline city rides in the NITF body head.

use std::sync::Arc;

use newsbridge_core::error::Result;
use newsbridge_core::item::NewsItem;
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{base_parse, NewsmlOneParser};
use crate::xmltree::Element;

pub struct KyodoNewsmlParser {
    vocab: Arc<VocabularyResolver>,
}

impl KyodoNewsmlParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }
}

impl NewsmlOneParser for KyodoNewsmlParser {
    fn name(&self) -> &'static str {
        "belga_kyodo_newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn parse(&self, root: &Element) -> Result<Vec<NewsItem>> {
        let mut items = base_parse(self, root)?;
        let city = root
            .find("NewsItem/NewsComponent/ContentItem/DataContent/nitf/body/body.head/dateline/location")
            .and_then(Element::text_trimmed);
        if let Some(city) = city {
            for item in &mut items {
                item.extra.city = Some(city.clone());
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsml12::test_fixtures::test_vocab;

    #[test]
    fn body_head_dateline_location_becomes_the_city() {
        let doc = r#"<NewsML>
          <NewsItem>
            <Identification><NewsIdentifier><NewsItemId>kyodo-1</NewsItemId></NewsIdentifier></Identification>
            <NewsComponent>
              <ContentItem>
                <MediaType FormalName="Text"/>
                <DataContent>
                  <nitf>
                    <body>
                      <body.head><dateline><location>TOKYO</location></dateline></body.head>
                      <body.content><p>Quake update.</p></body.content>
                    </body>
                  </nitf>
                </DataContent>
              </ContentItem>
            </NewsComponent>
          </NewsItem>
        </NewsML>"#;
        let parser = KyodoNewsmlParser::new(test_vocab());
        let root = Element::parse(doc.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        assert_eq!(items[0].extra.city.as_deref(), Some("TOKYO"));
    }
}
