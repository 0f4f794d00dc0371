//! EFE (Spanish wire) variant: the category rides in a NITF meta tag.

use std::sync::Arc;

use newsbridge_core::error::Result;
use newsbridge_core::item::{Category, NewsItem};
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{base_parse_contentitem, NewsmlOneParser};
use crate::xmltree::Element;

pub struct EfeNewsmlParser {
    vocab: Arc<VocabularyResolver>,
}

impl EfeNewsmlParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }
}

impl NewsmlOneParser for EfeNewsmlParser {
    fn name(&self) -> &'static str {
        "belga_efe_newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn parse_contentitem(&self, item: &mut NewsItem, content_el: Option<&Element>) -> Result<()> {
        base_parse_contentitem(self, item, content_el)?;
        let Some(content_el) = content_el else {
            return Ok(());
        };

        let qcode = content_el
            .find("DataContent/nitf/head")
            .map(|head| {
                head.children_named("meta")
                    .find(|meta| meta.attr("name") == Some("categoria"))
                    .and_then(|meta| meta.attr("content"))
                    .unwrap_or("GENERAL")
            })
            .unwrap_or("GENERAL");

        let name = self
            .vocab
            .get_items("categories")
            .into_iter()
            .find(|cv| cv.qcode.eq_ignore_ascii_case(qcode))
            .map(|cv| cv.name)
            .unwrap_or_else(|| "GENERAL".to_string());

        item.anpa_category.push(Category::new(qcode.to_uppercase()));
        item.add_subject(Subject::plain(SubjectScheme::NewsProducts, name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newsml12::test_fixtures::test_vocab;

    #[test]
    fn categoria_meta_maps_through_the_categories_cv() {
        let doc = r#"<NewsML>
          <NewsItem>
            <Identification><NewsIdentifier><NewsItemId>efe-1</NewsItemId></NewsIdentifier></Identification>
            <NewsComponent>
              <ContentItem>
                <MediaType FormalName="Text"/>
                <DataContent>
                  <nitf>
                    <head><meta name="categoria" content="pol"/></head>
                    <body><body.content><p>Madrid.</p></body.content></body>
                  </nitf>
                </DataContent>
              </ContentItem>
            </NewsComponent>
          </NewsItem>
        </NewsML>"#;
        let parser = EfeNewsmlParser::new(test_vocab());
        let root = Element::parse(doc.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        let item = &items[0];
        assert_eq!(item.anpa_category[0].qcode, "POL");
        assert!(item
            .subject
            .contains(SubjectScheme::NewsProducts, "POLITICS"));
    }

    #[test]
    fn missing_categoria_falls_back_to_general() {
        let doc = r#"<NewsML>
          <NewsItem>
            <Identification><NewsIdentifier><NewsItemId>efe-2</NewsItemId></NewsIdentifier></Identification>
            <NewsComponent>
              <ContentItem>
                <DataContent><nitf><body><body.content><p>Madrid.</p></body.content></body></nitf></DataContent>
              </ContentItem>
            </NewsComponent>
          </NewsItem>
        </NewsML>"#;
        let parser = EfeNewsmlParser::new(test_vocab());
        let root = Element::parse(doc.as_bytes()).unwrap();
        let items = parser.parse(&root).unwrap();
        assert!(items[0]
            .subject
            .contains(SubjectScheme::NewsProducts, "GENERAL"));
    }
}
