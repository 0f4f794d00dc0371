//! ATS (Swiss wire) variant: the content item lives one NewsComponent
//! deeper than the common shape.

use std::sync::Arc;

use newsbridge_core::error::Result;
use newsbridge_core::item::NewsItem;
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{base_parse_newscomponent, NewsmlOneParser};
use crate::xmltree::Element;

pub struct AtsNewsmlParser {
    vocab: Arc<VocabularyResolver>,
}

impl AtsNewsmlParser {
    pub fn new(vocab: Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }
}

impl NewsmlOneParser for AtsNewsmlParser {
    fn name(&self) -> &'static str {
        "belga_ats_newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn parse_newscomponent(&self, item: &mut NewsItem, component_el: &Element) -> Result<()> {
        base_parse_newscomponent(self, item, component_el)?;
        if let Some(content_el) = component_el.find("NewsComponent/ContentItem") {
            self.parse_contentitem(item, Some(content_el))?;
        }
        Ok(())
    }
}
