//! Belga's own NewsML 1.2 flavor, plus the remote and tip feeds. Every
//! 2nd-level NewsComponent is a separate item whose guid is the digest of
//! its serialized subtree, so re-ingesting the same payload is idempotent.

use std::sync::Arc;

use md5::{Digest, Md5};

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::NewsItem;
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::text::plain_to_html;
use newsbridge_core::vocab::VocabularyResolver;

use crate::newsml12::{
    base_parse_administrative, base_parse_descriptive, base_parse_newslines, NewsmlOneParser,
};
use crate::xmltree::Element;

pub struct BelgaNewsmlParser {
    vocab: Arc<VocabularyResolver>,
    name: &'static str,
    supported_roles: &'static [&'static str],
}

impl BelgaNewsmlParser {
    /// The regular Belga feed.
    pub fn belga(vocab: Arc<VocabularyResolver>) -> Self {
        Self {
            vocab,
            name: "belganewsml12",
            supported_roles: &["ALERT", "SHORT", "TEXT", "BRIEF"],
        }
    }

    /// Remote-bureau feed; also carries ORIGINAL components.
    pub fn remote(vocab: Arc<VocabularyResolver>) -> Self {
        Self {
            vocab,
            name: "belga_remote_newsml12",
            supported_roles: &["ALERT", "SHORT", "TEXT", "BRIEF", "ORIGINAL"],
        }
    }

    /// Tip-off feed; TIP components only.
    pub fn tip(vocab: Arc<VocabularyResolver>) -> Self {
        Self {
            vocab,
            name: "belgatipnewsml12",
            supported_roles: &["TIP"],
        }
    }

    fn parse_component(&self, item: &mut NewsItem, component_el: &Element) -> Result<()> {
        let role = component_el
            .formal_name("Role")
            .filter(|r| !r.is_empty())
            .ok_or_else(|| NewsbridgeError::skip("NewsComponent/Role was not found"))?;
        if !self.supported_roles.contains(&role.to_uppercase().as_str()) {
            return Err(NewsbridgeError::skip(format!(
                "NewsComponent/Role/FormalName is not supported: {role:?}"
            )));
        }
        item.role = Some(role.to_string());
        item.language = component_el.attr("lang").map(str::to_string);

        base_parse_newslines(self, item, component_el.child("NewsLines"));
        base_parse_administrative(self, item, component_el.child("AdministrativeMetadata"));
        base_parse_descriptive(self, item, component_el.child("DescriptiveMetadata"));

        for (formal_name, is_body) in [("Body", true), ("Title", false), ("Lead", false)] {
            let component = component_el.children_named("NewsComponent").find(|nc| {
                nc.formal_name("Role") == Some(formal_name)
            });
            let Some(component) = component else { continue };

            let data_content = component.find("ContentItem/DataContent");
            let format = component.find("ContentItem/Format");
            let (Some(data_content), Some(_)) = (data_content, format) else {
                return Err(NewsbridgeError::skip("Format or DataContent was not found"));
            };
            if let Some(text) = data_content.text_trimmed() {
                match formal_name {
                    "Body" if is_body => item.body_html = Some(plain_to_html(&text)),
                    "Title" => item.headline = Some(text),
                    _ => item.abstract_text = Some(text),
                }
            }
        }
        if item.body_html.is_none() {
            item.body_html = item.headline.clone();
        }
        Ok(())
    }
}

fn component_digest(component_el: &Element) -> String {
    let mut hasher = Md5::new();
    hasher.update(component_el.outer_xml().as_bytes());
    hex::encode(hasher.finalize())
}

impl NewsmlOneParser for BelgaNewsmlParser {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }

    fn parse(&self, root: &Element) -> Result<Vec<NewsItem>> {
        let envelope_seed = self.parse_envelope(root.child("NewsEnvelope"));
        let mut items = Vec::new();
        for newsitem_el in root.children_named("NewsItem") {
            let mut seed = envelope_seed.clone();
            self.parse_identification(&mut seed, newsitem_el.child("Identification"));
            self.parse_newsmanagement(&mut seed, newsitem_el.child("NewsManagement"))
                .map_err(|e| NewsbridgeError::Parse(format!("{}: {e}", self.name)))?;

            let Some(first_level) = newsitem_el.child("NewsComponent") else {
                continue;
            };
            // genre applies to every component of this item
            for genre_el in first_level.find_all("DescriptiveMetadata/Genre") {
                if let Some(genre) = genre_el.attr("FormalName").filter(|g| !g.is_empty()) {
                    seed.add_subject(Subject::plain(SubjectScheme::Genre, genre));
                }
            }

            for component_el in first_level.children_named("NewsComponent") {
                let mut item = seed.clone();
                let digest = component_digest(component_el);
                item.guid = digest.clone();
                item.id = digest;

                match self.parse_component(&mut item, component_el) {
                    Ok(()) => {}
                    Err(NewsbridgeError::SkipItem(reason)) => {
                        tracing::warn!(parser = self.name, reason, "skipping component");
                        continue;
                    }
                    Err(e) => {
                        return Err(NewsbridgeError::Parse(format!("{}: {e}", self.name)));
                    }
                }
                self.finalize(&mut item);
                items.push(item);
            }
        }
        Ok(items)
    }
}
