//! NewsML 1.2 parser kernel. Walks the common document shape
//! (`NewsEnvelope`, `NewsItem`, `Identification`, `NewsManagement`, nested
//! `NewsComponent`s) into canonical items. Provider variants override the
//! phase methods they need; each phase's common behavior lives in a
//! `base_*` function an override can delegate to.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{
    AssociatedWith, Category, Characteristics, ContentFormat, HowPresent, ItemType, NewsItem,
    PubStatus, SentFrom,
};
use newsbridge_core::subject::{Subject, SubjectScheme};
use newsbridge_core::vocab::VocabularyResolver;

use crate::xmltree::Element;

/// Timestamp in any of the NewsML 1.2 wire shapes: with numeric offset,
/// with a trailing `Z`, or naive (interpreted in `naive_tz`).
pub fn parse_newsml_datetime(raw: &str, naive_tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_str(raw, "%Y%m%dT%H%M%S%z") {
        return Some(with_offset.with_timezone(&Utc));
    }
    let naive_raw = raw.strip_suffix('Z').unwrap_or(raw);
    let naive = NaiveDateTime::parse_from_str(naive_raw, "%Y%m%dT%H%M%S").ok()?;
    if raw.ends_with('Z') {
        return Some(Utc.from_utc_datetime(&naive));
    }
    naive_tz
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

pub trait NewsmlOneParser: Send + Sync {
    fn name(&self) -> &'static str;

    fn vocab(&self) -> &VocabularyResolver;

    fn can_parse(&self, root: &Element) -> bool {
        root.name == "NewsML"
    }

    /// Timezone naive timestamps are interpreted in.
    fn naive_timezone(&self) -> Tz {
        chrono_tz::UTC
    }

    fn parse_datetime(&self, raw: &str) -> Option<DateTime<Utc>> {
        parse_newsml_datetime(raw, self.naive_timezone())
    }

    /// Parse a whole document into items, one per `NewsItem` element.
    /// An item may self-skip; any other failure aborts the document.
    fn parse(&self, root: &Element) -> Result<Vec<NewsItem>> {
        base_parse(self, root)
    }

    fn parse_envelope(&self, envelope_el: Option<&Element>) -> NewsItem {
        base_parse_envelope(self, envelope_el)
    }

    fn parse_newsitem(&self, item: &mut NewsItem, newsitem_el: &Element) -> Result<()> {
        base_parse_newsitem(self, item, newsitem_el)
    }

    fn parse_identification(&self, item: &mut NewsItem, ident_el: Option<&Element>) {
        base_parse_identification(self, item, ident_el)
    }

    fn parse_newsmanagement(&self, item: &mut NewsItem, manage_el: Option<&Element>) -> Result<()> {
        base_parse_newsmanagement(self, item, manage_el)
    }

    fn parse_newscomponent(&self, item: &mut NewsItem, component_el: &Element) -> Result<()> {
        base_parse_newscomponent(self, item, component_el)
    }

    fn parse_newslines(&self, item: &mut NewsItem, newslines_el: Option<&Element>) {
        base_parse_newslines(self, item, newslines_el)
    }

    fn parse_administrative(&self, item: &mut NewsItem, admin_el: Option<&Element>) {
        base_parse_administrative(self, item, admin_el)
    }

    fn parse_descriptive(&self, item: &mut NewsItem, descript_el: Option<&Element>) {
        base_parse_descriptive(self, item, descript_el)
    }

    fn parse_contentitem(&self, item: &mut NewsItem, content_el: Option<&Element>) -> Result<()> {
        base_parse_contentitem(self, item, content_el)
    }

    /// Applied to every parsed item before it is handed back.
    fn finalize(&self, item: &mut NewsItem) {
        base_finalize(self, item)
    }
}

pub fn base_parse<P: NewsmlOneParser + ?Sized>(
    parser: &P,
    root: &Element,
) -> Result<Vec<NewsItem>> {
    let seed = parser.parse_envelope(root.child("NewsEnvelope"));
    let mut items = Vec::new();
    for newsitem_el in root.children_named("NewsItem") {
        let mut item = seed.clone();
        match parser.parse_newsitem(&mut item, newsitem_el) {
            Ok(()) => {}
            Err(NewsbridgeError::SkipItem(reason)) => {
                tracing::warn!(parser = parser.name(), reason, "skipping item");
                continue;
            }
            Err(e) => {
                return Err(NewsbridgeError::Parse(format!("{}: {e}", parser.name())));
            }
        }
        parser.finalize(&mut item);
        items.push(item);
    }
    Ok(items)
}

pub fn base_parse_envelope<P: NewsmlOneParser + ?Sized>(
    _parser: &P,
    envelope_el: Option<&Element>,
) -> NewsItem {
    let mut item = NewsItem::new(ItemType::Text);
    let Some(envelope_el) = envelope_el else {
        return item;
    };

    item.ingest_provider_sequence = envelope_el.find_text("TransmissionId");
    if let Some(priority) = envelope_el.formal_name("Priority") {
        item.priority = priority.parse().ok();
    }

    if let Some(sentfrom_el) = envelope_el.child("SentFrom") {
        let mut sentfrom = SentFrom {
            comment: sentfrom_el.find_text("Comment"),
            ..Default::default()
        };
        if let Some(party_el) = sentfrom_el.child("Party") {
            sentfrom.party = Some(party_el.attr("FormalName").unwrap_or_default().to_string());
            for property in party_el.children_named("Property") {
                if property.attr("FormalName") == Some("Organization") {
                    sentfrom.organization = property.attr("Value").map(str::to_string);
                }
            }
        }
        item.sentfrom = Some(sentfrom);
    }
    item
}

pub fn base_parse_newsitem<P: NewsmlOneParser + ?Sized>(
    parser: &P,
    item: &mut NewsItem,
    newsitem_el: &Element,
) -> Result<()> {
    if let Some(duid) = newsitem_el.attr("Duid").filter(|d| !d.is_empty()) {
        item.duid = Some(duid.to_string());
    }
    if let Some(link_type) = newsitem_el.attr("LinkType").filter(|l| !l.is_empty()) {
        item.add_subject(Subject::plain(SubjectScheme::LinkType, link_type));
    }

    parser.parse_identification(item, newsitem_el.child("Identification"));
    parser.parse_newsmanagement(item, newsitem_el.child("NewsManagement"))?;
    if let Some(component_el) = newsitem_el.child("NewsComponent") {
        parser.parse_newscomponent(item, component_el)?;
    }
    Ok(())
}

pub fn base_parse_identification<P: NewsmlOneParser + ?Sized>(
    _parser: &P,
    item: &mut NewsItem,
    ident_el: Option<&Element>,
) {
    let Some(ident_el) = ident_el else { return };

    if let Some(newsident_el) = ident_el.child("NewsIdentifier") {
        if let Some(provider_id) = newsident_el.find_text("ProviderId") {
            item.provider_id = Some(provider_id);
        }
        if let Some(date_id) = newsident_el.find_text("DateId") {
            item.date_id = Some(date_id);
        }
        if let Some(news_item_id) = newsident_el.find_text("NewsItemId") {
            item.guid = news_item_id.clone();
            item.item_id = Some(news_item_id);
        }
        if let Some(revision) = newsident_el.find_text("RevisionId") {
            item.version = revision.parse().unwrap_or(0);
        }
        if let Some(public_identifier) = newsident_el.find_text("PublicIdentifier") {
            item.guid = public_identifier;
        }
        item.id = item.guid.clone();
    }

    if let Some(label) = ident_el.find_text("NameLabel") {
        item.add_subject(Subject::plain(SubjectScheme::Label, label));
    }
}

pub fn base_parse_newsmanagement<P: NewsmlOneParser + ?Sized>(
    parser: &P,
    item: &mut NewsItem,
    manage_el: Option<&Element>,
) -> Result<()> {
    let Some(manage_el) = manage_el else {
        return Ok(());
    };

    if let Some(raw) = manage_el.find_text("FirstCreated") {
        item.firstcreated = parser.parse_datetime(&raw);
    }
    if let Some(raw) = manage_el.find_text("ThisRevisionCreated") {
        item.versioncreated = parser.parse_datetime(&raw);
    }
    if let Some(status) = manage_el.formal_name("Status") {
        item.pubstatus = PubStatus::from_str_loose(status);
    }
    if let Some(urgency_el) = manage_el.child("Urgency") {
        let raw = match urgency_el.attr("FormalName").filter(|u| !u.is_empty()) {
            Some(formal_name) => formal_name.to_string(),
            None => urgency_el.text_trimmed().unwrap_or_default(),
        };
        item.urgency = Some(
            raw.parse()
                .map_err(|_| NewsbridgeError::parse(format!("bad urgency {raw:?}")))?,
        );
    }

    let associated: Vec<&Element> = manage_el.children_named("AssociatedWith").collect();
    if !associated.is_empty() {
        let mut associated_with = AssociatedWith::default();
        for element in associated {
            associated_with.item = element
                .attr("NewsItem")
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            if let Some(formal_name) = element.attr("FormalName") {
                associated_with.types.push(formal_name.to_string());
            }
        }
        item.associated_with = Some(associated_with);
    }
    Ok(())
}

pub fn base_parse_newscomponent<P: NewsmlOneParser + ?Sized>(
    parser: &P,
    item: &mut NewsItem,
    component_el: &Element,
) -> Result<()> {
    if let Some(duid) = component_el.attr("Duid") {
        if item.guid.is_empty() {
            item.guid = duid.to_string();
            item.id = item.guid.clone();
        }
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
    if let Some(role) = component_el.formal_name("Role").filter(|r| !r.is_empty()) {
        item.role = Some(role.to_string());
    }

    parser.parse_newslines(item, component_el.child("NewsLines"));
    parser.parse_administrative(item, component_el.child("AdministrativeMetadata"));

    // some feeds misspell the element
    let descriptive_el = component_el
        .child("DescriptiveMetadata")
        .or_else(|| component_el.child("DescriptiveMetada"));
    parser.parse_descriptive(item, descriptive_el);

    parser.parse_contentitem(item, component_el.child("ContentItem"))?;

    if let Some(keywords_el) = component_el.child("item_keywords") {
        item.keywords = keywords_el
            .children_named("item_keyword")
            .filter_map(Element::text_trimmed)
            .collect();
    }
    Ok(())
}

pub fn base_parse_newslines<P: NewsmlOneParser + ?Sized>(
    _parser: &P,
    item: &mut NewsItem,
    newslines_el: Option<&Element>,
) {
    let Some(newslines_el) = newslines_el else {
        return;
    };

    if let Some(dateline) = newslines_el.find_text("DateLine") {
        item.set_dateline(Some(dateline), None, None);
    }
    if let Some(headline) = newslines_el.find_text("HeadLine") {
        item.headline = Some(headline);
    }
    if let Some(line_type) = newslines_el
        .find("NewsLine/NewsLineType")
        .and_then(|e| e.attr("FormalName"))
    {
        item.line_type = Some(line_type.to_string());
    }
    if let Some(line_text) = newslines_el.find_text("NewsLine/NewsLineText") {
        item.line_text = Some(line_text);
    }
    if let Some(sub_head_line) = newslines_el.find_text("SubHeadLine") {
        item.sub_head_line = Some(sub_head_line);
    }
    if let Some(byline) = newslines_el.find_text("ByLine") {
        item.byline = Some(byline);
    }
    if let Some(byline_title) = newslines_el.find_text("ByLineTitle") {
        item.byline_title = Some(byline_title);
    }
    if let Some(copyright) = newslines_el.find_text("CopyrightLine") {
        item.copyrightholder = Some(copyright);
    }
    if let Some(slugline) = newslines_el.find_text("SlugLine") {
        item.slugline = Some(slugline);
    }
    if let Some(keyword_line) = newslines_el.find_text("KeywordLine") {
        item.extra.belga_keywords = Some(keyword_line);
    }
}

pub fn base_parse_administrative<P: NewsmlOneParser + ?Sized>(
    _parser: &P,
    item: &mut NewsItem,
    admin_el: Option<&Element>,
) {
    let Some(admin_el) = admin_el else { return };

    if let Some(provider) = admin_el.find("Provider/Party") {
        item.administrative.provider =
            Some(provider.attr("FormalName").unwrap_or_default().to_string());
    }
    if let Some(creator) = admin_el.find("Creator/Party") {
        item.administrative.creator =
            Some(creator.attr("FormalName").unwrap_or_default().to_string());
    }
    if let Some(source) = admin_el.find("Source/Party") {
        item.administrative.source =
            Some(source.attr("FormalName").unwrap_or_default().to_string());
    }
}

pub fn base_parse_descriptive<P: NewsmlOneParser + ?Sized>(
    parser: &P,
    item: &mut NewsItem,
    descript_el: Option<&Element>,
) {
    let Some(descript_el) = descript_el else {
        return;
    };

    if let Some(language) = descript_el.child("Language") {
        item.language = Some(language.attr("FormalName").unwrap_or_default().to_string());
    }

    for genre_el in descript_el.children_named("Genre") {
        if let Some(genre) = genre_el.attr("FormalName").filter(|g| !g.is_empty()) {
            item.add_subject(Subject::plain(SubjectScheme::Genre, genre));
        }
    }

    // SubjectDetail before SubjectMatter before Subject, as delivered
    let mut subject_els = descript_el.find_all("SubjectCode/SubjectDetail");
    subject_els.extend(descript_el.find_all("SubjectCode/SubjectMatter"));
    subject_els.extend(descript_el.find_all("SubjectCode/Subject"));

    let formal_names: Vec<&str> = subject_els
        .iter()
        .filter_map(|e| e.attr("FormalName"))
        .collect();
    for subject in parser.vocab().map_iptc_subjects(formal_names) {
        item.add_subject(subject);
    }
    for subject_el in &subject_els {
        if let Some(cat) = subject_el.attr("cat") {
            let category = Category::new(cat);
            if !item.anpa_category.contains(&category) {
                item.anpa_category.push(category);
            }
        }
    }

    for element in descript_el.children_named("OfInterestTo") {
        if let Some(formal_name) = element.attr("FormalName").filter(|v| !v.is_empty()) {
            item.add_subject(Subject::plain(SubjectScheme::OfInterestTo, formal_name));
        }
    }

    if let Some(raw) = descript_el.find_text("DateLineDate") {
        item.set_dateline(None, parser.parse_datetime(&raw), None);
    }

    if let Some(location_el) = descript_el.child("Location") {
        if let Some(how_present) = location_el.attr("HowPresent") {
            item.extra.how_present = match how_present {
                "Event" => Some(HowPresent::Event),
                _ => Some(HowPresent::Origin),
            };
        }
        for property in location_el.children_named("Property") {
            let value = property.attr("Value").unwrap_or_default();
            match property.attr("FormalName") {
                Some("Country") => {
                    item.extra.country = Some(value.to_string());
                    if let Some(country) = parser.vocab().get_country(value) {
                        item.add_subject(country);
                    }
                }
                Some("City") => item.extra.city = Some(value.to_string()),
                Some("CountryArea") => item.extra.country_area = Some(value.to_string()),
                _ => {}
            }
        }
    }

    for property in descript_el.children_named("Property") {
        if property.attr("FormalName") == Some("Keyword") {
            if let Some(value) = property.attr("Value") {
                item.keywords.push(value.to_string());
            }
        }
    }
}

pub fn base_parse_contentitem<P: NewsmlOneParser + ?Sized>(
    _parser: &P,
    item: &mut NewsItem,
    content_el: Option<&Element>,
) -> Result<()> {
    let Some(content_el) = content_el else {
        return Ok(());
    };

    if let Some(media_type) = content_el.formal_name("MediaType") {
        item.item_type = ItemType::from_str_loose(media_type);
    }
    if let Some(mimetype) = content_el.formal_name("MimeType") {
        item.mimetype = Some(mimetype.to_string());
    }
    if let Some(format) = content_el.formal_name("Format") {
        item.format = match format {
            f if f.starts_with("NITF") => ContentFormat::Nitf,
            "Text" => ContentFormat::Preformatted,
            _ => ContentFormat::Html,
        };
    }

    if let Some(character_el) = content_el.child("Characteristics") {
        let mut characteristics = Characteristics {
            size_bytes: character_el.find_text("SizeInBytes"),
            ..Default::default()
        };
        for property in character_el.children_named("Property") {
            let value = property.attr("Value").map(str::to_string);
            match property.attr("FormalName") {
                Some("Words") => characteristics.word_count = value,
                Some("SizeInBytes") => characteristics.size_bytes = value,
                Some("Creator") => characteristics.creator = value,
                Some("Characters") => characteristics.characters = value,
                Some("FormatVersion") => characteristics.format_version = value,
                _ => {}
            }
        }
        item.characteristics = Some(characteristics);
    }

    if let Some(body_content) = content_el.find("DataContent/nitf/body/body.content") {
        item.body_html = Some(body_content.inner_xml());
    }
    Ok(())
}

pub fn base_finalize<P: NewsmlOneParser + ?Sized>(_parser: &P, item: &mut NewsItem) {
    item.ensure_service_product();
    item.add_subject(Subject::plain(SubjectScheme::Distribution, "default"));
    item.slugline = None;
    item.keywords.clear();
}

/// The kernel with no provider twists, used for plain NewsML 1.2 feeds.
pub struct GenericNewsmlParser {
    vocab: std::sync::Arc<VocabularyResolver>,
}

impl GenericNewsmlParser {
    pub fn new(vocab: std::sync::Arc<VocabularyResolver>) -> Self {
        Self { vocab }
    }
}

impl NewsmlOneParser for GenericNewsmlParser {
    fn name(&self) -> &'static str {
        "newsml12"
    }

    fn vocab(&self) -> &VocabularyResolver {
        &self.vocab
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use std::sync::Arc;

    use newsbridge_core::subject::Translations;
    use newsbridge_core::vocab::testing::FixedStore;
    use newsbridge_core::vocab::{CvItem, Vocabulary};

    use super::*;

    pub fn test_vocab() -> Arc<VocabularyResolver> {
        let store = FixedStore::with(vec![
            Vocabulary::new(
                "iptc_subject_codes",
                vec![
                    CvItem::new("01000000", "arts, culture and entertainment"),
                    CvItem::new("01011000", "music"),
                    CvItem::new("08003002", "people"),
                    CvItem::new("11000000", "politics"),
                    CvItem::new("15000000", "sport"),
                ],
            ),
            Vocabulary::new(
                "country",
                vec![
                    CvItem::new("country_fra", "France").with_translations(Translations::named(&[
                        ("nl", "Frankrijk"),
                        ("fr", "France"),
                    ])),
                    CvItem::new("country_bel", "Belgium").with_translations(Translations::named(
                        &[("nl", "België"), ("fr", "Belgique")],
                    )),
                ],
            ),
            Vocabulary::new("belga-keywords", vec![CvItem::new("BRIEF", "Brief")]),
            Vocabulary::new(
                "categories",
                vec![CvItem::new("POL", "POLITICS"), CvItem::new("DEP", "SPORTS")],
            ),
        ]);
        Arc::new(VocabularyResolver::new(store))
    }

    pub const AFP_STYLE_DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<NewsML Version="1.2">
  <Catalog Href="http://www.afp.com/dtd/AFPCatalog.xml"/>
  <NewsEnvelope>
    <TransmissionId>0421</TransmissionId>
    <DateAndTime>20181209T112417Z</DateAndTime>
    <Priority FormalName="4"/>
  </NewsEnvelope>
  <NewsItem xml:lang="fr">
    <Identification>
      <NewsIdentifier>
        <ProviderId>afp.com</ProviderId>
        <DateId>20181209T112417Z</DateId>
        <NewsItemId>TX-PAR-QCJ26</NewsItemId>
        <RevisionId PreviousRevision="0" Update="N">1</RevisionId>
        <PublicIdentifier>urn:newsml:afp.com:20181209T112417Z:TX-PAR-QCJ26:1</PublicIdentifier>
      </NewsIdentifier>
      <NameLabel>musique-rock-célébrités-religion-France</NameLabel>
    </Identification>
    <NewsManagement>
      <NewsItemType FormalName="News"/>
      <FirstCreated>20181209T112417+0000</FirstCreated>
      <ThisRevisionCreated>20181209T112417+0000</ThisRevisionCreated>
      <Status FormalName="Usable"/>
      <Urgency FormalName="4"/>
    </NewsManagement>
    <NewsComponent>
      <NewsLines>
        <DateLine xml:lang="fr">Paris, 9 déc 2018 (AFP) -</DateLine>
        <HeadLine xml:lang="fr">Un an après, les fans de Johnny lui rendent hommage à Paris</HeadLine>
        <NewsLine>
          <NewsLineType FormalName="ProductLine"/>
          <NewsLineText xml:lang="fr">(Photo+Live Video+Video)</NewsLineText>
        </NewsLine>
      </NewsLines>
      <AdministrativeMetadata>
        <Provider>
          <Party FormalName="AFP"/>
        </Provider>
      </AdministrativeMetadata>
      <DescriptiveMetadata>
        <Language FormalName="fr"/>
        <SubjectCode>
          <SubjectMatter FormalName="01011000" cat="CLT"/>
        </SubjectCode>
        <SubjectCode>
          <Subject FormalName="01000000" cat="CLT"/>
        </SubjectCode>
        <SubjectCode>
          <SubjectDetail FormalName="08003002" cat="HUM"/>
        </SubjectCode>
        <OfInterestTo FormalName="DAB-TFG-1=DAB"/>
        <DateLineDate>20181209T112417+0000</DateLineDate>
        <Location HowPresent="Origin">
          <Property FormalName="Country" Value="FRA"/>
          <Property FormalName="City" Value="Paris"/>
        </Location>
        <Property FormalName="Keyword" Value="musique"/>
        <Property FormalName="Keyword" Value="rock"/>
      </DescriptiveMetadata>
      <ContentItem>
        <MediaType FormalName="Text"/>
        <Format FormalName="NITF3.1"/>
        <Characteristics>
          <SizeInBytes>2520</SizeInBytes>
          <Property FormalName="Words" Value="420"/>
        </Characteristics>
        <DataContent>
          <nitf>
            <body>
              <body.content>
                <p>Un an après la mort de Johnny Hallyday, des fans lui rendent hommage.</p>
                <p>A l'intérieur de l'église, un millier de personnes.</p>
              </body.content>
            </body>
          </nitf>
        </DataContent>
      </ContentItem>
    </NewsComponent>
  </NewsItem>
</NewsML>"#;
}
