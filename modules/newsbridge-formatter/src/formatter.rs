//! Outbound Belga NewsML 1.2 document builder. One call serializes the
//! published item together with its whole chain.

use chrono::{DateTime, Utc};

use newsbridge_core::config::Config;
use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{
    Author, BelgaUrl, ItemType, NewsItem, Rendition, RenditionKind,
};
use newsbridge_core::repo::{
    ArchiveRepository, Attachment, AttachmentStore, ContentProfiles, MediaStore,
    SequenceAllocator, UserDirectory,
};
use newsbridge_core::subject::SubjectScheme;
use newsbridge_core::text::{clean_and_flatten, first_paragraph};

use crate::chain::{capitalize, ChainEntity, ChainResolver, CoverageHydrator};
use crate::urn::set_belga_urns;
use crate::xml::Node;

const DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const CATALOG_HREF: &str = "http://www.belga.be/dtd/BelgaCatalog.xml";

/// File-extension spellings the receiver expects.
fn format_name(extension: &str) -> String {
    let name = capitalize(&extension.to_lowercase());
    match name.as_str() {
        "Mp4" => "Mpeg4".to_string(),
        "Jpg" => "Jpeg".to_string(),
        _ => name,
    }
}

pub struct BelgaNewsml12Formatter<'a> {
    config: Config,
    archive: &'a dyn ArchiveRepository,
    users: &'a dyn UserDirectory,
    attachments: &'a dyn AttachmentStore,
    profiles: &'a dyn ContentProfiles,
    sequences: &'a dyn SequenceAllocator,
    media: &'a dyn MediaStore,
    coverage: Option<&'a dyn CoverageHydrator>,
}

impl<'a> BelgaNewsml12Formatter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        archive: &'a dyn ArchiveRepository,
        users: &'a dyn UserDirectory,
        attachments: &'a dyn AttachmentStore,
        profiles: &'a dyn ContentProfiles,
        sequences: &'a dyn SequenceAllocator,
        media: &'a dyn MediaStore,
    ) -> Self {
        Self {
            config,
            archive,
            users,
            attachments,
            profiles,
            sequences,
            media,
            coverage: None,
        }
    }

    pub fn with_coverage(mut self, coverage: &'a dyn CoverageHydrator) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Text and video items go out as Belga NewsML 1.2.
    pub fn can_format(&self, format_type: &str, item: &NewsItem) -> bool {
        format_type == "belganewsml12"
            && matches!(item.item_type, ItemType::Text | ItemType::Video)
    }

    /// Serialize `item` for `subscriber`. Returns `(sequence, xml)` pairs.
    pub async fn format(&self, item: &NewsItem, subscriber: &str) -> Result<Vec<(u64, String)>> {
        self.try_format(item, subscriber, Utc::now())
            .await
            .map_err(|e| NewsbridgeError::Format {
                subscriber: subscriber.to_string(),
                message: e.to_string(),
            })
    }

    async fn try_format(
        &self,
        item: &NewsItem,
        subscriber: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<(u64, String)>> {
        let sequence = self.sequences.next_sequence(subscriber).await?;
        let resolver =
            ChainResolver::new(self.archive, self.attachments, self.profiles, self.coverage);
        let entities = resolver.entities(item).await?;
        // the oldest chain node identifies the whole family
        let originator = entities
            .iter()
            .find_map(|entity| match entity {
                ChainEntity::Text { item, .. } => Some(item.clone()),
                _ => None,
            })
            .unwrap_or_else(|| item.clone());

        let mut component_1 = Node::new("NewsComponent")
            .attr("Duid", originator.guid.clone())
            .attr(
                "xml:lang",
                item.language
                    .clone()
                    .unwrap_or_else(|| self.config.default_language.clone()),
            )
            .add(Node::new("NewsLines").add(Node::leaf("HeadLine", item.headline.as_deref())))
            .add(Node::new("AdministrativeMetadata"))
            .add(
                Node::new("DescriptiveMetadata").add(Node::new("Genre").attr(
                    "FormalName",
                    item.subject
                        .first_of(SubjectScheme::Genre)
                        .map(|s| s.qcode.clone())
                        .unwrap_or_default(),
                )),
            );
        for entity in &entities {
            component_1 = component_1.add(self.entity_component(entity).await?);
        }

        let newsml = Node::new("NewsML")
            .add(Node::new("Catalog").attr("Href", CATALOG_HREF))
            .add(
                Node::new("NewsEnvelope")
                    .add(Node::leaf(
                        "DateAndTime",
                        Some(now.format(DATETIME_FORMAT).to_string()),
                    ))
                    .add(Node::new("NewsService").attr("FormalName", ""))
                    .add(Node::new("NewsProduct").attr("FormalName", "")),
            )
            .add(
                Node::new("NewsItem")
                    .add(self.identification(item, &originator, now))
                    .add(self.news_management(item, now))
                    .add(component_1),
            );

        Ok(vec![(sequence, newsml.render()?)])
    }

    fn identification(&self, item: &NewsItem, originator: &NewsItem, now: DateTime<Utc>) -> Node {
        let date_id = originator
            .firstcreated
            .unwrap_or(now)
            .with_timezone(&self.config.default_timezone)
            .format(DATETIME_FORMAT)
            .to_string();
        Node::new("Identification").add(
            Node::new("NewsIdentifier")
                .add(Node::leaf(
                    "ProviderId",
                    Some(self.config.newsml_provider_id.clone()),
                ))
                .add(Node::leaf("DateId", Some(date_id)))
                .add(Node::leaf("NewsItemId", Some(originator.guid.clone())))
                .add(
                    Node::leaf("RevisionId", Some(item.version.to_string()))
                        .attr("Update", "N")
                        .attr("PreviousRevision", "0"),
                )
                .add(Node::leaf(
                    "PublicIdentifier",
                    Some(format!("{}:{}N", item.guid, item.version)),
                )),
        )
    }

    fn news_management(&self, item: &NewsItem, now: DateTime<Utc>) -> Node {
        let mut management = Node::new("NewsManagement")
            .add(Node::new("NewsItemType").attr("FormalName", "NEWS"))
            .add(Node::leaf(
                "FirstCreated",
                Some(
                    item.firstcreated
                        .unwrap_or(now)
                        .format(DATETIME_FORMAT)
                        .to_string(),
                ),
            ))
            .add(Node::leaf(
                "ThisRevisionCreated",
                Some(
                    item.versioncreated
                        .unwrap_or(now)
                        .format(DATETIME_FORMAT)
                        .to_string(),
                ),
            ));
        match item.embargo.filter(|embargo| *embargo > now) {
            Some(embargo) => {
                management = management
                    .add(Node::new("Status").attr("FormalName", "Embargoed"))
                    .add(
                        Node::new("StatusWillChange")
                            .add(Node::new("FutureStatus").attr(
                                "FormalName",
                                item.pubstatus.to_string().to_uppercase(),
                            ))
                            .add(Node::leaf("DateAndTime", Some(embargo.to_rfc3339()))),
                    );
            }
            None => {
                management = management.add(
                    Node::new("Status")
                        .attr("FormalName", item.pubstatus.to_string().to_uppercase()),
                );
            }
        }
        management
    }

    async fn entity_component(&self, entity: &ChainEntity) -> Result<Node> {
        match entity {
            ChainEntity::Text { item, role } => self.text_entity(item, role).await,
            ChainEntity::RelatedText(item) => self.text_entity(item, "RelatedArticle").await,
            ChainEntity::Url { item, url } => Ok(self.url_entity(item, url).await?),
            ChainEntity::Picture(item) => self.picture_entity(item).await,
            ChainEntity::Gallery(item) => self.gallery_entity(item).await,
            ChainEntity::Audio(item) => self.audio_entity(item).await,
            ChainEntity::Video(item) => self.video_entity(item).await,
            ChainEntity::Attachment(attachment) => self.attachment_entity(attachment).await,
        }
    }

    async fn text_entity(&self, item: &NewsItem, role: &str) -> Result<Node> {
        let mut component = Node::new("NewsComponent")
            .maybe_attr("Duid", (!item.guid.is_empty()).then(|| item.guid.clone()))
            .maybe_attr("xml:lang", item.language.clone())
            .add(Node::new("Role").attr("FormalName", role));
        component = component
            .add(self.newslines(item))
            .add(self.administrative_metadata(item).await)
            .add(descriptive_metadata(item));

        let body = item.body_html.as_deref().map(clean_and_flatten);
        let lead = item.body_html.as_deref().and_then(first_paragraph);
        for (role, content) in [
            ("Body", body),
            ("Title", item.headline.clone()),
            ("Lead", lead),
        ] {
            if let Some(content) = content.filter(|c| !c.is_empty()) {
                component = component.add(text_component_3(role, &content, item.language.as_deref()));
            }
        }
        Ok(component)
    }

    async fn url_entity(&self, item: &NewsItem, url: &BelgaUrl) -> Result<Node> {
        let newslines = Node::new("NewsLines")
            .add(Node::new("DateLine"))
            .add(Node::leaf("CreditLine", item.byline.as_deref()))
            .add(Node::leaf("HeadLine", Some(url.description.clone())))
            .add(Node::leaf("CopyrightLine", item.copyrightholder.as_deref()));
        let mut component = Node::new("NewsComponent")
            .maybe_attr("xml:lang", item.language.clone())
            .add(Node::new("Role").attr("FormalName", "URL"))
            .add(newslines)
            .add(self.administrative_metadata(item).await)
            .add(descriptive_metadata(item));
        for (role, value) in [("Title", &url.description), ("Locator", &url.url)] {
            component = component.add(text_component_3(role, value, item.language.as_deref()));
        }
        Ok(component)
    }

    async fn picture_entity(&self, item: &NewsItem) -> Result<Node> {
        let mut item = item.clone();
        set_belga_urns(&mut item, &self.config.belga_urn_suffix);
        let mut component = self.media_entity_shell(&item, "Picture").await;
        let caption = caption_text(&item, "picture");
        for (role, content) in [("Title", item.headline.clone()), ("Caption", caption)] {
            if let Some(content) = content {
                component = component.add(text_component_3(role, &content, item.language.as_deref()));
            }
        }
        for (role, kind) in [
            ("Image", RenditionKind::Original),
            ("Thumbnail", RenditionKind::Thumbnail),
            ("Preview", RenditionKind::ViewImage),
        ] {
            let Some(rendition) = item.renditions.get(&kind) else {
                continue;
            };
            let mut third = Node::new("NewsComponent")
                .maybe_attr("xml:lang", item.language.clone())
                .add(Node::new("Role").attr("FormalName", role))
                .add(component_class("Image"));
            third = third.add(self.media_contentitem(rendition, false).await?);
            component = component.add(third);
        }
        Ok(component)
    }

    async fn gallery_entity(&self, item: &NewsItem) -> Result<Node> {
        let mut item = item.clone();
        set_belga_urns(&mut item, &self.config.belga_urn_suffix);
        let mut component = self.media_entity_shell(&item, "Gallery").await;
        for (role, content) in [
            ("Title", item.headline.clone()),
            ("Caption", item.description_text.clone()),
        ] {
            if let Some(content) = content {
                component = component.add(text_component_3(role, &content, item.language.as_deref()));
            }
        }
        if let Some(original) = item.renditions.get(&RenditionKind::Original) {
            let third = Node::new("NewsComponent")
                .maybe_attr("Duid", (!item.guid.is_empty()).then(|| item.guid.clone()))
                .maybe_attr("xml:lang", item.language.clone())
                .add(Node::new("Role").attr("FormalName", "Component"))
                .add(component_class("Image"))
                // galleries are always delivered as Jpeg
                .add(self.media_contentitem(original, true).await?);
            component = component.add(third);
        }
        Ok(component)
    }

    async fn audio_entity(&self, item: &NewsItem) -> Result<Node> {
        let mut item = item.clone();
        set_belga_urns(&mut item, &self.config.belga_urn_suffix);
        let mut component = self.media_entity_shell(&item, "Audio").await;
        for (role, content) in [
            ("Title", item.headline.clone()),
            ("Body", item.description_text.clone()),
        ] {
            if let Some(content) = content {
                component = component.add(text_component_3(role, &content, item.language.as_deref()));
            }
        }
        if let Some(original) = item.renditions.get(&RenditionKind::Original) {
            let third = Node::new("NewsComponent")
                .maybe_attr("Duid", (!item.guid.is_empty()).then(|| item.guid.clone()))
                .maybe_attr("xml:lang", item.language.clone())
                .add(Node::new("Role").attr("FormalName", "Sound"))
                .add(component_class("Audio"))
                .add(self.media_contentitem(original, false).await?);
            component = component.add(third);
        }
        Ok(component)
    }

    async fn video_entity(&self, item: &NewsItem) -> Result<Node> {
        let mut item = item.clone();
        set_belga_urns(&mut item, &self.config.belga_urn_suffix);
        let mut component = self.media_entity_shell(&item, "Video").await;
        let body = caption_text(&item, "video");
        for (role, content) in [("Title", item.headline.clone()), ("Body", body)] {
            if let Some(content) = content {
                component = component.add(text_component_3(role, &content, item.language.as_deref()));
            }
        }
        if let Some(original) = item.renditions.get(&RenditionKind::Original) {
            let third = Node::new("NewsComponent")
                .maybe_attr("Duid", (!item.guid.is_empty()).then(|| item.guid.clone()))
                .maybe_attr("xml:lang", item.language.clone())
                .add(Node::new("Role").attr("FormalName", "Clip"))
                // the receiver files clips under the Audio component class
                .add(component_class("Audio"))
                .add(self.media_contentitem(original, false).await?);
            component = component.add(third);
        }
        Ok(component)
    }

    async fn attachment_entity(&self, attachment: &Attachment) -> Result<Node> {
        let mut stand_in = NewsItem::with_guid(ItemType::Text, attachment.id.clone());
        stand_in.headline = attachment.title.clone();
        stand_in.description_text = attachment.description.clone();

        let mut component = Node::new("NewsComponent")
            .attr("Duid", attachment.id.clone())
            .add(Node::new("Role").attr("FormalName", "RelatedDocument"))
            .add(self.newslines(&stand_in))
            .add(self.administrative_metadata(&stand_in).await)
            .add(descriptive_metadata(&stand_in));
        for (role, content) in [
            ("Title", stand_in.headline.clone()),
            ("Body", stand_in.description_text.clone()),
        ] {
            if let Some(content) = content {
                component = component.add(text_component_3(role, &content, None));
            }
        }
        let rendition = Rendition {
            href: Some(format!(
                "{}/{}?resource=attachments",
                self.config.media_prefix.trim_end_matches('/'),
                attachment.media
            )),
            media: Some(attachment.media.clone()),
            mimetype: Some(attachment.mimetype.clone()),
            filename: Some(attachment.filename.clone()),
            ..Default::default()
        };
        let third = Node::new("NewsComponent")
            .attr("Duid", attachment.id.clone())
            .add(Node::new("Role").attr("FormalName", "Component"))
            .add(component_class("Binary"))
            .add(self.media_contentitem(&rendition, false).await?);
        Ok(component.add(third))
    }

    /// Duid/lang attributes plus the three metadata blocks every media
    /// entity shares.
    async fn media_entity_shell(&self, item: &NewsItem, role: &str) -> Node {
        Node::new("NewsComponent")
            .maybe_attr("Duid", (!item.guid.is_empty()).then(|| item.guid.clone()))
            .maybe_attr("xml:lang", item.language.clone())
            .add(Node::new("Role").attr("FormalName", role))
            .add(self.newslines(item))
            .add(self.administrative_metadata(item).await)
            .add(descriptive_metadata(item))
    }

    fn newslines(&self, item: &NewsItem) -> Node {
        let mut newslines = Node::new("NewsLines")
            .add(Node::new("DateLine"))
            .add(Node::leaf(
                "CreditLine",
                item.creditline.as_deref().or(item.byline.as_deref()),
            ))
            .add(Node::leaf("HeadLine", item.headline.as_deref()))
            .add(Node::leaf("CopyrightLine", item.copyrightholder.as_deref()));

        for scheme in [SubjectScheme::Country, SubjectScheme::BelgaKeywords] {
            for subject in item.subject.of_scheme(scheme) {
                let localized = item
                    .language
                    .as_deref()
                    .and_then(|lang| {
                        subject
                            .translations
                            .as_ref()
                            .and_then(|t| t.name_for(lang))
                    })
                    .unwrap_or(subject.name.as_str());
                newslines = newslines.add(Node::leaf("KeywordLine", Some(localized)));
            }
        }
        if let Some(legacy) = item.extra.belga_keywords.as_deref() {
            for keyword in legacy.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                newslines = newslines.add(Node::leaf("KeywordLine", Some(keyword)));
            }
        }
        for keyword in &item.keywords {
            newslines = newslines.add(Node::leaf("KeywordLine", Some(keyword.clone())));
        }

        newslines.add(
            Node::new("NewsLine")
                .add(
                    Node::new("NewsLineType")
                        .attr("FormalName", item.line_type.clone().unwrap_or_default()),
                )
                .add(Node::leaf("NewsLineText", item.line_text.as_deref())),
        )
    }

    async fn administrative_metadata(&self, item: &NewsItem) -> Node {
        let mut metadata = Node::new("AdministrativeMetadata").add(
            Node::new("Provider").add(
                Node::new("Party")
                    .attr("FormalName", item.line_type.clone().unwrap_or_default()),
            ),
        );

        let mut creator = Node::new("Creator");
        for (name, role) in self.author_parties(item).await {
            creator = creator.add(Node::new("Party").attr("FormalName", name).attr("Topic", role));
        }
        metadata = metadata.add(creator);

        if let Some(contributor) = item.administrative.contributor.as_deref() {
            metadata = metadata.add(
                Node::new("Contributor")
                    .add(Node::new("Party").attr("FormalName", contributor)),
            );
        }
        for (formal_name, value) in [
            ("Validator", item.administrative.validator.as_deref()),
            (
                "ValidationDate",
                item.administrative.validation_date.as_deref(),
            ),
            ("ForeignId", item.administrative.foreign_id.as_deref()),
            ("Topic", item.administrative.topic.as_deref()),
            (
                "EditorialInfo",
                item.administrative.editorial_info.as_deref(),
            ),
        ] {
            if let Some(value) = value {
                metadata = metadata.add(property(formal_name, value));
            }
        }
        if let Some(priority) = item.priority {
            metadata = metadata.add(property("Priority", priority.to_string()));
        }
        metadata = metadata.add(property("NewsObjectId", item.guid.clone()));
        for label in item.subject.of_scheme(SubjectScheme::Label) {
            metadata = metadata.add(property("Label", label.name.clone()));
        }
        if let Some(distribution) = item.subject.first_of(SubjectScheme::Distribution) {
            let value = if distribution.qcode == "bilingual" {
                "B"
            } else {
                "Default"
            };
            metadata = metadata.add(property("Distribution", value));
        }

        for subject in item.subject.of_scheme(SubjectScheme::ServicesProducts) {
            let Some((service, product)) = subject.qcode.split_once('/') else {
                continue;
            };
            metadata = metadata.add(
                Node::new("Property")
                    .attr("FormalName", "NewsPackage")
                    .add(property("NewsService", service))
                    .add(property("NewsProduct", product)),
            );
        }

        let mut source_parts: Vec<&str> = item
            .subject
            .of_scheme(SubjectScheme::Sources)
            .chain(item.subject.of_scheme(SubjectScheme::MediaSource))
            .map(|s| s.qcode.as_str())
            .collect();
        if let Some(creditline) = item.creditline.as_deref() {
            if !source_parts.contains(&creditline) {
                source_parts.push(creditline);
            }
        }
        if !source_parts.is_empty() {
            metadata = metadata.add(
                Node::new("Source")
                    .add(Node::new("Party").attr("FormalName", source_parts.join("/"))),
            );
        }
        metadata
    }

    /// `(FormalName, Topic)` pairs for the Creator block. Pictures credit
    /// their original creator; everything else lists its authors.
    async fn author_parties(&self, item: &NewsItem) -> Vec<(String, String)> {
        if item.item_type == ItemType::Picture {
            let Some(creator_id) = item.original_creator.as_deref() else {
                return Vec::new();
            };
            return vec![self.stored_user_party(creator_id).await];
        }
        let mut parties = Vec::new();
        for author in &item.authors {
            parties.push(self.author_party(author).await);
        }
        parties
    }

    async fn author_party(&self, author: &Author) -> (String, String) {
        let mut name = author
            .sub_label
            .clone()
            .unwrap_or_else(|| author.name.clone());
        if let Some(parent) = author.parent.as_deref() {
            match self.users.user(parent).await {
                Ok(Some(user)) => name = user.username,
                Ok(None) => tracing::warn!(user = %parent, "unknown author user"),
                Err(e) => tracing::warn!(user = %parent, error = %e, "author lookup failed"),
            }
        }
        (name, author.role.clone())
    }

    async fn stored_user_party(&self, user_id: &str) -> (String, String) {
        let user = match self.users.user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) | Err(_) => {
                tracing::warn!(user = %user_id, "unknown creator user");
                return (String::new(), String::new());
            }
        };
        let mut role_name = String::new();
        if let Some(role_id) = user.role.as_deref() {
            match self.users.role(role_id).await {
                Ok(Some(role)) => role_name = role.name,
                Ok(None) => tracing::warn!(role = %role_id, "unknown author role"),
                Err(e) => tracing::warn!(role = %role_id, error = %e, "role lookup failed"),
            }
        }
        (user.username, role_name)
    }

    async fn media_contentitem(&self, rendition: &Rendition, force_jpeg: bool) -> Result<Node> {
        let href = rendition
            .belga_urn
            .as_deref()
            .or(rendition.href.as_deref())
            .unwrap_or_default()
            .to_string();
        let filename = rendition
            .filename
            .clone()
            .or_else(|| href.rsplit('/').next().map(str::to_string))
            .unwrap_or_default();
        let extension = filename.rsplit('.').next().unwrap_or_default();
        let format = if force_jpeg {
            "Jpeg".to_string()
        } else {
            format_name(extension)
        };

        let mut contentitem = Node::new("ContentItem")
            .attr("Href", href)
            .add(Node::new("Format").attr("FormalName", format));
        if let Some(mimetype) = rendition.mimetype.as_deref() {
            contentitem = contentitem.add(Node::new("MimeType").attr("FormalName", mimetype));
        }
        let mut characteristics = Node::new("Characteristics");
        if let Some(media_id) = rendition.media.as_deref() {
            match self.media.get(media_id).await? {
                Some(blob) => {
                    if let Some(size) = blob.size() {
                        characteristics =
                            characteristics.add(Node::leaf("SizeInBytes", Some(size.to_string())));
                    }
                }
                None => tracing::warn!(media = %media_id, "media blob not found"),
            }
        }
        if let Some(width) = rendition.width {
            characteristics = characteristics.add(property("Width", width.to_string()));
        }
        if let Some(height) = rendition.height {
            characteristics = characteristics.add(property("Height", height.to_string()));
        }
        Ok(contentitem.add(characteristics))
    }
}

fn property(formal_name: &str, value: impl Into<String>) -> Node {
    Node::new("Property")
        .attr("FormalName", formal_name)
        .attr("Value", value)
}

fn component_class(value: &str) -> Node {
    Node::new("DescriptiveMetadata").add(property("ComponentClass", value))
}

/// 3rd-level text component: Role, ComponentClass Text and the payload
/// with its character count.
fn text_component_3(role: &str, content: &str, language: Option<&str>) -> Node {
    Node::new("NewsComponent")
        .maybe_attr("xml:lang", language)
        .add(Node::new("Role").attr("FormalName", role))
        .add(component_class("Text"))
        .add(
            Node::new("ContentItem")
                .add(Node::new("Format").attr("FormalName", "Text"))
                .add(Node::leaf("DataContent", Some(content)))
                .add(
                    Node::new("Characteristics")
                        .add(Node::leaf(
                            "SizeInBytes",
                            Some(content.chars().count().to_string()),
                        ))
                        .add(property("maxCharCount", "0")),
                ),
        )
}

fn descriptive_metadata(item: &NewsItem) -> Node {
    let metadata = Node::new("DescriptiveMetadata").maybe_attr(
        "DateAndTime",
        item.firstcreated
            .map(|fc| fc.format(DATETIME_FORMAT).to_string()),
    );
    metadata.add(Node::new("SubjectCode")).add(
        Node::new("Location")
            .add(
                Node::new("Property")
                    .attr("FormalName", "City")
                    .maybe_attr("Value", item.extra.city.clone()),
            )
            .add(
                Node::new("Property")
                    .attr("FormalName", "Country")
                    .maybe_attr("Value", item.extra.country.clone()),
            )
            .add(
                Node::new("Property")
                    .attr("FormalName", "CountryArea")
                    .maybe_attr("Value", item.extra.country_area.clone()),
            )
            .add(Node::new("Property").attr("FormalName", "WorldRegion")),
    )
}

/// Synthesized media caption. Falls back to the stored description when
/// neither people nor event are known.
fn caption_text(item: &NewsItem, medium: &str) -> Option<String> {
    let people = item.extra.people.as_deref().filter(|s| !s.is_empty());
    let event = item
        .extra
        .event_description
        .as_deref()
        .filter(|s| !s.is_empty());
    match (people, event) {
        (Some(people), Some(event)) => {
            Some(format!("{people} on the {medium} regarding {event}"))
        }
        (Some(people), None) => Some(format!("{} showing {people}", capitalize(medium))),
        (None, Some(event)) => Some(format!("{} showing {event}", capitalize(medium))),
        (None, None) => item.description_text.clone(),
    }
}
