//! Items-chain resolution. Publishing one item emits its whole family:
//! the originator, every update and translation, and each node's media
//! siblings, in one deterministic order.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{Association, BelgaUrl, Extra, ItemType, NewsItem};
use newsbridge_core::repo::{ArchiveRepository, Attachment, AttachmentStore, ContentProfiles};

use belga_search_client::BelgaCoverageClient;

pub const BELGA_TEXT_PROFILE: &str = "belga_text";
pub const BELGA_TEXT_ROLE: &str = "Belga text";

/// Resolves `belga-coverage-*` custom-field URNs into coverage items.
#[async_trait]
pub trait CoverageHydrator: Send + Sync {
    async fn coverage(&self, urn: &str) -> Result<NewsItem>;
}

#[async_trait]
impl CoverageHydrator for BelgaCoverageClient {
    async fn coverage(&self, urn: &str) -> Result<NewsItem> {
        self.fetch(urn)
            .await
            .map_err(|e| NewsbridgeError::Fetch(e.to_string()))
    }
}

/// One outbound sibling of a chain node. The order of construction is the
/// order of emission.
#[derive(Debug, Clone)]
pub enum ChainEntity {
    Text { item: NewsItem, role: String },
    Url { item: NewsItem, url: BelgaUrl },
    Picture(NewsItem),
    Gallery(NewsItem),
    Audio(NewsItem),
    Video(NewsItem),
    Attachment(Attachment),
    RelatedText(NewsItem),
}

impl ChainEntity {
    pub fn role(&self) -> &str {
        match self {
            ChainEntity::Text { role, .. } => role,
            ChainEntity::Url { .. } => "URL",
            ChainEntity::Picture(_) => "Picture",
            ChainEntity::Gallery(_) => "Gallery",
            ChainEntity::Audio(_) => "Audio",
            ChainEntity::Video(_) => "Video",
            ChainEntity::Attachment(_) => "RelatedDocument",
            ChainEntity::RelatedText(_) => "RelatedArticle",
        }
    }

    pub fn duid(&self) -> Option<&str> {
        match self {
            ChainEntity::Text { item, .. }
            | ChainEntity::Picture(item)
            | ChainEntity::Gallery(item)
            | ChainEntity::Audio(item)
            | ChainEntity::Video(item)
            | ChainEntity::RelatedText(item) => {
                (!item.guid.is_empty()).then_some(item.guid.as_str())
            }
            ChainEntity::Attachment(attachment) => Some(attachment.id.as_str()),
            ChainEntity::Url { .. } => None,
        }
    }
}

pub struct ChainResolver<'a> {
    archive: &'a dyn ArchiveRepository,
    attachments: &'a dyn AttachmentStore,
    profiles: &'a dyn ContentProfiles,
    coverage: Option<&'a dyn CoverageHydrator>,
}

impl<'a> ChainResolver<'a> {
    pub fn new(
        archive: &'a dyn ArchiveRepository,
        attachments: &'a dyn AttachmentStore,
        profiles: &'a dyn ContentProfiles,
        coverage: Option<&'a dyn CoverageHydrator>,
    ) -> Self {
        Self {
            archive,
            attachments,
            profiles,
            coverage,
        }
    }

    /// The ordered chain nodes for `published`: originator, updates and
    /// translations, version-created ascending. Nodes that are not
    /// published or corrected are dropped, except `published` itself.
    pub async fn nodes(&self, published: &NewsItem) -> Result<Vec<NewsItem>> {
        let mut collected: Vec<NewsItem> = vec![published.clone()];
        let mut visited: HashSet<String> = [published.id.clone()].into();

        // backward to the originator
        let mut cursor = published.clone();
        while let Some(previous_id) = cursor.rewrite_of.clone() {
            if !visited.insert(previous_id.clone()) {
                break;
            }
            match self.archive.find_one(&previous_id).await? {
                Some(previous) => {
                    collected.push(previous.clone());
                    cursor = previous;
                }
                None => {
                    tracing::warn!(id = %previous_id, "chain predecessor not in archive");
                    break;
                }
            }
        }

        // forward over updates and translations, breadth first
        let mut frontier: Vec<String> = collected
            .iter()
            .flat_map(|node| forward_edges(node))
            .filter(|id| !visited.contains(id))
            .collect();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                if !visited.insert(id.clone()) {
                    continue;
                }
                let node = if id == published.id {
                    Some(published.clone())
                } else {
                    self.archive.find_one(&id).await?
                };
                let Some(node) = node else {
                    tracing::warn!(id = %id, "chain member not in archive");
                    continue;
                };
                next.extend(forward_edges(&node).filter(|id| !visited.contains(id)));
                collected.push(node);
            }
            frontier = next;
        }

        collected.sort_by(|a, b| {
            version_key(a)
                .cmp(&version_key(b))
                .then_with(|| a.id.cmp(&b.id))
        });
        collected.retain(|node| node.state.is_publishable() || node.id == published.id);
        Ok(collected)
    }

    /// Fan the ordered nodes out into chain entities. Media ids appear at
    /// most once across the whole chain.
    pub async fn entities(&self, published: &NewsItem) -> Result<Vec<ChainEntity>> {
        let nodes = self.nodes(published).await?;
        let mut seen_media: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for node in &nodes {
            self.fan_out(node, &mut seen_media, &mut out).await?;
        }
        Ok(out)
    }

    async fn fan_out(
        &self,
        node: &NewsItem,
        seen: &mut HashSet<String>,
        out: &mut Vec<ChainEntity>,
    ) -> Result<()> {
        out.push(ChainEntity::Text {
            item: node.clone(),
            role: self.text_role(node).await?,
        });

        for url in &node.extra.belga_url {
            let mut url = url.clone();
            url.ensure_guid();
            out.push(ChainEntity::Url {
                item: node.clone(),
                url,
            });
        }

        let media_kinds: [(ItemType, fn(NewsItem) -> ChainEntity); 4] = [
            (ItemType::Picture, ChainEntity::Picture),
            (ItemType::Graphic, ChainEntity::Gallery),
            (ItemType::Audio, ChainEntity::Audio),
            (ItemType::Video, ChainEntity::Video),
        ];
        for (item_type, make) in media_kinds {
            for media in self.associated_media(node, item_type).await? {
                if seen.insert(media.id.clone()) {
                    out.push(make(inherit_from(node, media)));
                }
            }
        }

        for urn in &node.extra.coverages {
            if !seen.insert(urn.clone()) {
                continue;
            }
            let Some(hydrator) = self.coverage else {
                tracing::warn!(urn = %urn, "no coverage client configured, dropping coverage");
                continue;
            };
            match hydrator.coverage(urn).await {
                Ok(coverage) => out.push(ChainEntity::Gallery(inherit_from(node, coverage))),
                // degraded output beats a failed publish
                Err(e) => tracing::warn!(urn = %urn, error = %e, "failed to fetch coverage"),
            }
        }

        let attachment_ids: Vec<String> = node
            .attachments
            .iter()
            .map(|a| a.attachment_id.clone())
            .collect();
        if !attachment_ids.is_empty() {
            for attachment in self.attachments.find_by_ids(&attachment_ids).await? {
                if seen.insert(attachment.id.clone()) {
                    out.push(ChainEntity::Attachment(attachment));
                }
            }
        }

        for related in self.related_texts(node).await? {
            if seen.insert(related.id.clone()) {
                out.push(ChainEntity::RelatedText(inherit_from(node, related)));
            }
        }
        Ok(())
    }

    /// Inline associations first, then the ones that need an archive
    /// round-trip, both in association-key order.
    async fn associated_media(&self, node: &NewsItem, wanted: ItemType) -> Result<Vec<NewsItem>> {
        let mut inline = Vec::new();
        let mut ids = Vec::new();
        for association in node.associations.values() {
            if association.item_type() != wanted {
                continue;
            }
            match association {
                Association::Full(item) if !item.renditions.is_empty() => {
                    inline.push((**item).clone());
                }
                other => ids.push(other.id().to_string()),
            }
        }
        if !ids.is_empty() {
            inline.extend(self.archive.find_by_ids(&ids).await?);
        }
        Ok(inline)
    }

    async fn related_texts(&self, node: &NewsItem) -> Result<Vec<NewsItem>> {
        let mut verbatim = Vec::new();
        let mut ids = Vec::new();
        for association in node.associations.values() {
            if association.item_type() != ItemType::Text {
                continue;
            }
            match association {
                // search results are complete, nothing to look up
                Association::Full(item) if !item.fetchable => verbatim.push((**item).clone()),
                other => ids.push(other.id().to_string()),
            }
        }
        if !ids.is_empty() {
            verbatim.extend(self.archive.find_by_ids(&ids).await?);
        }
        Ok(verbatim)
    }

    async fn text_role(&self, node: &NewsItem) -> Result<String> {
        let Some(profile) = node.profile.as_deref() else {
            return Ok(BELGA_TEXT_ROLE.to_string());
        };
        if profile == BELGA_TEXT_PROFILE {
            return Ok(BELGA_TEXT_ROLE.to_string());
        }
        match self.profiles.find_one(profile).await? {
            Some(found) => Ok(capitalize(&found.label)),
            None => {
                tracing::warn!(profile = %profile, "unknown content profile");
                Ok(capitalize(profile))
            }
        }
    }
}

fn forward_edges(node: &NewsItem) -> impl Iterator<Item = String> + '_ {
    node.rewritten_by
        .iter()
        .chain(node.translations.iter())
        .cloned()
}

fn version_key(node: &NewsItem) -> DateTime<Utc> {
    node.versioncreated.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub(crate) fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Synthesized siblings carry their parent's editorial envelope unless
/// they brought their own.
fn inherit_from(parent: &NewsItem, mut entity: NewsItem) -> NewsItem {
    if entity.guid.is_empty() {
        entity.guid = parent.guid.clone();
    }
    for (own, inherited) in [
        (&mut entity.language, &parent.language),
        (&mut entity.copyrightholder, &parent.copyrightholder),
        (&mut entity.line_type, &parent.line_type),
        (&mut entity.version_creator, &parent.version_creator),
        (&mut entity.slugline, &parent.slugline),
        (&mut entity.creditline, &parent.creditline),
        (&mut entity.original_creator, &parent.original_creator),
    ] {
        if own.is_none() {
            *own = inherited.clone();
        }
    }
    for (own, inherited) in [
        (&mut entity.firstpublished, &parent.firstpublished),
        (&mut entity.firstcreated, &parent.firstcreated),
        (&mut entity.versioncreated, &parent.versioncreated),
    ] {
        if own.is_none() {
            *own = *inherited;
        }
    }
    if entity.administrative.is_empty() {
        entity.administrative = parent.administrative.clone();
    }
    if entity.extra == Extra::default() {
        entity.extra = parent.extra.clone();
    }
    if entity.authors.is_empty() {
        entity.authors = parent.authors.clone();
    }
    entity
}
