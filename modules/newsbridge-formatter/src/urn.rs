//! Belga URN rewriting for outbound renditions. The receiver resolves
//! media through its own stores, so hrefs are replaced by store URNs
//! before serialization.

use newsbridge_core::item::{NewsItem, RenditionKind};

use belga_search_client::{COVERAGE_GUID_PREFIX, IMAGE_GUID_PREFIX};

/// Picture-store size names per rendition.
fn picturestore_size(kind: RenditionKind) -> Option<&'static str> {
    match kind {
        RenditionKind::Original => Some("full"),
        RenditionKind::Thumbnail => Some("thumbnail"),
        RenditionKind::ViewImage => Some("preview"),
        RenditionKind::BaseImage => None,
    }
}

/// Fill `belga-urn` (and filename where the store implies one) on every
/// rendition of a media item.
///
/// Three cases, by provenance:
/// - Belga image library items point into the picture store.
/// - Belga coverages point at the gallery by id.
/// - Internally uploaded blobs point into the deployment's own store,
///   qualified by the configured URN suffix.
pub fn set_belga_urns(item: &mut NewsItem, urn_suffix: &str) {
    if let Some(image_id) = item.guid.strip_prefix(IMAGE_GUID_PREFIX).map(str::to_string) {
        for (kind, rendition) in item.renditions.iter_mut() {
            if let Some(size) = picturestore_size(*kind) {
                rendition.belga_urn = Some(format!(
                    "urn:www.belga.be:picturestore:{image_id}:{size}:true"
                ));
                rendition.filename = Some(format!("{image_id}.jpeg"));
            }
        }
        return;
    }
    if let Some(gallery_id) = item
        .guid
        .strip_prefix(COVERAGE_GUID_PREFIX)
        .map(str::to_string)
    {
        for rendition in item.renditions.values_mut() {
            rendition.belga_urn = Some(format!("urn:www.belga.be:belgagallery:{gallery_id}"));
        }
        return;
    }
    for rendition in item.renditions.values_mut() {
        if let Some(media) = rendition.media.as_deref() {
            rendition.belga_urn = Some(format!("urn:www.belga.be:superdesk:{urn_suffix}:{media}"));
        }
    }
}
