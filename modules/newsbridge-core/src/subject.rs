use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Controlled-vocabulary scheme a subject entry belongs to. The scheme
/// partitions an item's subject set: `(scheme, qcode)` is unique per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectScheme {
    #[serde(rename = "services-products")]
    ServicesProducts,
    #[serde(rename = "country")]
    Country,
    #[serde(rename = "countries")]
    Countries,
    #[serde(rename = "iptc_subject_codes")]
    IptcSubjectCodes,
    #[serde(rename = "genre")]
    Genre,
    #[serde(rename = "label")]
    Label,
    #[serde(rename = "sources")]
    Sources,
    #[serde(rename = "credits")]
    Credits,
    #[serde(rename = "media-source")]
    MediaSource,
    #[serde(rename = "news_products")]
    NewsProducts,
    #[serde(rename = "news_services")]
    NewsServices,
    #[serde(rename = "distribution")]
    Distribution,
    #[serde(rename = "belga-keywords")]
    BelgaKeywords,
    #[serde(rename = "original-metadata")]
    OriginalMetadata,
    #[serde(rename = "link_type")]
    LinkType,
    #[serde(rename = "of_interest_to")]
    OfInterestTo,
    #[serde(rename = "essential")]
    Essential,
    #[serde(rename = "equivalents_list")]
    EquivalentsList,
}

impl std::fmt::Display for SubjectScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubjectScheme::ServicesProducts => "services-products",
            SubjectScheme::Country => "country",
            SubjectScheme::Countries => "countries",
            SubjectScheme::IptcSubjectCodes => "iptc_subject_codes",
            SubjectScheme::Genre => "genre",
            SubjectScheme::Label => "label",
            SubjectScheme::Sources => "sources",
            SubjectScheme::Credits => "credits",
            SubjectScheme::MediaSource => "media-source",
            SubjectScheme::NewsProducts => "news_products",
            SubjectScheme::NewsServices => "news_services",
            SubjectScheme::Distribution => "distribution",
            SubjectScheme::BelgaKeywords => "belga-keywords",
            SubjectScheme::OriginalMetadata => "original-metadata",
            SubjectScheme::LinkType => "link_type",
            SubjectScheme::OfInterestTo => "of_interest_to",
            SubjectScheme::Essential => "essential",
            SubjectScheme::EquivalentsList => "equivalents_list",
        };
        write!(f, "{s}")
    }
}

/// Localized names for a CV entry, keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translations {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub name: HashMap<String, String>,
}

impl Translations {
    pub fn named(pairs: &[(&str, &str)]) -> Self {
        Self {
            name: pairs
                .iter()
                .map(|(lang, name)| (lang.to_string(), name.to_string()))
                .collect(),
        }
    }

    pub fn name_for(&self, language: &str) -> Option<&str> {
        self.name.get(language).map(String::as_str)
    }
}

/// One tagged entry of an item's subject set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub qcode: String,
    pub scheme: SubjectScheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Translations>,
}

impl Subject {
    /// Entry whose name equals its qcode, the common case for ingested CVs.
    pub fn plain(scheme: SubjectScheme, qcode: impl Into<String>) -> Self {
        let qcode = qcode.into();
        Self {
            name: qcode.clone(),
            qcode,
            scheme,
            parent: None,
            translations: None,
        }
    }

    pub fn named(
        scheme: SubjectScheme,
        qcode: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            qcode: qcode.into(),
            scheme,
            parent: None,
            translations: None,
        }
    }

    /// A `services-products` entry. The qcode is `SERVICE/PRODUCT` and the
    /// parent is the SERVICE half.
    pub fn service_product(qcode: impl Into<String>) -> Self {
        let qcode = qcode.into();
        let parent = qcode.split('/').next().unwrap_or_default().to_string();
        Self {
            name: qcode.clone(),
            qcode,
            scheme: SubjectScheme::ServicesProducts,
            parent: Some(parent),
            translations: None,
        }
    }

    pub fn with_translations(mut self, translations: Translations) -> Self {
        self.translations = Some(translations);
        self
    }

    pub fn key(&self) -> (SubjectScheme, &str) {
        (self.scheme, self.qcode.as_str())
    }
}

/// Insertion-ordered set of subjects keyed on `(scheme, qcode)`.
///
/// Inserting a duplicate key is a no-op; the first entry wins and order is
/// preserved, which is what the outbound format relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubjectSet {
    entries: Vec<Subject>,
}

impl SubjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set-insert. Returns true when the entry was actually added.
    pub fn add(&mut self, subject: Subject) -> bool {
        if self.contains(subject.scheme, &subject.qcode) {
            return false;
        }
        self.entries.push(subject);
        true
    }

    pub fn extend(&mut self, subjects: impl IntoIterator<Item = Subject>) {
        for subject in subjects {
            self.add(subject);
        }
    }

    pub fn contains(&self, scheme: SubjectScheme, qcode: &str) -> bool {
        self.entries
            .iter()
            .any(|s| s.scheme == scheme && s.qcode == qcode)
    }

    pub fn has_scheme(&self, scheme: SubjectScheme) -> bool {
        self.entries.iter().any(|s| s.scheme == scheme)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.entries.iter()
    }

    pub fn of_scheme(&self, scheme: SubjectScheme) -> impl Iterator<Item = &Subject> {
        self.entries.iter().filter(move |s| s.scheme == scheme)
    }

    pub fn first_of(&self, scheme: SubjectScheme) -> Option<&Subject> {
        self.of_scheme(scheme).next()
    }

    /// Drop every entry of the given scheme.
    pub fn remove_scheme(&mut self, scheme: SubjectScheme) {
        self.entries.retain(|s| s.scheme != scheme);
    }

    pub fn retain(&mut self, keep: impl FnMut(&Subject) -> bool) {
        self.entries.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for SubjectSet {
    type Item = Subject;
    type IntoIter = std::vec::IntoIter<Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SubjectSet {
    type Item = &'a Subject;
    type IntoIter = std::slice::Iter<'a, Subject>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<Subject> for SubjectSet {
    fn from_iter<I: IntoIterator<Item = Subject>>(iter: I) -> Self {
        let mut set = SubjectSet::new();
        set.extend(iter);
        set
    }
}

impl<'de> Deserialize<'de> for SubjectSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<Subject>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_is_dropped_first_wins() {
        let mut set = SubjectSet::new();
        assert!(set.add(Subject::named(SubjectScheme::Genre, "Alert", "Alert")));
        assert!(!set.add(Subject::named(SubjectScheme::Genre, "Alert", "Other name")));
        assert_eq!(set.len(), 1);
        assert_eq!(set.first_of(SubjectScheme::Genre).unwrap().name, "Alert");
    }

    #[test]
    fn same_qcode_different_scheme_both_kept() {
        let mut set = SubjectSet::new();
        set.add(Subject::plain(SubjectScheme::Sources, "AFP"));
        set.add(Subject::plain(SubjectScheme::Credits, "AFP"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut set = SubjectSet::new();
        set.add(Subject::plain(SubjectScheme::BelgaKeywords, "BRUSSELS"));
        set.add(Subject::service_product("NEWS/ECONOMY"));
        set.add(Subject::plain(SubjectScheme::BelgaKeywords, "EUROPE"));
        let names: Vec<_> = set.iter().map(|s| s.qcode.as_str()).collect();
        assert_eq!(names, vec!["BRUSSELS", "NEWS/ECONOMY", "EUROPE"]);
    }

    #[test]
    fn service_product_parent_is_service_half() {
        let subject = Subject::service_product("NEWS/SPORTS");
        assert_eq!(subject.parent.as_deref(), Some("NEWS"));
        assert_eq!(subject.scheme, SubjectScheme::ServicesProducts);
    }

    #[test]
    fn scheme_serializes_to_wire_name() {
        let json = serde_json::to_string(&SubjectScheme::ServicesProducts).unwrap();
        assert_eq!(json, "\"services-products\"");
        let json = serde_json::to_string(&SubjectScheme::IptcSubjectCodes).unwrap();
        assert_eq!(json, "\"iptc_subject_codes\"");
    }

    #[test]
    fn subject_set_roundtrips_through_json() {
        let mut set = SubjectSet::new();
        set.add(Subject::service_product("NEWS/GENERAL"));
        set.add(Subject::plain(SubjectScheme::Distribution, "default"));
        let json = serde_json::to_string(&set).unwrap();
        let back: SubjectSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
