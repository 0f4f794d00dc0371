//! Look-up façade over the controlled-vocabulary store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::subject::{Subject, SubjectScheme, Translations};

/// One entry of a controlled vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvItem {
    pub qcode: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Translations>,
}

fn default_active() -> bool {
    true
}

impl CvItem {
    pub fn new(qcode: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qcode: qcode.into(),
            name: name.into(),
            is_active: true,
            translations: None,
        }
    }

    pub fn with_translations(mut self, translations: Translations) -> Self {
        self.translations = Some(translations);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(rename = "_id")]
    pub id: String,
    pub items: Vec<CvItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Vocabulary {
    pub fn new(id: impl Into<String>, items: Vec<CvItem>) -> Self {
        Self {
            id: id.into(),
            items,
            display_name: None,
        }
    }
}

/// Read access to the vocabulary store, owned by an external collaborator.
pub trait VocabularyStore: Send + Sync {
    fn find_one(&self, id: &str) -> Option<Vocabulary>;
}

/// Resolver with a per-instance cache. The store is the single source of
/// truth; misses are not cached.
pub struct VocabularyResolver {
    store: Arc<dyn VocabularyStore>,
    cache: Mutex<HashMap<String, Arc<Vocabulary>>>,
}

impl VocabularyResolver {
    pub fn new(store: Arc<dyn VocabularyStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_vocabulary(&self, id: &str) -> Option<Arc<Vocabulary>> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(found) = cache.get(id) {
                return Some(Arc::clone(found));
            }
        }
        let Some(found) = self.store.find_one(id) else {
            tracing::debug!(vocabulary = id, "vocabulary not found in store");
            return None;
        };
        let vocabulary = Arc::new(found);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(id.to_string(), Arc::clone(&vocabulary));
        }
        Some(vocabulary)
    }

    /// Active entries of a vocabulary, in stored order.
    pub fn get_items(&self, id: &str) -> Vec<CvItem> {
        self.get_vocabulary(id)
            .map(|v| v.items.iter().filter(|i| i.is_active).cloned().collect())
            .unwrap_or_default()
    }

    /// Country subject for a 3-letter code, matched case-insensitively
    /// against `country_<code3>` qcodes.
    pub fn get_country(&self, code3: &str) -> Option<Subject> {
        let wanted = format!("country_{}", code3.to_lowercase());
        self.get_items("country")
            .into_iter()
            .find(|item| item.qcode.to_lowercase() == wanted)
            .map(|item| {
                let mut subject =
                    Subject::named(SubjectScheme::Country, item.qcode, item.name);
                subject.translations = item.translations;
                subject
            })
    }

    /// Belga keyword subjects matching the given text. When the CV has no
    /// match the raw text is kept as an `original-metadata` entry.
    pub fn get_keywords(&self, text: &str) -> Vec<Subject> {
        let matches: Vec<Subject> = self
            .get_items("belga-keywords")
            .into_iter()
            .filter(|item| item.name.eq_ignore_ascii_case(text))
            .map(|item| {
                let mut subject =
                    Subject::named(SubjectScheme::BelgaKeywords, item.qcode, item.name);
                subject.translations = item.translations;
                subject
            })
            .collect();
        if matches.is_empty() {
            vec![Subject::plain(SubjectScheme::OriginalMetadata, text)]
        } else {
            matches
        }
    }

    /// Map ingested IPTC FormalNames onto `iptc_subject_codes` subjects.
    /// Unknown or inactive codes are dropped; duplicates are skipped while
    /// preserving insertion order.
    pub fn map_iptc_subjects<'a>(
        &self,
        formal_names: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Subject> {
        let known: HashMap<String, CvItem> = self
            .get_items("iptc_subject_codes")
            .into_iter()
            .map(|item| (item.qcode.clone(), item))
            .collect();
        let mut seen: Vec<String> = Vec::new();
        let mut subjects = Vec::new();
        for formal_name in formal_names {
            if seen.iter().any(|s| s == formal_name) {
                continue;
            }
            if let Some(item) = known.get(formal_name) {
                seen.push(formal_name.to_string());
                subjects.push(Subject::named(
                    SubjectScheme::IptcSubjectCodes,
                    item.qcode.clone(),
                    iptc_label(&item.qcode, &item.name),
                ));
            }
        }
        subjects
    }
}

/// Display label for an IPTC subject code. The CV name wins; top-level
/// media topics fall back to the standard IPTC labels.
pub fn iptc_label(qcode: &str, cv_name: &str) -> String {
    if !cv_name.is_empty() {
        return cv_name.to_string();
    }
    match qcode {
        "01000000" => "arts, culture and entertainment",
        "02000000" => "crime, law and justice",
        "03000000" => "disaster and accident",
        "04000000" => "economy, business and finance",
        "05000000" => "education",
        "06000000" => "environmental issue",
        "07000000" => "health",
        "08000000" => "human interest",
        "09000000" => "labour",
        "10000000" => "lifestyle and leisure",
        "11000000" => "politics",
        "12000000" => "religion and belief",
        "13000000" => "science and technology",
        "14000000" => "social issue",
        "15000000" => "sport",
        "16000000" => "unrest, conflicts and war",
        "17000000" => "weather",
        _ => "",
    }
    .to_string()
}

#[cfg(any(test, feature = "test-support"))]
pub mod testing {
    use super::*;

    /// Store backed by a fixed set of vocabularies.
    #[derive(Default)]
    pub struct FixedStore {
        vocabularies: HashMap<String, Vocabulary>,
    }

    impl FixedStore {
        pub fn with(vocabularies: Vec<Vocabulary>) -> Arc<Self> {
            Arc::new(Self {
                vocabularies: vocabularies
                    .into_iter()
                    .map(|v| (v.id.clone(), v))
                    .collect(),
            })
        }
    }

    impl VocabularyStore for FixedStore {
        fn find_one(&self, id: &str) -> Option<Vocabulary> {
            self.vocabularies.get(id).cloned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixedStore;
    use super::*;

    fn resolver() -> VocabularyResolver {
        let store = FixedStore::with(vec![
            Vocabulary::new(
                "country",
                vec![CvItem::new("country_bel", "Belgium")
                    .with_translations(Translations::named(&[("nl", "België"), ("fr", "Belgique")]))],
            ),
            Vocabulary::new(
                "belga-keywords",
                vec![
                    CvItem::new("BRIEF", "Brief"),
                    CvItem::new("SPORTS", "Sports").inactive(),
                ],
            ),
            Vocabulary::new(
                "iptc_subject_codes",
                vec![
                    CvItem::new("11000000", "politics"),
                    CvItem::new("15000000", "sport"),
                    CvItem::new("99000000", "legacy").inactive(),
                ],
            ),
        ]);
        VocabularyResolver::new(store)
    }

    #[test]
    fn country_lookup_is_case_insensitive() {
        let resolver = resolver();
        let subject = resolver.get_country("BEL").unwrap();
        assert_eq!(subject.qcode, "country_bel");
        assert_eq!(subject.scheme, SubjectScheme::Country);
        assert_eq!(
            subject.translations.unwrap().name_for("fr"),
            Some("Belgique")
        );
        assert!(resolver.get_country("xyz").is_none());
    }

    #[test]
    fn keywords_fall_back_to_original_metadata() {
        let resolver = resolver();
        let matched = resolver.get_keywords("brief");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].scheme, SubjectScheme::BelgaKeywords);
        assert_eq!(matched[0].qcode, "BRIEF");

        let fallback = resolver.get_keywords("whatever");
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].scheme, SubjectScheme::OriginalMetadata);
        assert_eq!(fallback[0].qcode, "whatever");
    }

    #[test]
    fn inactive_keywords_are_not_matched() {
        let resolver = resolver();
        let fallback = resolver.get_keywords("Sports");
        assert_eq!(fallback[0].scheme, SubjectScheme::OriginalMetadata);
    }

    #[test]
    fn iptc_mapping_drops_unknown_and_duplicates() {
        let resolver = resolver();
        let subjects = resolver.map_iptc_subjects(
            ["15000000", "11000000", "15000000", "99000000", "123"].into_iter(),
        );
        let qcodes: Vec<_> = subjects.iter().map(|s| s.qcode.as_str()).collect();
        assert_eq!(qcodes, vec!["15000000", "11000000"]);
        assert_eq!(subjects[0].name, "sport");
    }

    #[test]
    fn vocabulary_is_cached_per_instance() {
        let resolver = resolver();
        let first = resolver.get_vocabulary("country").unwrap();
        let second = resolver.get_vocabulary("country").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
