//! Shared core of the newsroom integration layer: the canonical item
//! model, subject taxonomy, vocabulary resolver, collaborator contracts
//! and the text helpers every other crate leans on.

pub mod config;
pub mod error;
pub mod item;
pub mod repo;
pub mod subject;
pub mod text;
pub mod vocab;

pub use config::Config;
pub use error::{NewsbridgeError, Result};
pub use item::{
    Administrative, AssociatedWith, Association, AttachmentRef, Author, BelgaUrl, Category,
    Characteristics, ContentFormat, ContentState, Dateline, Extra, FileMeta, HowPresent, ItemType,
    NewsItem, PubStatus, Rendition, RenditionKind, RenditionMap, SentFrom,
};
pub use subject::{Subject, SubjectScheme, SubjectSet, Translations};
pub use vocab::{CvItem, Vocabulary, VocabularyResolver, VocabularyStore};
