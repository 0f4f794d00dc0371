//! IPTC 7901 text wire, as delivered by DPA and ATS. The first line is a
//! service signature; everything else is loosely structured header and
//! body text in latin-1.

use chrono::Utc;
use regex::Regex;

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{Category, ItemType, NewsItem};
use newsbridge_core::subject::{Subject, SubjectScheme};

use super::dpa::category_product;

const NOT_FOR_PUBLICATION: &[&str] = &[
    "The following information is not for publication",
    "The following information is not intended for publication",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iptc7901Variant {
    Dpa,
    Ats,
}

pub struct Iptc7901Parser {
    // ATS stamps a digit priority, DPA a letter; probe ATS first
    ats_line: Regex,
    dpa_line: Regex,
}

impl Default for Iptc7901Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Iptc7901Parser {
    pub fn new() -> Self {
        Self {
            ats_line: Regex::new(r"^([a-zA-Z]*)([0-9]*) ([0-9]) ([A-Z]{1,3}) ([0-9]*)")
                .unwrap_or_else(|e| panic!("static pattern: {e}")),
            dpa_line: Regex::new(r"^([a-zA-Z]*)([0-9]*) (.) ([A-Z]{1,3}) ([0-9]*) ([a-zA-Z0-9 ]*)")
                .unwrap_or_else(|e| panic!("static pattern: {e}")),
        }
    }

    pub fn name(&self) -> &'static str {
        "belga_iptc7901"
    }

    pub fn detect(&self, data: &[u8]) -> Option<Iptc7901Variant> {
        let text = latin1(data);
        let first = text.lines().next()?;
        if self.ats_line.is_match(first) {
            Some(Iptc7901Variant::Ats)
        } else if self.dpa_line.is_match(first) {
            Some(Iptc7901Variant::Dpa)
        } else {
            None
        }
    }

    pub fn can_parse(&self, data: &[u8]) -> bool {
        self.detect(data).is_some()
    }

    pub fn parse(&self, data: &[u8]) -> Result<NewsItem> {
        let text = latin1(data);
        let variant = self
            .detect(data)
            .ok_or_else(|| NewsbridgeError::parse("unrecognized IPTC 7901 signature"))?;

        let mut item = NewsItem::with_guid(ItemType::Text, NewsItem::generate_guid());
        item.versioncreated = Some(Utc::now());

        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        self.parse_signature(&mut item, variant, lines.first().copied().unwrap_or_default());
        self.parse_lines(&mut item, &lines);

        match variant {
            Iptc7901Variant::Dpa => {
                self.split_dpa_header(&mut item);
                self.derive_dateline(&mut item);
                if let Some(body) = item.body_html.take() {
                    let body = body.replace("\r\n", " ").replace('\n', "</p><p>");
                    item.body_html = Some(format!("<p>{body}</p>"));
                }
            }
            Iptc7901Variant::Ats => {
                // ATS keeps the whole take as one paragraph
                if let Some(body) = item.body_html.take() {
                    let body = body.replace("\r\n", " ").replace('\n', " ");
                    item.body_html = Some(format!("<p>{body}</p>"));
                }
            }
        }

        for category in &item.anpa_category {
            if let Some(product) = iptc_category_product(&category.qcode) {
                item.subject.add(Subject::service_product(product));
            }
        }
        item.ensure_service_product();
        item.add_subject(Subject::plain(SubjectScheme::Credits, "DPA"));
        item.add_subject(Subject::plain(SubjectScheme::Distribution, "default"));
        Ok(item)
    }

    fn parse_signature(&self, item: &mut NewsItem, variant: Iptc7901Variant, first: &str) {
        let (regex, letter_priority) = match variant {
            Iptc7901Variant::Ats => (&self.ats_line, false),
            Iptc7901Variant::Dpa => (&self.dpa_line, true),
        };
        if let Some(caps) = regex.captures(first) {
            item.original_source = Some(caps[1].to_string());
            item.ingest_provider_sequence = Some(caps[2].to_string());
            item.priority = Some(if letter_priority {
                map_priority(&caps[3])
            } else {
                caps[3].parse().unwrap_or(5)
            });
            item.anpa_category.push(Category::new(caps[4].to_uppercase()));
            item.word_count = caps[5].parse().ok();
        }
    }

    /// Line 1 is the slugline, line 2 the headline, then body until the
    /// embargo sentinel flips the rest into the ednote.
    fn parse_lines(&self, item: &mut NewsItem, lines: &[&str]) {
        let mut body = String::new();
        let mut ednote: Option<String> = None;
        for (count, line) in lines.iter().enumerate().skip(1) {
            match count {
                1 => {
                    let slug = item.slugline.get_or_insert_with(String::new);
                    slug.push_str(line.trim_end_matches(['/', '\r', '\n']));
                }
                2 => {
                    item.headline = Some(line.trim_end_matches(['\r', '\n']).to_string());
                }
                _ => {
                    if let Some(note) = ednote.as_mut() {
                        note.push_str(line);
                    } else if NOT_FOR_PUBLICATION.iter().any(|s| line.contains(s)) {
                        ednote = Some(String::new());
                    } else {
                        body.push_str(line);
                    }
                }
            }
        }
        item.body_html = Some(body);
        item.ednote = ednote;
    }

    /// DPA opens the body with `City (dpa) - …`.
    fn derive_dateline(&self, item: &mut NewsItem) {
        let Some(body) = item.body_html.as_deref() else { return };
        let Some(first) = body.lines().next() else { return };
        if let Some((city, _)) = first.split_once("(dpa)") {
            let city = city.trim();
            if !city.is_empty() {
                item.set_dateline(
                    Some(format!("{city} (dpa) - ")),
                    None,
                    Some(city.to_string()),
                );
            }
        }
    }

    /// The first body stanza up to ` =` on its own paragraph is header
    /// matter: take key, header note, byline, extra headline lines.
    fn split_dpa_header(&self, item: &mut NewsItem) {
        let Some(body) = item.body_html.take() else { return };
        let split = [" =\n \n", " =\r\n \r\n"]
            .iter()
            .filter_map(|divider| body.find(divider).map(|at| (at, divider.len())))
            .min();
        let Some((at, divider_len)) = split else {
            if let Some(headline) = item.headline.take() {
                item.headline = Some(headline.replace(" =", ""));
            }
            item.body_html = Some(body);
            return;
        };
        let headers = body[..at].to_string();
        let rest = body[at + divider_len..].to_string();

        let header_lines: Vec<&str> = headers.split('\n').map(|l| l.trim_end_matches('\r')).collect();
        let mut headline = String::new();
        for (idx, line) in header_lines.iter().enumerate() {
            let last = idx + 1 == header_lines.len();
            if !line.is_empty() && *line == line.to_uppercase() {
                match item.anpa_take_key.as_mut() {
                    Some(key) => {
                        key.push(' ');
                        key.push_str(line);
                    }
                    None => item.anpa_take_key = Some(line.to_string()),
                }
                continue;
            }
            if line.starts_with('(') || line.ends_with(')') {
                match item.anpa_header.as_mut() {
                    Some(header) => {
                        header.push(' ');
                        header.push_str(line);
                    }
                    None => item.anpa_header = Some(line.to_string()),
                }
                continue;
            }
            if last {
                if let Some(byline) = line.strip_prefix("By ") {
                    item.byline = Some(byline.trim().to_string());
                }
                continue;
            }
            headline.push_str(line);
        }
        if !headline.is_empty() {
            item.headline = Some(headline);
        }
        item.body_html = Some(rest);
    }
}

fn map_priority(letter: &str) -> i32 {
    match letter.to_lowercase().as_str() {
        "f" => 1,
        "b" => 2,
        "u" => 3,
        "r" => 4,
        _ => 5,
    }
}

/// IPTC 7901 signatures reuse the DPA letter table plus the ATS economy
/// code.
fn iptc_category_product(code: &str) -> Option<&'static str> {
    if code.eq_ignore_ascii_case("EC") {
        return Some("NEWS/ECONOMY");
    }
    category_product(code)
}

fn latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dpa_fixture() -> Vec<u8> {
        let mut text = String::new();
        text.push_str("eca00075 U I 510  dpa 0075\n");
        text.push_str("/politics/Britain/EU/Brexit/justice/\n");
        text.push_str("Top EU court: Britain can unilaterally reverse Brexit decision =\n");
        text.push_str("2ND LEAD 3RD NET\n");
        text.push_str("(Updates with reaction)\n");
        text.push_str("By Helen Maguire, dpa =\n \n");
        text.push_str("Luxembourg (dpa) - Britain could unilaterally decide not to leave the\r\n");
        text.push_str("European Union, the bloc's top court ruled on Monday.\n");
        text.push_str("The following information is not for publication\n");
        text.push_str("Contact the desk.\n");
        text.into_bytes()
    }

    fn ats_fixture() -> Vec<u8> {
        let mut text = String::new();
        text.push_str("bsf037 4 EC 174 ats\n");
        text.push_str("Notes de frais GE/\n");
        text.push_str("L'affaire des notes de frais a marque l'executif\n");
        text.push_str("Geneve (ats) Le scandale cause par les notes de frais\r\n");
        text.push_str("a provoque un seisme au sein de l'executif municipal.\n");
        text.into_bytes()
    }

    #[test]
    fn variant_is_detected_from_the_signature_line() {
        let parser = Iptc7901Parser::new();
        assert_eq!(parser.detect(&dpa_fixture()), Some(Iptc7901Variant::Dpa));
        assert_eq!(parser.detect(&ats_fixture()), Some(Iptc7901Variant::Ats));
        assert_eq!(parser.detect(b"!! not a wire file\n"), None);
    }

    #[test]
    fn dpa_signature_and_header_stanza_are_split_out() {
        let parser = Iptc7901Parser::new();
        let item = parser.parse(&dpa_fixture()).unwrap();
        assert_eq!(item.original_source.as_deref(), Some("eca"));
        assert_eq!(item.ingest_provider_sequence.as_deref(), Some("00075"));
        assert_eq!(item.priority, Some(3));
        assert_eq!(item.anpa_category[0].qcode, "I");
        assert_eq!(item.word_count, Some(510));
        assert_eq!(
            item.slugline.as_deref(),
            Some("/politics/Britain/EU/Brexit/justice")
        );
        assert_eq!(item.anpa_take_key.as_deref(), Some("2ND LEAD 3RD NET"));
        assert_eq!(item.anpa_header.as_deref(), Some("(Updates with reaction)"));
        assert_eq!(item.byline.as_deref(), Some("Helen Maguire, dpa"));
        assert!(item
            .headline
            .as_deref()
            .is_some_and(|h| h.starts_with("Top EU court: Britain can unilaterally reverse")));
    }

    #[test]
    fn dpa_body_paragraphs_wrap_every_line_and_the_sentinel_cuts_the_ednote() {
        let parser = Iptc7901Parser::new();
        let item = parser.parse(&dpa_fixture()).unwrap();
        assert_eq!(
            item.body_html.as_deref(),
            Some(
                "<p>Luxembourg (dpa) - Britain could unilaterally decide not to leave the \
                 European Union, the bloc's top court ruled on Monday.</p><p></p>"
            )
        );
        assert_eq!(item.ednote.as_deref(), Some("Contact the desk.\n"));
        assert_eq!(
            item.dateline.as_ref().and_then(|d| d.city.as_deref()),
            Some("Luxembourg")
        );
        assert!(item
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/POLITICS"));
        assert!(item.subject.contains(SubjectScheme::Credits, "DPA"));
        assert!(item.subject.contains(SubjectScheme::Distribution, "default"));
    }

    #[test]
    fn ats_keeps_a_single_paragraph_body() {
        let parser = Iptc7901Parser::new();
        let item = parser.parse(&ats_fixture()).unwrap();
        assert_eq!(item.original_source.as_deref(), Some("bsf"));
        assert_eq!(item.ingest_provider_sequence.as_deref(), Some("037"));
        assert_eq!(item.priority, Some(4));
        assert_eq!(item.anpa_category[0].qcode, "EC");
        assert!(item
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/ECONOMY"));
        assert_eq!(
            item.body_html.as_deref(),
            Some(
                "<p>Geneve (ats) Le scandale cause par les notes de frais \
                 a provoque un seisme au sein de l'executif municipal. </p>"
            )
        );
    }
}
