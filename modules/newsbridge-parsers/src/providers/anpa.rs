//! Kyodo's ANPA 1312 wire. Byte-delimited framing: SOH header lines,
//! STX body, ETX footer with the filing timestamp.

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::{Category, ContentFormat, ItemType, NewsItem};
use newsbridge_core::subject::{Subject, SubjectScheme};

const MAPPING_CATEGORY: &[(&str, &str)] = &[
    ("S", "NEWS/SPORTS"),
    ("P", "NEWS/POLITICS"),
    ("E", "NEWS/ECONOMY"),
];

/// Filing-desk code in the footer to the zone its wall clock is in.
const ZONE_TABLE: &[(&str, Tz)] = &[
    ("TYO", chrono_tz::Asia::Tokyo),
    ("TOK", chrono_tz::Asia::Tokyo),
    ("LON", chrono_tz::Europe::London),
    ("NYC", chrono_tz::America::New_York),
    ("GMT", chrono_tz::UTC),
];

pub struct AnpaParser {
    first_line: Regex,
    second_line: Regex,
    footer: Regex,
    body: Regex,
}

impl Default for AnpaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AnpaParser {
    pub fn new() -> Self {
        Self {
            first_line: Regex::new(r"(?i)^\x01([a-z])([0-9]{4})KYODO\x1f([a-z0-9-]+)")
                .unwrap_or_else(|e| panic!("static pattern: {e}")),
            second_line: Regex::new(
                r"(?i)^([a-z]) ([a-z])[\x13\x14]([\x11\x12]) (am-|pm-|bc-|ap-)([a-z-.]+)(.*) ([0-9]{1,2})-([0-9]{1,2}) ([0-9]{4})",
            )
            .unwrap_or_else(|e| panic!("static pattern: {e}")),
            footer: Regex::new(r"\x03([A-Z]{3})-([0-9]{2}:[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2})")
                .unwrap_or_else(|e| panic!("static pattern: {e}")),
            body: Regex::new(r"(?s)\x02(.*)\x03").unwrap_or_else(|e| panic!("static pattern: {e}")),
        }
    }

    pub fn name(&self) -> &'static str {
        "belga_anpa1312"
    }

    pub fn can_parse(&self, data: &[u8]) -> bool {
        let text = latin1(data);
        text.lines()
            .next()
            .is_some_and(|first| self.first_line.is_match(first))
    }

    pub fn parse(&self, data: &[u8]) -> Result<NewsItem> {
        let text = latin1(data);
        let mut lines = text.split_inclusive('\n');
        let first = lines.next().unwrap_or_default();
        let second = lines.next().unwrap_or_default();
        let rest: String = lines.collect();

        let mut item = NewsItem::with_guid(ItemType::Text, NewsItem::generate_guid());
        item.format = ContentFormat::Html;
        item.language = Some("en".to_string());

        if let Some(caps) = self.first_line.captures(first) {
            item.ingest_provider_sequence = Some(caps[2].to_string());
        }

        if let Some(caps) = self.second_line.captures(second) {
            let priority = if caps[1].eq_ignore_ascii_case("u") { 2 } else { 3 };
            item.priority = Some(priority);
            item.urgency = Some(priority);

            let letter = caps[2].to_uppercase();
            if let Some(product) = MAPPING_CATEGORY
                .iter()
                .find(|(code, _)| *code == letter)
                .map(|(_, product)| *product)
            {
                item.add_subject(Subject::service_product(product));
            }
            item.anpa_category.push(Category::new(letter));

            item.slugline = Some(caps[5].to_string());
            item.anpa_take_key = Some(caps[6].trim().to_string());
            item.word_count = caps[9].parse().ok();
            if &caps[3] == "\u{12}" {
                item.format = ContentFormat::Preformatted;
            }
        }

        if let Some(caps) = self.footer.captures(&text) {
            let zone = ZONE_TABLE
                .iter()
                .find(|(code, _)| *code == &caps[1])
                .map(|(_, tz)| *tz)
                .unwrap_or(chrono_tz::UTC);
            let naive = NaiveDateTime::parse_from_str(&caps[2], "%H:%M-%m-%d-%y")
                .map_err(|_| NewsbridgeError::timestamp(&caps[2]))?;
            let created = naive
                .and_local_timezone(zone)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| NewsbridgeError::timestamp(&caps[2]))?;
            item.firstcreated = Some(created);
            item.versioncreated = Some(created);
        }

        if let Some(caps) = self.body.captures(&rest) {
            self.parse_body(&mut item, &caps[1]);
        }

        item.ensure_service_product();
        item.add_subject(Subject::plain(SubjectScheme::Sources, "KYODO"));
        item.add_subject(Subject::plain(SubjectScheme::Distribution, "default"));
        item.slugline = None;
        item.keywords.clear();
        Ok(item)
    }

    fn parse_body(&self, item: &mut NewsItem, body: &str) {
        let lines: Vec<&str> = body.split('\n').collect();

        let body_lines: Vec<&str> = lines
            .iter()
            .filter(|l| l.starts_with('\t'))
            .map(|l| l.trim_start_matches('\t').trim_end_matches(['\r', '\n']))
            .collect();
        if !body_lines.is_empty() {
            item.body_html = Some(format!("<p>{}</p>", body_lines.join("</p><p>")));
        }

        let header_lines: Vec<&str> = lines
            .iter()
            .filter(|l| l.starts_with('^'))
            .map(|l| l.trim_matches(['^', '<', '=', ' ', '\r', '\n']))
            .collect();
        if header_lines.len() > 1 {
            item.headline = Some(header_lines[1].to_string());
        }
        if header_lines.len() > 3 {
            item.byline = Some(header_lines[header_lines.len() - 2].to_string());
        }

        // first sentence of the lead paragraph doubles as the abstract
        if let Some(lead) = body_lines.first() {
            let lead = lead.trim();
            let sentence = match lead.find(". ") {
                Some(idx) => &lead[..idx + 1],
                None => lead,
            };
            item.abstract_text = Some(sentence.to_string());
            let city = sentence.split(',').next().unwrap_or(sentence).trim();
            if !city.is_empty() {
                item.extra.city = Some(city.to_string());
            }
        }
    }
}

fn latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kyodo_fixture() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"\x01a0075KYODO\x1fsoccer-cup\n");
        data.extend_from_slice(b"u s\x13\x12 bc-emperor.s(-Cup 12-09 0344\n");
        data.extend_from_slice(b"\x02\n");
        data.extend_from_slice(b"^KY-SP--soccer-cup\n");
        data.extend_from_slice(b"^Soccer: Urawa Reds claim 7th Emperor's Cup =\n");
        data.extend_from_slice(
            b"\tSAITAMA, Japan, Dec. 9 Kyodo - Urawa Reds claimed their seventh \n",
        );
        data.extend_from_slice(b"\tEmperor's Cup on Sunday.\n");
        data.extend_from_slice(b"\x03TYO-12:18-12-09-18\n");
        data
    }

    #[test]
    fn header_framing_is_recognized() {
        let parser = AnpaParser::new();
        assert!(parser.can_parse(&kyodo_fixture()));
        assert!(!parser.can_parse(b"plain text file\n"));
    }

    #[test]
    fn header_lines_carry_priority_category_and_count() {
        let parser = AnpaParser::new();
        let item = parser.parse(&kyodo_fixture()).unwrap();
        assert_eq!(item.priority, Some(2));
        assert_eq!(item.urgency, Some(2));
        assert_eq!(item.anpa_category[0].qcode, "S");
        assert_eq!(item.word_count, Some(344));
        assert_eq!(item.format, ContentFormat::Preformatted);
        assert_eq!(item.language.as_deref(), Some("en"));
        assert_eq!(item.ingest_provider_sequence.as_deref(), Some("0075"));
        assert!(item
            .subject
            .contains(SubjectScheme::ServicesProducts, "NEWS/SPORTS"));
        assert!(item.subject.contains(SubjectScheme::Sources, "KYODO"));
        assert!(item.subject.contains(SubjectScheme::Distribution, "default"));
    }

    #[test]
    fn footer_timestamp_is_tokyo_wall_clock() {
        let parser = AnpaParser::new();
        let item = parser.parse(&kyodo_fixture()).unwrap();
        assert_eq!(
            item.firstcreated.map(|d| d.to_rfc3339()),
            Some("2018-12-09T03:18:00+00:00".to_string())
        );
        assert_eq!(item.versioncreated, item.firstcreated);
    }

    #[test]
    fn tabbed_lines_become_paragraphs_and_the_lead_yields_the_city() {
        let parser = AnpaParser::new();
        let item = parser.parse(&kyodo_fixture()).unwrap();
        assert_eq!(
            item.body_html.as_deref(),
            Some(
                "<p>SAITAMA, Japan, Dec. 9 Kyodo - Urawa Reds claimed their seventh </p>\
                 <p>Emperor's Cup on Sunday.</p>"
            )
        );
        assert_eq!(
            item.headline.as_deref(),
            Some("Soccer: Urawa Reds claim 7th Emperor's Cup")
        );
        assert_eq!(item.extra.city.as_deref(), Some("SAITAMA"));
        assert!(item.slugline.is_none());
    }
}
