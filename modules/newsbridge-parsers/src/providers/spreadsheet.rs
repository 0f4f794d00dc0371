//! Event grid ingester for the spreadsheet transport. Rows come in as
//! strings; results are written back into the grid's generated columns
//! so the desk sees per-row status.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use newsbridge_core::error::{NewsbridgeError, Result};
use newsbridge_core::item::NewsItem;

pub const TITLES: &[&str] = &[
    "Start date",
    "Start time",
    "End date",
    "End time",
    "All day",
    "Timezone",
    "Slugline",
    "Event name",
    "Description",
    "Occurence status",
    "Calendars",
    "Location Name",
    "Location Address",
    "Location City/Town",
    "Location State/Province/Region",
    "Location Country",
    "Contact Honorific",
    "Contact First name",
    "Contact Last name",
    "Contact Organisation",
    "Contact Point of Contact",
    "Contact Email",
    "Contact Phone Number",
    "Contact Phone Usage",
    "Contact Phone Public",
    "Long description",
    "Internal note",
    "Ed note",
    "External links",
];

pub const GENERATED_FIELDS: &[&str] = &["_STATUS", "_ERR_MESSAGE", "_GUID"];

const REQUIRED_FIELDS: &[&str] = &["slugline", "calendars", "name"];
const REQUIRED_CONTACT_FIELDS: &[&str] = &["Contact Email", "Contact Phone Number"];
const REQUIRED_LOCATION_FIELDS: &[&str] = &["Location Name", "Location Address", "Location Country"];

const OCCUR_STATUS_QCODES: &[(&str, &str)] = &[
    ("Unplanned event", "eocstat:eos0"),
    ("Planned, occurrence planned only", "eocstat:eos1"),
    ("Planned, occurrence highly uncertain", "eocstat:eos2"),
    ("Planned, May occur", "eocstat:eos3"),
    ("Planned, occurrence highly likely", "eocstat:eos4"),
    ("Planned, occurs certainly", "eocstat:eos5"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDates {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub tz: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurStatus {
    pub qcode: String,
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub is_active: bool,
    pub name: String,
    pub qcode: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventAddress {
    pub line: Vec<String>,
    pub locality: String,
    pub area: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLocation {
    pub name: String,
    pub address: EventAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPhone {
    pub number: String,
    pub public: bool,
    pub usage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContact {
    pub honorific: String,
    pub first_name: String,
    pub last_name: String,
    pub organisation: String,
    pub contact_email: Vec<String>,
    pub contact_phone: Vec<ContactPhone>,
}

/// Planning event, distinct from the news item model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventItem {
    pub guid: String,
    pub name: String,
    pub slugline: String,
    pub dates: EventDates,
    pub definition_short: String,
    pub definition_long: String,
    pub internal_note: String,
    pub ednote: String,
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occur_status: Option<OccurStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub calendars: Vec<Calendar>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub location: Vec<EventLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<EventContact>,
}

/// 1-based grid write-back, shaped like the sheet API wants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct SpreadsheetParser;

impl SpreadsheetParser {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        "belga_spreadsheet"
    }

    pub fn can_parse(&self, titles: &[String]) -> bool {
        self.parse_titles(titles).is_ok()
    }

    /// Column index per title, case-insensitive. Generated columns are
    /// optional so a bare template still validates.
    fn parse_titles(&self, titles: &[String]) -> Result<HashMap<String, usize>> {
        let lowered: Vec<String> = titles.iter().map(|s| s.trim().to_lowercase()).collect();
        let mut index = HashMap::new();
        for field in TITLES {
            let at = lowered
                .iter()
                .position(|t| t == &field.to_lowercase())
                .ok_or_else(|| {
                    NewsbridgeError::parse(format!("column {field:?} is missing"))
                })?;
            index.insert(field.to_string(), at);
        }
        for field in GENERATED_FIELDS {
            if let Some(at) = lowered.iter().position(|t| t == &field.to_lowercase()) {
                index.insert(field.to_string(), at);
            }
        }
        Ok(index)
    }

    /// Returns the parsed events plus the status cells to write back.
    /// Rows already marked DONE are skipped; UPDATED and ERROR rows are
    /// reprocessed.
    pub fn parse(&self, data: &[Vec<String>]) -> Result<(Vec<EventItem>, Vec<CellUpdate>)> {
        let index = self.parse_titles(data.first().map(Vec::as_slice).unwrap_or(&[]))?;
        let generated = |field: &str| -> Result<usize> {
            index
                .get(field)
                .copied()
                .ok_or_else(|| NewsbridgeError::parse(format!("column {field:?} is missing")))
        };
        let status_col = generated("_STATUS")?;
        let err_col = generated("_ERR_MESSAGE")?;
        let guid_col = generated("_GUID")?;

        let mut items = Vec::new();
        let mut cells = Vec::new();

        // two title rows precede the data
        for (offset, values) in data.iter().enumerate().skip(2) {
            let row = offset + 1;
            let status = values
                .get(status_col)
                .map(|v| v.trim().to_uppercase())
                .filter(|v| !v.is_empty());
            let reprocess = match status.as_deref() {
                None => true,
                Some("UPDATED") | Some("ERROR") => true,
                Some(_) => false,
            };
            if !reprocess {
                continue;
            }

            let guid_cell = values.get(guid_col).map(String::as_str).unwrap_or("");
            let guid = if guid_cell.is_empty() {
                NewsItem::generate_guid()
            } else {
                guid_cell.to_string()
            };

            match self.parse_row(values, &index, &guid, status) {
                Ok(item) => {
                    cells.push(CellUpdate {
                        row,
                        col: status_col + 1,
                        value: "DONE".to_string(),
                    });
                    cells.push(CellUpdate {
                        row,
                        col: err_col + 1,
                        value: String::new(),
                    });
                    cells.push(CellUpdate {
                        row,
                        col: guid_col + 1,
                        value: guid,
                    });
                    items.push(item);
                }
                Err(e) => {
                    tracing::error!(row, error = %e, "spreadsheet row rejected");
                    cells.push(CellUpdate {
                        row,
                        col: status_col + 1,
                        value: "ERROR".to_string(),
                    });
                    cells.push(CellUpdate {
                        row,
                        col: err_col + 1,
                        value: e.to_string(),
                    });
                }
            }
        }
        Ok((items, cells))
    }

    fn parse_row(
        &self,
        values: &[String],
        index: &HashMap<String, usize>,
        guid: &str,
        status: Option<String>,
    ) -> Result<EventItem> {
        let cell = |title: &str| -> &str {
            index
                .get(title)
                .and_then(|&at| values.get(at))
                .map(String::as_str)
                .unwrap_or("")
        };

        let tzone = match cell("Timezone") {
            "" | "none" => "UTC".to_string(),
            other => other.to_string(),
        };
        let tz = Tz::from_str(&tzone)
            .map_err(|_| NewsbridgeError::parse("Invalid timezone"))?;

        let all_day = cell("All day") == "TRUE";
        let (start, end) = if all_day {
            let start = parse_date(cell("Start date"))?.and_time(NaiveTime::MIN);
            let end = parse_date(cell("End date"))?.and_time(NaiveTime::MIN)
                + Duration::days(1)
                - Duration::seconds(1);
            (start, end)
        } else {
            (
                parse_datetime(cell("Start date"), cell("Start time"))?,
                parse_datetime(cell("End date"), cell("End time"))?,
            )
        };

        let mut item = EventItem {
            guid: guid.to_string(),
            name: cell("Event name").to_string(),
            slugline: cell("Slugline").to_string(),
            dates: EventDates {
                start: local_to_utc(start, tz)?,
                end: local_to_utc(end, tz)?,
                tz: tzone,
            },
            definition_short: cell("Description").to_string(),
            definition_long: cell("Long description").to_string(),
            internal_note: cell("Internal note").to_string(),
            ednote: cell("Ed note").to_string(),
            links: vec![cell("External links").to_string()],
            status,
            state: "draft".to_string(),
            occur_status: None,
            calendars: Vec::new(),
            location: Vec::new(),
            contact: None,
        };

        let occur = cell("Occurence status");
        if let Some((name, qcode)) = OCCUR_STATUS_QCODES.iter().find(|(name, _)| *name == occur) {
            item.occur_status = Some(OccurStatus {
                qcode: qcode.to_string(),
                name: name.to_string(),
                label: name.to_lowercase(),
            });
        }

        let calendars = cell("Calendars");
        if !calendars.is_empty() {
            item.calendars.push(Calendar {
                is_active: true,
                name: calendars.to_string(),
                qcode: calendars.to_lowercase(),
            });
        }

        if REQUIRED_LOCATION_FIELDS.iter().all(|f| !cell(f).is_empty()) {
            item.location.push(EventLocation {
                name: cell("Location Name").to_string(),
                address: EventAddress {
                    line: vec![cell("Location Address").to_string()],
                    locality: cell("Location City/Town").to_string(),
                    area: cell("Location State/Province/Region").to_string(),
                    country: cell("Location Country").to_string(),
                },
            });
        }

        let has_person = ["Contact First name", "Contact Last name"]
            .iter()
            .all(|f| !cell(f).is_empty())
            || !cell("Contact Organisation").is_empty();
        if REQUIRED_CONTACT_FIELDS.iter().all(|f| !cell(f).is_empty()) && has_person {
            let mut is_public = cell("Contact Phone Public") == "TRUE";
            if cell("Contact Phone Usage") == "Confidential" {
                is_public = false;
            }
            item.contact = Some(EventContact {
                honorific: cell("Contact Honorific").to_string(),
                first_name: cell("Contact First name").to_string(),
                last_name: cell("Contact Last name").to_string(),
                organisation: cell("Contact Organisation").to_string(),
                contact_email: vec![cell("Contact Email").to_string()],
                contact_phone: vec![ContactPhone {
                    number: cell("Contact Phone Number").to_string(),
                    public: is_public,
                    usage: cell("Contact Phone Usage").to_string(),
                }],
            });
        }

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| match *field {
                "slugline" => item.slugline.is_empty(),
                "calendars" => item.calendars.is_empty(),
                "name" => item.name.is_empty(),
                _ => false,
            })
            .collect();
        if !missing.is_empty() {
            return Err(NewsbridgeError::parse(format!(
                "Missing {} fields",
                missing.join(", ")
            )));
        }
        Ok(item)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), format) {
            return Ok(date);
        }
    }
    Err(NewsbridgeError::parse(format!("Invalid date {raw:?}")))
}

fn parse_datetime(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = parse_date(date)?;
    let time = ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time.trim(), format).ok())
        .ok_or_else(|| NewsbridgeError::parse(format!("Invalid time {time:?}")))?;
    Ok(date.and_time(time))
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| NewsbridgeError::parse("Invalid datetime"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<&str>>) -> Vec<Vec<String>> {
        rows.into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect()
    }

    fn titles() -> Vec<&'static str> {
        let mut titles: Vec<&str> = TITLES.to_vec();
        titles.extend_from_slice(GENERATED_FIELDS);
        titles
    }

    fn row(overrides: &[(&str, &'static str)]) -> Vec<&'static str> {
        let mut values = vec![""; titles().len()];
        let base: &[(&str, &'static str)] = &[
            ("Start date", "2026-05-01"),
            ("Start time", "09:00"),
            ("End date", "2026-05-01"),
            ("End time", "17:00"),
            ("Timezone", "Europe/Brussels"),
            ("Slugline", "summit"),
            ("Event name", "EU summit"),
            ("Calendars", "General"),
            ("Occurence status", "Planned, occurs certainly"),
        ];
        for &(key, value) in base.iter().chain(overrides) {
            let at = titles().iter().position(|t| *t == key).unwrap();
            values[at] = value;
        }
        values
    }

    #[test]
    fn valid_rows_become_events_with_done_cells() {
        let parser = SpreadsheetParser::new();
        let data = grid(vec![titles(), vec![], row(&[])]);
        let (items, cells) = parser.parse(&data).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.name, "EU summit");
        assert_eq!(item.dates.tz, "Europe/Brussels");
        // Brussels is UTC+2 in May
        assert_eq!(item.dates.start.to_rfc3339(), "2026-05-01T07:00:00+00:00");
        assert_eq!(
            item.occur_status.as_ref().map(|s| s.qcode.as_str()),
            Some("eocstat:eos5")
        );
        assert_eq!(item.calendars[0].qcode, "general");
        let status_col = titles().iter().position(|t| *t == "_STATUS").unwrap() + 1;
        assert!(cells.contains(&CellUpdate {
            row: 3,
            col: status_col,
            value: "DONE".to_string()
        }));
    }

    #[test]
    fn missing_required_fields_are_reported_in_the_grid() {
        let parser = SpreadsheetParser::new();
        let data = grid(vec![titles(), vec![], row(&[("Event name", "")])]);
        let (items, cells) = parser.parse(&data).unwrap();
        assert!(items.is_empty());
        let err_col = titles().iter().position(|t| *t == "_ERR_MESSAGE").unwrap() + 1;
        assert!(cells.iter().any(|c| c.col == err_col
            && c.row == 3
            && c.value.contains("Missing name fields")));
    }

    #[test]
    fn done_rows_are_skipped_and_updated_rows_reprocessed() {
        let parser = SpreadsheetParser::new();
        let done = row(&[("_STATUS", "DONE")]);
        let updated = row(&[("_STATUS", "UPDATED"), ("_GUID", "urn:newsml:localhost:abc")]);
        let data = grid(vec![titles(), vec![], done, updated]);
        let (items, cells) = parser.parse(&data).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "urn:newsml:localhost:abc");
        assert!(cells.iter().all(|c| c.row == 4));
    }

    #[test]
    fn bad_timezone_is_an_error_row() {
        let parser = SpreadsheetParser::new();
        let data = grid(vec![titles(), vec![], row(&[("Timezone", "Mars/Olympus")])]);
        let (items, cells) = parser.parse(&data).unwrap();
        assert!(items.is_empty());
        assert!(cells.iter().any(|c| c.value == "ERROR"));
        assert!(cells.iter().any(|c| c.value.contains("Invalid timezone")));
    }

    #[test]
    fn all_day_events_span_to_end_of_day() {
        let parser = SpreadsheetParser::new();
        let data = grid(vec![
            titles(),
            vec![],
            row(&[("All day", "TRUE"), ("Timezone", "none")]),
        ]);
        let (items, _) = parser.parse(&data).unwrap();
        let dates = &items[0].dates;
        assert_eq!(dates.start.to_rfc3339(), "2026-05-01T00:00:00+00:00");
        assert_eq!(dates.end.to_rfc3339(), "2026-05-01T23:59:59+00:00");
        assert_eq!(dates.tz, "UTC");
    }
}
