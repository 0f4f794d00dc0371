//! Provider-specific parser variants. Each one overrides just enough of
//! the shared NewsML kernel, or brings its own framing for the non-XML
//! wires.

pub mod afp;
pub mod anp;
pub mod anpa;
pub mod ansa;
pub mod ats;
pub mod belga;
pub mod dpa;
pub mod efe;
pub mod iptc7901;
pub mod kyodo;
pub mod spreadsheet;
pub mod tass;

pub use afp::AfpNewsmlParser;
pub use anp::AnpNewsmlParser;
pub use anpa::AnpaParser;
pub use ansa::AnsaNitfParser;
pub use ats::AtsNewsmlParser;
pub use belga::BelgaNewsmlParser;
pub use dpa::DpaNewsmlTwoParser;
pub use efe::EfeNewsmlParser;
pub use iptc7901::{Iptc7901Parser, Iptc7901Variant};
pub use kyodo::KyodoNewsmlParser;
pub use spreadsheet::SpreadsheetParser;
pub use tass::TassNewsmlParser;
