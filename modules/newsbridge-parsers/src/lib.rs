//! Feed parsers for the wires Belga ingests. The NewsML 1.2 kernel in
//! [`newsml12`] carries most providers; the rest bring their own framing
//! (NewsML-G2, NITF, ANPA 1312, IPTC 7901, event spreadsheets).

pub mod newsml12;
pub mod providers;
pub mod xmltree;

pub use newsml12::{GenericNewsmlParser, NewsmlOneParser};
pub use providers::{
    AfpNewsmlParser, AnpNewsmlParser, AnpaParser, AnsaNitfParser, AtsNewsmlParser,
    BelgaNewsmlParser, DpaNewsmlTwoParser, EfeNewsmlParser, Iptc7901Parser, KyodoNewsmlParser,
    SpreadsheetParser, TassNewsmlParser,
};
pub use xmltree::Element;
