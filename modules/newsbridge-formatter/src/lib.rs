//! Outbound side of the bridge: resolves the items chain of a published
//! item and serializes it as Belga NewsML 1.2.

pub mod chain;
pub mod formatter;
pub mod urn;
pub mod xml;

pub use chain::{ChainEntity, ChainResolver, CoverageHydrator, BELGA_TEXT_PROFILE, BELGA_TEXT_ROLE};
pub use formatter::BelgaNewsml12Formatter;
pub use urn::set_belga_urns;
pub use xml::{Node, XML_DECLARATION};
