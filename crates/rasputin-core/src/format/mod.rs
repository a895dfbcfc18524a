pub mod keyfile;
pub mod numeric;
pub mod xml;

pub use keyfile::KeyFile;
pub use numeric::{format_float, parse_float, parse_int, parse_positive};
pub use xml::{RcDocument, XmlPath};
