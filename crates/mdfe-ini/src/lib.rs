//! MDFe INI Codec
//!
//! Text ⇄ ordered sections of case-insensitive key/value pairs.
//!
//! # Grammar
//!
//! - Lines are trimmed; blank lines and lines starting with `;` are skipped
//! - `[NAME]` opens a section (both brackets required)
//! - `key=value` splits at the first `=`; a trailing `; comment` is removed
//! - Duplicate keys: last write wins
//!
//! # Example
//!
//! ```rust
//! use mdfe_ini::IniParser;
//!
//! let doc = IniParser::new().parse("[IDE]\ncUF=35 ; SP\n").unwrap();
//! assert_eq!(doc.section("ide").unwrap().get("CUF"), Some("35"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod parser;
pub mod section;
pub mod writer;

pub use document::IniDocument;
pub use error::{IniError, Result};
pub use parser::{IniParser, ParseMode};
pub use section::IniSection;
pub use writer::IniWriter;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with INI documents
    pub use crate::document::IniDocument;
    pub use crate::error::IniError;
    pub use crate::parser::IniParser;
    pub use crate::section::IniSection;
    pub use crate::writer::IniWriter;
}
