//! MDFe Template Validation
//!
//! Checks a candidate INI payload against the canonical section template
//! and reports six kinds of defect:
//!
//! - missing / extra sections
//! - missing / extra keys
//! - empty values
//! - leftover `<placeholder>` values
//!
//! Template sections whose names contain `XXX` (or `YYY` / `ZZZ`) match
//! any candidate section with a digit run of the same length in that spot.
//!
//! # Example
//!
//! ```rust
//! use mdfe_template::{MdfeIniValidator, TemplateProvider};
//!
//! let template = TemplateProvider::from_source("[TOT]\nqNFe=<n>\n").unwrap();
//! let result = MdfeIniValidator::new(template)
//!     .compare_with_template("[TOT]\nqNFe=2\n")
//!     .unwrap();
//! assert!(result.is_match());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod comparison;
pub mod error;
pub mod pattern;
pub mod provider;
pub mod validator;

pub use comparison::{ComparisonResult, SectionDefects};
pub use error::{Result, TemplateError};
pub use pattern::{compile_pattern, SectionPattern, TemplatePattern};
pub use provider::TemplateProvider;
pub use validator::MdfeIniValidator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for template validation
    pub use crate::comparison::ComparisonResult;
    pub use crate::provider::TemplateProvider;
    pub use crate::validator::MdfeIniValidator;
}
