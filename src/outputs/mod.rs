//! Output modules for article records and run reports.
//!
//! # Submodules
//!
//! - [`record`]: Writes article records as text files and loads them back
//! - [`json`]: Writes crawl summaries and exports the corpus as JSON
//!
//! # Output Structure
//!
//! ```text
//! dataset/
//! ├── deportes/
//! │   ├── elmundo/
//! │   ├── okdiario/
//! │   │   └── 3f1c9a0b2d_el_real_madrid_gana.txt
//! │   └── telemadrid/
//! ├── economia/
//! └── internacional/
//! ```

pub mod json;
pub mod record;
