//! Export of crawled records.
//!
//! # Submodules
//!
//! - [`images`]: writes each record's thumbnail to its canonical file name
//! - [`table`]: writes one CSV row per record
//!
//! # Output Structure
//!
//! With the default paths:
//!
//! ```text
//! output/
//! ├── data.csv
//! ├── la_fires_spread_2024-03-05.jpg
//! └── ...
//! ```

pub mod images;
pub mod table;
