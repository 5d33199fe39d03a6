//! Constants for record files and their front matter

/// Default file extension of record files, without the leading dot
pub const DEFAULT_RECORD_EXTENSION: &str = "yaml";

/// Front matter delimiters
pub const YAML_DELIMITER: &str = "---";
pub const TOML_DELIMITER: &str = "+++";

/// Byte order mark some editors put in front of UTF-8 files
pub const UTF8_BOM: &str = "\u{feff}";
