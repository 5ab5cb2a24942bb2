pub mod json_file;
pub mod results;

pub use json_file::JsonFile;
pub use results::{record_key, stamp_record, Record, ResultStore, CAPTURED_AT_FIELD, KEY_FIELD};
