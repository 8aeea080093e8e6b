mod file;
mod path;

pub use file::FileKind;
pub use path::clean_utf8_path;
pub use path::DocumentPath;
