//! Error types for sdkshim-cbp

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid project file: {message}")]
    XmlParse { message: String },

    #[error("Cannot get relative path: {from} => {to}")]
    RelativePath { from: String, to: String },
}
