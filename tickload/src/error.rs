use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum LoadError {
    StringError(String),
    IoError(Arc<std::io::Error>),
    // start() was called on a loader that already issued its request
    AlreadyStarted,
    // A backend reported a status code outside of LoadStatus
    UnrecognizedStatus(i32),
    // A loaded resource is not of the type the caller asked for
    ResourceTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            LoadError::StringError(_) => None,
            LoadError::IoError(ref e) => Some(&**e),
            LoadError::AlreadyStarted => None,
            LoadError::UnrecognizedStatus(_) => None,
            LoadError::ResourceTypeMismatch { .. } => None,
        }
    }
}

impl core::fmt::Display for LoadError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            LoadError::StringError(ref e) => e.fmt(fmt),
            LoadError::IoError(ref e) => e.fmt(fmt),
            LoadError::AlreadyStarted => "load already started".fmt(fmt),
            LoadError::UnrecognizedStatus(code) => {
                write!(fmt, "unrecognized backend load status {}", code)
            }
            LoadError::ResourceTypeMismatch { expected, actual } => write!(
                fmt,
                "loaded resource is a {} but a {} was requested",
                actual, expected
            ),
        }
    }
}

impl From<&str> for LoadError {
    fn from(str: &str) -> Self {
        LoadError::StringError(str.to_string())
    }
}

impl From<String> for LoadError {
    fn from(string: String) -> Self {
        LoadError::StringError(string)
    }
}

impl From<std::io::Error> for LoadError {
    fn from(error: std::io::Error) -> Self {
        LoadError::IoError(Arc::new(error))
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
