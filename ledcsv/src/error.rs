use std::fmt;

use hera_led::error::HeraError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Wrong number of positional arguments
    Usage,
    /// (path, error)
    Input(String, std::io::Error),
    TempFile(String, std::io::Error),
    Output(String, std::io::Error),
    Layout(HeraError),
    Convert(HeraError),
    Io(std::io::Error),
    ConfigLoadFail,
    XdgVars,
}

impl Error {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage => 1,
            Error::Input(..) => 2,
            Error::TempFile(..) => 3,
            Error::Output(..) => 4,
            Error::Convert(HeraError::Format(_)) => 5,
            _ => 6,
        }
    }
}

impl fmt::Display for Error {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Usage => {
                write!(f, "Usage: ledcsv <bmp image name (input)> <csv file (output)>")
            }
            Error::Input(path, err) => write!(f, "Could not open {path}: {err}"),
            Error::TempFile(path, err) => write!(f, "Could not create {path}: {err}"),
            Error::Output(path, err) => write!(f, "Could not create {path}: {err}"),
            Error::Layout(err) => write!(f, "Could not load LED layout: {err}"),
            Error::Convert(err) => write!(f, "{err}"),
            Error::Io(err) => write!(f, "Failed to open: {err}"),
            Error::ConfigLoadFail => write!(f, "Failed to load user config"),
            Error::XdgVars => write!(f, "XDG environment vars appear unset"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<HeraError> for Error {
    fn from(err: HeraError) -> Self {
        Error::Convert(err)
    }
}
