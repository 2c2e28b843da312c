#[derive(Debug)]
pub enum Error {
    NetCDF(netcdf::Error),
    Mongo(mongodb::error::Error),
    Shape(ndarray::ShapeError),
    VariableNotFound { var: String },
    GridShapeMismatch { var: String, expected: [usize; 3], found: Vec<usize> },
    MetadataConflict { id: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetCDF(err) => write!(f, "NetCDF Error: {err}"),
            Self::Mongo(err) => write!(f, "MongoDB Error: {err}"),
            Self::Shape(err) => write!(f, "Array shape error: {err}"),
            Self::VariableNotFound { var } => write!(f, "Variable '{var}' not found in file."),
            Self::GridShapeMismatch { var, expected, found } => write!(
                f,
                "Variable '{var}' has dimensions {found:?}, expected {expected:?}."
            ),
            Self::MetadataConflict { id } => {
                write!(f, "Metadata record '{id}' already exists.")
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;

impl From<netcdf::Error> for Error {
    fn from(value: netcdf::Error) -> Self {
        Self::NetCDF(value)
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Mongo(value)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Shape(value)
    }
}
