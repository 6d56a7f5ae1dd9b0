use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use rand_distr::NormalError;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The crate's error type.
///
/// Configuration problems (bad topologies, dimension mismatches, invalid hyperparameters) and
/// persistence problems (unsupported versions, unknown strategy codes, malformed files) get their
/// own variants, plain I/O failures are wrapped in `Io`.
#[derive(Debug)]
pub enum MlErr {
    InvalidTopology {
        reason: &'static str,
    },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidHyperparameter {
        name: &'static str,
        value: f64,
    },
    IncompatibleLoss {
        loss: &'static str,
        act_fn: &'static str,
    },
    MissingEvaluationData,
    EmptyEnsemble,
    UnsupportedVersion(u8),
    UnknownActivation(u8),
    UnknownLoss(u8),
    MalformedFile {
        reason: &'static str,
    },
    Init(NormalError),
    Config(serde_json::Error),
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::InvalidTopology { reason } => write!(f, "invalid topology: {reason}"),
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "size mismatch for {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidHyperparameter { name, value } => {
                write!(f, "invalid value {value} for hyperparameter `{name}`")
            }
            MlErr::IncompatibleLoss { loss, act_fn } => write!(
                f,
                "the {loss} cost function can't be paired with the {act_fn} activation function"
            ),
            MlErr::MissingEvaluationData => {
                write!(f, "this training mode requires evaluation data")
            }
            MlErr::EmptyEnsemble => write!(f, "a composite classifier needs at least one network"),
            MlErr::UnsupportedVersion(version) => {
                write!(f, "unsupported network file version {version:#04x}")
            }
            MlErr::UnknownActivation(code) => {
                write!(f, "no activation function registered with code {code}")
            }
            MlErr::UnknownLoss(code) => write!(f, "no cost function registered with code {code}"),
            MlErr::MalformedFile { reason } => write!(f, "malformed network file: {reason}"),
            MlErr::Init(e) => write!(f, "failed to initialize parameters: {e}"),
            MlErr::Config(e) => write!(f, "invalid training configuration: {e}"),
            MlErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Init(e) => Some(e),
            MlErr::Config(e) => Some(e),
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<NormalError> for MlErr {
    fn from(value: NormalError) -> Self {
        Self::Init(value)
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}
