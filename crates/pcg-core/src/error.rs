use crate::pcg::CgState;
use thiserror::Error;

/// Fatal errors raised while building the product construction graph.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The accept set is a single 32-bit word, so at most 31 preference
    /// levels can be tracked per state.
    #[error("too many preference levels: got {0}, maximum is 31")]
    TooManyPreferences(usize),

    /// The topology must be weakly connected before the product is taken.
    #[error("malformed topology: graph is not weakly connected")]
    MalformedTopology,
}

/// Preference-ordering failures, each carrying the witness pair of states.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// Two states at the same location are incomparable under simulation.
    #[error("states {0} and {1} at location {loc} are incomparable", loc = .0.loc())]
    Inconsistent(CgState, CgState),

    /// A hard preference required by the topology is not justified by the
    /// simulation relation.
    #[error("required preference of {0} over {1} at location {loc} does not hold", loc = .0.loc())]
    SimplePath(CgState, CgState),
}

impl OrderingError {
    /// The pair of states witnessing the failure.
    pub fn witness(&self) -> (&CgState, &CgState) {
        match self {
            OrderingError::Inconsistent(x, y) | OrderingError::SimplePath(x, y) => (x, y),
        }
    }
}
