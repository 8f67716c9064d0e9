pub use crate::{Error, Reset, Result, SolverOptions, Threshold};

pub use crate::coreset::Coreset;
pub use crate::iht::AihtI;
pub use crate::iht_ii::AihtII;
pub use crate::report::{History, IterationReport, Reporter, TableReporter};
pub use crate::solver::{solve, solve_with_reporter, Mode, Solution, SolveStatus};
pub use crate::tangent::TangentSpace;
pub use crate::util::objective;
