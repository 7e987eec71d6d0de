pub mod driver;
pub mod error;
pub mod report;
pub mod run;

pub use driver::{LifecycleDriver, TeardownPolicy};
pub use error::{LifecycleError, ReadError, SequenceError, TeardownError};
pub use report::{Phase, RunReport, SequenceReport, StepReport};
pub use run::run_all;
