pub mod classifier;
pub mod error;
pub mod knn;
pub mod logistic_regression;
pub mod newton_cg;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod scale;
pub mod split;

pub use classifier::{accuracy, Classifier, Evaluation};
pub use error::{PipelineError, Result};
pub use pipeline::{run, Config};
pub use report::Report;
