//! Policy layer (role quotas, evaluator capability, bundled local evaluator).
//!
//! The quota table is compiled from config at startup; evaluators are
//! consulted per request through `EvaluatorAdapter`.

pub mod evaluator;
pub mod local;
pub mod table;

pub use evaluator::{
    normalize, Conclusion, DecisionEvaluator, EvaluationRequest, EvaluatorAdapter,
    EvaluatorError, Signal, Verdict,
};
pub use local::LocalEvaluator;
pub use table::PolicyTable;
