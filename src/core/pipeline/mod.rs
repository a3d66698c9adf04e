//! End-to-end pipeline from audio or transcript to a stored patient record

pub mod coordinator;

pub use coordinator::{
    PipelineCoordinator, PipelineOutcome, PipelineRequest, PipelineTarget, ProcessRequest,
    MISSING_FIELDS_MESSAGE, TEMPLATE_NOT_FOUND_MESSAGE,
};
