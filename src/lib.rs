pub mod iq_pipeline;
pub mod logger;
