//! Domain models for docseq.
//!
//! This module contains the core domain types representing sequence
//! configurations, counters, and API contracts.

pub mod config;
pub mod counter;
pub mod dto;

pub use config::{ResetFrequency, SequenceConfig, SequenceFormat};
pub use counter::SequenceCounter;
pub use dto::{
    ApiResponse, BulkFormatFailure, BulkFormatRequest, BulkFormatResponse, ConfigPatch,
    IdentifierRequest, IdentifierResponse, PreviewResponse, ReleaseResponse, ResetRequest,
    StatisticsResponse, UpdateConfigRequest,
};
