//! Deterministic half of the stock suggestion pipeline: sales-record domain
//! types, the sales analyzer, the pipeline state machine, the error taxonomy
//! and configuration loading. Nothing here performs I/O apart from reading
//! the config file.

pub mod analysis;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use analysis::{analyze_sales, SalesAnalyzer};
pub use domain::sales::{AnalysisResult, SalesRecord, SalesTrend};
pub use domain::suggestion::{StockSuggestion, StockSuggestionRequest, StockSuggestionResponse};
pub use errors::{DateParseError, InterfaceError, SuggestionError};
pub use flows::{FlowTrace, SuggestionEvent, SuggestionFlow, SuggestionState};
