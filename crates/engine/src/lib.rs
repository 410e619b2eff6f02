pub mod analyzer;
pub mod comparison;
pub mod config;
pub mod error;
pub mod positions;
pub mod signals;
pub mod snapshot;
pub mod summary;
pub mod technical;

pub use analyzer::{AnalysisRun, PortfolioAnalyzer, SymbolFailure, TechnicalAnalysis};
pub use comparison::{normalize, Comparison, NormalizedSeries};
pub use config::{AnalysisConfig, IndicatorConfig, SignalConfig};
pub use error::AnalysisError;
pub use positions::value_positions;
pub use signals::{detect, Signal};
pub use snapshot::price_change;
pub use summary::summarize;
pub use technical::{LatestReadings, PriceMetrics, TechnicalReport, WindowedSeries};
