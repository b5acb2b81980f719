//! External collaborators: sentiment, market data and news providers

pub mod llm;
pub mod market_data;
pub mod traits;

pub use llm::LlmSentimentClient;
pub use market_data::HttpMarketDataClient;
pub use traits::{
    DataProvider, NewsArticle, NewsProvider, SentimentEstimate, SentimentSource,
};
