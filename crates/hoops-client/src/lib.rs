pub mod extractor;
pub mod fetcher;

pub use extractor::TableExtractor;
pub use fetcher::ReqwestFetcher;
