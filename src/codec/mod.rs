//! Wire codecs for client payloads

pub mod data_url;

pub use data_url::DecodedAsset;
