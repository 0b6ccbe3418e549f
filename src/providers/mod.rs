pub mod caching;
pub mod http;
pub mod rates;

pub use caching::SessionRateProvider;
pub use http::HttpPropertyApi;
pub use rates::ApiRateProvider;
