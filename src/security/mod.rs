pub mod csrf;
pub mod headers;
pub mod json;
pub mod rate_limit;
