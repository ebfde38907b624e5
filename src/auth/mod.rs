pub mod claims;
pub mod extractors;
pub mod password;
