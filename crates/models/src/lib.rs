pub mod errors;
pub mod db;
pub mod validate;
pub mod tenant;
pub mod user;
pub mod user_credentials;
pub mod product;
pub mod commitment;
pub mod subscription;
pub mod capital_call;
pub mod receipt;
pub mod statement;
pub mod kyc_document;
pub mod newsletter;
pub mod manual_asset;

#[cfg(test)]
mod tests;
