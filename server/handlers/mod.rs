pub mod accounts;
pub mod diagnosis;
pub mod error;
pub mod history;
pub mod upload;
