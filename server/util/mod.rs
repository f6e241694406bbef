pub mod form;
pub mod http;
pub mod multipart;
