pub mod get_token;

pub use get_token::{GetToken, GET_TOKEN};
