mod api_key;
pub mod password;

pub use api_key::{AuthError, KeyAuthenticator, API_KEY_HEADER};
