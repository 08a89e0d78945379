pub mod authentication;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod gate;
pub mod token_codec;

pub use authentication::{AuthenticationService, IssuedToken};
pub use credentials::{CredentialError, CredentialVerifier};
pub use error::AuthError;
pub use factory::build_token_codec;
pub use gate::AuthorizationGate;
pub use token_codec::{TokenCodec, TokenCodecError};
