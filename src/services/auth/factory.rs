/// Factory: build the auth services from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::token_codec::{TokenCodec, TokenCodecError};

pub fn build_token_codec(config: &Config) -> Result<Arc<TokenCodec>, TokenCodecError> {
    let codec = TokenCodec::new(config.jwt_key.as_bytes(), config.jwt_expiration)?;

    Ok(Arc::new(codec))
}
