//! Token refresh protocol

use agenda_domain::{ApiRequest, RefreshRequest, RefreshResponse};
use tracing::{debug, info, warn};

use super::SessionContext;
use super::response::decode;
use crate::error::ApiResult;

/// Exchanges the stored refresh token for a new pair.
///
/// Returns true when a new pair was stored. Any failure signs the session
/// out: both tokens are removed and the identity cache is invalidated.
pub(super) async fn refresh_session(ctx: SessionContext) -> bool {
    let Some(refresh_token) = ctx.tokens.get().refresh_token else {
        debug!("no refresh token stored, skipping refresh");
        return false;
    };

    let outcome = match exchange(&ctx, refresh_token).await {
        Ok(pair) => ctx
            .tokens
            .set(Some(&pair.access_token), Some(&pair.refresh_token))
            .map_err(Into::into),
        Err(error) => Err(error),
    };

    match outcome {
        Ok(_) => {
            info!("session refreshed");
            true
        }
        Err(error) => {
            warn!(error = %error, "token refresh failed, signing out");
            ctx.sign_out();
            false
        }
    }
}

async fn exchange(ctx: &SessionContext, refresh_token: String) -> ApiResult<RefreshResponse> {
    let url = ctx.url("/auth/refresh").await;
    let request = ApiRequest::post(url).with_json(&RefreshRequest { refresh_token })?;
    let response = ctx.send_public(request).await?;
    decode(&response)
}
