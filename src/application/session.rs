//! Session validation.

use crate::domain::{CurrentUser, Result};

use super::parser::decode;
use super::transport::{Endpoint, RateLimitedTransport, Transport};

/// Confirms the credential by fetching the identity it is bound to.
///
/// # Errors
/// `Auth` on 401; any other failure class as returned by the transport.
pub async fn validate<T: Transport>(transport: &RateLimitedTransport<T>) -> Result<CurrentUser> {
    let payload = transport.call(&Endpoint::CurrentUser).await?;
    let user: CurrentUser = decode(payload)?;

    tracing::info!(user_id = %user.id, username = %user.username, "Session validated");

    Ok(user)
}
