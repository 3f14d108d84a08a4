use std::time::Duration;

use rand::Rng;

use crate::cache::CacheStore;

pub const DEFAULT_OTP_LENGTH: usize = 6;

pub fn otp_key(email: &str) -> String {
    format!("otp-{}", email)
}

/// Numeric code of the given length, digits only.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Generates a fresh OTP for the email and stores it with a TTL. Any live
/// code for the same email is deleted first, so at most one code is ever
/// valid per address.
pub async fn generate_user_otp(
    cache: &dyn CacheStore,
    email: &str,
    ttl: Duration,
) -> anyhow::Result<String> {
    let otp = generate_otp(DEFAULT_OTP_LENGTH);
    let key = otp_key(email);

    if cache.get(&key).await?.is_some() {
        cache.del(&key).await?;
    }
    cache.set_ex(&key, &otp, ttl.as_secs()).await?;

    Ok(otp)
}
