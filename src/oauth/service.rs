use rand::Rng;
use reqwest::Url;
use tracing::{error, info, warn};

use crate::auth::dto::AuthPayload;
use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::{ExperienceLevel, NewUser, User};
use crate::auth::{password, service as auth_service};
use crate::config::AppConfig;
use crate::email::{self, EmailTemplate};
use crate::oauth::dto::{FigmaProfile, FigmaTokens, GoogleProfile, GoogleTokens, ProviderProfile, SocialProfile};
use crate::response::ApiResponse;
use crate::state::AppState;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const FIGMA_AUTHORIZE_URL: &str = "https://www.figma.com/oauth";
const FIGMA_OAUTH_TOKEN_URL: &str = "https://www.figma.com/api/oauth/token";
const FIGMA_PROFILE_URL: &str = "https://api.figma.com/v1/me";

const RANDOM_PASSWORD_LENGTH: usize = 12;
const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+[]{}|;:,.<>?";

fn redirect_uri(config: &AppConfig) -> String {
    format!("{}/oauth-verify", config.client_base_domain)
}

/// Authorization URL for Google's consent screen.
pub fn google_authorization_url(config: &AppConfig) -> anyhow::Result<String> {
    let scopes = [
        "https://www.googleapis.com/auth/userinfo.profile",
        "openid",
        "https://www.googleapis.com/auth/userinfo.email",
    ];
    let mut url = Url::parse(GOOGLE_AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.google.client_id)
        .append_pair("redirect_uri", &redirect_uri(config))
        .append_pair("response_type", "code")
        .append_pair("scope", &scopes.join(" "))
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("include_granted_scopes", "true");
    Ok(url.to_string())
}

/// Authorization URL for Figma's consent screen.
pub fn figma_authorization_url(config: &AppConfig) -> anyhow::Result<String> {
    let mut url = Url::parse(FIGMA_AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.figma.client_id)
        .append_pair("redirect_uri", &redirect_uri(config))
        .append_pair("scope", "file_read")
        .append_pair("state", "state")
        .append_pair("response_type", "code");
    Ok(url.to_string())
}

/// Exchanges a Google authorization code for tokens.
pub async fn get_google_oauth_tokens(
    http: &reqwest::Client,
    config: &AppConfig,
    code: &str,
) -> anyhow::Result<GoogleTokens> {
    let params = [
        ("code", code),
        ("client_id", config.google.client_id.as_str()),
        ("client_secret", config.google.client_secret.as_str()),
        ("redirect_uri", &redirect_uri(config)),
        ("grant_type", "authorization_code"),
    ];
    let tokens = http
        .post(GOOGLE_OAUTH_TOKEN_URL)
        .form(&params)
        .send()
        .await?
        .error_for_status()?
        .json::<GoogleTokens>()
        .await?;
    Ok(tokens)
}

/// Fetches the Google profile for the exchanged tokens.
pub async fn get_google_profile(
    http: &reqwest::Client,
    access_token: &str,
    id_token: &str,
) -> anyhow::Result<GoogleProfile> {
    let profile = http
        .get(GOOGLE_PROFILE_URL)
        .query(&[("alt", "json"), ("access_token", access_token)])
        .bearer_auth(id_token)
        .send()
        .await?
        .error_for_status()?
        .json::<GoogleProfile>()
        .await?;
    Ok(profile)
}

/// Exchanges a Figma authorization code for tokens.
pub async fn get_figma_oauth_tokens(
    http: &reqwest::Client,
    config: &AppConfig,
    code: &str,
) -> anyhow::Result<FigmaTokens> {
    let params = [
        ("client_id", config.figma.client_id.as_str()),
        ("client_secret", config.figma.client_secret.as_str()),
        ("redirect_uri", &redirect_uri(config)),
        ("code", code),
        ("grant_type", "authorization_code"),
    ];
    let tokens = http
        .post(FIGMA_OAUTH_TOKEN_URL)
        .form(&params)
        .send()
        .await?
        .error_for_status()?
        .json::<FigmaTokens>()
        .await?;
    Ok(tokens)
}

/// Fetches the Figma profile for the exchanged token.
pub async fn get_figma_profile(
    http: &reqwest::Client,
    access_token: &str,
) -> anyhow::Result<FigmaProfile> {
    let profile = http
        .get(FIGMA_PROFILE_URL)
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?
        .json::<FigmaProfile>()
        .await?;
    Ok(profile)
}

/// Normalizes a provider profile into the local shape. Google carries split
/// name fields; Figma's handle is split on its first space.
pub fn format_profile(profile: &ProviderProfile) -> SocialProfile {
    match profile {
        ProviderProfile::Google(google) => SocialProfile {
            first_name: google.given_name.clone(),
            last_name: google.family_name.clone(),
            email: google.email.clone(),
            image_url: (!google.picture.is_empty()).then(|| google.picture.clone()),
        },
        ProviderProfile::Figma(figma) => {
            let mut parts = figma.handle.split(' ');
            SocialProfile {
                first_name: parts.next().unwrap_or("").to_string(),
                last_name: parts.next().unwrap_or("").to_string(),
                email: figma.email.clone(),
                image_url: (!figma.img_url.is_empty()).then(|| figma.img_url.clone()),
            }
        }
    }
}

pub fn generate_random_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| PASSWORD_CHARSET[rng.gen_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// Logs in an existing account or creates one from the provider profile.
/// New accounts get a hashed random password and start out verified, and a
/// welcome email goes out on a best-effort basis.
pub async fn authenticate_user_profile(
    state: &AppState,
    keys: &JwtKeys,
    profile: &ProviderProfile,
) -> Result<AuthPayload, ApiResponse> {
    let profile = format_profile(profile);

    if let Some(existing) = auth_service::check_email_exists(&state.db, &profile.email).await? {
        return Ok(auth_service::generate_user_payload(keys, &existing)?);
    }

    let random_password = generate_random_password(RANDOM_PASSWORD_LENGTH);
    let password_hash = password::hash_password(&random_password, state.config.hash_cost)?;

    let super_admin = &state.config.super_admin_email;
    let experience_level = if !super_admin.is_empty() && profile.email == *super_admin {
        ExperienceLevel::SuperAdmin
    } else {
        ExperienceLevel::Regular
    };

    let user = User::create(
        &state.db,
        NewUser {
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            password_hash,
            image_id: None,
            image_url: profile.image_url,
            experience_level,
            is_verified: true,
        },
    )
    .await
    .map_err(|err| {
        error!(error = %err, "oauth user creation failed");
        ApiResponse::internal().with_error("An error occurred while creating user profile")
    })?;

    info!(user_id = %user.id, email = %user.email, "user created from oauth profile");

    let fullname = format!("{} {}", user.first_name, user.last_name);
    if let Err(response) = email::send_email(
        state.mailer.as_ref(),
        &user.email,
        "Welcome to Moospire",
        EmailTemplate::WelcomeOauth,
        &[("fullName", fullname.as_str())],
    )
    .await
    {
        warn!(error = %response, "oauth welcome email failed");
    }

    Ok(auth_service::generate_user_payload(keys, &user)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_profiles_map_their_split_name_fields() {
        let profile = ProviderProfile::Google(GoogleProfile {
            email: "jane@example.com".into(),
            given_name: "Jane".into(),
            family_name: "Doe".into(),
            picture: "https://lh3.example/jane.png".into(),
            name: "Jane Doe".into(),
            verified_email: true,
        });
        assert_eq!(
            format_profile(&profile),
            SocialProfile {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                email: "jane@example.com".into(),
                image_url: Some("https://lh3.example/jane.png".into()),
            }
        );
    }

    #[test]
    fn figma_handles_split_on_the_first_space() {
        let profile = ProviderProfile::Figma(FigmaProfile {
            email: "jane@example.com".into(),
            handle: "Jane Doe".into(),
            img_url: "https://figma.example/jane.png".into(),
            id: "123".into(),
        });
        let formatted = format_profile(&profile);
        assert_eq!(formatted.first_name, "Jane");
        assert_eq!(formatted.last_name, "Doe");
    }

    #[test]
    fn single_word_figma_handles_leave_the_last_name_empty() {
        let profile = ProviderProfile::Figma(FigmaProfile {
            email: "jane@example.com".into(),
            handle: "janedoe".into(),
            img_url: String::new(),
            id: String::new(),
        });
        let formatted = format_profile(&profile);
        assert_eq!(formatted.first_name, "janedoe");
        assert_eq!(formatted.last_name, "");
        assert_eq!(formatted.image_url, None);
    }

    #[test]
    fn random_passwords_use_the_full_charset_alphabet() {
        let password = generate_random_password(RANDOM_PASSWORD_LENGTH);
        assert_eq!(password.len(), RANDOM_PASSWORD_LENGTH);
        assert!(password
            .bytes()
            .all(|b| PASSWORD_CHARSET.contains(&b)));
    }

    #[test]
    fn authorization_urls_carry_the_expected_query() {
        let config = crate::state::test_config();
        let url = google_authorization_url(&config).unwrap();
        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("openid"));

        let url = figma_authorization_url(&config).unwrap();
        assert!(url.starts_with(FIGMA_AUTHORIZE_URL));
        assert!(url.contains("scope=file_read"));
        assert!(url.contains("response_type=code"));
    }
}
