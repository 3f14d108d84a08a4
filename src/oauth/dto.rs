use serde::Deserialize;

/// Token response from Google's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    pub id_token: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub token_type: String,
}

/// Token response from Figma's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct FigmaTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub expires_in: Option<i64>,
}

/// Google userinfo payload. `given_name`/`family_name` are what identify it
/// as a Google profile.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub verified_email: bool,
}

/// Figma /v1/me payload. `handle`/`img_url` identify it as Figma's shape.
#[derive(Debug, Clone, Deserialize)]
pub struct FigmaProfile {
    pub email: String,
    pub handle: String,
    pub img_url: String,
    #[serde(default)]
    pub id: String,
}

/// Provider profile after the provider-specific fetch.
#[derive(Debug, Clone)]
pub enum ProviderProfile {
    Google(GoogleProfile),
    Figma(FigmaProfile),
}

/// The provider-agnostic shape the rest of the service works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn a_profile_matching_neither_shape_is_rejected() {
        // Lacks given_name/family_name and handle/img_url alike.
        let unknown = json!({
            "email": "jane@example.com",
            "display_name": "Jane Doe",
        });
        assert!(serde_json::from_value::<GoogleProfile>(unknown.clone()).is_err());
        assert!(serde_json::from_value::<FigmaProfile>(unknown).is_err());
    }

    #[test]
    fn provider_shapes_deserialize_from_their_own_payloads() {
        let google = json!({
            "email": "jane@example.com",
            "given_name": "Jane",
            "family_name": "Doe",
            "picture": "https://lh3.example/jane.png",
            "verified_email": true,
        });
        let profile: GoogleProfile = serde_json::from_value(google).unwrap();
        assert_eq!(profile.given_name, "Jane");

        let figma = json!({
            "email": "jane@example.com",
            "handle": "Jane Doe",
            "img_url": "https://figma.example/jane.png",
        });
        let profile: FigmaProfile = serde_json::from_value(figma).unwrap();
        assert_eq!(profile.handle, "Jane Doe");
    }
}
