use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_not_blank;

/// Microsoft OAuth authorization code obtained with PKCE.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct XboxExchangeRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Missing code"))]
    pub code: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Missing redirectUri"))]
    pub redirect_uri: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Missing codeVerifier"))]
    pub code_verifier: String,
}

/// Credentials returned by the exchange, replayed to list titles.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct XboxTitlesRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Missing xuid"))]
    pub xuid: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Missing xstsToken"))]
    pub xsts_token: String,
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Missing userHash"))]
    pub user_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_titles_credential_is_required() {
        let request: XboxTitlesRequest =
            serde_json::from_str(r#"{"xuid":"2533","xstsToken":"x"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_hash"));
    }
}
