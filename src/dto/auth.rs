use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_not_blank;

/// Long-lived NPSSO cookie copied from the console network website.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NpssoRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "NPSSO token required"))]
    pub npsso: String,
}

/// Refresh token issued by a previous login or rotation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank", message = "Refresh token required"))]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_npsso_fails_validation() {
        let request: NpssoRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn refresh_token_is_camel_case() {
        let request: RefreshRequest =
            serde_json::from_str(r#"{"refreshToken":"r-1"}"#).unwrap();
        assert_eq!(request.refresh_token, "r-1");
        assert!(request.validate().is_ok());
    }
}
