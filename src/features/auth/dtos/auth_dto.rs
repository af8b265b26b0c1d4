use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request DTO for user registration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,

    #[validate(length(min = 2, max = 255, message = "Name must be at least 2 characters long"))]
    pub name: String,
}

/// Request DTO for login
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Public representation of a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Response DTO for register/login: a bearer token plus the user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: UserResponseDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    #[test]
    fn test_register_dto_accepts_generated_identities() {
        for _ in 0..20 {
            let dto = RegisterRequestDto {
                email: SafeEmail().fake(),
                password: "secret-password".to_string(),
                name: Name().fake(),
            };
            assert!(dto.validate().is_ok(), "rejected {:?}", dto.email);
        }
    }

    #[test]
    fn test_register_dto_rejects_bad_input() {
        let bad_email = RegisterRequestDto {
            email: "not-an-email".to_string(),
            password: "secret-password".to_string(),
            name: "Owner".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequestDto {
            email: SafeEmail().fake(),
            password: "short".to_string(),
            name: "Owner".to_string(),
        };
        assert!(short_password.validate().is_err());

        let short_name = RegisterRequestDto {
            email: SafeEmail().fake(),
            password: "secret-password".to_string(),
            name: "O".to_string(),
        };
        assert!(short_name.validate().is_err());
    }
}
