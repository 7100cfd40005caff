// src/auth/services.rs

use diesel::Connection;
use inkwell_api::{RegisterRequest, TokenResponse, UserResponse};

use crate::auth::password::PasswordManager;
use crate::auth::tokens::{TokenPair, TokenService};
use crate::db::DbPool;
use crate::db::connection::get_connection;
use crate::db::error::RepositoryError;
use crate::db::models::user::NewUser;
use crate::db::repositories::user_repository::UserRepository;
use crate::error::AppError;

const INVALID_LOGIN: &str = "Invalid email or password";

pub struct AuthService {
    pool: DbPool,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(pool: DbPool, tokens: TokenService) -> Self {
        Self { pool, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Inscription: creates the user and issues its first token pair in one
    /// transaction.
    pub fn register(&self, request: RegisterRequest) -> Result<TokenResponse, AppError> {
        if !Self::is_valid_email(&request.email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }

        let password_hash = PasswordManager::hash(&request.password)?;
        let new_user = NewUser {
            email: request.email.trim().to_string(),
            name: request.name,
            last_name: request.last_name,
            password_hash,
        };

        let mut conn = get_connection(&self.pool)?;
        let pair = conn.transaction::<_, AppError, _>(|conn| {
            if UserRepository::find_by_email(conn, &new_user.email)?.is_some() {
                return Err(AppError::email_taken());
            }

            let user = UserRepository::create(conn, &new_user).map_err(|e| match e {
                RepositoryError::UniqueViolation(_) => AppError::email_taken(),
                other => AppError::from(other),
            })?;

            tracing::info!(user_id = user.id, "User registered");
            self.tokens.issue_pair(conn, &user)
        })?;

        Ok(Self::token_response(pair))
    }

    /// Connexion: the refresh token is reused until rotated or revoked.
    pub fn login(&self, email: &str, password: &str) -> Result<TokenResponse, AppError> {
        let mut conn = get_connection(&self.pool)?;

        let user = UserRepository::find_by_email(&mut conn, email.trim())?
            .ok_or_else(|| AppError::invalid_credentials(INVALID_LOGIN))?;

        if !PasswordManager::verify(password, &user.password_hash) {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AppError::invalid_credentials(INVALID_LOGIN));
        }

        let pair = conn.transaction::<_, AppError, _>(|conn| self.tokens.issue_pair(conn, &user))?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(Self::token_response(pair))
    }

    /// Exchanges a refresh token for a new pair, invalidating the old one.
    pub fn refresh(&self, presented: &str) -> Result<TokenResponse, AppError> {
        let claims = self.tokens.verify_refresh_token(presented)?;

        let mut conn = get_connection(&self.pool)?;
        let pair = conn.transaction::<_, AppError, _>(|conn| {
            self.tokens.rotate_refresh_token(conn, claims.id, presented)
        })?;

        Ok(Self::token_response(pair))
    }

    /// Déconnexion: revokes the user's refresh token.
    pub fn logout(&self, user_id: i32) -> Result<(), AppError> {
        let mut conn = get_connection(&self.pool)?;
        TokenService::revoke(&mut conn, user_id)
    }

    pub fn current_user(&self, user_id: i32) -> Result<UserResponse, AppError> {
        let mut conn = get_connection(&self.pool)?;

        UserRepository::find_by_id(&mut conn, user_id)?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::invalid_credentials("User no longer exists"))
    }

    fn token_response(pair: TokenPair) -> TokenResponse {
        TokenResponse::bearer(pair.access_token, pair.refresh_token)
    }

    fn is_valid_email(email: &str) -> bool {
        let email = email.trim();
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtManager;
    use crate::db::connection::{test_pool, unreachable_pool};

    fn service(pool: DbPool) -> AuthService {
        let jwt = JwtManager::new("auth_service_test_secret").unwrap();
        AuthService::new(pool, TokenService::new(jwt))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "pw1".to_string(),
            name: "Ann".to_string(),
            last_name: Some("Smith".to_string()),
        }
    }

    fn unique_email() -> String {
        format!("a_{}@b.com", uuid::Uuid::new_v4().simple())
    }

    #[test]
    fn email_validation() {
        assert!(AuthService::is_valid_email("a@b.com"));
        assert!(AuthService::is_valid_email(" user.name@mail.example.org "));
        assert!(!AuthService::is_valid_email("invalid email"));
        assert!(!AuthService::is_valid_email("@b.com"));
        assert!(!AuthService::is_valid_email("a@b"));
        assert!(!AuthService::is_valid_email("a@@b.com"));
    }

    #[test]
    fn register_rejects_invalid_email_before_touching_database() {
        let auth = service(unreachable_pool());

        let err = auth.register(register_request("invalid email")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn register_issues_tokens_and_rejects_duplicate_email() {
        let pool = test_pool();
        let auth = service(pool);
        let email = unique_email();

        let tokens = auth.register(register_request(&email)).unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert!(!tokens.refresh_token.is_empty());

        let err = auth
            .register(register_request(&email.to_uppercase()))
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateResource(ref m) if m == "Email already registered"));
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn login_twice_returns_same_refresh_token() {
        let pool = test_pool();
        let auth = service(pool);
        let email = unique_email();
        let registered = auth.register(register_request(&email)).unwrap();

        let first = auth.login(&email, "pw1").unwrap();
        let second = auth.login(&email, "pw1").unwrap();

        assert_eq!(first.refresh_token, second.refresh_token);
        assert_eq!(first.refresh_token, registered.refresh_token);
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn login_rejects_wrong_password_and_unknown_email() {
        let pool = test_pool();
        let auth = service(pool);
        let email = unique_email();
        auth.register(register_request(&email)).unwrap();

        assert!(matches!(
            auth.login(&email, "wrong"),
            Err(AppError::InvalidCredentials(_))
        ));
        assert!(matches!(
            auth.login("nobody_at_all@example.com", "pw1"),
            Err(AppError::InvalidCredentials(_))
        ));
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn refresh_rotates_and_old_token_is_refused() {
        let pool = test_pool();
        let auth = service(pool);
        let original = auth.register(register_request(&unique_email())).unwrap();

        let rotated = auth.refresh(&original.refresh_token).unwrap();
        assert_ne!(rotated.refresh_token, original.refresh_token);

        assert!(matches!(
            auth.refresh(&original.refresh_token),
            Err(AppError::InvalidCredentials(_))
        ));
        assert!(auth.refresh(&rotated.refresh_token).is_ok());
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn refresh_refuses_access_token() {
        let pool = test_pool();
        let auth = service(pool);
        let tokens = auth.register(register_request(&unique_email())).unwrap();

        assert!(matches!(
            auth.refresh(&tokens.access_token),
            Err(AppError::InvalidCredentials(_))
        ));
    }

    #[test]
    #[ignore = "requires DATABASE_URL"]
    fn logout_revokes_refresh_token() {
        let pool = test_pool();
        let auth = service(pool);
        let email = unique_email();
        let tokens = auth.register(register_request(&email)).unwrap();
        let user_id = auth
            .tokens()
            .verify_access_token(&tokens.access_token)
            .unwrap()
            .id;

        auth.logout(user_id).unwrap();
        auth.logout(user_id).unwrap();

        assert!(auth.refresh(&tokens.refresh_token).is_err());
        let again = auth.login(&email, "pw1").unwrap();
        assert_ne!(again.refresh_token, tokens.refresh_token);
    }
}
