//! Account flows: login, token refresh, logout, password reset, activation
//! and administrative provisioning.
//!
//! Each flow validates its input, talks to the stores and the token service,
//! and reports failures as `ApiError` so handlers can return them directly.
//! Email is always sent after the database work has committed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use crate::auth::{RoleResolver, TokenError, TokenService};
use crate::db::{ActivationOutcome, ActivationUpdate, Database, NewPhoto, UserStatus};
use crate::error::{ApiError, ResultExt, validate_uuid};
use crate::jwt::unix_now;
use crate::mail::{self, Mailer};
use crate::password::{hash_password, verify_password};
use crate::validation::ValidationErrors;

/// Lifetime of activation and password reset tokens.
pub const ONE_TIME_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Largest accepted photo upload.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Returned by forgot-password whether or not the email is registered.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If that email is registered, you will receive a reset link.";

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub username: Option<String>,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: LoginUser,
}

/// Profile fields submitted with an activation.
#[derive(Debug, Clone, Default)]
pub struct ActivationForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub photos: Vec<NewPhoto>,
}

/// A freshly provisioned, not yet activated account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

pub struct AccountService {
    db: Database,
    tokens: Arc<TokenService>,
    resolver: Arc<RoleResolver>,
    mailer: Arc<dyn Mailer>,
    frontend_url: Url,
}

impl AccountService {
    pub fn new(
        db: Database,
        tokens: Arc<TokenService>,
        resolver: Arc<RoleResolver>,
        mailer: Arc<dyn Mailer>,
        frontend_url: Url,
    ) -> Self {
        Self {
            db,
            tokens,
            resolver,
            mailer,
            frontend_url,
        }
    }

    /// Exchange credentials for an access and refresh token pair.
    ///
    /// Unknown email and wrong password produce the same error. An account
    /// that has not been activated is refused before its password is checked.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<LoginResponse, ApiError> {
        let mut v = ValidationErrors::new();
        v.email("email", email);
        v.password("password", password);
        v.finish()?;
        let (email, password) = (email.unwrap_or_default().trim(), password.unwrap_or_default());

        let user = self
            .db
            .users()
            .get_by_email(email)
            .await
            .db_err("Failed to look up user")?
            .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

        if user.status != UserStatus::Active {
            return Err(ApiError::forbidden("Please activate your account first"));
        }

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;
        if !verify_password(password, hash).internal_err("Failed to verify password")? {
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        let role = self
            .resolver
            .resolve(&user.role)
            .await
            .internal_err("Failed to resolve role")?;
        let mut permissions: Vec<String> = role.permissions.iter().cloned().collect();
        permissions.sort();

        let access_token = self
            .tokens
            .issue_access_token(&user.uuid, &user.role)
            .internal_err("Failed to issue access token")?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(user.id, &user.uuid)
            .await
            .internal_err("Failed to issue refresh token")?;

        info!(user = %user.uuid, role = %user.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: LoginUser {
                id: user.uuid,
                username: user.username,
                email: user.email,
                role: user.role,
                permissions,
            },
        })
    }

    /// Mint a new access token from a refresh token. The refresh token itself
    /// is not rotated.
    pub async fn refresh_access_token(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<String, ApiError> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request("Refresh token is required"))?;

        let subject = match self.tokens.verify_refresh_token(refresh_token).await {
            Ok(subject) => subject,
            Err(TokenError::NotFound) => {
                return Err(ApiError::forbidden("Refresh token not found"));
            }
            Err(TokenError::Invalid) => return Err(ApiError::forbidden("Invalid refresh token")),
            Err(TokenError::Expired) => return Err(ApiError::forbidden("Refresh token expired")),
            Err(e) => return Err(ApiError::internal_error("Failed to verify refresh token", e)),
        };

        let Some(user) = self
            .db
            .users()
            .get_by_id(subject.user_id)
            .await
            .db_err("Failed to look up user")?
        else {
            self.tokens
                .revoke_refresh_token(refresh_token)
                .await
                .internal_err("Failed to revoke refresh token")?;
            return Err(ApiError::forbidden("Refresh token not found"));
        };

        self.tokens
            .issue_access_token(&user.uuid, &user.role)
            .internal_err("Failed to issue access token")
    }

    /// Revoke a refresh token. Always succeeds from the caller's view.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token.filter(|t| !t.is_empty()) else {
            return;
        };
        if let Err(e) = self.tokens.revoke_refresh_token(token).await {
            warn!(error = %e, "Failed to revoke refresh token on logout");
        }
    }

    /// Start a password reset. The result does not reveal whether the email
    /// is registered, and mail failures are only logged.
    pub async fn forgot_password(&self, email: Option<&str>) -> Result<&'static str, ApiError> {
        let mut v = ValidationErrors::new();
        let email = v.require("email", email, "Email is required");
        v.finish()?;
        let email = email.unwrap_or_default();

        let Some(user) = self
            .db
            .users()
            .get_by_email(email)
            .await
            .db_err("Failed to look up user")?
        else {
            return Ok(FORGOT_PASSWORD_MESSAGE);
        };

        let token = random_token();
        let expires_at = expiry_from_now()?;
        self.db
            .reset_tokens()
            .replace_for_user(user.id, &token, expires_at)
            .await
            .db_err("Failed to store reset token")?;

        let link = self.link("reset-password", &token);
        if let Err(e) = self
            .mailer
            .send(&user.email, mail::RESET_SUBJECT, &mail::reset_html(&link))
            .await
        {
            error!(user = %user.uuid, error = %e, "Failed to send password reset email");
        }

        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    /// Set a new password using a reset token. The token is consumed.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: Option<&str>,
        confirm_password: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut v = ValidationErrors::new();
        v.password("newPassword", new_password);
        let confirmed = v
            .require(
                "confirmPassword",
                confirm_password,
                "Password confirmation is required",
            )
            .is_some();
        if confirmed && new_password != confirm_password {
            v.add("confirmPassword", "Passwords do not match");
        }
        v.finish()?;
        let new_password = new_password.unwrap_or_default();

        let hash = hash_password(new_password).internal_err("Failed to hash password")?;
        let now = now_secs()?;

        let reset = self
            .db
            .users()
            .reset_password_with_token(token, now, &hash)
            .await
            .db_err("Failed to reset password")?;
        if !reset {
            return Err(ApiError::bad_request("Invalid or expired token"));
        }

        info!("Password reset completed");
        Ok(())
    }

    /// Activate an account: consume the token, store the profile and photos,
    /// and mark the user active, all in one transaction.
    pub async fn activate(&self, token: &str, form: ActivationForm) -> Result<(), ApiError> {
        let mut v = ValidationErrors::new();
        if token.trim().is_empty() {
            v.add("token", "Token is required");
        }
        let username = v
            .require("username", form.username.as_deref(), "Username is required")
            .map(str::to_string);
        v.password("password", form.password.as_deref());
        for photo in &form.photos {
            check_photo(&mut v, "photos", photo);
        }
        v.finish()?;

        let password_hash = hash_password(form.password.as_deref().unwrap_or_default())
            .internal_err("Failed to hash password")?;
        let update = ActivationUpdate {
            username: username.unwrap_or_default(),
            password_hash,
            phone: form
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            photos: form.photos,
        };

        let outcome = self
            .db
            .users()
            .activate_with_token(token, now_secs()?, &update)
            .await
            .db_err("Failed to activate account")?;

        match outcome {
            ActivationOutcome::Activated(user_id) => {
                info!(user_id, username = %update.username, "Account activated");
                Ok(())
            }
            ActivationOutcome::InvalidToken => {
                Err(ApiError::bad_request("Invalid or expired activation link"))
            }
            ActivationOutcome::UsernameTaken => {
                Err(ApiError::conflict("Username is already taken"))
            }
        }
    }

    /// Create an inactive account with the given role and email its
    /// activation link.
    ///
    /// If the email cannot be sent the account and token stay in place and
    /// `resend_activation` can be used.
    pub async fn admin_create_user(
        &self,
        email: Option<&str>,
        role_name: Option<&str>,
    ) -> Result<ProvisionedUser, ApiError> {
        let mut v = ValidationErrors::new();
        v.email("email", email);
        let role_name = v.require("roleName", role_name, "Role is required");
        v.finish()?;
        let email = email.unwrap_or_default().trim();
        let role_name = role_name.unwrap_or_default();

        let users = self.db.users();
        if users
            .get_by_email(email)
            .await
            .db_err("Failed to look up user")?
            .is_some()
        {
            return Err(ApiError::conflict("User with this email already exists"));
        }

        let role = self
            .db
            .roles()
            .get_by_name(role_name)
            .await
            .db_err("Failed to look up role")?
            .ok_or_else(|| ApiError::bad_request("Invalid role"))?;

        let uuid = uuid::Uuid::new_v4().to_string();
        let token = random_token();
        let expires_at = expiry_from_now()?;

        if let Err(e) = users
            .create_pending_with_activation(&uuid, email, role.id, &token, expires_at)
            .await
        {
            if is_unique_violation(&e) {
                return Err(ApiError::conflict("User with this email already exists"));
            }
            return Err(ApiError::db_error("Failed to create user", e));
        }

        info!(user = %uuid, role = %role.name, "Provisioned user");

        self.send_activation(email, &token).await?;

        Ok(ProvisionedUser {
            id: uuid,
            email: email.to_string(),
            role: role.name,
        })
    }

    /// Issue a fresh activation token for an inactive account and email it.
    pub async fn resend_activation(&self, email: Option<&str>) -> Result<(), ApiError> {
        let mut v = ValidationErrors::new();
        v.email("email", email);
        v.finish()?;
        let email = email.unwrap_or_default().trim();

        let user = self
            .db
            .users()
            .get_by_email(email)
            .await
            .db_err("Failed to look up user")?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if user.status == UserStatus::Active {
            return Err(ApiError::bad_request("User is already active"));
        }

        let token = random_token();
        self.db
            .activation_tokens()
            .replace_for_user(user.id, &token, expiry_from_now()?)
            .await
            .db_err("Failed to store activation token")?;

        self.send_activation(&user.email, &token).await
    }

    /// Store an uploaded photo, optionally attached to the user with UUID
    /// `owner`. Returns the photo UUID.
    pub async fn upload_photo(
        &self,
        photo: Option<NewPhoto>,
        owner: Option<&str>,
    ) -> Result<String, ApiError> {
        let photo = photo.ok_or_else(|| ApiError::field("photo", "Photo file is required"))?;
        let mut v = ValidationErrors::new();
        check_photo(&mut v, "photo", &photo);
        v.finish()?;

        let owner_id = match owner.map(str::trim).filter(|o| !o.is_empty()) {
            Some(uuid) => {
                validate_uuid(uuid)?;
                let user = self
                    .db
                    .users()
                    .get_by_uuid(uuid)
                    .await
                    .db_err("Failed to look up user")?
                    .ok_or_else(|| ApiError::not_found("User not found"))?;
                Some(user.id)
            }
            None => None,
        };

        let id = self
            .db
            .photos()
            .save(&photo, owner_id)
            .await
            .db_err("Failed to save photo")?;
        info!(photo = %id, owner = ?owner_id, bytes = photo.data.len(), "Stored photo");
        Ok(id)
    }

    async fn send_activation(&self, email: &str, token: &str) -> Result<(), ApiError> {
        let link = self.link("activate", token);
        self.mailer
            .send(email, mail::ACTIVATION_SUBJECT, &mail::activation_html(&link))
            .await
            .map_err(|e| {
                error!(to = %email, error = %e, "Failed to send activation email");
                ApiError::delivery("Failed to send activation email")
            })
    }

    /// `{frontend_url}/{path}/{token}`
    fn link(&self, path: &str, token: &str) -> String {
        format!(
            "{}/{}/{}",
            self.frontend_url.as_str().trim_end_matches('/'),
            path,
            token
        )
    }
}

/// 32 random bytes, hex encoded.
fn random_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn now_secs() -> Result<i64, ApiError> {
    unix_now()
        .map(|n| n as i64)
        .internal_err("System time error")
}

fn expiry_from_now() -> Result<i64, ApiError> {
    Ok(now_secs()? + ONE_TIME_TOKEN_TTL_SECS)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
}

/// Photos must be images of at most `MAX_PHOTO_BYTES`.
fn check_photo(v: &mut ValidationErrors, field: &str, photo: &NewPhoto) {
    if !photo.content_type.starts_with("image/") {
        v.add(field, format!("{} is not an image", display_name(photo)));
    }
    if photo.data.len() > MAX_PHOTO_BYTES {
        v.add(field, format!("{} is larger than 5 MB", display_name(photo)));
    }
}

fn display_name(photo: &NewPhoto) -> &str {
    if photo.filename.is_empty() {
        "Photo"
    } else {
        &photo.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtConfig;
    use crate::mail::MemoryMailer;

    struct Fixture {
        db: Database,
        mailer: Arc<MemoryMailer>,
        service: AccountService,
    }

    async fn fixture() -> Fixture {
        let db = Database::open(":memory:").await.unwrap();
        db.seed_defaults().await.unwrap();
        let jwt = Arc::new(JwtConfig::new(
            b"access-secret-for-testing-0123456789",
            b"refresh-secret-for-testing-0123456789",
        ));
        let mailer = Arc::new(MemoryMailer::new());
        let service = AccountService::new(
            db.clone(),
            Arc::new(TokenService::new(db.clone(), jwt)),
            Arc::new(RoleResolver::new(db.clone())),
            mailer.clone(),
            Url::parse("https://app.example.com/").unwrap(),
        );
        Fixture {
            db,
            mailer,
            service,
        }
    }

    fn token_from_link(html: &str, path: &str) -> String {
        let marker = format!("/{path}/");
        let start = html.find(&marker).unwrap() + marker.len();
        html[start..start + 64].to_string()
    }

    async fn active_user(f: &Fixture, email: &str, password: &str) {
        f.service
            .admin_create_user(Some(email), Some("user"))
            .await
            .unwrap();
        let mail = f.mailer.last_to(email).unwrap();
        let token = token_from_link(&mail.html, "activate");
        f.service
            .activate(
                &token,
                ActivationForm {
                    username: Some(email.split('@').next().unwrap().to_string()),
                    password: Some(password.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_validation_lists_fields() {
        let f = fixture().await;
        let err = f.service.login(Some("bad"), Some("123")).await.unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "password"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_inactive_user() {
        let f = fixture().await;
        f.service
            .admin_create_user(Some("new@x.com"), Some("user"))
            .await
            .unwrap();

        let err = f
            .service
            .login(Some("new@x.com"), Some("whatever"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let user = f.db.users().get_by_email("new@x.com").await.unwrap().unwrap();
        assert_eq!(f.db.refresh_tokens().count_for_user(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_login_returns_permissions() {
        let f = fixture().await;
        active_user(&f, "bob@x.com", "secret1").await;

        let response = f
            .service
            .login(Some("bob@x.com"), Some("secret1"))
            .await
            .unwrap();
        assert_eq!(response.user.role, "user");
        assert_eq!(response.user.permissions, vec!["user.read".to_string()]);
        assert_eq!(response.user.username.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_forgot_password_replaces_token() {
        let f = fixture().await;
        active_user(&f, "bob@x.com", "secret1").await;
        let user = f.db.users().get_by_email("bob@x.com").await.unwrap().unwrap();

        f.service.forgot_password(Some("bob@x.com")).await.unwrap();
        f.service.forgot_password(Some("bob@x.com")).await.unwrap();
        assert_eq!(f.db.reset_tokens().count_for_user(user.id).await.unwrap(), 1);

        let message = f.service.forgot_password(Some("nobody@x.com")).await.unwrap();
        assert_eq!(message, FORGOT_PASSWORD_MESSAGE);
    }

    #[tokio::test]
    async fn test_forgot_password_hides_mail_failure() {
        let f = fixture().await;
        active_user(&f, "bob@x.com", "secret1").await;
        f.mailer.set_failing(true);

        assert_eq!(
            f.service.forgot_password(Some("bob@x.com")).await.unwrap(),
            FORGOT_PASSWORD_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let f = fixture().await;
        active_user(&f, "bob@x.com", "secret1").await;
        f.service.forgot_password(Some("bob@x.com")).await.unwrap();
        let mail = f.mailer.last_to("bob@x.com").unwrap();
        let token = token_from_link(&mail.html, "reset-password");

        let err = f
            .service
            .reset_password(&token, Some("newpass1"), Some("newpass2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        f.service
            .reset_password(&token, Some("newpass1"), Some("newpass1"))
            .await
            .unwrap();
        assert!(
            f.service
                .login(Some("bob@x.com"), Some("newpass1"))
                .await
                .is_ok()
        );

        let err = f
            .service
            .reset_password(&token, Some("again12"), Some("again12"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_activation_rejects_non_images() {
        let f = fixture().await;
        let err = f
            .service
            .activate(
                "token",
                ActivationForm {
                    username: Some("bob".into()),
                    password: Some("secret1".into()),
                    phone: None,
                    photos: vec![
                        NewPhoto {
                            data: vec![0; 10],
                            content_type: "text/plain".into(),
                            filename: "notes.txt".into(),
                        },
                        NewPhoto {
                            data: vec![0; MAX_PHOTO_BYTES + 1],
                            content_type: "image/png".into(),
                            filename: "big.png".into(),
                        },
                    ],
                },
            )
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_admin_create_duplicate_and_bad_role() {
        let f = fixture().await;
        f.service
            .admin_create_user(Some("a@x.com"), Some("user"))
            .await
            .unwrap();

        let dup = f
            .service
            .admin_create_user(Some("A@x.com"), Some("user"))
            .await
            .unwrap_err();
        assert!(matches!(dup, ApiError::Conflict(_)));

        let bad = f
            .service
            .admin_create_user(Some("b@x.com"), Some("wizard"))
            .await
            .unwrap_err();
        assert!(matches!(bad, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_admin_create_mail_failure_keeps_user() {
        let f = fixture().await;
        f.mailer.set_failing(true);

        let err = f
            .service
            .admin_create_user(Some("a@x.com"), Some("user"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Delivery(_)));
        let user = f.db.users().get_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(
            f.db.activation_tokens().count_for_user(user.id).await.unwrap(),
            1
        );

        f.mailer.set_failing(false);
        f.service.resend_activation(Some("a@x.com")).await.unwrap();
        assert!(f.mailer.last_to("a@x.com").is_some());
    }

    #[tokio::test]
    async fn test_resend_activation_errors() {
        let f = fixture().await;
        let missing = f
            .service
            .resend_activation(Some("ghost@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(missing, ApiError::NotFound(_)));

        active_user(&f, "bob@x.com", "secret1").await;
        let active = f
            .service
            .resend_activation(Some("bob@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(active, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_refresh_errors() {
        let f = fixture().await;
        assert!(matches!(
            f.service.refresh_access_token(None).await.unwrap_err(),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            f.service.refresh_access_token(Some("nope")).await.unwrap_err(),
            ApiError::Forbidden(_)
        ));
    }

    fn png(len: usize) -> NewPhoto {
        NewPhoto {
            data: vec![0; len],
            content_type: "image/png".to_string(),
            filename: "me.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_photo_with_owner() {
        let f = fixture().await;
        active_user(&f, "bob@x.com", "secret1").await;
        let bob = f.db.users().get_by_email("bob@x.com").await.unwrap().unwrap();

        let id = f
            .service
            .upload_photo(Some(png(10)), Some(&bob.uuid))
            .await
            .unwrap();
        let stored = f.db.photos().get(&id).await.unwrap().unwrap();
        assert_eq!(stored.owner_id, Some(bob.id));

        let view = f.db.users().get_view(&bob.uuid).await.unwrap().unwrap();
        assert!(view.photos.contains(&id));
    }

    #[tokio::test]
    async fn test_upload_photo_rejections() {
        let f = fixture().await;

        let err = f.service.upload_photo(None, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let mut text = png(10);
        text.content_type = "text/plain".to_string();
        let err = f.service.upload_photo(Some(text), None).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = f
            .service
            .upload_photo(Some(png(MAX_PHOTO_BYTES + 1)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = f
            .service
            .upload_photo(Some(png(10)), Some("00000000-0000-4000-8000-000000000000"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Without an owner the photo is stored unattached.
        let id = f.service.upload_photo(Some(png(10)), None).await.unwrap();
        assert_eq!(f.db.photos().get(&id).await.unwrap().unwrap().owner_id, None);
    }
}
