use tracing::{info, warn};

use super::{
    credentials::{hash_password, is_valid_email, normalize_email, normalize_username, verify_password},
    jwt::JwtKeys,
    repo_types::{NewUser, Role, User},
};
use crate::{
    error::{AppError, AppResult},
    store::Store,
};

/// Same text for unknown email and wrong password.
pub const BAD_CREDENTIALS: &str = "username or password incorrect";

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

pub async fn register(store: &dyn Store, input: Registration) -> AppResult<User> {
    let role = Role::parse_requested(input.role.as_deref())
        .ok_or_else(|| AppError::validation("Role for account only user or admin"))?;

    let username = normalize_username(&input.username);
    if username.is_empty() {
        return Err(AppError::validation("username is required"));
    }
    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }
    if input.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }

    let password_hash = hash_password(&input.password)?;
    let user = store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user registered");
    Ok(user)
}

#[derive(Debug)]
pub struct LoginSuccess {
    pub token: String,
    pub user: User,
}

pub async fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> AppResult<LoginSuccess> {
    let email = normalize_email(email);

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::auth(BAD_CREDENTIALS));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::auth(BAD_CREDENTIALS));
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(LoginSuccess { token, user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::store::memory::MemoryStore;
    use axum::extract::FromRef;

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_valid_token() {
        let store = MemoryStore::new();
        let keys = JwtKeys::from_ref(&AppState::fake());

        let user = register(&store, registration("alice", "a@x.com", "secret"))
            .await
            .expect("register");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret");

        let ok = login(&store, &keys, "a@x.com", "secret").await.expect("login");
        assert_eq!(ok.user.username, "alice");
        assert_eq!(keys.verify(&ok.token).expect("token validates").sub, user.id);

        let err = login(&store, &keys, "a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(ref m) if m == BAD_CREDENTIALS));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let store = MemoryStore::new();
        let keys = JwtKeys::from_ref(&AppState::fake());
        register(&store, registration("bob", "b@x.com", "pw")).await.unwrap();

        let unknown = login(&store, &keys, "nobody@x.com", "pw").await.unwrap_err();
        let wrong = login(&store, &keys, "b@x.com", "nope").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status(), wrong.status());
    }

    #[tokio::test]
    async fn role_is_validated_and_normalised() {
        let store = MemoryStore::new();
        let mut admin = registration("root", "root@x.com", "pw");
        admin.role = Some("Admin".into());
        assert_eq!(register(&store, admin).await.unwrap().role, Role::Admin);

        let mut bogus = registration("eve", "eve@x.com", "pw");
        bogus.role = Some("owner".into());
        let err = register(&store, bogus).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        register(&store, registration("alice", "a@x.com", "pw")).await.unwrap();

        let same_email = register(&store, registration("alice2", "A@X.com", "pw")).await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));

        let same_name = register(&store, registration(" alice ", "other@x.com", "pw")).await;
        assert!(matches!(same_name, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn username_is_escaped_before_storage() {
        let store = MemoryStore::new();
        let user = register(&store, registration("  <i>zed</i> ", "z@x.com", "pw"))
            .await
            .unwrap();
        assert_eq!(user.username, "&lt;i&gt;zed&lt;/i&gt;");
    }
}
