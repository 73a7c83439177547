use sqlx::SqliteConnection;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, SignupRequest},
        password::{verify_password, PasswordScheme},
        repo_types::User,
    },
    error::ApiError,
};

/// Create a user unless the username or email is already taken.
///
/// Lookup and insert run as separate autocommit statements so no connection
/// ever holds a read lock it later needs to upgrade. The uniqueness
/// constraints on `users` close the gap between the two.
pub async fn signup(
    conn: &mut SqliteConnection,
    scheme: PasswordScheme,
    req: SignupRequest,
) -> Result<PublicUser, ApiError> {
    if let Some(existing) =
        User::find_by_username_or_email(conn, &req.username, &req.email).await?
    {
        warn!(
            username = %req.username,
            existing_id = existing.id,
            "username or email already registered"
        );
        return Err(ApiError::Conflict);
    }

    let user = insert_user(conn, scheme, &req).await?;

    info!(user_id = user.id, username = %user.username, ?scheme, "user registered");
    Ok(PublicUser {
        id: user.id,
        username: user.username,
        email: user.email,
    })
}

/// Hash and insert. A unique violation here means a concurrent signup took
/// the username or email after our lookup.
async fn insert_user(
    conn: &mut SqliteConnection,
    scheme: PasswordScheme,
    req: &SignupRequest,
) -> Result<User, ApiError> {
    let hashed = scheme.hash(&req.password)?;

    match User::create(conn, &req.username, &req.email, &hashed).await {
        Ok(u) => Ok(u),
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %req.username, "signup lost race on unique constraint");
            Err(ApiError::Conflict)
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            Err(e.into())
        }
    }
}

/// Check credentials. Unknown usernames and wrong passwords are
/// indistinguishable to the caller.
pub async fn login(
    conn: &mut SqliteConnection,
    req: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let Some(user) = User::find_by_username(conn, &req.username).await? else {
        warn!(username = %req.username, "login unknown username");
        return Err(ApiError::InvalidCredentials);
    };

    let ok = match verify_password(&req.password, &user.hashed_password) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, user_id = user.id, "stored password unreadable");
            false
        }
    };
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(LoginResponse {
        message: "Login successful",
        user_id: user.id,
        username: user.username,
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
