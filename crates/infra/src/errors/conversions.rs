//! Conversions from external infrastructure errors into domain errors.

use installsync_domain::SyncError;
use reqwest::Error as HttpError;
use tokio_postgres::error::SqlState;
use tokio_postgres::Error as PgError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSyncError {
    fn into_sync(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* tokio_postgres::Error → SyncError */
/* -------------------------------------------------------------------------- */

/// Map a SQLSTATE to the domain error class.
///
/// Serialization failures (`40001`) and detected deadlocks (`40P01`) are the
/// conflicts a writer may replay; everything else is fatal to the write.
pub fn classify_sql_state(state: Option<&SqlState>, message: impl Into<String>) -> SyncError {
    let message = message.into();
    match state {
        Some(code)
            if *code == SqlState::T_R_SERIALIZATION_FAILURE
                || *code == SqlState::T_R_DEADLOCK_DETECTED =>
        {
            SyncError::DatabaseConflict(format!("{} ({})", message, code.code()))
        }
        Some(code)
            if *code == SqlState::INVALID_PASSWORD
                || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION =>
        {
            SyncError::Auth(format!("database rejected credentials: {message}"))
        }
        Some(code) => SyncError::Database(format!("{} ({})", message, code.code())),
        None => SyncError::Database(message),
    }
}

impl IntoSyncError for PgError {
    fn into_sync(self) -> SyncError {
        if let Some(db) = self.as_db_error() {
            return classify_sql_state(Some(db.code()), db.message());
        }
        if self.is_closed() {
            return SyncError::Database("database connection closed".into());
        }
        classify_sql_state(self.code(), self.to_string())
    }
}

impl From<PgError> for InfraError {
    fn from(value: PgError) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync(self) -> SyncError {
        if self.is_timeout() {
            return SyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SyncError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return SyncError::InvalidInput(format!("HTTP response could not be decoded: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SyncError::Auth(message),
                400..=499 => SyncError::InvalidInput(message),
                _ => SyncError::Network(message),
            };
        }

        SyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
