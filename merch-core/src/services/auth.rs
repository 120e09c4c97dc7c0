//! Auth service - registration on first login, credential checks after

use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{run_blocking, KeyedLocks, RequestGroup};
use crate::domain::credential::{hash_password, verify_password};
use crate::domain::{Account, Argon2Params, Error, Result};
use crate::ports::LedgerRepository;

/// Auth service for account login and registration
pub struct AuthService {
    repository: Arc<dyn LedgerRepository>,
    starting_balance: i64,
    password_params: Argon2Params,
    exists_requests: RequestGroup<bool>,
    auth_requests: RequestGroup<Uuid>,
    registrations: KeyedLocks<String>,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        starting_balance: i64,
        password_params: Argon2Params,
    ) -> Self {
        Self {
            repository,
            starting_balance,
            password_params,
            exists_requests: RequestGroup::new(),
            auth_requests: RequestGroup::new(),
            registrations: KeyedLocks::new(),
        }
    }

    /// Log in as `name`, creating the account if the name is new
    ///
    /// Returns the account id. A known name with the wrong password fails
    /// with [`Error::InvalidCredentials`].
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<Uuid> {
        if name.is_empty() {
            return Err(Error::validation("Account name must not be empty"));
        }
        if password.is_empty() {
            return Err(Error::validation("Password must not be empty"));
        }

        if self.account_exists(name).await? {
            return self.verify(name, password).await;
        }

        let _registration = self.registrations.lock_all(&[name.to_string()]).await;

        // Someone else may have registered the name while we waited. The
        // shared existence check could predate that, so ask the store directly.
        let repo = Arc::clone(&self.repository);
        let lookup_name = name.to_string();
        if run_blocking(move || repo.find_account_id(&lookup_name)).await?.is_some() {
            return self.verify(name, password).await;
        }

        self.register(name, password).await
    }

    /// Whether an account with this name exists
    pub async fn account_exists(&self, name: &str) -> Result<bool> {
        let repo = Arc::clone(&self.repository);
        let name = name.to_string();
        self.exists_requests
            .run(format!("exists:{}", name), move || {
                run_blocking(move || Ok(repo.find_account_id(&name)?.is_some()))
            })
            .await
    }

    async fn verify(&self, name: &str, password: &str) -> Result<Uuid> {
        // The key covers the whole credential pair: two logins for one name
        // with different passwords must not share an answer.
        let key = format!("auth:{}:{}", name, hex::encode(Sha256::digest(password.as_bytes())));
        let repo = Arc::clone(&self.repository);
        let name = name.to_string();
        let password = password.to_string();

        let result = self
            .auth_requests
            .run(key, move || {
                run_blocking(move || {
                    let (id, stored) = repo
                        .find_credentials(&name)?
                        .ok_or(Error::InvalidCredentials)?;
                    verify_password(&password, &stored)?;
                    Ok(id)
                })
            })
            .await;

        if let Err(e) = &result {
            tracing::warn!(error = %e, "authentication failed");
        }
        result
    }

    async fn register(&self, name: &str, password: &str) -> Result<Uuid> {
        let repo = Arc::clone(&self.repository);
        let params = self.password_params.clone();
        let starting_balance = self.starting_balance;
        let name = name.to_string();
        let password = password.to_string();

        let account = run_blocking(move || {
            let hash = hash_password(&password, &params)?;
            let account = Account::new(name, hash, starting_balance);
            repo.create_account(&account)?;
            Ok(account)
        })
        .await?;

        tracing::info!(
            account_id = %account.id,
            name = %account.name,
            balance = account.balance,
            "account created"
        );
        Ok(account.id)
    }
}
