//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 用户凭据校验。凭据表在启动时加载一次，之后只读。

use crate::error::Result;
use crate::model::UserCredential;
use crate::store::CatalogStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub correct: bool,
}

/// 密码的 SHA-256 十六进制摘要
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// 用户服务
#[derive(Debug, Default)]
pub struct UserService {
    // username -> password hash
    users: HashMap<String, String>,
}

impl UserService {
    /// 从持久存储加载凭据表
    pub async fn load(store: &dyn CatalogStore) -> Result<Self> {
        let users = store.load_users().await?;
        info!("Loaded {} user credentials", users.len());
        Ok(Self::from_credentials(users))
    }

    pub fn from_credentials(credentials: impl IntoIterator<Item = UserCredential>) -> Self {
        Self {
            users: credentials
                .into_iter()
                .map(|c| (c.username, c.password_hash.to_ascii_lowercase()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// 用户名存在且密码摘要一致时返回 `correct = true`
    #[instrument(skip(self, request), level = "debug", fields(username = %request.username))]
    pub fn check_user(&self, request: &LoginRequest) -> LoginResult {
        let correct = self
            .users
            .get(&request.username)
            .map(|expected| *expected == hash_password(&request.password))
            .unwrap_or(false);
        debug!("Login check for {}: {}", request.username, correct);
        LoginResult { correct }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_lowercase_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
