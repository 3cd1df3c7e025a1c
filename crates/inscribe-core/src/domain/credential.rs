//! Credential - レジストリ更新に使う ed25519 鍵
//!
//! keypair ファイルは 64 要素の JSON 配列（先頭 32 byte が secret seed、
//! 後半 32 byte が public key）。ウォレットの書き出す形式をそのまま読みます。
//!
//! Authority（更新権限者）の表現は verifying key の hex 文字列です。

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::ConfigError;

/// 更新権限を持つ公開鍵
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorityKey(VerifyingKey);

impl AuthorityKey {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// hex 署名を検証
    pub fn verify(&self, message: &[u8], signature_hex: &str) -> bool {
        let Ok(bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return false;
        };
        self.0.verify(message, &signature).is_ok()
    }
}

impl fmt::Display for AuthorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AuthorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityKey({})", self.to_hex())
    }
}

impl FromStr for AuthorityKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| ConfigError::Credential(format!("authority is not hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConfigError::Credential("authority must be 32 bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ConfigError::Credential(format!("invalid authority key: {e}")))?;
        Ok(Self(key))
    }
}

impl Serialize for AuthorityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AuthorityKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 秘密鍵を保持する認証情報
///
/// プロセス起動時に 1 回だけ読み込み、以後は読み取り専用で使います。
/// Debug 出力では公開鍵だけを表示します。
#[derive(Clone)]
pub struct Credential {
    signing_key: SigningKey,
}

impl Credential {
    /// 32 byte の seed から作成（テスト・鍵生成用）
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// 64 byte の keypair（seed || public key）から作成
    ///
    /// 後半の public key が seed から導出したものと一致しなければエラー。
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| {
            ConfigError::Credential(format!("keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|e| ConfigError::Credential(format!("keypair halves do not match: {e}")))?;
        Ok(Self { signing_key })
    }

    /// `[12, 34, ...]` 形式の JSON から作成
    pub fn from_keypair_json(json: &str) -> Result<Self, ConfigError> {
        let bytes: Vec<u8> = serde_json::from_str(json)
            .map_err(|e| ConfigError::Credential(format!("keypair is not a JSON byte array: {e}")))?;
        Self::from_keypair_bytes(&bytes)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_keypair_json(&json)
    }

    /// keypair ファイル形式（64 要素の JSON 配列）で書き出す
    pub fn to_keypair_json(&self) -> String {
        let bytes = self.signing_key.to_keypair_bytes();
        // Vec<u8> の serialize は失敗しない
        serde_json::to_string(&bytes.to_vec()).unwrap_or_default()
    }

    pub fn authority(&self) -> AuthorityKey {
        AuthorityKey(self.signing_key.verifying_key())
    }

    /// メッセージに署名して hex で返す
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("authority", &self.authority())
            .finish_non_exhaustive()
    }
}
