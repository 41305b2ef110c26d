use async_trait::async_trait;
use crate::error::RoundCtlError;

#[async_trait(?Send)]
pub trait PersistentStorage {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), RoundCtlError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RoundCtlError>;
    async fn delete(&self, key: &str) -> Result<(), RoundCtlError>;
}
