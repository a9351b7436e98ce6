//! Pass-through to store commands the facade does not wrap.

use tracing::debug;

use super::Cache;
use crate::error::{CacheError, Result};
use crate::store::Reply;

impl Cache {
    /// Runs the store command `name` with `args` and returns its raw reply.
    ///
    /// Arguments and replies bypass the codec. Use this for commands such as
    /// `STRLEN` or `HEXISTS` that have no typed wrapper.
    ///
    /// # Errors
    /// [`CacheError::UnsupportedOperation`] if the name is blank, contains
    /// whitespace, or is unknown to the store.
    pub async fn call<I, A>(&self, name: &str, args: I) -> Result<Reply>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(CacheError::UnsupportedOperation(name.to_string()));
        }

        let args: Vec<Vec<u8>> = args.into_iter().map(|arg| arg.as_ref().to_vec()).collect();
        debug!("Forwarding {} with {} argument(s) to {}", name, args.len(), self.store.name());
        self.store.command(name, args).await
    }
}
