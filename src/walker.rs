//! Common parameter traversal structures for AWS SSM.
//!
//! This module doesn't contain anything special beyond a pseudo-iterator
//! to walk over a parameter hierarchy in a more idiomatic manner, hiding
//! the continuation tokens returned by each page.
use rusoto_ssm::{GetParametersByPathRequest, Ssm, SsmClient};

use std::collections::VecDeque;

use crate::types::UtilResult;

/// A single name/value pair stored in a parameter hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// A single page of parameters, with the token to fetch the next page.
#[derive(Clone, Debug, Default)]
pub struct ParameterPage {
    pub parameters: Vec<Parameter>,
    pub next_token: Option<String>,
}

/// Path-structured key/value store which can be queried page by page.
pub trait ParameterStore {
    /// Fetches the page of direct children under `path` for a token.
    async fn parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> UtilResult<ParameterPage>;
}

impl ParameterStore for SsmClient {
    async fn parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> UtilResult<ParameterPage> {
        let request = GetParametersByPathRequest {
            path: path.to_string(),
            next_token,
            ..GetParametersByPathRequest::default()
        };

        let response = self.get_parameters_by_path(request).await?;

        let parameters = response
            .parameters
            .unwrap_or_default()
            .into_iter()
            .map(|parameter| Parameter {
                name: parameter.name.unwrap_or_default(),
                value: parameter.value.unwrap_or_default(),
            })
            .collect();

        Ok(ParameterPage {
            parameters,
            next_token: response.next_token,
        })
    }
}

/// Pseudo `Iterator` structure to walk over `Parameter` types in a store.
///
/// As this is a fallible iteration, a `for` style loop cannot be used
/// easily. Instead, this pattern must be used:
///
/// ```rust,ignore
/// let mut walker = ParameterWalker::new(&ssm, path);
///
/// while let Some(parameter) = walker.next().await? {
///     // do something...
/// }
/// ```
pub struct ParameterWalker<'a, S> {
    store: &'a S,
    path: String,
    token: Option<String>,
    buffer: VecDeque<Parameter>,
    finished: bool,
}

impl<'a, S> ParameterWalker<'a, S>
where
    S: ParameterStore,
{
    /// Construct a new `ParameterWalker` for a hierarchy path.
    pub fn new(store: &'a S, path: String) -> Self {
        Self {
            store,
            path,
            token: None,
            buffer: VecDeque::new(),
            finished: false,
        }
    }

    /// Attempts to fetch the next `Parameter` in the hierarchy.
    ///
    /// Calling this method does not guarantee a call will be made to AWS;
    /// there may already be buffered data to be returned immediately. Pages
    /// are requested until one arrives without a continuation token.
    pub async fn next(&mut self) -> UtilResult<Option<Parameter>> {
        loop {
            // always check the buffer first
            if let Some(parameter) = self.buffer.pop_front() {
                return Ok(Some(parameter));
            }

            // if done, no fetch
            if self.finished {
                return Ok(None);
            }

            let page = self
                .store
                .parameters_by_path(&self.path, self.token.take())
                .await?;

            // store the page and next identifier
            self.buffer.extend(page.parameters);
            self.token = page.next_token;

            // check for last page
            if self.token.is_none() {
                self.finished = true;
            }
        }
    }

    /// Drains the walker, collecting every remaining `Parameter`.
    pub async fn collect(mut self) -> UtilResult<Vec<Parameter>> {
        let mut parameters = Vec::new();

        while let Some(parameter) = self.next().await? {
            parameters.push(parameter);
        }

        Ok(parameters)
    }
}
