//! Table query builder
//!
//! Builds REST table requests (`col=eq.value`, `order=col.desc`,
//! `offset`/`limit`) and executes them with the owning user's token.

use super::client::{decode_json, RestClient};
use super::error::BaasError;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Rows returned by `fetch`, with the exact total when it was requested
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

/// Query against one table
#[derive(Debug)]
pub struct TableQuery {
    rest: RestClient,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    offset: Option<u64>,
    limit: Option<u64>,
    count_exact: bool,
}

impl TableQuery {
    pub(crate) fn new(rest: RestClient, table: &str) -> Self {
        Self {
            rest,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            offset: None,
            limit: None,
            count_exact: false,
        }
    }

    /// Columns to return; embedded resources use `alias:table(cols)`
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    pub fn neq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("neq.{}", value.to_string())));
        self
    }

    /// Case-insensitive match; `*` in `pattern` is the wildcard
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("ilike.{}", pattern)));
        self
    }

    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|v| quote_list_value(&v.to_string()))
            .collect();
        self.filters
            .push((column.to_string(), format!("in.({})", quoted.join(","))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    /// Inclusive row range, zero based
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.offset = Some(from);
        self.limit = Some(to.saturating_sub(from) + 1);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ask for the exact number of matching rows
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    fn query_pairs(&self, with_select: bool) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if with_select {
            if let Some(select) = &self.select {
                pairs.push(("select".to_string(), select.clone()));
            }
        }
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    fn build(&self, method: Method, with_select: bool) -> RequestBuilder {
        self.rest
            .request(method, &self.table)
            .query(&self.query_pairs(with_select))
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<reqwest::Response, BaasError> {
        self.rest.client().send(builder, operation, &self.table).await
    }

    /// Run a select
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Fetched<T>, BaasError> {
        let mut builder = self.build(Method::GET, true);
        if self.count_exact {
            builder = builder.header("Prefer", "count=exact");
        }
        let response = self.send(builder, "select").await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        let rows = decode_json(response).await?;
        Ok(Fetched { rows, total })
    }

    /// First matching row, if any
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, BaasError> {
        let fetched = self.limit(1).fetch::<T>().await?;
        Ok(fetched.rows.into_iter().next())
    }

    /// Exact number of matching rows, without transferring them
    ///
    /// `select` is sent along so embedded `!inner` joins can filter.
    pub async fn count(self) -> Result<u64, BaasError> {
        let builder = self
            .build(Method::HEAD, true)
            .header("Prefer", "count=exact");
        let response = self.send(builder, "count").await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| BaasError::Decode("missing row count".to_string()))
    }

    /// Insert rows and return them as stored
    pub async fn insert<B, T>(self, rows: &B) -> Result<Vec<T>, BaasError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self
            .build(Method::POST, true)
            .header("Prefer", "return=representation")
            .json(rows);
        let response = self.send(builder, "insert").await?;
        decode_json(response).await
    }

    /// Insert a single row and return it as stored
    pub async fn insert_one<B, T>(self, row: &B) -> Result<T, BaasError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.insert(row).await?;
        rows.into_iter().next().ok_or(BaasError::EmptyResult)
    }

    /// Insert rows without reading them back
    pub async fn insert_silent<B>(self, rows: &B) -> Result<(), BaasError>
    where
        B: Serialize + ?Sized,
    {
        let builder = self
            .build(Method::POST, false)
            .header("Prefer", "return=minimal")
            .json(rows);
        self.send(builder, "insert").await?;
        Ok(())
    }

    /// Patch matching rows and return them as stored
    pub async fn update<B, T>(self, patch: &B) -> Result<Vec<T>, BaasError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self
            .build(Method::PATCH, true)
            .header("Prefer", "return=representation")
            .json(patch);
        let response = self.send(builder, "update").await?;
        decode_json(response).await
    }

    /// Delete matching rows
    pub async fn delete(self) -> Result<(), BaasError> {
        let builder = self
            .build(Method::DELETE, false)
            .header("Prefer", "return=minimal");
        self.send(builder, "delete").await?;
        Ok(())
    }
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Escape LIKE metacharacters so `term` matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn quote_list_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
