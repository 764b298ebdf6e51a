use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url, header};
use serde::{Serialize, de::DeserializeOwned};
use std::time::{Duration, Instant};

use super::{Database, Table};
use crate::error::DbError;
use crate::metrics::DB_LATENCY;
use crate::models::{BlogPost, Contact, Customer, NewContact, NewCustomer, Service};

// PostgREST client for the hosted database
#[derive(Clone)]
pub struct RestDatabase {
    base_url: String,
    api_key: String,
    http: Client,
}

impl RestDatabase {
    pub fn new(url: &str, api_key: String, timeout: Duration) -> Result<Self, DbError> {
        let http = Client::builder()
            .user_agent(concat!("agency-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key,
            http,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.base_url, table.as_str())
    }

    fn query_url(&self, table: Table, query: &[(&str, &str)]) -> Result<Url, DbError> {
        let mut url = Url::parse(&self.table_url(table)).map_err(|e| DbError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, DbError> {
        let start = Instant::now();
        let result = self.authorized(req).send().await;
        DB_LATENCY.observe(start.elapsed().as_secs_f64());

        let res = result?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(DbError::Status { status, body });
        }
        Ok(res)
    }

    async fn select<T: DeserializeOwned>(&self, table: Table, query: &[(&str, &str)]) -> Result<Vec<T>, DbError> {
        let mut url = self.query_url(table, &[("select", "*")])?;
        url.query_pairs_mut().extend_pairs(query);
        let req = self.http.get(url);
        Ok(self.send(req).await?.json::<Vec<T>>().await?)
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(&self, table: Table, row: &B) -> Result<T, DbError> {
        let req = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(row);
        let mut rows = self.send(req).await?.json::<Vec<T>>().await?;
        if rows.is_empty() {
            return Err(DbError::EmptyInsert(table.as_str()));
        }
        Ok(rows.swap_remove(0))
    }
}

// total from a Content-Range like "0-9/42" or "*/42"
pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl Database for RestDatabase {
    async fn count(&self, table: Table) -> Result<u64, DbError> {
        let req = self
            .http
            .head(self.query_url(table, &[("select", "id")])?)
            .header("Prefer", "count=exact");
        let res = self.send(req).await?;

        res.headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or(DbError::MissingCount)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, DbError> {
        self.select(Table::Customers, &[("order", "created_at.desc")]).await
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DbError> {
        self.insert(Table::Customers, &customer).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, DbError> {
        self.select(Table::Contacts, &[("order", "created_at.desc")]).await
    }

    async fn create_contact(&self, contact: NewContact) -> Result<Contact, DbError> {
        self.insert(Table::Contacts, &contact).await
    }

    async fn list_services(&self) -> Result<Vec<Service>, DbError> {
        self.select(Table::Services, &[("order", "sort_order.asc")]).await
    }

    async fn list_published_posts(&self) -> Result<Vec<BlogPost>, DbError> {
        self.select(
            Table::BlogPosts,
            &[("published", "eq.true"), ("order", "published_at.desc")],
        )
        .await
    }

    async fn find_post(&self, slug: &str) -> Result<Option<BlogPost>, DbError> {
        let slug_filter = format!("eq.{}", slug);
        let mut rows: Vec<BlogPost> = self
            .select(
                Table::BlogPosts,
                &[("slug", slug_filter.as_str()), ("published", "eq.true"), ("limit", "1")],
            )
            .await?;
        Ok(rows.pop())
    }
}
