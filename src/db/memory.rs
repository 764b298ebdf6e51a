use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{Database, Table};
use crate::error::DbError;
use crate::models::{BlogPost, Contact, Customer, NewContact, NewCustomer, Service};

// In-process store for when no hosted database is configured (nothing persists)
#[derive(Default)]
pub struct MemoryDatabase {
    customers: DashMap<i64, Customer>,
    contacts: DashMap<i64, Contact>,
    services: DashMap<i64, Service>,
    posts: DashMap<i64, BlogPost>,
    next_id: AtomicI64,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// Content tables are managed outside the API; tests seed them directly
#[cfg(test)]
impl MemoryDatabase {
    pub fn insert_service(&self, service: Service) {
        self.services.insert(service.id, service);
    }

    pub fn insert_post(&self, post: BlogPost) {
        self.posts.insert(post.id, post);
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn count(&self, table: Table) -> Result<u64, DbError> {
        let len = match table {
            Table::Customers => self.customers.len(),
            Table::Contacts => self.contacts.len(),
            Table::Services => self.services.len(),
            Table::BlogPosts => self.posts.len(),
        };
        Ok(len as u64)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, DbError> {
        let mut rows: Vec<Customer> = self.customers.iter().map(|r| r.value().clone()).collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DbError> {
        let row = Customer {
            id: self.next_id(),
            name: customer.name,
            email: customer.email,
            company: customer.company,
            created_at: Some(Utc::now()),
        };
        self.customers.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, DbError> {
        let mut rows: Vec<Contact> = self.contacts.iter().map(|r| r.value().clone()).collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn create_contact(&self, contact: NewContact) -> Result<Contact, DbError> {
        let row = Contact {
            id: self.next_id(),
            name: contact.name,
            email: contact.email,
            phone: contact.phone,
            company: contact.company,
            service: contact.service,
            message: contact.message,
            created_at: Some(Utc::now()),
        };
        self.contacts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_services(&self) -> Result<Vec<Service>, DbError> {
        let mut rows: Vec<Service> = self.services.iter().map(|r| r.value().clone()).collect();
        rows.sort_by_key(|s| (s.sort_order, s.id));
        Ok(rows)
    }

    async fn list_published_posts(&self) -> Result<Vec<BlogPost>, DbError> {
        let mut rows: Vec<BlogPost> = self
            .posts
            .iter()
            .filter(|r| r.published)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_post(&self, slug: &str) -> Result<Option<BlogPost>, DbError> {
        Ok(self
            .posts
            .iter()
            .find(|r| r.published && r.slug == slug)
            .map(|r| r.value().clone()))
    }
}
