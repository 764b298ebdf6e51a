mod memory;
mod rest;

pub use memory::MemoryDatabase;
pub use rest::RestDatabase;

use async_trait::async_trait;
use crate::error::DbError;
use crate::models::{BlogPost, Contact, Customer, NewContact, NewCustomer, Service};

// Tables exposed by the hosted database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Customers,
    Contacts,
    Services,
    BlogPosts,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Contacts => "contacts",
            Table::Services => "services",
            Table::BlogPosts => "blog_posts",
        }
    }
}

// Storage behind the API handlers
#[async_trait]
pub trait Database: Send + Sync {
    async fn count(&self, table: Table) -> Result<u64, DbError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, DbError>;
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DbError>;

    // leads, newest first
    async fn list_contacts(&self) -> Result<Vec<Contact>, DbError>;
    async fn create_contact(&self, contact: NewContact) -> Result<Contact, DbError>;

    // in display order
    async fn list_services(&self) -> Result<Vec<Service>, DbError>;

    // published only, newest first
    async fn list_published_posts(&self) -> Result<Vec<BlogPost>, DbError>;
    async fn find_post(&self, slug: &str) -> Result<Option<BlogPost>, DbError>;
}
