//! One data-access capability per resource type.
//!
//! A [`Resource`] describes where a collection lives and how its wire shape
//! normalizes into local records. [`ResourceClient`] performs the calls;
//! [`Collection`] is a screen's local copy, changed only after the server
//! confirms a mutation.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{server_error_message, ApiClient, ApiResponse, Method};
use crate::error::{LedgerError, Result};
use crate::models::{
    Account, AccountUpdate, AccountWire, Group, GroupUpdate, GroupsEnvelope, NewAccount, NewGroup,
    NewTransaction, NewUser, Transaction, TransactionWire, User, UserUpdate, UserWire,
};

pub trait Resource: Send + Sync + 'static {
    type Wire: DeserializeOwned + Send;
    type Item: Clone + Send;
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    const NAME: &'static str;
    const LIST_PATH: &'static str;
    const CREATE_PATH: &'static str;
    const UPDATE_PATH: Option<&'static str>;
    const DELETE_PATH: &'static str;
    /// Body key naming the record to delete.
    const ID_FIELD: &'static str;

    fn normalize(wire: Self::Wire) -> Vec<Self::Item>;

    fn id_of(item: &Self::Item) -> i64;

    fn delete_failure(response: &ApiResponse, fallback: &str) -> String {
        server_error_message(&response.body).unwrap_or_else(|| fallback.to_string())
    }
}

pub struct Users;
pub struct Accounts;
pub struct Groups;
pub struct Transactions;

impl Resource for Users {
    type Wire = Vec<UserWire>;
    type Item = User;
    type Draft = NewUser;
    type Patch = UserUpdate;

    const NAME: &'static str = "user";
    const LIST_PATH: &'static str = "/api/usr/get/";
    const CREATE_PATH: &'static str = "/api/usr/create/";
    const UPDATE_PATH: Option<&'static str> = Some("/api/usr/put/");
    const DELETE_PATH: &'static str = "/api/usr/delete/";
    const ID_FIELD: &'static str = "user_id";

    fn normalize(wire: Self::Wire) -> Vec<User> {
        wire.into_iter().map(User::from).collect()
    }

    fn id_of(item: &User) -> i64 {
        item.id
    }
}

impl Resource for Accounts {
    type Wire = Vec<AccountWire>;
    type Item = Account;
    type Draft = NewAccount;
    type Patch = AccountUpdate;

    const NAME: &'static str = "account";
    const LIST_PATH: &'static str = "/api/master-account/list";
    const CREATE_PATH: &'static str = "/api/master-account/create/";
    const UPDATE_PATH: Option<&'static str> = Some("/api/master-account/put/");
    const DELETE_PATH: &'static str = "/api/master-account/delete/";
    const ID_FIELD: &'static str = "account_id";

    fn normalize(wire: Self::Wire) -> Vec<Account> {
        wire.into_iter().map(Account::from).collect()
    }

    fn id_of(item: &Account) -> i64 {
        item.id
    }
}

impl Resource for Groups {
    type Wire = GroupsEnvelope;
    type Item = Group;
    type Draft = NewGroup;
    type Patch = GroupUpdate;

    const NAME: &'static str = "group";
    const LIST_PATH: &'static str = "/api/group/get/";
    const CREATE_PATH: &'static str = "/api/group/create/";
    const UPDATE_PATH: Option<&'static str> = Some("/api/group/put/");
    const DELETE_PATH: &'static str = "/api/group/delete/";
    const ID_FIELD: &'static str = "group_id";

    fn normalize(wire: GroupsEnvelope) -> Vec<Group> {
        wire.groups
    }

    fn id_of(item: &Group) -> i64 {
        item.group_id
    }

    /// The group endpoint answers failures in plain text; keep only the words.
    fn delete_failure(response: &ApiResponse, fallback: &str) -> String {
        let cleaned: String = response
            .text()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            fallback.to_string()
        } else {
            cleaned.to_string()
        }
    }
}

impl Resource for Transactions {
    type Wire = Vec<TransactionWire>;
    type Item = Transaction;
    type Draft = NewTransaction;
    type Patch = ();

    const NAME: &'static str = "transaction";
    const LIST_PATH: &'static str = "/api/transaction/get/";
    const CREATE_PATH: &'static str = "/api/transaction/create/";
    const UPDATE_PATH: Option<&'static str> = None;
    const DELETE_PATH: &'static str = "/api/transaction/delete/";
    const ID_FIELD: &'static str = "transaction_id";

    fn normalize(wire: Self::Wire) -> Vec<Transaction> {
        wire.into_iter().map(Transaction::from).collect()
    }

    fn id_of(item: &Transaction) -> i64 {
        item.number
    }
}

pub struct ResourceClient<R: Resource> {
    api: ApiClient,
    _resource: PhantomData<R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self::new(self.api.clone())
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    pub async fn list(&self) -> Result<Vec<R::Item>> {
        let fallback = format!("Failed to load {}s.", R::NAME);
        let wire: R::Wire = self.api.get_json(R::LIST_PATH, &fallback).await?;
        Ok(R::normalize(wire))
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<()> {
        let fallback = format!("Failed to create {}.", R::NAME);
        let body = serde_json::to_value(draft)?;
        self.api
            .send_unit(Method::Post, R::CREATE_PATH, body, &fallback)
            .await
    }

    pub async fn update(&self, patch: &R::Patch) -> Result<()> {
        let path = R::UPDATE_PATH.ok_or(LedgerError::Unsupported(R::NAME))?;
        let fallback = format!("Failed to update {}.", R::NAME);
        let body = serde_json::to_value(patch)?;
        self.api.send_unit(Method::Put, path, body, &fallback).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut body = Map::new();
        body.insert(R::ID_FIELD.to_string(), Value::from(id));
        let response = self
            .api
            .call_unchecked(Method::Delete, R::DELETE_PATH, Some(Value::Object(body)))
            .await?;
        if response.is_success() {
            return Ok(());
        }
        let fallback = format!("Failed to delete {}.", R::NAME);
        tracing::warn!(resource = R::NAME, id, status = response.status, "delete rejected");
        Err(LedgerError::Status {
            status: response.status,
            message: R::delete_failure(&response, &fallback),
        })
    }
}

/// A screen's local copy of one collection.
pub struct Collection<R: Resource> {
    client: ResourceClient<R>,
    items: Vec<R::Item>,
}

impl<R: Resource> Collection<R> {
    pub fn new(client: ResourceClient<R>) -> Self {
        Self {
            client,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[R::Item] {
        &self.items
    }

    pub fn find(&self, id: i64) -> Option<&R::Item> {
        self.items.iter().find(|item| R::id_of(item) == id)
    }

    pub async fn load(&mut self) -> Result<()> {
        self.items = self.client.list().await?;
        Ok(())
    }

    /// Refetch after a committed mutation. A failed refetch keeps the old
    /// items; the mutation itself already succeeded.
    async fn refresh(&mut self) {
        if let Err(e) = self.load().await {
            tracing::warn!(resource = R::NAME, error = %e, "refetch after mutation failed");
        }
    }

    /// Create, then refetch the whole collection.
    pub async fn create(&mut self, draft: &R::Draft) -> Result<()> {
        self.client.create(draft).await?;
        self.refresh().await;
        Ok(())
    }

    /// Update, then refetch the whole collection.
    pub async fn update(&mut self, patch: &R::Patch) -> Result<()> {
        self.client.update(patch).await?;
        self.refresh().await;
        Ok(())
    }

    /// Delete, then drop the record locally without refetching.
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.client.delete(id).await?;
        self.items.retain(|item| R::id_of(item) != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::amount::Amount;
    use crate::api::fake::FakeTransport;

    fn accounts_fake() -> Arc<FakeTransport> {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Get,
            Accounts::LIST_PATH,
            200,
            json!([
                {"id": 1, "name": "Cash", "opening_amount": 10.0, "closing_amount": 15.0, "account_group": "Current"},
                {"id": 2, "name": "Loan", "opening_amount": 0, "closing_amount": -5.0, "account_group": "Debt"}
            ]),
        );
        fake
    }

    #[tokio::test]
    async fn test_list_normalizes_accounts() {
        let fake = accounts_fake();
        let client = ResourceClient::<Accounts>::new(ApiClient::new(fake));
        let accounts = client.list().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].group_name, "Current");
    }

    #[tokio::test]
    async fn test_delete_patches_local_state_without_refetch() {
        let fake = accounts_fake();
        fake.respond(Method::Delete, Accounts::DELETE_PATH, 204, json!(null));
        let mut collection = Collection::new(ResourceClient::<Accounts>::new(ApiClient::new(fake.clone())));
        collection.load().await.unwrap();
        collection.delete(1).await.unwrap();

        assert_eq!(collection.items().len(), 1);
        assert_eq!(fake.count(Method::Get, Accounts::LIST_PATH), 1);
        let sent = fake.requests();
        let delete = sent.iter().find(|r| r.method == Method::Delete).unwrap();
        assert_eq!(delete.body, Some(json!({"account_id": 1})));
    }

    #[tokio::test]
    async fn test_create_refetches() {
        let fake = accounts_fake();
        fake.respond(Method::Post, Accounts::CREATE_PATH, 201, json!({}));
        let mut collection = Collection::new(ResourceClient::<Accounts>::new(ApiClient::new(fake.clone())));
        collection.load().await.unwrap();
        let draft = NewAccount {
            name: "Bank".to_string(),
            amount: Amount::parse("100").unwrap(),
            group_id: 4,
        };
        collection.create(&draft).await.unwrap();
        assert_eq!(fake.count(Method::Get, Accounts::LIST_PATH), 2);
        let post = fake
            .requests()
            .into_iter()
            .find(|r| r.method == Method::Post)
            .unwrap();
        assert_eq!(post.body.unwrap()["amount"], json!(100.0));
    }

    #[tokio::test]
    async fn test_create_succeeds_when_refetch_fails() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, Transactions::CREATE_PATH, 201, json!({}));
        fake.respond(Method::Get, Transactions::LIST_PATH, 500, json!({}));
        let mut collection =
            Collection::new(ResourceClient::<Transactions>::new(ApiClient::new(fake.clone())));
        let draft = NewTransaction {
            date: "2024-03-01".to_string(),
            description: "Rent".to_string(),
            author_id: 1,
            lines: Vec::new(),
        };

        collection.create(&draft).await.unwrap();
        assert_eq!(fake.count(Method::Post, Transactions::CREATE_PATH), 1);
        assert_eq!(fake.count(Method::Get, Transactions::LIST_PATH), 1);
        assert!(collection.items().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_items_when_refetch_fails() {
        let fake = accounts_fake();
        // First list succeeds, the refetch after the update does not.
        fake.fail(Method::Get, Accounts::LIST_PATH, "connection reset");
        fake.respond(Method::Put, Accounts::UPDATE_PATH.unwrap(), 200, json!({}));
        let mut collection =
            Collection::new(ResourceClient::<Accounts>::new(ApiClient::new(fake.clone())));
        collection.load().await.unwrap();

        let patch = AccountUpdate {
            account_id: 1,
            name: "Cash box".to_string(),
            amount: Amount::parse("12").unwrap(),
            group_id: 4,
        };
        collection.update(&patch).await.unwrap();
        assert_eq!(collection.items().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_state_unchanged() {
        let fake = accounts_fake();
        fake.respond(Method::Delete, Accounts::DELETE_PATH, 400, json!({"error": "in use"}));
        let mut collection = Collection::new(ResourceClient::<Accounts>::new(ApiClient::new(fake)));
        collection.load().await.unwrap();
        let err = collection.delete(1).await.unwrap_err();
        assert_eq!(err.to_string(), "in use (HTTP 400)");
        assert_eq!(collection.items().len(), 2);
    }

    #[tokio::test]
    async fn test_network_failure_leaves_state_unchanged() {
        let fake = accounts_fake();
        fake.fail(Method::Delete, Accounts::DELETE_PATH, "connection reset");
        let mut collection = Collection::new(ResourceClient::<Accounts>::new(ApiClient::new(fake)));
        collection.load().await.unwrap();
        assert!(matches!(collection.delete(2).await, Err(LedgerError::Network(_))));
        assert_eq!(collection.items().len(), 2);
    }

    #[tokio::test]
    async fn test_group_delete_failure_strips_punctuation() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_raw(
            Method::Delete,
            Groups::DELETE_PATH,
            409,
            b"[\"Group has accounts!\"]",
        );
        let client = ResourceClient::<Groups>::new(ApiClient::new(fake));
        let err = client.delete(3).await.unwrap_err();
        assert!(matches!(err, LedgerError::Status { ref message, .. } if message == "Group has accounts"));
    }

    #[tokio::test]
    async fn test_transactions_cannot_be_updated() {
        let fake = Arc::new(FakeTransport::new());
        let client = ResourceClient::<Transactions>::new(ApiClient::new(fake.clone()));
        assert!(matches!(client.update(&()).await, Err(LedgerError::Unsupported("transaction"))));
        assert!(fake.requests().is_empty());
    }
}
