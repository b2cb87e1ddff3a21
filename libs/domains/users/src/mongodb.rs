//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, to_bson},
    options::ReturnDocument,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::UserResult;
use crate::models::{PageWindow, User, UserPatch};
use crate::repository::UserRepository;

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository
    ///
    /// # Arguments
    /// * `db` - MongoDB database instance
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let db = client.database("mydb");
    /// let repo = MongoUserRepository::new(db);
    /// ```
    pub fn new(db: Database) -> Self {
        let collection = db.collection::<User>("users");
        Self { collection }
    }

    /// Create a new MongoUserRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Create the indexes used by listings and counts.
    ///
    /// Idempotent; safe to run on every startup.
    pub async fn init_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "status": 1, "createdAt": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) }
    }

    fn active_filter() -> Document {
        doc! { "status": true }
    }

    /// Build the case-insensitive search filter over name fields.
    ///
    /// `pattern` is expected to be regex-escaped by the caller.
    fn search_filter(pattern: &str) -> Document {
        doc! {
            "status": true,
            "$or": [
                { "firstName": { "$regex": pattern, "$options": "i" } },
                { "lastName": { "$regex": pattern, "$options": "i" } },
                { "username": { "$regex": pattern, "$options": "i" } },
            ],
        }
    }

    /// Build a `$set` document from a patch; only `Some` fields are written
    fn build_set(patch: &UserPatch) -> Document {
        let mut set = doc! {};

        if let Some(ref first_name) = patch.first_name {
            set.insert("firstName", first_name);
        }
        if let Some(ref last_name) = patch.last_name {
            set.insert("lastName", last_name);
        }
        if let Some(ref username) = patch.username {
            set.insert("username", username);
        }
        if let Some(ref email) = patch.email {
            set.insert("email", email);
        }
        if let Some(ref address) = patch.address {
            set.insert("address", address);
        }
        if let Some(ref number_document) = patch.number_document {
            set.insert("numberDocument", number_document);
        }
        if let Some(ref type_document) = patch.type_document {
            set.insert("typeDocument", type_document);
        }
        if let Some(ref role) = patch.role {
            set.insert("role", role);
        }
        if let Some(ref phone_numbers) = patch.phone_numbers {
            set.insert("phoneNumbers", phone_numbers.clone());
        }
        if let Some(ref password) = patch.password {
            set.insert("password", password);
        }
        if let Some(status) = patch.status {
            set.insert("status", status);
        }
        if let Some(updated_at) = patch.updated_at {
            set.insert("updatedAt", to_bson(&updated_at).unwrap_or(Bson::Null));
        }

        set
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> UserResult<User> {
        self.collection.insert_one(&user).await?;

        tracing::info!(user_id = %user.id, "User created successfully");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let user = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_active(&self, window: PageWindow) -> UserResult<Vec<User>> {
        use futures_util::TryStreamExt;

        let options = mongodb::options::FindOptions::builder()
            .skip(window.skip)
            .limit(window.limit)
            .sort(doc! { "createdAt": 1 })
            .build();

        let cursor = self
            .collection
            .find(Self::active_filter())
            .with_options(options)
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn count_active(&self) -> UserResult<u64> {
        let count = self.collection.count_documents(Self::active_filter()).await?;
        Ok(count)
    }

    #[instrument(skip(self, patch))]
    async fn update_returning(&self, id: Uuid, patch: UserPatch) -> UserResult<Option<User>> {
        let set = Self::build_set(&patch);

        // MongoDB rejects an empty $set; a no-op patch degrades to a read
        if set.is_empty() {
            return self.find_by_id(id).await;
        }

        let updated = self
            .collection
            .find_one_and_update(Self::id_filter(id), doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!(user_id = %id, "User updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn search_active(&self, pattern: &str) -> UserResult<Vec<User>> {
        use futures_util::TryStreamExt;

        let cursor = self.collection.find(Self::search_filter(pattern)).await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }
}
