//! Package settings repository backed by MongoDB.
//!
//! One document per package in the `package_settings` collection, keyed by a
//! unique index on `package_name`.

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, info, warn};

use crate::database::models::PackageSetting;
use crate::database::store::{PreferenceStore, StoreError};
use crate::database::Database;

const COLLECTION: &str = "package_settings";

/// MongoDB-backed [`PreferenceStore`].
#[derive(Clone)]
pub struct PackageSettingsRepository {
    collection: Collection<PackageSetting>,
}

impl PackageSettingsRepository {
    /// Attach to the collection, creating the unique index if needed.
    ///
    /// # Errors
    /// Returns error if the index can't be created.
    pub async fn open(db: &Database) -> Result<Self, StoreError> {
        let collection: Collection<PackageSetting> = db.collection(COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! { "package_name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection.create_index(index).await?;

        info!("Package settings collection ready");
        Ok(Self { collection })
    }
}

#[async_trait]
impl PreferenceStore for PackageSettingsRepository {
    async fn insert_or_replace(&self, setting: &PackageSetting) -> Result<(), StoreError> {
        let filter = doc! { "package_name": setting.package_name.as_str() };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, setting)
            .with_options(options)
            .await?;

        debug!("Saved orientation {} for {}", setting.orientation, setting.package_name);
        Ok(())
    }

    async fn delete(&self, package_name: &str) -> Result<(), StoreError> {
        let filter = doc! { "package_name": package_name };
        let result = self.collection.delete_one(filter).await?;

        debug!("Deleted package setting for {}: {}", package_name, result.deleted_count > 0);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let result = self.collection.delete_many(doc! {}).await?;
        debug!("Deleted {} package settings", result.deleted_count);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PackageSetting>, StoreError> {
        // Read raw documents so one malformed record doesn't fail the whole load.
        let raw_coll: Collection<Document> = self.collection.clone_with_type();
        let mut cursor = raw_coll.find(doc! {}).await?;
        let mut settings = Vec::new();

        while let Some(result) = cursor.next().await {
            let document = result?;
            match setting_from_document(&document) {
                Some(setting) => settings.push(setting),
                None => warn!("Skipping malformed package setting document: {}", document),
            }
        }

        debug!("Listed {} package settings", settings.len());
        Ok(settings)
    }
}

/// Extract a setting from a raw document, tolerating 64-bit codes.
fn setting_from_document(document: &Document) -> Option<PackageSetting> {
    let package_name = document.get_str("package_name").ok()?;
    if package_name.is_empty() {
        return None;
    }

    let orientation = match document.get("orientation")? {
        Bson::Int32(code) => *code,
        Bson::Int64(code) => i32::try_from(*code).ok()?,
        _ => return None,
    };

    Some(PackageSetting {
        package_name: package_name.to_string(),
        orientation,
    })
}
