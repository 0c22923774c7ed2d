use crate::media::{MediaStore, Upload};
use crate::models::{
    Content, ContentForm, Database, NewPlaylist, NewScreen, Playlist, Screen, UpdatePlaylist,
    UpdateScreen, DEFAULT_DURATION_SECS,
};
use crate::store::{JsonStore, StoreError};
use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// A record kept in one of the store's collections.
pub trait Record: Clone + Send + 'static {
    /// Human readable kind, used in "not found" messages.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn touch(&mut self, now: DateTime<Utc>);
    fn collection(db: &Database) -> &Vec<Self>;
    fn collection_mut(db: &mut Database) -> &mut Vec<Self>;
}

impl Record for Screen {
    const KIND: &'static str = "Screen";

    fn id(&self) -> &str {
        &self.id
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
    fn collection(db: &Database) -> &Vec<Self> {
        &db.screens
    }
    fn collection_mut(db: &mut Database) -> &mut Vec<Self> {
        &mut db.screens
    }
}

impl Record for Playlist {
    const KIND: &'static str = "Playlist";

    fn id(&self) -> &str {
        &self.id
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
    fn collection(db: &Database) -> &Vec<Self> {
        &db.playlists
    }
    fn collection_mut(db: &mut Database) -> &mut Vec<Self> {
        &mut db.playlists
    }
}

impl Record for Content {
    const KIND: &'static str = "Content";

    fn id(&self) -> &str {
        &self.id
    }
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
    fn collection(db: &Database) -> &Vec<Self> {
        &db.content
    }
    fn collection_mut(db: &mut Database) -> &mut Vec<Self> {
        &mut db.content
    }
}

/// CRUD over one collection of the JSON store.
pub struct Repository<R> {
    store: Arc<JsonStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Repository<R> {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// All records in insertion order.
    pub async fn list(&self) -> Result<Vec<R>, StoreError> {
        let db = self.store.read().await?;
        Ok(R::collection(&db).clone())
    }

    pub async fn get(&self, id: &str) -> Result<R, StoreError> {
        let db = self.store.read().await?;
        R::collection(&db)
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or(StoreError::NotFound(R::KIND))
    }

    /// Appends a record built from a freshly generated id and creation time.
    pub async fn insert<F>(&self, build: F) -> Result<R, StoreError>
    where
        F: FnOnce(String, DateTime<Utc>) -> R,
    {
        let record = build(Uuid::new_v4().to_string(), Utc::now());
        self.store
            .update(|db| {
                R::collection_mut(db).push(record.clone());
                Ok(record)
            })
            .await
    }

    /// Applies `merge` to the record with `id`, stamps `updatedAt` and returns
    /// the merged record.
    pub async fn modify<F>(&self, id: &str, merge: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut R),
    {
        self.store
            .update(|db| {
                let record = R::collection_mut(db)
                    .iter_mut()
                    .find(|r| r.id() == id)
                    .ok_or(StoreError::NotFound(R::KIND))?;
                merge(record);
                record.touch(Utc::now());
                Ok(record.clone())
            })
            .await
    }

    /// Removes the record with `id`, returning what was removed.
    pub async fn remove(&self, id: &str) -> Result<R, StoreError> {
        self.store
            .update(|db| {
                let records = R::collection_mut(db);
                let index = records
                    .iter()
                    .position(|r| r.id() == id)
                    .ok_or(StoreError::NotFound(R::KIND))?;
                Ok(records.remove(index))
            })
            .await
    }
}

pub type ScreenRepository = Repository<Screen>;
pub type PlaylistRepository = Repository<Playlist>;

impl Repository<Screen> {
    pub async fn create(&self, new_screen: NewScreen) -> Result<Screen, StoreError> {
        self.insert(|id, now| new_screen.into_screen(id, now)).await
    }

    pub async fn update(&self, id: &str, updates: UpdateScreen) -> Result<Screen, StoreError> {
        self.modify(id, |screen| updates.apply_to(screen)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.remove(id).await.map(|_| ())
    }
}

impl Repository<Playlist> {
    pub async fn create(&self, new_playlist: NewPlaylist) -> Result<Playlist, StoreError> {
        self.insert(|id, now| new_playlist.into_playlist(id, now))
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        updates: UpdatePlaylist,
    ) -> Result<Playlist, StoreError> {
        self.modify(id, |playlist| updates.apply_to(playlist)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.remove(id).await.map(|_| ())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Invalid(String),
}

/// Content records plus the files they own.
#[derive(Clone)]
pub struct ContentRepository {
    records: Repository<Content>,
    media: MediaStore,
}

impl ContentRepository {
    pub fn new(store: Arc<JsonStore>, media: MediaStore) -> Self {
        Self {
            records: Repository::new(store),
            media,
        }
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub async fn list(&self) -> Result<Vec<Content>, StoreError> {
        self.records.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Content, StoreError> {
        self.records.get(id).await
    }

    /// Creates a record. An accepted upload takes precedence over a `url` field.
    pub async fn create(
        &self,
        form: ContentForm,
        upload: Option<Upload>,
    ) -> Result<Content, ContentError> {
        let name = form
            .name
            .ok_or_else(|| ContentError::Invalid("missing 'name'".to_string()))?;
        let kind = form
            .kind
            .ok_or_else(|| ContentError::Invalid("missing 'type'".to_string()))?;

        let stored = match self.accepted(upload) {
            Some(upload) => Some(self.media.save(&upload).await?),
            None => None,
        };

        let (url, file_name) = match &stored {
            Some(file) => (file.url.clone(), Some(file.file_name.clone())),
            None => (form.url.unwrap_or_default(), None),
        };

        let created = self
            .records
            .insert(|id, now| Content {
                id,
                name,
                kind,
                url,
                duration: form.duration.unwrap_or(DEFAULT_DURATION_SECS),
                file_name,
                created_at: now,
                updated_at: None,
            })
            .await;

        if created.is_err() {
            if let Some(file) = &stored {
                self.media.remove(&file.file_name).await;
            }
        }

        Ok(created?)
    }

    /// Merges the form onto the record. A new upload replaces the previously
    /// stored file, which is removed once the record points at the new one.
    pub async fn update(
        &self,
        id: &str,
        form: ContentForm,
        upload: Option<Upload>,
    ) -> Result<Content, ContentError> {
        // Fail before touching the disk when the record is gone.
        let previous = self.records.get(id).await?;

        let stored = match self.accepted(upload) {
            Some(upload) => Some(self.media.save(&upload).await?),
            None => None,
        };

        let replacement = stored.clone();
        let updated = self
            .records
            .modify(id, move |content| {
                form.apply_to(content);
                if let Some(file) = replacement {
                    content.url = file.url;
                    content.file_name = Some(file.file_name);
                }
            })
            .await;

        match (&updated, &stored) {
            (Ok(_), Some(new_file)) => {
                if let Some(old) = previous.file_name.as_deref() {
                    if old != new_file.file_name {
                        self.media.remove(old).await;
                    }
                }
            }
            (Err(_), Some(new_file)) => self.media.remove(&new_file.file_name).await,
            _ => {}
        }

        Ok(updated?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = self.records.remove(id).await?;
        if let Some(file_name) = removed.file_name.as_deref() {
            self.media.remove(file_name).await;
        }
        Ok(())
    }

    fn accepted(&self, upload: Option<Upload>) -> Option<Upload> {
        let upload = upload?;
        if upload.is_allowed() {
            Some(upload)
        } else {
            tracing::warn!(
                "Rejected upload '{}' with disallowed type {:?}",
                upload.original_name,
                upload.mime_type()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use axum::body::Bytes;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        screens: ScreenRepository,
        playlists: PlaylistRepository,
        content: ContentRepository,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::open(dir.path().join("db.json")).await.unwrap());
        let media = MediaStore::open(dir.path().join("uploads")).await.unwrap();
        Fixture {
            screens: Repository::new(store.clone()),
            playlists: Repository::new(store.clone()),
            content: ContentRepository::new(store, media),
            _dir: dir,
        }
    }

    fn new_screen(name: &str) -> NewScreen {
        NewScreen {
            name: name.to_string(),
            location: Some("Hall".to_string()),
            playlist_id: None,
            is_active: None,
        }
    }

    fn image_form(name: &str) -> ContentForm {
        ContentForm {
            name: Some(name.to_string()),
            kind: Some(ContentKind::Image),
            url: None,
            duration: Some(5),
        }
    }

    fn png(name: &str) -> Upload {
        Upload {
            original_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nfake"),
        }
    }

    #[tokio::test]
    async fn test_screen_crud_and_not_found() {
        let f = fixture().await;

        let a = f.screens.create(new_screen("A")).await.unwrap();
        let b = f.screens.create(new_screen("B")).await.unwrap();
        assert_ne!(a.id, b.id);

        let listed = f.screens.list().await.unwrap();
        assert_eq!(
            listed.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );

        assert_eq!(f.screens.get(&a.id).await.unwrap(), a);

        let updated = f
            .screens
            .update(
                &a.id,
                UpdateScreen {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.location, "Hall");
        assert!(updated.updated_at.is_some());

        f.screens.delete(&a.id).await.unwrap();

        assert!(matches!(
            f.screens.get(&a.id).await,
            Err(StoreError::NotFound("Screen"))
        ));
        assert!(matches!(
            f.screens.update(&a.id, UpdateScreen::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            f.screens.delete(&a.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(f.screens.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_playlist_delete_leaves_screen_reference() {
        let f = fixture().await;

        let p = f
            .playlists
            .create(NewPlaylist {
                name: "Loop".to_string(),
                description: None,
                content_ids: Some(vec!["x".to_string(), "x".to_string()]),
                duration: None,
            })
            .await
            .unwrap();
        assert_eq!(p.content_ids.len(), 2);

        let mut s = new_screen("Door");
        s.playlist_id = Some(p.id.clone());
        let s = f.screens.create(s).await.unwrap();

        f.playlists.delete(&p.id).await.unwrap();
        let s = f.screens.get(&s.id).await.unwrap();
        assert_eq!(s.playlist_id.as_deref(), Some(p.id.as_str()));
    }

    #[tokio::test]
    async fn test_content_upload_lifecycle() {
        let f = fixture().await;
        let dir = f.content.media().dir().to_path_buf();

        let created = f
            .content
            .create(image_form("Logo"), Some(png("logo.png")))
            .await
            .unwrap();
        let first = created.file_name.clone().unwrap();
        assert!(created.url.starts_with("/uploads/"));
        assert!(first.ends_with(".png"));
        assert!(dir.join(&first).exists());

        let updated = f
            .content
            .update(&created.id, ContentForm::default(), Some(png("logo2.png")))
            .await
            .unwrap();
        let second = updated.file_name.clone().unwrap();
        assert_ne!(first, second);
        assert_eq!(updated.url, MediaStore::url_for(&second));
        assert_eq!(updated.name, "Logo");
        assert!(!dir.join(&first).exists());
        assert!(dir.join(&second).exists());

        f.content.delete(&created.id).await.unwrap();
        assert!(!dir.join(&second).exists());
        assert!(matches!(
            f.content.get(&created.id).await,
            Err(StoreError::NotFound("Content"))
        ));
    }

    #[tokio::test]
    async fn test_content_without_file_keeps_url() {
        let f = fixture().await;

        let mut form = image_form("Remote");
        form.url = Some("https://example.com/a.png".to_string());
        let created = f.content.create(form, None).await.unwrap();
        assert_eq!(created.url, "https://example.com/a.png");
        assert_eq!(created.file_name, None);

        let updated = f
            .content
            .update(
                &created.id,
                ContentForm {
                    duration: Some(12),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.duration, 12);
        assert_eq!(updated.url, "https://example.com/a.png");
    }

    #[tokio::test]
    async fn test_disallowed_upload_is_not_stored() {
        let f = fixture().await;

        let mut form = image_form("Doc");
        form.url = Some("https://example.com/doc".to_string());
        let upload = Upload {
            original_name: "doc.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        };

        let created = f.content.create(form, Some(upload)).await.unwrap();
        assert_eq!(created.file_name, None);
        assert_eq!(created.url, "https://example.com/doc");

        let entries = std::fs::read_dir(f.content.media().dir()).unwrap().count();
        assert_eq!(entries, 0);
    }

    #[tokio::test]
    async fn test_content_update_missing_id_stores_nothing() {
        let f = fixture().await;

        let res = f
            .content
            .update("nope", ContentForm::default(), Some(png("a.png")))
            .await;
        assert!(matches!(
            res,
            Err(ContentError::Store(StoreError::NotFound("Content")))
        ));
        assert_eq!(std::fs::read_dir(f.content.media().dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_content_create_requires_name_and_type() {
        let f = fixture().await;
        let res = f
            .content
            .create(
                ContentForm {
                    name: Some("No type".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await;
        assert!(matches!(res, Err(ContentError::Invalid(_))));
        assert!(f.content.list().await.unwrap().is_empty());
    }
}
