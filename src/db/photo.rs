use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;

/// An uploaded photo awaiting storage.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct Photo {
    pub uuid: String,
    pub owner_id: Option<i64>,
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct PhotoRow {
    uuid: String,
    owner_id: Option<i64>,
    data: Vec<u8>,
    content_type: String,
    filename: String,
    created_at: String,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            uuid: row.uuid,
            owner_id: row.owner_id,
            data: row.data,
            content_type: row.content_type,
            filename: row.filename,
            created_at: row.created_at,
        }
    }
}

pub struct PhotoStore {
    pool: SqlitePool,
}

impl PhotoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a photo. Returns its UUID.
    pub async fn save(&self, photo: &NewPhoto, owner_id: Option<i64>) -> Result<String, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        insert_in(&mut conn, owner_id, photo).await
    }

    pub async fn get(&self, uuid: &str) -> Result<Option<Photo>, sqlx::Error> {
        let row: Option<PhotoRow> = sqlx::query_as(
            "SELECT uuid, owner_id, data, content_type, filename, created_at
             FROM photos WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Photo::from))
    }
}

pub(super) async fn insert_in(
    conn: &mut SqliteConnection,
    owner_id: Option<i64>,
    photo: &NewPhoto,
) -> Result<String, sqlx::Error> {
    let uuid = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO photos (uuid, owner_id, data, content_type, filename) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&uuid)
    .bind(owner_id)
    .bind(&photo.data)
    .bind(&photo.content_type)
    .bind(&photo.filename)
    .execute(&mut *conn)
    .await?;
    Ok(uuid)
}
