use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct VideoRow {
    pub content_hash: String,
    pub movie: String,
    pub prompt: String,
    pub path: String,
    pub created_ts: i64,
}

pub async fn get(pool: &SqlitePool, content_hash: &str) -> Result<Option<VideoRow>, sqlx::Error> {
    let row: Option<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT content_hash, movie, prompt, path, created_ts \
         FROM video_cache WHERE content_hash = ?",
    )
    .bind(content_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(content_hash, movie, prompt, path, created_ts)| VideoRow {
        content_hash,
        movie,
        prompt,
        path,
        created_ts,
    }))
}

pub async fn put(
    pool: &SqlitePool,
    content_hash: &str,
    movie: &str,
    prompt: &str,
    path: &str,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT OR REPLACE INTO video_cache (content_hash, movie, prompt, path, created_ts) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(content_hash)
    .bind(movie)
    .bind(prompt)
    .bind(path)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
