use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct ImageRow {
    pub content_hash: String,
    pub movie: String,
    pub prompt: String,
    pub seq: i64,
    pub path: String,
    pub created_ts: i64,
}

pub async fn get(pool: &SqlitePool, content_hash: &str) -> Result<Option<ImageRow>, sqlx::Error> {
    let row: Option<(String, String, String, i64, String, i64)> = sqlx::query_as(
        "SELECT content_hash, movie, prompt, seq, path, created_ts \
         FROM image_cache WHERE content_hash = ?",
    )
    .bind(content_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(content_hash, movie, prompt, seq, path, created_ts)| ImageRow {
            content_hash,
            movie,
            prompt,
            seq,
            path,
            created_ts,
        },
    ))
}

pub async fn put(
    pool: &SqlitePool,
    content_hash: &str,
    movie: &str,
    prompt: &str,
    seq: i64,
    path: &str,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT OR REPLACE INTO image_cache (content_hash, movie, prompt, seq, path, created_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(content_hash)
    .bind(movie)
    .bind(prompt)
    .bind(seq)
    .bind(path)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
