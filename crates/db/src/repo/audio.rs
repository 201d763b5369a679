use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct AudioRow {
    pub content_hash: String,
    pub movie: String,
    pub prompt: String,
    pub voice: String,
    pub path: String,
    pub created_ts: i64,
}

pub async fn get(pool: &SqlitePool, content_hash: &str) -> Result<Option<AudioRow>, sqlx::Error> {
    let row: Option<(String, String, String, String, String, i64)> = sqlx::query_as(
        "SELECT content_hash, movie, prompt, voice, path, created_ts \
         FROM audio_cache WHERE content_hash = ?",
    )
    .bind(content_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(content_hash, movie, prompt, voice, path, created_ts)| AudioRow {
            content_hash,
            movie,
            prompt,
            voice,
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
    voice: &str,
    path: &str,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT OR REPLACE INTO audio_cache (content_hash, movie, prompt, voice, path, created_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(content_hash)
    .bind(movie)
    .bind(prompt)
    .bind(voice)
    .bind(path)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
