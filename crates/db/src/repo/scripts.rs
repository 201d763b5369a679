use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct ScriptRow {
    pub movie: String,
    pub script: String,
    pub source_url: String,
    pub fetched_ts: i64,
}

pub async fn get(pool: &SqlitePool, movie: &str) -> Result<Option<ScriptRow>, sqlx::Error> {
    let row: Option<(String, String, String, i64)> = sqlx::query_as(
        "SELECT movie, script, source_url, fetched_ts FROM script_cache WHERE movie = ?",
    )
    .bind(movie)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(movie, script, source_url, fetched_ts)| ScriptRow {
        movie,
        script,
        source_url,
        fetched_ts,
    }))
}

pub async fn put(
    pool: &SqlitePool,
    movie: &str,
    script: &str,
    source_url: &str,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT OR REPLACE INTO script_cache (movie, script, source_url, fetched_ts) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(movie)
    .bind(script)
    .bind(source_url)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}
