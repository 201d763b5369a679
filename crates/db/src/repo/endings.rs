use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct EndingRow {
    pub movie: String,
    pub prompt: String,
    pub ending_json: String,
    pub created_ts: i64,
}

pub async fn get(
    pool: &SqlitePool,
    movie: &str,
    prompt: &str,
) -> Result<Option<EndingRow>, sqlx::Error> {
    let row: Option<(String, String, String, i64)> = sqlx::query_as(
        "SELECT movie, prompt, ending_json, created_ts FROM ending_cache \
         WHERE movie = ? AND prompt = ?",
    )
    .bind(movie)
    .bind(prompt)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(movie, prompt, ending_json, created_ts)| EndingRow {
        movie,
        prompt,
        ending_json,
        created_ts,
    }))
}

pub async fn put(
    pool: &SqlitePool,
    movie: &str,
    prompt: &str,
    ending_json: &str,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT OR REPLACE INTO ending_cache (movie, prompt, ending_json, created_ts) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(movie)
    .bind(prompt)
    .bind(ending_json)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = crate::connect(":memory:").await.unwrap();
        crate::migrate::run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn keyed_by_movie_and_prompt() {
        let pool = test_pool().await;
        put(&pool, "Jaws", "the shark wins", "{\"a\":1}").await.unwrap();
        put(&pool, "Jaws", "brody retires", "{\"b\":2}").await.unwrap();

        let a = get(&pool, "Jaws", "the shark wins").await.unwrap().unwrap();
        let b = get(&pool, "Jaws", "brody retires").await.unwrap().unwrap();
        assert_eq!(a.ending_json, "{\"a\":1}");
        assert_eq!(b.ending_json, "{\"b\":2}");

        assert!(get(&pool, "Jaws", "other").await.unwrap().is_none());
        assert!(get(&pool, "Alien", "the shark wins").await.unwrap().is_none());
    }
}
