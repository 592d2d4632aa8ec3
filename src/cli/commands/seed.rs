use crate::database::Database;

const GENRES: &[(&str, &str)] = &[
    ("Action", "action"),
    ("Comedy", "comedy"),
    ("Drama", "drama"),
    ("Fantasy", "fantasy"),
    ("Romance", "romance"),
    ("Sci-Fi", "sci-fi"),
    ("Slice of Life", "slice-of-life"),
    ("Sports", "sports"),
];

const TAGS: &[(&str, &str)] = &[
    ("Isekai", "isekai"),
    ("School", "school"),
    ("Mecha", "mecha"),
    ("Time Travel", "time-travel"),
];

const PLATFORMS: &[(&str, &str)] = &[
    ("Crunchyroll", "crunchyroll"),
    ("Netflix", "netflix"),
    ("Hidive", "hidive"),
];

/// Idempotent starter data: re-running the seed skips rows that already
/// exist.
pub async fn seed_reference_data() -> anyhow::Result<()> {
    let pool = Database::pool().await?;

    let mut inserted = 0u32;
    for (table, rows) in [("genres", GENRES), ("tags", TAGS), ("platforms", PLATFORMS)] {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING",
            table
        );
        for &(name, slug) in rows {
            let result = sqlx::query(&sql).bind(name).bind(slug).execute(&pool).await?;
            inserted += result.rows_affected() as u32;
        }
    }

    println!("Seed complete: {} new reference rows", inserted);
    Ok(())
}
