use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Material, Theory};
use crate::db::types::MaterialType;
use crate::repositories::materials::{self, NewMaterial};

const COLUMNS: &str = "id, material_id, content, created_at, updated_at";

pub(crate) async fn find_by_material(
    pool: &PgPool,
    material_id: &str,
) -> Result<Option<Theory>, sqlx::Error> {
    sqlx::query_as::<_, Theory>(&format!("SELECT {COLUMNS} FROM theories WHERE material_id = $1"))
        .bind(material_id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateTheory<'a> {
    pub(crate) material_id: &'a str,
    pub(crate) theory_id: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) content: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateTheory<'_>,
) -> Result<(Material, Theory), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let material = materials::insert(
        &mut tx,
        NewMaterial {
            id: params.material_id,
            chapter_id: params.chapter_id,
            course_id: params.course_id,
            title: params.title,
            slug: params.slug,
            material_type: MaterialType::Theory,
            now: params.now,
        },
    )
    .await?;

    let theory = sqlx::query_as::<_, Theory>(&format!(
        "INSERT INTO theories (id, material_id, content, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.theory_id)
    .bind(params.material_id)
    .bind(params.content)
    .bind(params.now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((material, theory))
}

pub(crate) async fn update(
    pool: &PgPool,
    material_id: &str,
    title: &str,
    slug: &str,
    content: &str,
    now: PrimitiveDateTime,
) -> Result<(Material, Theory), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let material = materials::rename(&mut *tx, material_id, title, slug, now).await?;
    let theory = sqlx::query_as::<_, Theory>(&format!(
        "UPDATE theories SET content = $2, updated_at = $3
         WHERE material_id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(material_id)
    .bind(content)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((material, theory))
}
