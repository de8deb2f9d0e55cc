use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Material, SubmissionTemplate};
use crate::db::types::MaterialType;
use crate::repositories::materials::{self, NewMaterial};

const COLUMNS: &str = "id, material_id, content, created_at, updated_at";

pub(crate) async fn find_by_material(
    pool: &PgPool,
    material_id: &str,
) -> Result<Option<SubmissionTemplate>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionTemplate>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE material_id = $1"
    ))
    .bind(material_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateTemplate<'a> {
    pub(crate) material_id: &'a str,
    pub(crate) template_id: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) content: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateTemplate<'_>,
) -> Result<(Material, SubmissionTemplate), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let material = materials::insert(
        &mut tx,
        NewMaterial {
            id: params.material_id,
            chapter_id: params.chapter_id,
            course_id: params.course_id,
            title: params.title,
            slug: params.slug,
            material_type: MaterialType::Submission,
            now: params.now,
        },
    )
    .await?;

    let template = sqlx::query_as::<_, SubmissionTemplate>(&format!(
        "INSERT INTO submissions (id, material_id, content, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.template_id)
    .bind(params.material_id)
    .bind(params.content)
    .bind(params.now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((material, template))
}

pub(crate) async fn update(
    pool: &PgPool,
    material_id: &str,
    title: &str,
    slug: &str,
    content: &str,
    now: PrimitiveDateTime,
) -> Result<(Material, SubmissionTemplate), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let material = materials::rename(&mut *tx, material_id, title, slug, now).await?;
    let template = sqlx::query_as::<_, SubmissionTemplate>(&format!(
        "UPDATE submissions SET content = $2, updated_at = $3
         WHERE material_id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(material_id)
    .bind(content)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((material, template))
}
