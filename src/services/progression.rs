use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::db::models::{Chapter, Material};
use crate::repositories;

/// Chapters of one course with their materials, both in position order.
#[derive(Debug, Clone)]
pub(crate) struct CourseOutline {
    pub(crate) chapters: Vec<OutlineChapter>,
}

#[derive(Debug, Clone)]
pub(crate) struct OutlineChapter {
    pub(crate) chapter: Chapter,
    pub(crate) materials: Vec<Material>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MaterialState {
    pub(crate) is_complete: bool,
    pub(crate) is_lock: bool,
}

impl CourseOutline {
    /// Groups materials under their chapters. Both inputs may come in any
    /// order; the outline is sorted by `position`.
    pub(crate) fn assemble(mut chapters: Vec<Chapter>, mut materials: Vec<Material>) -> Self {
        chapters.sort_by_key(|chapter| chapter.position);
        materials.sort_by_key(|material| material.position);

        let mut by_chapter: HashMap<String, Vec<Material>> = HashMap::new();
        for material in materials {
            by_chapter.entry(material.chapter_id.clone()).or_default().push(material);
        }

        let chapters = chapters
            .into_iter()
            .map(|chapter| {
                let materials = by_chapter.remove(&chapter.id).unwrap_or_default();
                OutlineChapter { chapter, materials }
            })
            .collect();

        Self { chapters }
    }

    pub(crate) async fn load(pool: &PgPool, course_id: &str) -> Result<Self, sqlx::Error> {
        let chapters = repositories::chapters::list_for_course(pool, course_id).await?;
        let materials = repositories::materials::list_for_course(pool, course_id).await?;
        Ok(Self::assemble(chapters, materials))
    }

    /// Materials in reading order; empty chapters contribute nothing.
    pub(crate) fn flatten(&self) -> impl Iterator<Item = &Material> {
        self.chapters.iter().flat_map(|chapter| chapter.materials.iter())
    }

    pub(crate) fn material_count(&self) -> usize {
        self.chapters.iter().map(|chapter| chapter.materials.len()).sum()
    }

    /// Completion and lock flags for every material.
    ///
    /// The first material of the course is always open. Every later
    /// material opens only once the material right before it in reading
    /// order is complete, which carries across chapter boundaries.
    pub(crate) fn material_states(&self, completed: &HashSet<String>) -> HashMap<String, MaterialState> {
        let mut states = HashMap::with_capacity(self.material_count());
        let mut previous_complete: Option<bool> = None;

        for material in self.flatten() {
            let is_complete = completed.contains(&material.id);
            let is_lock = match previous_complete {
                None => false,
                Some(done) => !done,
            };
            states.insert(material.id.clone(), MaterialState { is_complete, is_lock });
            previous_complete = Some(is_complete);
        }

        states
    }

    pub(crate) fn is_fully_complete(&self, completed: &HashSet<String>) -> bool {
        self.material_count() > 0 && self.flatten().all(|material| completed.contains(&material.id))
    }

    /// Material that follows `material_id`, crossing into the next
    /// non-empty chapter when the current chapter is exhausted.
    pub(crate) fn next_material(&self, material_id: &str) -> Option<NextMaterial<'_>> {
        let mut iter = self.flatten();
        let current = iter.by_ref().find(|material| material.id == material_id)?;
        let next = iter.next()?;
        Some(NextMaterial { material: next, is_other_chapter: next.chapter_id != current.chapter_id })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NextMaterial<'a> {
    pub(crate) material: &'a Material,
    pub(crate) is_other_chapter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::types::MaterialType;

    fn chapter(id: &str, position: i32) -> Chapter {
        let now = primitive_now_utc();
        Chapter {
            id: id.to_string(),
            course_id: "course".to_string(),
            title: id.to_string(),
            slug: id.to_string(),
            is_draft: false,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    fn material(id: &str, chapter_id: &str, position: i32) -> Material {
        let now = primitive_now_utc();
        Material {
            id: id.to_string(),
            chapter_id: chapter_id.to_string(),
            course_id: "course".to_string(),
            title: id.to_string(),
            slug: id.to_string(),
            material_type: MaterialType::Theory,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    fn algebra() -> CourseOutline {
        CourseOutline::assemble(
            vec![chapter("ch2", 2), chapter("ch1", 1), chapter("empty", 3), chapter("ch4", 4)],
            vec![
                material("m2", "ch1", 2),
                material("m1", "ch1", 1),
                material("m3", "ch2", 1),
                material("m4", "ch4", 1),
            ],
        )
    }

    fn done(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn only_first_material_is_open_initially() {
        let states = algebra().material_states(&done(&[]));
        assert!(!states["m1"].is_lock);
        assert!(states["m2"].is_lock);
        assert!(states["m3"].is_lock);
        assert!(states["m4"].is_lock);
    }

    #[test]
    fn completing_a_material_opens_the_next_one() {
        let states = algebra().material_states(&done(&["m1"]));
        assert!(states["m1"].is_complete);
        assert!(!states["m2"].is_lock);
        assert!(states["m3"].is_lock);
    }

    #[test]
    fn last_material_of_a_chapter_opens_next_chapter() {
        let states = algebra().material_states(&done(&["m1", "m2"]));
        assert!(!states["m3"].is_lock);
        assert!(states["m4"].is_lock);

        let states = algebra().material_states(&done(&["m1", "m2", "m3"]));
        assert!(!states["m4"].is_lock, "empty chapters are skipped");
    }

    #[test]
    fn incomplete_predecessor_keeps_material_locked() {
        let states = algebra().material_states(&done(&["m2"]));
        assert!(states["m2"].is_lock);
        assert!(!states["m3"].is_lock);
    }

    #[test]
    fn next_material_stays_in_chapter_then_crosses() {
        let outline = algebra();

        let next = outline.next_material("m1").expect("next");
        assert_eq!(next.material.id, "m2");
        assert!(!next.is_other_chapter);

        let next = outline.next_material("m2").expect("next");
        assert_eq!(next.material.id, "m3");
        assert!(next.is_other_chapter);

        let next = outline.next_material("m3").expect("next");
        assert_eq!(next.material.id, "m4");

        assert!(outline.next_material("m4").is_none());
        assert!(outline.next_material("missing").is_none());
    }

    #[test]
    fn full_completion_requires_every_material() {
        let outline = algebra();
        assert!(!outline.is_fully_complete(&done(&["m1", "m2", "m3"])));
        assert!(outline.is_fully_complete(&done(&["m1", "m2", "m3", "m4"])));
        assert!(!CourseOutline::assemble(vec![chapter("ch1", 1)], vec![])
            .is_fully_complete(&done(&[])));
    }
}
