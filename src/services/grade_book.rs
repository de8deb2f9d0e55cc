use std::collections::BTreeMap;

use serde::Serialize;

use crate::repositories::submission_students::SubmissionRow;

#[derive(Debug, Serialize)]
pub(crate) struct GradeLine {
    pub(crate) submission_id: String,
    pub(crate) material_id: String,
    pub(crate) material: String,
    pub(crate) course_id: String,
    pub(crate) course: String,
    pub(crate) status: &'static str,
    pub(crate) grade: Option<i32>,
}

/// One enrolment with its current attempts. `average` covers graded
/// attempts only and is absent until one is graded.
#[derive(Debug, Serialize)]
pub(crate) struct StudentGrades {
    pub(crate) active_student_id: String,
    pub(crate) student_id: String,
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) school_year: String,
    pub(crate) average: Option<i32>,
    pub(crate) grades: Vec<GradeLine>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub(crate) struct MaterialAverage {
    pub(crate) material_id: String,
    pub(crate) material: String,
    pub(crate) average: i32,
    pub(crate) graded: usize,
}

fn mean(grades: &[i32]) -> Option<i32> {
    if grades.is_empty() {
        return None;
    }
    Some(grades.iter().sum::<i32>() / grades.len() as i32)
}

/// Groups attempts per enrolment, sorted by student name, and averages
/// graded attempts per material, sorted by material title.
pub(crate) fn summarize(rows: Vec<SubmissionRow>) -> (Vec<StudentGrades>, Vec<MaterialAverage>) {
    let mut students: BTreeMap<(String, String), StudentGrades> = BTreeMap::new();
    let mut materials: BTreeMap<(String, String), Vec<i32>> = BTreeMap::new();

    for row in rows {
        let submission = row.submission;
        if let Some(grade) = submission.grade {
            materials
                .entry((row.material_title.clone(), submission.material_id.clone()))
                .or_default()
                .push(grade);
        }

        let entry = students
            .entry((row.student_name.clone(), submission.active_student_id.clone()))
            .or_insert_with(|| StudentGrades {
                active_student_id: submission.active_student_id.clone(),
                student_id: row.student_id,
                name: row.student_name,
                class: submission.class.clone(),
                school_year: submission.school_year.clone(),
                average: None,
                grades: Vec::new(),
            });
        entry.grades.push(GradeLine {
            submission_id: submission.id,
            material_id: submission.material_id,
            material: row.material_title,
            course_id: submission.course_id,
            course: submission.course_title,
            status: submission.status.display(),
            grade: submission.grade,
        });
    }

    let students = students
        .into_values()
        .map(|mut student| {
            let graded: Vec<i32> = student.grades.iter().filter_map(|line| line.grade).collect();
            student.average = mean(&graded);
            student
        })
        .collect();

    let averages = materials
        .into_iter()
        .filter_map(|((material, material_id), grades)| {
            mean(&grades).map(|average| MaterialAverage {
                material_id,
                material,
                average,
                graded: grades.len(),
            })
        })
        .collect();

    (students, averages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::db::models::SubmissionStudent;
    use crate::db::types::SubmissionStatus;

    fn row(
        id: &str,
        student: (&str, &str),
        material: (&str, &str),
        status: SubmissionStatus,
        grade: Option<i32>,
    ) -> SubmissionRow {
        let now = primitive_now_utc();
        SubmissionRow {
            submission: SubmissionStudent {
                id: id.to_string(),
                material_id: material.0.to_string(),
                course_id: "algebra".to_string(),
                school_id: "school".to_string(),
                teacher_id: "teacher".to_string(),
                active_student_id: format!("active-{}", student.0),
                status,
                file_url: "https://files/x.pdf".to_string(),
                description: String::new(),
                grade,
                comment: None,
                course_title: "Algebra".to_string(),
                class: "X IPA 1".to_string(),
                school_year: "2024/2025".to_string(),
                created_at: now,
                updated_at: now,
            },
            student_id: student.0.to_string(),
            student_name: student.1.to_string(),
            material_title: material.1.to_string(),
        }
    }

    #[test]
    fn averages_ignore_ungraded_attempts() {
        let (students, averages) = summarize(vec![
            row("s1", ("st-b", "Budi"), ("m1", "Worksheet 1"), SubmissionStatus::Approved, Some(90)),
            row("s2", ("st-b", "Budi"), ("m2", "Worksheet 2"), SubmissionStatus::Pending, None),
            row("s3", ("st-a", "Ani"), ("m1", "Worksheet 1"), SubmissionStatus::Approved, Some(75)),
            row("s4", ("st-a", "Ani"), ("m2", "Worksheet 2"), SubmissionStatus::Approved, Some(80)),
        ]);

        let names: Vec<&str> = students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ani", "Budi"]);
        assert_eq!(students[0].average, Some(77));
        assert_eq!(students[1].average, Some(90));
        assert_eq!(students[1].grades.len(), 2);
        assert_eq!(students[1].grades[1].status, "PENDING");

        assert_eq!(
            averages,
            vec![
                MaterialAverage {
                    material_id: "m1".to_string(),
                    material: "Worksheet 1".to_string(),
                    average: 82,
                    graded: 2,
                },
                MaterialAverage {
                    material_id: "m2".to_string(),
                    material: "Worksheet 2".to_string(),
                    average: 80,
                    graded: 1,
                },
            ]
        );
    }

    #[test]
    fn ungraded_student_has_no_average() {
        let (students, averages) = summarize(vec![row(
            "s1",
            ("st-a", "Ani"),
            ("m1", "Worksheet 1"),
            SubmissionStatus::TeacherRejected,
            None,
        )]);
        assert_eq!(students[0].average, None);
        assert_eq!(students[0].grades[0].status, "REJECTED");
        assert!(averages.is_empty());
    }
}
