//! Sorting for filtered table views.

use std::cmp::Ordering;

use crate::models::{
    ApprovalRequest, ApprovalSortColumn, Course, CourseSortColumn, Student, StudentSortColumn,
};
use crate::utils::cmp_ignore_case;

fn direction(cmp: Ordering, ascending: bool) -> Ordering {
    if ascending {
        cmp
    } else {
        cmp.reverse()
    }
}

pub fn sort_students(students: &mut [&Student], column: StudentSortColumn, ascending: bool) {
    students.sort_by(|a, b| {
        let name_cmp = |x: &Student, y: &Student| cmp_ignore_case(x.display_name(), y.display_name());

        let cmp = match column {
            StudentSortColumn::Name => name_cmp(a, b),
            StudentSortColumn::RegistrationNo => a
                .registration_no
                .cmp(&b.registration_no)
                .then_with(|| name_cmp(a, b)),
            StudentSortColumn::District => cmp_ignore_case(
                a.district.as_deref().unwrap_or(""),
                b.district.as_deref().unwrap_or(""),
            )
            .then_with(|| name_cmp(a, b)),
            StudentSortColumn::Status => a
                .status_label()
                .cmp(b.status_label())
                .then_with(|| name_cmp(a, b)),
            StudentSortColumn::Created => a.created_at.cmp(&b.created_at).then_with(|| name_cmp(a, b)),
        };

        direction(cmp, ascending)
    });
}

pub fn sort_courses(courses: &mut [&Course], column: CourseSortColumn, ascending: bool) {
    courses.sort_by(|a, b| {
        let name_cmp = |x: &Course, y: &Course| cmp_ignore_case(&x.name, &y.name);

        let cmp = match column {
            CourseSortColumn::Name => name_cmp(a, b),
            CourseSortColumn::Code => a.code.cmp(&b.code).then_with(|| name_cmp(a, b)),
            CourseSortColumn::Status => a
                .status
                .as_str()
                .cmp(b.status.as_str())
                .then_with(|| name_cmp(a, b)),
            CourseSortColumn::Students => a.student_count().cmp(&b.student_count()).then_with(|| name_cmp(a, b)),
            CourseSortColumn::Progress => a.progress_percent().cmp(&b.progress_percent()).then_with(|| name_cmp(a, b)),
        };

        direction(cmp, ascending)
    });
}

pub fn sort_approvals(approvals: &mut [&ApprovalRequest], column: ApprovalSortColumn, ascending: bool) {
    approvals.sort_by(|a, b| {
        let cmp = match column {
            ApprovalSortColumn::Date => a.created_at.cmp(&b.created_at),
            // Ascending shows the most urgent first
            ApprovalSortColumn::Priority => b.priority.cmp(&a.priority),
            ApprovalSortColumn::Status => a.status.as_str().cmp(b.status.as_str()),
            ApprovalSortColumn::Type => cmp_ignore_case(&a.request_type, &b.request_type),
        }
        .then_with(|| a.id.cmp(&b.id));

        direction(cmp, ascending)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_students_by_name_case_insensitive() {
        let students: Vec<Student> = serde_json::from_value(serde_json::json!([
            {"full_name_english": "nimali Silva"},
            {"full_name_english": "Kamal Perera"},
            {"full_name_english": "Amara Dias"}
        ]))
        .expect("student fixtures");

        let mut view: Vec<&Student> = students.iter().collect();
        sort_students(&mut view, StudentSortColumn::Name, true);
        let names: Vec<&str> = view.iter().map(|s| s.display_name()).collect();
        assert_eq!(names, vec!["Amara Dias", "Kamal Perera", "nimali Silva"]);

        sort_students(&mut view, StudentSortColumn::Name, false);
        assert_eq!(view[0].display_name(), "nimali Silva");
    }

    #[test]
    fn test_sort_courses_by_students_then_name() {
        let courses: Vec<Course> = serde_json::from_value(serde_json::json!([
            {"name": "Welding", "status": "Active", "students": 10},
            {"name": "Carpentry", "status": "Active", "students": 10},
            {"name": "Web Development", "status": "Active", "students": 30}
        ]))
        .expect("course fixtures");

        let mut view: Vec<&Course> = courses.iter().collect();
        sort_courses(&mut view, CourseSortColumn::Students, true);
        let names: Vec<&str> = view.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Carpentry", "Welding", "Web Development"]);
    }

    #[test]
    fn test_sort_approvals_by_priority() {
        let approvals: Vec<ApprovalRequest> = serde_json::from_value(serde_json::json!([
            {"id": 1, "type": "A", "priority": "Low", "status": "Pending"},
            {"id": 2, "type": "B", "priority": "High", "status": "Pending"},
            {"id": 3, "type": "C", "priority": "Medium", "status": "Pending"}
        ]))
        .expect("approval fixtures");

        let mut view: Vec<&ApprovalRequest> = approvals.iter().collect();
        sort_approvals(&mut view, ApprovalSortColumn::Priority, true);
        let ids: Vec<i64> = view.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
