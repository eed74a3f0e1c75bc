//! Offline demo data set.

use campus_lib::query::Record;
use campus_lib::source::InMemorySource;

const FIRST_NAMES: [&str; 8] = ["Amara", "Bruno", "Chen", "Dalia", "Emeka", "Freya", "Goran", "Hana"];
const LAST_NAMES: [&str; 7] = ["Okafor", "Lindqvist", "Nakamura", "Haddad", "Moreau", "Silva", "Kowalski"];
const HOMEROOMS: [&str; 4] = ["6A", "6B", "7A", "7B"];

/// Builds a source holding `students` and `attendance` collections.
pub fn source() -> InMemorySource {
    let students: Vec<Record> = (0..57i64)
        .map(|i| {
            let n = i as usize;
            Record::new()
                .set("id", i + 1)
                .set("first_name", FIRST_NAMES[n % FIRST_NAMES.len()])
                .set("last_name", LAST_NAMES[(n / 2) % LAST_NAMES.len()])
                .set("grade", 6 + (i % 2))
                .set("homeroom", HOMEROOMS[n % HOMEROOMS.len()])
                .set("active", i % 11 != 0)
        })
        .collect();

    let attendance: Vec<Record> = (0..120i64)
        .map(|i| {
            let status = match i % 9 {
                0 => "absent",
                1 => "late",
                _ => "present",
            };
            Record::new()
                .set("id", i + 1)
                .set("student_id", i % 57 + 1)
                .set("date", format!("2026-09-{:02}", i / 57 + 1))
                .set("status", status)
        })
        .collect();

    InMemorySource::new()
        .with_collection("students", students)
        .with_collection("attendance", attendance)
}
