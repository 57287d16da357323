//! Shared CSV fixtures for integration tests

use std::io::Write;

use tempfile::NamedTempFile;

/// Header of the default project export
pub const HEADER: &str = "id,school_state,project_grade_category,teacher_prefix,\
cleaned_titles,cleaned_essays,cleaned_summary,price,project_is_approved";

/// Essay of `len` characters
pub fn essay(len: usize) -> String {
    "students need books ".chars().cycle().take(len).collect()
}

/// A project export with `rows` rows
///
/// Essay lengths sweep 0..2600 so every treatment minimum cuts some
/// projects; five out of six projects are approved.
pub fn project_rows(rows: usize) -> String {
    let states = ["CA", "NY", "TX", "IL"];
    let mut csv = format!("{}\n", HEADER);
    for i in 0..rows {
        csv.push_str(&format!(
            "p{:05},{},Grades PreK-2,Mrs.,Project {},\"{}\",Help us learn,{:.2},{}\n",
            i,
            states[i % states.len()],
            i,
            essay((i * 37) % 2600),
            100.0 + (i % 50) as f64 * 10.0,
            if i % 6 == 0 { 0 } else { 1 },
        ));
    }
    csv
}

/// Write CSV text to a temporary `.csv` file
pub fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write fixture");
    file.flush().expect("flush fixture");
    file
}
