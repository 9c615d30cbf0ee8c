mod test_support;

use serde_json::json;
use test_support::{
    error_code, login_and_select, request_err, request_ok, spawn_sidecar, student_params, temp_dir,
};

#[test]
fn pages_of_fifty_with_out_of_range_rejected() {
    let workspace = temp_dir("schoold-browse-pages");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_and_select(&mut stdin, &mut reader, &workspace);

    for i in 0..120 {
        let class = if i % 2 == 0 { "5A" } else { "6B" };
        let year = if i < 100 { "2024" } else { "2023" };
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "students.create",
            student_params(&format!("Student {:03}", i), class, year),
        );
    }

    let mut seen = Vec::new();
    for (page, expected) in [(1, 50), (2, 50), (3, 20)] {
        let r = request_ok(
            &mut stdin,
            &mut reader,
            &format!("p{}", page),
            "browse.page",
            json!({ "page": page }),
        );
        assert_eq!(r["totalStudents"], json!(120));
        assert_eq!(r["totalPages"], json!(3));
        assert_eq!(r["pageSize"], json!(50));
        assert_eq!(r["page"], json!(page));
        let rows = r["students"].as_array().expect("students");
        assert_eq!(rows.len(), expected);
        seen.extend(rows.iter().filter_map(|s| s["id"].as_i64()));
    }
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 120);
    assert_eq!(seen, sorted);

    let e = request_err(&mut stdin, &mut reader, "p4", "browse.page", json!({ "page": 4 }));
    assert_eq!(error_code(&e), "page_out_of_range");
    let e = request_err(&mut stdin, &mut reader, "p0", "browse.page", json!({ "page": 0 }));
    assert_eq!(error_code(&e), "page_out_of_range");

    let years = request_ok(&mut stdin, &mut reader, "y", "browse.page", json!({}));
    assert_eq!(years["yearOptions"], json!(["2023", "2024"]));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn filters_combine_and_empty_result_is_one_page() {
    let workspace = temp_dir("schoold-browse-filters");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_and_select(&mut stdin, &mut reader, &workspace);

    let rows = [
        ("Asha Nair", "5A", "2024"),
        ("Ravi Kumar", "5B", "2024"),
        ("Meena Iyer", "10A", "2023"),
        ("Arjun Nair", "6A", "2023"),
    ];
    for (i, (name, class, year)) in rows.iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{}", i),
            "students.create",
            student_params(name, class, year),
        );
    }

    let names = |r: &serde_json::Value| -> Vec<String> {
        r["students"]
            .as_array()
            .expect("students")
            .iter()
            .filter_map(|s| s["name"].as_str().map(|n| n.to_string()))
            .collect()
    };

    let r = request_ok(&mut stdin, &mut reader, "1", "browse.page", json!({ "class": "5" }));
    assert_eq!(names(&r), vec!["Asha Nair", "Ravi Kumar"]);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "browse.page",
        json!({ "name": "nair", "year": "2023" }),
    );
    assert_eq!(names(&r), vec!["Arjun Nair"]);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "browse.page",
        json!({ "class": "a", "year": "All", "section": "" }),
    );
    assert_eq!(names(&r), vec!["Asha Nair", "Meena Iyer", "Arjun Nair"]);

    let r = request_ok(&mut stdin, &mut reader, "3b", "browse.page", json!({ "year": 2024 }));
    assert_eq!(names(&r), vec!["Asha Nair", "Ravi Kumar"]);

    let r = request_ok(&mut stdin, &mut reader, "4", "browse.page", json!({ "name": "zzz" }));
    assert_eq!(r["totalStudents"], json!(0));
    assert_eq!(r["totalPages"], json!(1));
    assert_eq!(r["empty"], json!(true));
    assert_eq!(r["message"], json!("No students found."));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn csv_export_writes_current_page() {
    let workspace = temp_dir("schoold-browse-csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    login_and_select(&mut stdin, &mut reader, &workspace);

    let mut tricky = student_params("Nair, Asha \"Ash\"", "5A", "2024");
    tricky["classTeacher"] = json!("Mrs. Rao");
    let _ = request_ok(&mut stdin, &mut reader, "1", "students.create", tricky);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        student_params("Ravi", "6B", "2024"),
    );

    let inline = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "browse.exportCsv",
        json!({ "class": "5A" }),
    );
    assert_eq!(inline["fileName"], json!("students_page_1.csv"));
    assert_eq!(inline["rowsExported"], json!(1));
    let csv = inline["csv"].as_str().expect("csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,name,class,section,class_teacher,phone,year,fee_paid,fee_balance,photo,created_at")
    );
    let row = lines.next().expect("data row");
    assert!(row.starts_with("1,\"Nair, Asha \"\"Ash\"\"\",5A,A,Mrs. Rao,98450 12345,2024,1000,250,,"));
    assert!(lines.next().is_none());

    let out = workspace.join("exports").join("page1.csv");
    let written = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "browse.exportCsv",
        json!({ "outPath": out.to_string_lossy() }),
    );
    assert_eq!(written["rowsExported"], json!(2));
    let on_disk = std::fs::read_to_string(&out).expect("read exported csv");
    assert_eq!(on_disk.lines().count(), 3);
    assert_eq!(Some(on_disk.as_str()), written["csv"].as_str());

    let _ = std::fs::remove_dir_all(workspace);
}
