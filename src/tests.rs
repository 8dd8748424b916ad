#[cfg(test)]
mod integration_tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{setup_test_app, ADMIN_EMAIL, ADMIN_PASSWORD};
    use axum::http::{header, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    async fn register(server: &TestServer, full_name: &str, email: &str, password: &str) {
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "full_name": full_name,
                "email": email,
                "password": password,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    /// Logs in and returns (token, next) from the response.
    async fn login(server: &TestServer, email: &str, password: &str) -> (String, String) {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        (
            body.data["token"].as_str().unwrap().to_string(),
            body.data["next"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(server: &TestServer) -> String {
        login(server, ADMIN_EMAIL, ADMIN_PASSWORD).await.0
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_course(
        server: &TestServer,
        token: &str,
        name: &str,
        department: &str,
        head_of_department: &str,
        year: i32,
        semester: i32,
        enrolled_students: i32,
    ) -> i64 {
        let response = server
            .post("/api/v1/courses")
            .add_header(header::AUTHORIZATION, bearer(token))
            .json(&json!({
                "name": name,
                "department": department,
                "head_of_department": head_of_department,
                "year": year,
                "semester": semester,
                "enrolled_students": enrolled_students,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["id"].as_i64().unwrap()
    }

    async fn enrolled_count(server: &TestServer, token: &str, course_id: i64) -> i64 {
        let response = server
            .get(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        body.data["enrolled_students"].as_i64().unwrap()
    }

    /// Completes the profile of the logged-in student and returns the
    /// response data (profile + automatic enrollments).
    async fn complete_profile(
        server: &TestServer,
        token: &str,
        branch: &str,
        year_of_study: i32,
        semester: i32,
    ) -> Value {
        let response = server
            .post("/api/v1/me/profile")
            .add_header(header::AUTHORIZATION, bearer(token))
            .json(&json!({
                "father_name": "Ravi",
                "mother_name": "Meena",
                "contact": "9876543210",
                "dob": "2003-06-14",
                "branch": branch,
                "year_of_study": year_of_study,
                "semester": semester,
                "address": "12 College Road",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data
    }

    /// Submits a status batch for a student; returns the raw response.
    async fn submit_statuses(
        server: &TestServer,
        token: &str,
        student_id: i64,
        changes: Value,
    ) -> axum_test::TestResponse {
        server
            .put(&format!("/api/v1/students/{student_id}/enrollments"))
            .add_header(header::AUTHORIZATION, bearer(token))
            .json(&json!({ "changes": changes }))
            .await
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_account() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "full_name": "Asha Verma",
                "email": "asha@example.edu",
                "password": "correct-horse-battery",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["first_name"], "Asha");
        assert_eq!(body.data["last_name"], "Verma");
        assert_eq!(body.data["email"], "asha@example.edu");
        assert_eq!(body.data["is_superuser"], false);
        assert!(body.data["id"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_full_name() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        for full_name in ["Madonna", "Anna Maria Lopez"] {
            let response = server
                .post("/api/v1/auth/register")
                .json(&json!({
                    "full_name": full_name,
                    "email": "someone@example.edu",
                    "password": "correct-horse-battery",
                }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["code"], "INVALID_FULL_NAME");
        }

        // Nothing was created for either attempt
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "someone@example.edu", "password": "correct-horse-battery" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "first-password-1").await;

        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "full_name": "Arun Sharma",
                "email": "asha@example.edu",
                "password": "second-password-2",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["code"], "EMAIL_ALREADY_EXISTS");

        // The original account still authenticates
        login(&server, "asha@example.edu", "first-password-1").await;
    }

    #[tokio::test]
    async fn test_login_routes_fresh_student_to_profile_completion() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;

        let (_, next) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        assert_eq!(next, "complete-profile");

        // The superuser goes straight home
        let (_, next) = login(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(next, "home");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "asha@example.edu", "password": "wrong-password" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "nobody@example.edu", "password": "whatever-password" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_logout_always_succeeds() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.post("/api/v1/auth/logout").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_complete_profile_auto_enrolls_matching_courses() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let algorithms = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;
        let databases = create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 0).await;
        // Wrong department, wrong year, wrong semester: never matched
        let circuits = create_course(&server, &admin, "Circuits", "ECE", "Dr. Bose", 2, 3, 0).await;
        create_course(&server, &admin, "Algorithms II", "CSE", "Dr. Rao", 3, 3, 0).await;
        create_course(&server, &admin, "Operating Systems", "CSE", "Dr. Rao", 2, 4, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;

        let data = complete_profile(&server, &token, "CSE", 2, 3).await;

        let enrollments = data["enrollments"].as_array().unwrap();
        assert_eq!(enrollments.len(), 2);
        assert!(enrollments.iter().all(|e| e["status"] == "ongoing"));
        let enrolled_ids: Vec<i64> = enrollments
            .iter()
            .map(|e| e["course_id"].as_i64().unwrap())
            .collect();
        assert!(enrolled_ids.contains(&algorithms));
        assert!(enrolled_ids.contains(&databases));

        // Each matched counter moved by exactly one; the rest stayed put
        assert_eq!(enrolled_count(&server, &admin, algorithms).await, 1);
        assert_eq!(enrolled_count(&server, &admin, databases).await, 1);
        assert_eq!(enrolled_count(&server, &admin, circuits).await, 0);

        // With a profile in place the student is routed home
        let (_, next) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        assert_eq!(next, "home");

        // And the profile page now carries the student record
        let response = server
            .get("/api/v1/me/profile")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["student"]["branch"], "CSE");
    }

    #[tokio::test]
    async fn test_complete_profile_requires_authentication() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/me/profile")
            .json(&json!({
                "contact": "9876543210",
                "dob": "2003-06-14",
                "branch": "CSE",
                "year_of_study": 2,
                "semester": 3,
                "address": "12 College Road",
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_complete_profile_twice_conflicts() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;

        complete_profile(&server, &token, "CSE", 2, 3).await;

        let response = server
            .post("/api/v1/me/profile")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({
                "contact": "9876543210",
                "dob": "2003-06-14",
                "branch": "CSE",
                "year_of_study": 2,
                "semester": 3,
                "address": "12 College Road",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["code"], "PROFILE_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_superuser_cannot_complete_profile() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let response = server
            .post("/api/v1/me/profile")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&json!({
                "contact": "9876543210",
                "dob": "1990-01-01",
                "branch": "CSE",
                "year_of_study": 1,
                "semester": 1,
                "address": "Admin Block",
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_complete_profile_with_no_matching_courses() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        create_course(&server, &admin, "Circuits", "ECE", "Dr. Bose", 1, 1, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;

        // No course matches; the student simply starts with an empty ledger
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        assert!(data["enrollments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_change_updates_counter_and_repeats_are_noops() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        // Four other students are already counted
        let course_id = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 4).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        assert_eq!(enrolled_count(&server, &admin, course_id).await, 5);

        // ongoing -> fail drops the counter
        let response = submit_statuses(
            &server,
            &admin,
            student_id,
            json!([{ "course_id": course_id, "status": "fail" }]),
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["applied"], 1);
        assert_eq!(body.data["enrollments"][0]["status"], "fail");
        assert_eq!(enrolled_count(&server, &admin, course_id).await, 4);

        // Submitting the same status again changes nothing
        let response = submit_statuses(
            &server,
            &admin,
            student_id,
            json!([{ "course_id": course_id, "status": "fail" }]),
        )
        .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["applied"], 0);
        assert_eq!(body.data["enrollments"][0]["status"], "fail");
        assert_eq!(enrolled_count(&server, &admin, course_id).await, 4);
    }

    #[tokio::test]
    async fn test_status_round_trip_restores_counter() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let course_id = create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 2).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();
        assert_eq!(enrolled_count(&server, &admin, course_id).await, 3);

        submit_statuses(
            &server,
            &admin,
            student_id,
            json!([{ "course_id": course_id, "status": "pass" }]),
        )
        .await
        .assert_status(StatusCode::OK);
        assert_eq!(enrolled_count(&server, &admin, course_id).await, 2);

        // Statuses are matched leniently: whitespace and case are ignored
        submit_statuses(
            &server,
            &admin,
            student_id,
            json!([{ "course_id": course_id, "status": " ONGOING " }]),
        )
        .await
        .assert_status(StatusCode::OK);
        assert_eq!(enrolled_count(&server, &admin, course_id).await, 3);
    }

    #[tokio::test]
    async fn test_invalid_status_rejects_the_whole_batch() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let first = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 5).await;
        let second = create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 5).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        // Two valid entries ahead of the bogus one; none of them may land
        let response = submit_statuses(
            &server,
            &admin,
            student_id,
            json!([
                { "course_id": first, "status": "pass" },
                { "course_id": second, "status": "fail" },
                { "course_id": first, "status": "bogus" },
            ]),
        )
        .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_STATUS");

        // Ledger and counters are exactly as before the submission
        let response = server
            .get(&format!("/api/v1/students/{student_id}/enrollments"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert!(body
            .data
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["status"] == "ongoing"));
        assert_eq!(enrolled_count(&server, &admin, first).await, 6);
        assert_eq!(enrolled_count(&server, &admin, second).await, 6);
    }

    #[tokio::test]
    async fn test_status_change_for_unknown_student() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let response = submit_statuses(
            &server,
            &admin,
            9999,
            json!([{ "course_id": 1, "status": "pass" }]),
        )
        .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["code"], "STUDENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_course_crud() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let course_id = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;

        // Update a couple of fields, including the raw counter
        let response = server
            .put(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&json!({
                "name": "Advanced Algorithms",
                "enrolled_students": 17,
            }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["name"], "Advanced Algorithms");
        assert_eq!(body.data["enrolled_students"], 17);
        // Untouched fields survive
        assert_eq!(body.data["department"], "CSE");

        // Fields outside the allow-list are rejected outright
        let response = server
            .put(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&json!({ "id": 99 }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        // Delete, then every lookup 404s
        let response = server
            .delete(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);

        let response = server
            .get(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .delete(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_course_delete_cascades_to_ledger() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let course_id = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        server
            .delete(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await
            .assert_status(StatusCode::OK);

        // The ledger rows went with the course, on both views
        let response = server
            .get(&format!("/api/v1/students/{student_id}/enrollments"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert!(body.data.as_array().unwrap().is_empty());

        let response = server
            .get("/api/v1/me/courses")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert!(body.data.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_course_search_is_case_insensitive() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;
        create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 0).await;
        create_course(&server, &admin, "Thermodynamics", "MECH", "Dr. Kulkarni", 2, 3, 0).await;

        // Name, head of department and department are all searchable
        for (term, expected) in [("algo", 1), ("IYER", 1), ("mech", 1), ("xyz", 0)] {
            let response = server
                .get(&format!("/api/v1/courses?search={term}"))
                .add_header(header::AUTHORIZATION, bearer(&admin))
                .await;
            response.assert_status(StatusCode::OK);
            let body: ApiResponse<Value> = response.json();
            assert_eq!(
                body.data["courses"].as_array().unwrap().len(),
                expected,
                "search term {term:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_course_listing_paginates_by_ten() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        for i in 1..=12 {
            create_course(
                &server,
                &admin,
                &format!("Course {i}"),
                "CSE",
                "Dr. Rao",
                1,
                1,
                0,
            )
            .await;
        }

        let response = server
            .get("/api/v1/courses")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["courses"].as_array().unwrap().len(), 10);
        assert_eq!(body.data["page"], 1);
        assert_eq!(body.data["page_size"], 10);
        assert_eq!(body.data["total_items"], 12);
        assert_eq!(body.data["total_pages"], 2);

        let response = server
            .get("/api/v1/courses?page=2")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["courses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_students_list_shows_completed_profiles() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;

        // Registration alone does not put anyone on the student list
        let response = server
            .get("/api/v1/students")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["count"], 0);

        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        complete_profile(&server, &token, "CSE", 2, 3).await;

        let response = server
            .get("/api/v1/students")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["count"], 1);
        let student = &body.data["students"][0];
        assert_eq!(student["first_name"], "Asha");
        assert_eq!(student["email"], "asha@example.edu");
        assert_eq!(student["branch"], "CSE");
        assert_eq!(student["year_of_study"], 2);
        assert_eq!(student["semester"], 3);
    }

    #[tokio::test]
    async fn test_admin_updates_student_fields() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/v1/students/{student_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&json!({
                "branch": "ECE",
                "year_of_study": 3,
                "is_active": false,
            }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["branch"], "ECE");
        assert_eq!(body.data["year_of_study"], 3);
        assert_eq!(body.data["is_active"], false);
        // Untouched fields survive
        assert_eq!(body.data["semester"], 3);
        assert_eq!(body.data["email"], "asha@example.edu");

        // Deactivated accounts can no longer log in
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "asha@example.edu", "password": "correct-horse-battery" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Fields outside the allow-list are rejected outright
        let response = server
            .put(&format!("/api/v1/students/{student_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&json!({ "is_superuser": true }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_update_unknown_student() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let response = server
            .put("/api/v1/students/9999")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .json(&json!({ "branch": "ECE" }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_student_removes_account_and_ledger() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let course_id = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        let response = server
            .delete(&format!("/api/v1/students/{student_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);

        // Account, profile and ledger rows are all gone; the course survives
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "asha@example.edu", "password": "correct-horse-battery" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/students")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["count"], 0);

        let response = server
            .get(&format!("/api/v1/courses/{course_id}"))
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_routes_reject_students_and_anonymous() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;

        let response = server
            .get("/api/v1/students")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server.get("/api/v1/students").await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/courses")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_dashboard_for_admin() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;
        create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        complete_profile(&server, &token, "CSE", 2, 3).await;

        let response = server
            .get("/api/v1/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["first_name"], "Admin");
        assert_eq!(body.data["course_count"], 2);
        assert_eq!(body.data["student_count"], 1);
        assert_eq!(body.data["hod_count"], 2);
        assert_eq!(body.data["department_count"], 1);
    }

    #[tokio::test]
    async fn test_dashboard_for_student() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let first = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;
        create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        submit_statuses(
            &server,
            &admin,
            student_id,
            json!([{ "course_id": first, "status": "pass" }]),
        )
        .await
        .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/dashboard")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["first_name"], "Asha");
        assert_eq!(body.data["branch"], "CSE");
        assert_eq!(body.data["ongoing_count"], 1);
        assert_eq!(body.data["pass_count"], 1);
        assert_eq!(body.data["fail_count"], 0);
    }

    #[tokio::test]
    async fn test_my_courses_status_filter() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let first = create_course(&server, &admin, "Algorithms", "CSE", "Dr. Rao", 2, 3, 0).await;
        create_course(&server, &admin, "Databases", "CSE", "Dr. Iyer", 2, 3, 0).await;

        register(&server, "Asha Verma", "asha@example.edu", "correct-horse-battery").await;
        let (token, _) = login(&server, "asha@example.edu", "correct-horse-battery").await;
        let data = complete_profile(&server, &token, "CSE", 2, 3).await;
        let student_id = data["profile"]["id"].as_i64().unwrap();

        submit_statuses(
            &server,
            &admin,
            student_id,
            json!([{ "course_id": first, "status": "pass" }]),
        )
        .await
        .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/me/courses")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data.as_array().unwrap().len(), 2);

        let response = server
            .get("/api/v1/me/courses?status=pass")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data.as_array().unwrap().len(), 1);
        assert_eq!(body.data[0]["name"], "Algorithms");

        let response = server
            .get("/api/v1/me/courses?status=bogus")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "original-password").await;
        let (token, _) = login(&server, "asha@example.edu", "original-password").await;

        let response = server
            .post("/api/v1/auth/change-password")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({
                "old_password": "original-password",
                "new_password": "brand-new-password",
            }))
            .await;
        response.assert_status(StatusCode::OK);

        // Old credential is dead, new one works
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": "asha@example.edu", "password": "original-password" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        login(&server, "asha@example.edu", "brand-new-password").await;
    }

    #[tokio::test]
    async fn test_change_password_requires_correct_old_password() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "original-password").await;
        let (token, _) = login(&server, "asha@example.edu", "original-password").await;

        let response = server
            .post("/api/v1/auth/change-password")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({
                "old_password": "not-the-password",
                "new_password": "brand-new-password",
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Nothing changed
        login(&server, "asha@example.edu", "original-password").await;
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register(&server, "Asha Verma", "asha@example.edu", "original-password").await;

        let response = server
            .post("/api/v1/auth/forgot-password")
            .json(&json!({ "email": "asha@example.edu" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let uid = body.data["uid"].as_str().unwrap().to_string();
        let token = body.data["token"].as_str().unwrap().to_string();

        // Mismatched confirmation leaves the credential untouched
        let response = server
            .post("/api/v1/auth/reset-password")
            .json(&json!({
                "uid": uid,
                "token": token,
                "new_password": "brand-new-password",
                "confirm_password": "something-else-entirely",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "PASSWORD_MISMATCH");
        login(&server, "asha@example.edu", "original-password").await;

        // A wrong token is rejected
        let response = server
            .post("/api/v1/auth/reset-password")
            .json(&json!({
                "uid": uid,
                "token": "definitely-not-the-token",
                "new_password": "brand-new-password",
                "confirm_password": "brand-new-password",
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // The real token resets the password
        let response = server
            .post("/api/v1/auth/reset-password")
            .json(&json!({
                "uid": uid,
                "token": token,
                "new_password": "brand-new-password",
                "confirm_password": "brand-new-password",
            }))
            .await;
        response.assert_status(StatusCode::OK);
        login(&server, "asha@example.edu", "brand-new-password").await;

        // The token is single-use
        let response = server
            .post("/api/v1/auth/reset-password")
            .json(&json!({
                "uid": uid,
                "token": token,
                "new_password": "yet-another-password",
                "confirm_password": "yet-another-password",
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        login(&server, "asha@example.edu", "brand-new-password").await;
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/auth/forgot-password")
            .json(&json!({ "email": "nobody@example.edu" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_EMAIL");
    }
}
