//! Tests for the API client interceptors and endpoint decoding

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
    use async_trait::async_trait;
    use campus_core::{AccessToken, AuthBackend, CampusResult, Credentials, Role, TokenStore};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestTokens(Mutex<Option<AccessToken>>);

    impl TestTokens {
        fn with(token: &str) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Some(AccessToken::new(token)))))
        }
    }

    impl TokenStore for TestTokens {
        fn get(&self) -> CampusResult<Option<AccessToken>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn set(&self, token: &AccessToken) -> CampusResult<()> {
            *self.0.lock().unwrap() = Some(token.clone());
            Ok(())
        }

        fn remove(&self) -> CampusResult<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    /// Answers queued replies in order and records every request
    #[derive(Default)]
    struct QueuedTransport {
        replies: Mutex<VecDeque<Option<(u16, String)>>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl QueuedTransport {
        fn reply(self: &Arc<Self>, status: u16, body: &str) -> Arc<Self> {
            self.replies
                .lock()
                .unwrap()
                .push_back(Some((status, body.to_string())));
            self.clone()
        }

        fn fail(self: &Arc<Self>) -> Arc<Self> {
            self.replies.lock().unwrap().push_back(None);
            self.clone()
        }

        fn authorization(&self, index: usize) -> Option<String> {
            self.seen.lock().unwrap()[index]
                .headers
                .get(AUTHORIZATION)
                .map(|v| v.to_str().unwrap().to_string())
        }
    }

    #[async_trait]
    impl HttpTransport for QueuedTransport {
        async fn send(&self, request: ApiRequest) -> CampusResult<ApiResponse> {
            self.seen.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop_front().flatten() {
                Some((status, body)) => Ok(ApiResponse::new(
                    StatusCode::from_u16(status).unwrap(),
                    body,
                )),
                None => Err(CampusError::Network {
                    message: "connection refused".to_string(),
                    source: None,
                    context: ErrorContext::new("test_transport"),
                }),
            }
        }
    }

    #[derive(Default)]
    struct CountingHandler(AtomicUsize);

    impl UnauthorizedHandler for CountingHandler {
        fn on_unauthorized(&self, _failure: &AuthFailure) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_bearer_header_attached_when_token_present() {
        let transport = Arc::new(QueuedTransport::default()).reply(200, "[]");
        let client = ApiClient::new(transport.clone(), TestTokens::with("tok1"));

        let courses = CoursesApi::new(client).list().await.unwrap();
        assert!(courses.is_empty());
        assert_eq!(transport.authorization(0).as_deref(), Some("Bearer tok1"));
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let transport = Arc::new(QueuedTransport::default()).reply(200, "[]");
        let client = ApiClient::new(transport.clone(), Arc::new(TestTokens::default()));

        CoursesApi::new(client).list().await.unwrap();
        assert_eq!(transport.authorization(0), None);
    }

    #[tokio::test]
    async fn test_unauthorized_runs_global_handler_for_any_endpoint() {
        let transport = Arc::new(QueuedTransport::default())
            .reply(401, r#"{"message":"Token expired"}"#)
            .reply(401, "");
        let handler = Arc::new(CountingHandler::default());
        let client = ApiClient::new(transport, TestTokens::with("tok1"))
            .with_unauthorized_handler(handler.clone());

        let err = DashboardApi::new(client.clone())
            .summary(Role::Teacher)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Token expired");
        assert_eq!(
            err.context().and_then(|c| c.metadata.get("method")).map(String::as_str),
            Some("GET")
        );

        let err = NotificationsApi::new(client)
            .mark_all_read()
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(handler.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_handler_clears_token() {
        let tokens = TestTokens::with("tok1");
        let transport = Arc::new(QueuedTransport::default()).reply(401, "");
        let client = ApiClient::new(transport, tokens.clone());

        assert!(client.get::<serde_json::Value>("/courses").await.is_err());
        assert!(tokens.get().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_errors_pass_through_untouched() {
        let tokens = TestTokens::with("tok1");
        let transport = Arc::new(QueuedTransport::default())
            .reply(422, r#"{"detail":"Course is full"}"#)
            .reply(500, "<html>oops</html>");
        let handler = Arc::new(CountingHandler::default());
        let client =
            ApiClient::new(transport, tokens.clone()).with_unauthorized_handler(handler.clone());
        let enrollments = EnrollmentsApi::new(client);

        match enrollments.enroll("7").await.unwrap_err() {
            CampusError::Api {
                status,
                message,
                context,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Course is full");
                assert_eq!(context.operation.as_deref(), Some("POST /enrollments/7"));
                assert_eq!(context.metadata.get("status").map(String::as_str), Some("422"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }

        match enrollments.my_courses().await.unwrap_err() {
            CampusError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }

        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
        assert!(tokens.get().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_network_failure_is_not_retried() {
        let transport = Arc::new(QueuedTransport::default()).fail().reply(200, "[]");
        let client = ApiClient::new(transport.clone(), Arc::new(TestTokens::default()));

        let err = CoursesApi::new(client).list().await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_and_me_decoding() {
        let transport = Arc::new(QueuedTransport::default())
            .reply(
                200,
                r#"{"access_token":"tok1","user":{"id":"1","role":"student"}}"#,
            )
            .reply(200, r#"{"user":{"id":2,"email":"t@x.io","role":"teacher"}}"#)
            .reply(200, r#"{"id":"3","email":"a@x.io","role":"admin"}"#)
            .reply(204, "");
        let auth = AuthApi::new(ApiClient::new(
            transport.clone(),
            Arc::new(TestTokens::default()),
        ));

        let login = auth
            .login(&Credentials::new("a@b.com", "x"))
            .await
            .unwrap();
        assert_eq!(login.access_token.expose(), "tok1");
        assert_eq!(login.user.role, Role::Student);
        {
            let seen = transport.seen.lock().unwrap();
            assert_eq!(seen[0].method, Method::POST);
            assert_eq!(seen[0].path, "/auth/login");
            let body = seen[0].body.as_ref().unwrap();
            assert_eq!(body["email"], "a@b.com");
            assert_eq!(body["password"], "x");
        }

        assert_eq!(auth.current_user().await.unwrap().id, "2");
        assert_eq!(auth.current_user().await.unwrap().role, Role::Admin);
        auth.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_envelopes_and_path_encoding() {
        let transport = Arc::new(QueuedTransport::default())
            .reply(
                200,
                r#"{"data":[{"id":1,"title":"Rust 101","lessonCount":12}]}"#,
            )
            .reply(204, "");
        let courses = CoursesApi::new(ApiClient::new(
            transport.clone(),
            Arc::new(TestTokens::default()),
        ));

        let list = courses.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "1");
        assert_eq!(list[0].lesson_count, 12);

        courses.delete("a b/c").await.unwrap();
        assert_eq!(transport.seen.lock().unwrap()[1].path, "/courses/a%20b%2Fc");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, r#"{"message":"Bad email"}"#),
            "Bad email"
        );
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, r#"{"error":"nope","detail":null}"#),
            "nope"
        );
        assert_eq!(
            extract_error_message(StatusCode::CONFLICT, "Already enrolled"),
            "Already enrolled"
        );
        assert_eq!(extract_error_message(StatusCode::NOT_FOUND, ""), "Not Found");
        assert!(extract_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"msg":"field required"}]}"#
        )
        .contains("field required"));
    }
}
