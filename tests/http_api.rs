#![cfg(feature = "http-service")]

//! Drives the REST API end to end through `RemoteDirectoryClient`.

use medidir_lib::{
    application::{CreateHospitalRequest, HospitalDetailsRequest, UpdateHospitalRequest},
    build_environment,
    domain::qna::FALLBACK_ANSWER,
    infrastructure::{check_service_availability, RemoteDirectoryClient},
    interfaces::{http::serve, HttpState},
};
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::oneshot};

struct TestServer {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let handles = build_environment(dir.path()).unwrap();
        let state = HttpState {
            hospitals: handles.hospitals,
            auth: handles.auth,
            qna: handles.qna,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, state, async {
            let _ = rx.await;
        }));

        Self {
            port,
            shutdown: Some(tx),
            _dir: dir,
        }
    }

    fn client(&self) -> RemoteDirectoryClient {
        RemoteDirectoryClient::new("127.0.0.1", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn hospital(
    name: &str,
    city: &str,
    specialities: &[&str],
    doctors: u64,
    departments: u64,
) -> CreateHospitalRequest {
    CreateHospitalRequest {
        name: name.into(),
        city: city.into(),
        image_url: format!("https://img.example/{name}.png"),
        specialities: specialities.iter().map(|s| s.to_string()).collect(),
        rating: 4.5,
        description: String::new(),
        images: Vec::new(),
        number_of_doctors: doctors,
        number_of_departments: departments,
    }
}

async fn blocking<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(work).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn questions_are_answered_from_the_directory() {
    let server = TestServer::start().await;
    let port = server.port;
    let mut client = server.client();

    blocking(move || {
        assert!(check_service_availability("127.0.0.1", port));

        client.register("asker@example.com", "secret1").unwrap();
        client
            .create_hospital(&hospital("City Care", "Pune", &["Cardiology", "Neurology"], 10, 3))
            .unwrap();
        client
            .create_hospital(&hospital(
                "Green Valley",
                "Mumbai",
                &["Cardiology", "Orthopedics"],
                5,
                2,
            ))
            .unwrap();

        assert_eq!(
            client.ask("How many doctors are there?").unwrap(),
            "We have a total of 15 doctors across all our hospitals."
        );
        assert_eq!(
            client.ask("Show me hospitals in Pune").unwrap(),
            "Here are the hospitals in Pune:\n- City Care (Cardiology, Neurology)\n"
        );
        assert_eq!(
            client.ask("What specialities do you offer?").unwrap(),
            "Our hospitals offer the following specialities: Cardiology, Neurology, Orthopedics"
        );
        assert_eq!(
            client.ask("How many departments?").unwrap(),
            "We have 5 departments across all our hospitals."
        );
        assert_eq!(client.ask("hello").unwrap(), FALLBACK_ANSWER);

        assert_eq!(client.ask("   ").unwrap(), FALLBACK_ANSWER);

        let err = client.ask("").unwrap_err().to_string();
        assert!(err.contains("400"), "{err}");
        assert!(err.contains("Query is required"), "{err}");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn asking_requires_a_valid_token() {
    let server = TestServer::start().await;
    let anonymous = server.client();
    let forged = server.client().with_token("not-a-real-token");

    blocking(move || {
        let err = anonymous.ask("How many doctors?").unwrap_err().to_string();
        assert!(err.contains("401"), "{err}");
        assert!(err.contains("Authentication required"), "{err}");

        let err = forged.ask("How many doctors?").unwrap_err().to_string();
        assert!(err.contains("401"), "{err}");
        assert!(err.contains("Invalid token"), "{err}");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn register_and_login() {
    let server = TestServer::start().await;
    let mut first = server.client();
    let mut second = server.client();

    blocking(move || {
        let issued = first.register("Someone@Example.com", "secret1").unwrap();
        assert_eq!(issued.user.email, "someone@example.com");
        assert!(!issued.token.is_empty());

        let err = second
            .register("someone@example.com", "secret1")
            .unwrap_err()
            .to_string();
        assert!(err.contains("400"), "{err}");
        assert!(err.contains("User already exists"), "{err}");

        let err = second
            .login("someone@example.com", "wrong-password")
            .unwrap_err()
            .to_string();
        assert!(err.contains("401"), "{err}");
        assert!(err.contains("Invalid credentials"), "{err}");

        let logged_in = second.login("someone@example.com", "secret1").unwrap();
        assert_eq!(logged_in.user.id, issued.user.id);
        assert_ne!(logged_in.token, issued.token);
        assert_eq!(second.ask("hi").unwrap(), FALLBACK_ANSWER);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn hospital_crud_round() {
    let server = TestServer::start().await;
    let port = server.port;
    let client = server.client();

    blocking(move || {
        let created = client
            .create_hospital(&hospital("Sunrise", "Pune", &["Oncology"], 4, 1))
            .unwrap();
        client
            .create_hospital(&hospital("Harbor", "Chennai", &["Cardiology"], 2, 1))
            .unwrap();

        assert_eq!(client.get_hospital(&created.id).unwrap(), created);

        let filtered = client.list_hospitals(Some("PUN")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, created.id);
        assert_eq!(client.list_hospitals(None).unwrap().len(), 2);
        assert!(client.list_hospitals(Some("Delhi")).unwrap().is_empty());

        let updated = client
            .update_hospital(
                &created.id,
                &UpdateHospitalRequest {
                    rating: Some(3.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.rating, 3.0);
        assert_eq!(updated.name, "Sunrise");

        let detailed = client
            .add_hospital_details(
                &created.id,
                &HospitalDetailsRequest {
                    description: Some("Cancer care centre".into()),
                    number_of_doctors: Some(9),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(detailed.description, "Cancer care centre");
        assert_eq!(detailed.number_of_doctors, 9);
        assert_eq!(detailed.rating, 3.0);

        assert_eq!(
            client.delete_hospital(&created.id).unwrap(),
            "Hospital deleted successfully"
        );
        let err = client.get_hospital(&created.id).unwrap_err().to_string();
        assert!(err.contains("404"), "{err}");
        assert!(err.contains("Hospital not found"), "{err}");

        let err = client.delete_hospital(&created.id).unwrap_err().to_string();
        assert!(err.contains("404"), "{err}");

        match ureq::get(&format!("http://127.0.0.1:{port}/api/v1/hospitals/not-an-id")).call() {
            Err(ureq::Error::Status(code, _)) => assert_eq!(code, 400),
            other => panic!("expected 400, got {other:?}"),
        }
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_hospitals_are_rejected() {
    let server = TestServer::start().await;
    let client = server.client();

    blocking(move || {
        let too_many = hospital("Wide", "Pune", &["A", "B", "C", "D", "E", "F"], 1, 1);
        let err = client.create_hospital(&too_many).unwrap_err().to_string();
        assert!(err.contains("400"), "{err}");
        assert!(err.contains("Maximum 5 specialities are allowed"), "{err}");

        let mut bad_rating = hospital("Rated", "Pune", &["A"], 1, 1);
        bad_rating.rating = 7.5;
        let err = client.create_hospital(&bad_rating).unwrap_err().to_string();
        assert!(err.contains("Rating must be between 0 and 5"), "{err}");

        assert!(client.list_hospitals(None).unwrap().is_empty());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn non_string_query_is_a_bad_request() {
    let server = TestServer::start().await;
    let port = server.port;
    let mut client = server.client();

    blocking(move || {
        let auth = client.register("typed@example.com", "secret1").unwrap();

        let result = ureq::post(&format!("http://127.0.0.1:{port}/api/v1/qna/ask"))
            .set("Authorization", &format!("Bearer {}", auth.token))
            .send_json(serde_json::json!({ "query": 5 }));
        match result {
            Err(ureq::Error::Status(code, response)) => {
                assert_eq!(code, 400);
                let body: serde_json::Value = response.into_json().unwrap();
                assert_eq!(body["code"], "MALFORMED_PAYLOAD");
            }
            other => panic!("expected 400, got {other:?}"),
        }
    })
    .await;
}
