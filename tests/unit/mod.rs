// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Unit tests for image-registry-webhook.
//!
//! These tests run without a Kubernetes cluster and exercise the public API
//! of each component in isolation.

#[path = "../common/mod.rs"]
mod common;

mod registry_policy_tests {
    use image_registry_webhook::webhooks::policies::registry::{
        DEPRECATED_REGISTRY_WARNING, evaluate, registry_host,
    };

    #[test]
    fn test_deprecated_registry_warning_text() {
        assert_eq!(
            DEPRECATED_REGISTRY_WARNING,
            "quay is will be depriated soon, please move to ecr"
        );
    }

    #[test]
    fn test_registry_host() {
        assert_eq!(registry_host("quay.io/org/app:v1"), Some("quay.io"));
        assert_eq!(registry_host("localhost:5000/app"), Some("localhost:5000"));
        assert_eq!(registry_host("alpine"), None);
    }

    #[test]
    fn test_digest_reference_uses_host_only() {
        let decision =
            evaluate("123.dkr.ecr.eu-west-1.amazonaws.com/app@sha256:0123456789abcdef");
        assert!(decision.allowed);
    }
}

mod aggregation_tests {
    use image_registry_webhook::webhooks::{Verdict, evaluate_images};

    #[test]
    fn test_allowed_then_denied() {
        let verdict = evaluate_images(["ecr.example.com/a", "gcr.io/b"]);
        assert_eq!(
            verdict,
            Verdict {
                allowed: false,
                warnings: vec![],
                message: Some("gcr.io/b Not a valid Image".to_string()),
            }
        );
    }

    #[test]
    fn test_all_allowed_no_warnings() {
        let verdict = evaluate_images(["ecr.example.com/a", "my-ecr.internal/b"]);
        assert!(verdict.allowed);
        assert!(verdict.warnings.is_empty());
        assert!(verdict.message.is_none());
    }
}

mod extract_tests {
    use crate::common::fixtures::{deployment_review, pod_review};
    use image_registry_webhook::webhooks::{AdmissionError, ResourceKind, extract_images};

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::Pod.to_string(), "Pod");
        assert_eq!(ResourceKind::Deployment.to_string(), "Deployment");
    }

    #[test]
    fn test_pod_fixture_images() {
        let review = pod_review(&["ecr.example.com/a", "quay.io/b"]).build();
        let images = extract_images("Pod", review["request"]["object"].clone()).unwrap();
        assert_eq!(images, vec!["ecr.example.com/a", "quay.io/b"]);
    }

    #[test]
    fn test_deployment_fixture_images() {
        let review = deployment_review(&["quay.io/foo:v1"]).build();
        let images = extract_images("Deployment", review["request"]["object"].clone()).unwrap();
        assert_eq!(images, vec!["quay.io/foo:v1"]);
    }

    #[test]
    fn test_pod_object_declared_as_deployment() {
        // A Pod body does not decode as a Deployment
        let review = pod_review(&["ecr.example.com/a"]).build();
        let err = extract_images("Deployment", review["request"]["object"].clone()).unwrap_err();
        assert!(matches!(err, AdmissionError::MalformedResource(_)));
    }
}

mod review_tests {
    use crate::common::fixtures::{ADMISSION_V1BETA1, deployment_review, pod_review};
    use image_registry_webhook::webhooks::review::{decode, decode_response, encode, respond_to};
    use image_registry_webhook::webhooks::{AdmissionError, evaluate_images};

    #[test]
    fn test_decode_fixture() {
        let request = decode(&pod_review(&["busybox"]).uid("u1").body(), Some("application/json"))
            .unwrap();
        assert_eq!(request.uid, "u1");
        assert_eq!(request.kind.kind, "Pod");
    }

    #[test]
    fn test_round_trip_preserves_decision_fields() {
        for (images, allowed) in [
            (vec!["ecr.example.com/app"], true),
            (vec!["quay.io/foo:v1", "quay.io/bar:v2"], true),
            (vec!["busybox"], false),
        ] {
            let request = decode(
                &deployment_review(&images).body(),
                Some("application/json"),
            )
            .unwrap();
            let verdict = evaluate_images(images.iter().copied());
            let response = verdict.clone().apply(respond_to(&request));
            let decoded = decode_response(&encode(response, &request).unwrap())
                .unwrap()
                .response
                .unwrap();

            assert_eq!(decoded.allowed, allowed);
            assert_eq!(decoded.warnings.unwrap_or_default(), verdict.warnings);
            assert_eq!(
                decoded.result.message,
                verdict.message.unwrap_or_default()
            );
        }
    }

    #[test]
    fn test_legacy_envelope_identity_preserved() {
        let request = decode(
            &pod_review(&["ecr.example.com/a"])
                .api_version(ADMISSION_V1BETA1)
                .body(),
            Some("application/json"),
        )
        .unwrap();
        let review = decode_response(&encode(respond_to(&request), &request).unwrap()).unwrap();
        assert_eq!(review.types.api_version, ADMISSION_V1BETA1);
        assert_eq!(review.types.kind, "AdmissionReview");
    }

    #[test]
    fn test_empty_body() {
        let err = decode(b"", Some("application/json")).unwrap_err();
        assert!(matches!(err, AdmissionError::MalformedEnvelope(_)));
    }
}

mod error_tests {
    use axum::http::StatusCode;
    use image_registry_webhook::webhooks::AdmissionError;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AdmissionError::UnsupportedContentType("text/plain".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdmissionError::MalformedResource("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_reasons_are_distinct() {
        let reasons = [
            AdmissionError::UnsupportedContentType(String::new()).reason(),
            AdmissionError::MalformedEnvelope(String::new()).reason(),
            AdmissionError::UnsupportedKind(String::new()).reason(),
            AdmissionError::MalformedResource(String::new()).reason(),
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
