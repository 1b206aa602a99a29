// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for image-registry-webhook.
//!
//! Uses proptest to generate random image references and verify the registry
//! policy and aggregation invariants.

use proptest::prelude::*;

use image_registry_webhook::webhooks::evaluate_images;
use image_registry_webhook::webhooks::policies::registry::{
    DEPRECATED_REGISTRY_WARNING, evaluate,
};

/// Strategy for image references without any `/`.
fn bare_image() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9._:-]{0,30}"
}

/// Strategy for repository paths.
fn image_path() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}(/[a-z0-9]{1,12}){0,2}(:[a-z0-9.]{1,8})?"
}

/// Strategy for registry hosts containing `ecr`.
fn ecr_host() -> impl Strategy<Value = String> {
    ("[a-z0-9.-]{0,12}", "[a-z0-9.-]{0,20}").prop_map(|(pre, post)| format!("{}ecr{}", pre, post))
}

/// Strategy for registry hosts that are neither `quay.io` nor contain `ecr`.
fn other_host() -> impl Strategy<Value = String> {
    "[a-z0-9.-]{1,24}".prop_filter("must not be an approved registry", |host| {
        host != "quay.io" && !host.contains("ecr")
    })
}

/// Strategy for an image under any registry.
fn any_image() -> impl Strategy<Value = String> {
    prop_oneof![
        bare_image(),
        image_path().prop_map(|p| format!("quay.io/{}", p)),
        (ecr_host(), image_path()).prop_map(|(h, p)| format!("{}/{}", h, p)),
        (other_host(), image_path()).prop_map(|(h, p)| format!("{}/{}", h, p)),
    ]
}

proptest! {
    /// Property: images without a registry are always denied.
    #[test]
    fn bare_images_denied(image in bare_image()) {
        let decision = evaluate(&image);
        prop_assert!(!decision.allowed);
        prop_assert_eq!(decision.denial_message, Some(format!("{} Not a valid Image", image)));
        prop_assert!(decision.warning.is_none());
    }

    /// Property: quay.io images are allowed with exactly the deprecation warning.
    #[test]
    fn quay_images_warned(path in image_path()) {
        let decision = evaluate(&format!("quay.io/{}", path));
        prop_assert!(decision.allowed);
        prop_assert_eq!(decision.warning.as_deref(), Some(DEPRECATED_REGISTRY_WARNING));
        prop_assert!(decision.denial_message.is_none());
    }

    /// Property: hosts containing `ecr` are allowed without warnings.
    #[test]
    fn ecr_images_allowed(host in ecr_host(), path in image_path()) {
        let decision = evaluate(&format!("{}/{}", host, path));
        prop_assert!(decision.allowed);
        prop_assert!(decision.warning.is_none());
        prop_assert!(decision.denial_message.is_none());
    }

    /// Property: every other registry is denied.
    #[test]
    fn other_registries_denied(host in other_host(), path in image_path()) {
        let image = format!("{}/{}", host, path);
        let decision = evaluate(&image);
        prop_assert!(!decision.allowed);
        prop_assert_eq!(decision.denial_message, Some(format!("{} Not a valid Image", image)));
    }

    /// Property: evaluation is deterministic.
    #[test]
    fn evaluation_is_deterministic(image in any_image()) {
        prop_assert_eq!(evaluate(&image), evaluate(&image));
    }

    /// Property: a denial anywhere decides the aggregate, and equals the first denial alone.
    #[test]
    fn first_denial_decides(images in prop::collection::vec(any_image(), 1..8)) {
        let verdict = evaluate_images(images.iter().map(String::as_str));
        let first_denied = images.iter().find(|image| !evaluate(image).allowed);

        match first_denied {
            Some(denied) => {
                prop_assert!(!verdict.allowed);
                prop_assert!(verdict.warnings.is_empty());
                prop_assert_eq!(verdict.message, evaluate(denied).denial_message);
            }
            None => {
                prop_assert!(verdict.allowed);
                prop_assert!(verdict.message.is_none());
                let expected: Vec<String> = images
                    .iter()
                    .filter_map(|image| evaluate(image).warning)
                    .collect();
                prop_assert_eq!(verdict.warnings, expected);
            }
        }
    }

    /// Property: images after the first denial never influence the verdict.
    #[test]
    fn trailing_images_ignored(
        head in prop::collection::vec(any_image(), 0..4),
        denied in bare_image(),
        tail in prop::collection::vec(any_image(), 0..4),
    ) {
        let mut with_tail = head.clone();
        with_tail.push(denied.clone());
        let without_tail = with_tail.clone();
        with_tail.extend(tail);

        prop_assert_eq!(
            evaluate_images(with_tail.iter().map(String::as_str)),
            evaluate_images(without_tail.iter().map(String::as_str))
        );
    }
}
