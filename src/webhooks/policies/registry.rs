//! Image registry policy.
//!
//! Classifies a single container image reference by the registry host it
//! names:
//! - `quay.io` is allowed with a deprecation warning
//! - any host containing `ecr` is allowed
//! - everything else, including bare names without a registry, is denied
//!
//! Classification is purely syntactic; no registry is contacted.

use tracing::debug;

use super::Decision;

/// Registry host that is still accepted but scheduled for removal
pub const DEPRECATED_REGISTRY: &str = "quay.io";

/// Substring that marks an approved registry host
pub const APPROVED_REGISTRY_MARKER: &str = "ecr";

/// Warning attached to images pulled from the deprecated registry
pub const DEPRECATED_REGISTRY_WARNING: &str = "quay is will be depriated soon, please move to ecr";

/// Denial message for an image outside the approved registries
pub fn invalid_image_message(image: &str) -> String {
    format!("{} Not a valid Image", image)
}

/// Registry host of an image reference: everything before the first `/`.
///
/// Returns `None` for bare names such as `busybox`.
pub fn registry_host(image: &str) -> Option<&str> {
    image.split_once('/').map(|(host, _)| host)
}

/// Evaluate one image reference against the registry policy
pub fn evaluate(image: &str) -> Decision {
    let Some(host) = registry_host(image) else {
        debug!(image = %image, "Image has no registry host");
        return Decision::deny(invalid_image_message(image));
    };

    if host == DEPRECATED_REGISTRY {
        debug!(image = %image, registry = %host, "Image uses deprecated registry");
        return Decision::allow_with_warning(DEPRECATED_REGISTRY_WARNING);
    }

    // Substring match on the host, not a domain suffix check
    if host.contains(APPROVED_REGISTRY_MARKER) {
        debug!(image = %image, registry = %host, "Image uses approved registry");
        return Decision::allow();
    }

    debug!(image = %image, registry = %host, "Image registry is not approved");
    Decision::deny(invalid_image_message(image))
}
