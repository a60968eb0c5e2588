// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Image override parsing and merging.

use crate::error::ConfigurationError;
use std::collections::BTreeMap;

pub type ImageMap = BTreeMap<String, String>;

/// Parse the YAML mapping an operator supplies to override images.
///
/// An empty or null document is an empty override set. Entries are kept as
/// given, including empty values, so [`update_images`] can honour them.
pub fn parse_image_config(image_config: &str) -> Result<ImageMap, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidImageConfig {
        value: image_config.to_string(),
        reason,
    };

    if image_config.trim().is_empty() {
        return Ok(ImageMap::new());
    }

    let parsed: Option<BTreeMap<String, Option<String>>> =
        serde_yaml::from_str(image_config).map_err(|e| invalid(e.to_string()))?;

    Ok(parsed
        .unwrap_or_default()
        .into_iter()
        .map(|(name, image)| (name, image.unwrap_or_default()))
        .collect())
}

/// Drop every entry whose image is an empty string.
pub fn remove_empty_images(images: ImageMap) -> ImageMap {
    images
        .into_iter()
        .filter(|(_, image)| !image.is_empty())
        .collect()
}

/// Overlay `custom` on `defaults`.
///
/// A non-empty override replaces the default, an empty override removes the
/// key from the result altogether, and keys missing from `custom` keep their
/// default.
pub fn update_images(defaults: &ImageMap, custom: &ImageMap) -> ImageMap {
    let mut images = defaults.clone();
    for (name, image) in custom {
        if image.is_empty() {
            images.remove(name);
        } else {
            images.insert(name.clone(), image.clone());
        }
    }
    images
}
