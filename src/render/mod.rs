// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns a render context and a list of templates into the desired resource set.

pub mod manifest;
pub mod template;

pub use manifest::render;
pub use template::Template;
