// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inline style builders.
//!
//! Small CSS property lists a binding writes through [`StyleTarget`].

use alloc::format;
use alloc::string::String;

use smallvec::SmallVec;

use crate::element::StyleTarget;
use crate::layout::{Layout, Transform, transforms_are_equal};

/// CSS property carrying the visual drag offset.
pub const TRANSFORM_PROPERTY: &str = "transform";

/// An ordered list of inline style properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    properties: SmallVec<[(&'static str, String); 4]>,
}

impl Style {
    /// No properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing an earlier value.
    pub fn set(&mut self, name: &'static str, value: String) {
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((name, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &'static str, value: String) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.properties.iter().map(|(n, v)| (*n, v.as_str()))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether there are no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Merge `other` into `self`; `other` wins on conflicts.
    pub fn extend(&mut self, other: Self) {
        for (name, value) in other.properties {
            self.set(name, value);
        }
    }

    /// Write every property to `target`.
    pub fn apply_to<T: StyleTarget + ?Sized>(&self, target: &T) {
        for (name, value) in self.iter() {
            target.set_style_property(name, value);
        }
    }
}

/// `top`, `left`, `width` and `height` in pixels.
pub fn layout_style(layout: &Layout) -> Style {
    Style::new()
        .with("top", format!("{}px", layout.y()))
        .with("left", format!("{}px", layout.x()))
        .with("width", format!("{}px", layout.width()))
        .with("height", format!("{}px", layout.height()))
}

/// The CSS value for a transform: `translate3d(xpx, ypx, 0)`.
pub fn transform_value(transform: Transform) -> String {
    format!("translate3d({}px, {}px, 0)", transform.x, transform.y)
}

/// `transform: translate3d(...)`.
pub fn transform_style(transform: Transform) -> Style {
    Style::new().with(TRANSFORM_PROPERTY, transform_value(transform))
}

/// [`transform_style`], or nothing for the identity.
pub fn maybe_transform_style(transform: Transform) -> Style {
    if transforms_are_equal(transform, Transform::ZERO) {
        Style::new()
    } else {
        transform_style(transform)
    }
}
